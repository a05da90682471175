use axum::{Json, extract::Path};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use super::{delegates, schemas::*};
use crate::{
    apex::utils::VerboseHTTPError,
    profiles,
    routines::schemas::RoutineAdjustment,
};

#[derive(Debug, Serialize)]
pub struct CyclePhaseView {
    pub phase_info: CyclePhaseInfo,
    pub skin_behavior: String,
    pub general_recommendations: Vec<String>,
    pub adjustments: Vec<RoutineAdjustment>,
}

/// Resolves the stored cycle settings for a user and rejects malformed ones
/// before handing off to the engine, which assumes its preconditions.
pub fn resolve_cycle_settings(
    profile: &profiles::schemas::UserProfile,
) -> Result<Option<(NaiveDate, i64)>, VerboseHTTPError> {
    let (Some(start_raw), Some(cycle_length)) =
        (profile.cycle_start_date.as_deref(), profile.cycle_length)
    else {
        return Ok(None);
    };

    if cycle_length < 1 {
        return Err(VerboseHTTPError::bad_request("cycle_length must be a positive number of days"));
    }

    let start = NaiveDate::parse_from_str(start_raw, "%Y-%m-%d")
        .map_err(|_| VerboseHTTPError::bad_request("cycle_start_date is not a valid ISO date"))?;

    Ok(Some((start, cycle_length)))
}

pub fn build_phase_view(
    start: NaiveDate,
    cycle_length: i64,
    skin_type: Option<crate::profiles::schemas::SkinType>,
) -> CyclePhaseView {
    let info = delegates::compute_cycle_phase(start, cycle_length, Utc::now().date_naive());
    let rule = delegates::phase_rule_for(info.phase);

    CyclePhaseView {
        phase_info: info,
        skin_behavior: rule.skin_behavior.to_string(),
        general_recommendations: rule
            .general_recommendations
            .iter()
            .map(|recommendation| recommendation.to_string())
            .collect(),
        adjustments: delegates::get_cycle_adjustments(info.phase, skin_type),
    }
}

pub async fn get_cycle_phase_endpoint(
    Path(user_id): Path<String>,
) -> Result<Json<CyclePhaseView>, VerboseHTTPError> {
    let profile = profiles::delegates::get_profile(&user_id)
        .await?
        .ok_or_else(|| {
            VerboseHTTPError::Standard(
                axum::http::StatusCode::NOT_FOUND,
                "User has no skin profile".to_string(),
            )
        })?;

    let Some((start, cycle_length)) = resolve_cycle_settings(&profile)? else {
        return Err(VerboseHTTPError::Standard(
            axum::http::StatusCode::NOT_FOUND,
            "Cycle tracking is not configured for this user".to_string(),
        ));
    };

    Ok(Json(build_phase_view(start, cycle_length, profile.skin_type)))
}
