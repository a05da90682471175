use axum::{
    Json,
    extract::{Path, Query},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    apex::utils::VerboseHTTPError,
    cycle,
    cycle::endpoints::CyclePhaseView,
    profiles,
    weather,
    weather::schemas::WeatherAdjustmentsView,
};

#[derive(Debug, Deserialize)]
pub struct RoutineContextQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Combined context view for the routine screen: both engines run
/// independently and their outputs are shown together.
#[derive(Debug, Serialize)]
pub struct RoutineContextView {
    pub user_id: String,
    pub cycle: Option<CyclePhaseView>,
    pub weather: Option<WeatherAdjustmentsView>,
}

pub async fn get_routine_adjustments_endpoint(
    Path(user_id): Path<String>,
    Query(query): Query<RoutineContextQuery>,
) -> Result<Json<RoutineContextView>, VerboseHTTPError> {
    let profile = profiles::delegates::get_profile(&user_id).await?;

    let Some(profile) = profile else {
        // No profile yet: nothing to adjust, but not an error.
        return Ok(Json(RoutineContextView {
            user_id,
            cycle: None,
            weather: None,
        }));
    };

    let cycle_view = match cycle::endpoints::resolve_cycle_settings(&profile) {
        Ok(Some((start, cycle_length))) => Some(cycle::endpoints::build_phase_view(
            start,
            cycle_length,
            profile.skin_type,
        )),
        Ok(None) => None,
        Err(_) => {
            // Malformed stored settings degrade the cycle section instead of
            // failing the whole routine view.
            warn!(user_id = %profile.user_id, "skipping cycle section, stored cycle settings are invalid");
            None
        }
    };

    let weather_view = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            let snapshot = weather::delegates::fetch_current_weather(lat, lng).await?;
            let adjustments =
                weather::delegates::get_weather_adjustments(&snapshot, profile.skin_type);
            Some(WeatherAdjustmentsView {
                snapshot,
                adjustments,
            })
        }
        _ => None,
    };

    Ok(Json(RoutineContextView {
        user_id,
        cycle: cycle_view,
        weather: weather_view,
    }))
}
