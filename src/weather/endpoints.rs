use axum::{Json, extract::Query};
use serde::Deserialize;

use super::{delegates, schemas::WeatherAdjustmentsView};
use crate::{apex::utils::VerboseHTTPError, profiles::schemas::SkinType};

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lng: f64,
    pub skin_type: Option<String>,
}

pub async fn get_weather_adjustments_endpoint(
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherAdjustmentsView>, VerboseHTTPError> {
    let skin_type = match query.skin_type.as_deref() {
        Some(raw) => Some(
            SkinType::from_label(raw)
                .ok_or_else(|| VerboseHTTPError::bad_request("unknown skin_type"))?,
        ),
        None => None,
    };

    let snapshot = delegates::fetch_current_weather(query.lat, query.lng).await?;
    let adjustments = delegates::get_weather_adjustments(&snapshot, skin_type);

    Ok(Json(WeatherAdjustmentsView {
        snapshot,
        adjustments,
    }))
}
