use std::env::var;
use tracing::warn;

use super::schemas::*;
use crate::apex::utils::VerboseHTTPError;
use crate::profiles::schemas::SkinType;
use crate::routines::schemas::{AdjustmentTrigger, RoutineAdjustment};

const DEFAULT_OPEN_METEO_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";

/// Stateless: every rule whose predicate matches fires, in table order.
pub fn get_weather_adjustments(
    snapshot: &WeatherSnapshot,
    skin_type: Option<SkinType>,
) -> Vec<RoutineAdjustment> {
    let mut adjustments = Vec::new();

    for rule in get_weather_rules() {
        if !(rule.matches)(snapshot) {
            continue;
        }

        let trigger = AdjustmentTrigger::Weather(rule.trigger);
        adjustments.extend(
            rule.base_adjustments
                .iter()
                .map(|template| template.materialize(trigger)),
        );

        if let Some(skin_type) = skin_type {
            for (extra_skin_type, templates) in &rule.skin_type_extras {
                if *extra_skin_type == skin_type {
                    adjustments
                        .extend(templates.iter().map(|template| template.materialize(trigger)));
                }
            }
        }
    }

    adjustments
}

/// Current conditions for a coordinate pair. Provider failures propagate as
/// upstream errors; the caller decides whether to retry. The provider
/// returns no place name, so the location string is best-effort
/// coordinates.
pub async fn fetch_current_weather(lat: f64, lng: f64) -> Result<WeatherSnapshot, VerboseHTTPError> {
    let endpoint =
        var("OPEN_METEO_ENDPOINT").unwrap_or_else(|_| DEFAULT_OPEN_METEO_ENDPOINT.to_string());

    let client = reqwest::Client::new();

    let response = client
        .get(&endpoint)
        .query(&[
            ("latitude", lat.to_string()),
            ("longitude", lng.to_string()),
            (
                "current",
                "temperature_2m,apparent_temperature,relative_humidity_2m,uv_index,wind_speed_10m,weather_code"
                    .to_string(),
            ),
            ("wind_speed_unit", "ms".to_string()),
        ])
        .send()
        .await
        .map_err(|_| {
            warn!(lat, lng, "weather provider unreachable");
            VerboseHTTPError::Upstream("Failed to reach weather provider".to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(lat, lng, %status, "weather provider returned an error");
        return Err(VerboseHTTPError::Upstream(format!(
            "Weather provider request failed: {status}"
        )));
    }

    let payload: OpenMeteoResponse = response
        .json()
        .await
        .map_err(|_| VerboseHTTPError::Upstream("Failed to parse weather provider response".to_string()))?;

    Ok(WeatherSnapshot {
        temperature: payload.current.temperature_2m,
        feels_like: payload.current.apparent_temperature,
        humidity: payload.current.relative_humidity_2m,
        uv_index: payload.current.uv_index,
        wind_speed: payload.current.wind_speed_10m,
        condition: WeatherCondition::from_wmo_code(payload.current.weather_code),
        location: format!("{lat:.4},{lng:.4}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(temperature: f64, humidity: f64, uv_index: f64, wind_speed: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            feels_like: temperature,
            humidity,
            uv_index,
            wind_speed,
            condition: WeatherCondition::Clear,
            location: "0.0000,0.0000".to_string(),
        }
    }

    fn fired_triggers(adjustments: &[RoutineAdjustment]) -> Vec<WeatherTrigger> {
        let mut triggers: Vec<WeatherTrigger> = adjustments
            .iter()
            .filter_map(|adjustment| match adjustment.trigger {
                AdjustmentTrigger::Weather(trigger) => Some(trigger),
                AdjustmentTrigger::Cycle(_) => None,
            })
            .collect();
        triggers.dedup();
        triggers
    }

    #[test]
    fn cold_dry_windy_reading_fires_all_three_rules() {
        let adjustments = get_weather_adjustments(&snapshot(2.0, 25.0, 1.0, 10.0), None);
        let triggers = fired_triggers(&adjustments);
        assert_eq!(
            triggers,
            vec![
                WeatherTrigger::LowHumidity,
                WeatherTrigger::ColdDry,
                WeatherTrigger::Windy,
            ],
            "matching rules fire non-exclusively, in table order"
        );
    }

    #[test]
    fn mild_reading_fires_nothing() {
        let adjustments = get_weather_adjustments(&snapshot(20.0, 50.0, 3.0, 2.0), Some(SkinType::Oily));
        assert!(adjustments.is_empty());
    }

    #[test]
    fn thresholds_are_strict_inequalities() {
        assert!(get_weather_adjustments(&snapshot(20.0, 70.0, 0.0, 0.0), None).is_empty());
        assert!(!get_weather_adjustments(&snapshot(20.0, 70.1, 0.0, 0.0), None).is_empty());
        assert!(get_weather_adjustments(&snapshot(20.0, 50.0, 7.0, 0.0), None).is_empty());
        assert!(!get_weather_adjustments(&snapshot(20.0, 50.0, 7.1, 0.0), None).is_empty());
        assert!(get_weather_adjustments(&snapshot(20.0, 50.0, 0.0, 8.0), None).is_empty());
        assert!(!get_weather_adjustments(&snapshot(20.0, 50.0, 0.0, 8.1), None).is_empty());
    }

    #[test]
    fn skin_type_extras_layer_on_top_of_base() {
        let reading = snapshot(35.0, 80.0, 2.0, 0.0);

        let base_only = get_weather_adjustments(&reading, None);
        let with_oily = get_weather_adjustments(&reading, Some(SkinType::Oily));
        assert!(with_oily.len() > base_only.len());

        // hot_humid and high_humidity both fire; the extras belong to them,
        // not to some unrelated rule.
        for adjustment in &with_oily {
            match adjustment.trigger {
                AdjustmentTrigger::Weather(trigger) => assert!(matches!(
                    trigger,
                    WeatherTrigger::HighHumidity | WeatherTrigger::HotHumid
                )),
                AdjustmentTrigger::Cycle(_) => panic!("weather engine emitted a cycle trigger"),
            }
        }
    }

    #[test]
    fn wmo_codes_map_onto_conditions() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(75), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(96), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_wmo_code(42), WeatherCondition::Unknown);
    }

    #[test]
    fn every_rule_has_base_adjustments_and_extras() {
        for rule in get_weather_rules() {
            assert!(!rule.base_adjustments.is_empty());
            assert!(rule.base_adjustments.len() <= 2);
            assert!(!rule.skin_type_extras.is_empty());
        }
    }
}
