use serde::{Deserialize, Serialize};

use crate::profiles::schemas::SkinType;
use crate::routines::schemas::{AdjustmentTemplate, AdjustmentType, RoutineAdjustment};

pub const HIGH_HUMIDITY_THRESHOLD: f64 = 70.0;
pub const LOW_HUMIDITY_THRESHOLD: f64 = 30.0;
pub const HIGH_UV_THRESHOLD: f64 = 7.0;
pub const COLD_TEMPERATURE_THRESHOLD: f64 = 5.0;
pub const COLD_DRY_HUMIDITY_THRESHOLD: f64 = 40.0;
pub const HOT_TEMPERATURE_THRESHOLD: f64 = 30.0;
pub const HOT_HUMID_HUMIDITY_THRESHOLD: f64 = 60.0;
pub const WINDY_THRESHOLD: f64 = 8.0;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherTrigger {
    HighHumidity,
    LowHumidity,
    HighUv,
    ColdDry,
    HotHumid,
    Windy,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// WMO weather interpretation codes as used by Open-Meteo.
    pub fn from_wmo_code(code: i64) -> Self {
        match code {
            0 => WeatherCondition::Clear,
            1 | 2 => WeatherCondition::PartlyCloudy,
            3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Fog,
            51..=57 => WeatherCondition::Drizzle,
            61..=67 | 80..=82 => WeatherCondition::Rain,
            71..=77 | 85 | 86 => WeatherCondition::Snow,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }
}

/// One reading from the weather provider. Not persisted by this core.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub uv_index: f64,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
    pub location: String,
}

/// One row of the weather rule table. Rules are evaluated top to bottom and
/// every matching rule fires; weather stressors are additive, not mutually
/// exclusive categories.
pub struct WeatherRule {
    pub trigger: WeatherTrigger,
    pub matches: fn(&WeatherSnapshot) -> bool,
    pub base_adjustments: Vec<AdjustmentTemplate>,
    pub skin_type_extras: Vec<(SkinType, Vec<AdjustmentTemplate>)>,
}

pub fn get_weather_rules() -> Vec<WeatherRule> {
    vec![
        WeatherRule {
            trigger: WeatherTrigger::HighHumidity,
            matches: |weather| weather.humidity > HIGH_HUMIDITY_THRESHOLD,
            base_adjustments: vec![AdjustmentTemplate {
                adjustment_type: AdjustmentType::Swap,
                product_category: "moisturizer",
                reason: "Humidity above 70% keeps skin from losing water on its own",
                suggestion: "Swap your cream for a lightweight gel moisturizer",
            }],
            skin_type_extras: vec![
                (
                    SkinType::Oily,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Emphasize,
                        product_category: "cleanser",
                        reason: "Sweat mixes with sebum faster in humid air",
                        suggestion: "Cleanse as soon as you come back indoors",
                    }],
                ),
                (
                    SkinType::Combination,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Emphasize,
                        product_category: "toner",
                        reason: "The T-zone over-produces oil in sticky weather",
                        suggestion: "Use a balancing toner morning and evening",
                    }],
                ),
            ],
        },
        WeatherRule {
            trigger: WeatherTrigger::LowHumidity,
            matches: |weather| weather.humidity < LOW_HUMIDITY_THRESHOLD,
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "moisturizer",
                    reason: "Dry air pulls water straight out of the skin",
                    suggestion: "Apply moisturizer on slightly damp skin to lock water in",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Add,
                    product_category: "mist",
                    reason: "Indoor heating and dry air dehydrate skin through the day",
                    suggestion: "Keep a hydrating mist at your desk",
                },
            ],
            skin_type_extras: vec![
                (
                    SkinType::Dry,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Add,
                        product_category: "face_oil",
                        reason: "Dry skin loses the most water when humidity drops",
                        suggestion: "Seal your evening routine with a face oil",
                    }],
                ),
                (
                    SkinType::Sensitive,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Reduce,
                        product_category: "exfoliant",
                        reason: "A dehydrated barrier reacts badly to acids",
                        suggestion: "Skip exfoliation until humidity recovers",
                    }],
                ),
            ],
        },
        WeatherRule {
            trigger: WeatherTrigger::HighUv,
            matches: |weather| weather.uv_index > HIGH_UV_THRESHOLD,
            base_adjustments: vec![AdjustmentTemplate {
                adjustment_type: AdjustmentType::Emphasize,
                product_category: "sunscreen",
                reason: "UV index above 7 burns unprotected skin within minutes",
                suggestion: "Reapply a broad-spectrum SPF every two hours outdoors",
            }],
            skin_type_extras: vec![(
                SkinType::Sensitive,
                vec![AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Avoid,
                    product_category: "exfoliant",
                    reason: "Fresh exfoliation plus strong UV invites irritation and spots",
                    suggestion: "Hold off on acids and retinoids on high-UV days",
                }],
            )],
        },
        WeatherRule {
            trigger: WeatherTrigger::ColdDry,
            matches: |weather| {
                weather.temperature < COLD_TEMPERATURE_THRESHOLD
                    && weather.humidity < COLD_DRY_HUMIDITY_THRESHOLD
            },
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "moisturizer",
                    reason: "Cold, dry air strips lipids from the barrier",
                    suggestion: "Switch to a heavier barrier cream while the cold lasts",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Add,
                    product_category: "face_oil",
                    reason: "An occlusive layer slows water loss in freezing air",
                    suggestion: "Layer a face oil over your night moisturizer",
                },
            ],
            skin_type_extras: vec![
                (
                    SkinType::Dry,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Add,
                        product_category: "mask",
                        reason: "Dry skin cracks first in a cold snap",
                        suggestion: "Use an overnight hydrating mask twice this week",
                    }],
                ),
                (
                    SkinType::Sensitive,
                    vec![AdjustmentTemplate {
                        adjustment_type: AdjustmentType::Reduce,
                        product_category: "exfoliant",
                        reason: "Wind-chilled skin is already micro-damaged",
                        suggestion: "Pause exfoliation until the weather turns",
                    }],
                ),
            ],
        },
        WeatherRule {
            trigger: WeatherTrigger::HotHumid,
            matches: |weather| {
                weather.temperature > HOT_TEMPERATURE_THRESHOLD
                    && weather.humidity > HOT_HUMID_HUMIDITY_THRESHOLD
            },
            base_adjustments: vec![
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "cleanser",
                    reason: "Sweat, sunscreen and sebum build up fast in hot, humid weather",
                    suggestion: "Double-cleanse in the evening",
                },
                AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Reduce,
                    product_category: "face_oil",
                    reason: "Heavy occlusives trap sweat against the skin",
                    suggestion: "Drop oils and rich creams until the heat breaks",
                },
            ],
            skin_type_extras: vec![(
                SkinType::Oily,
                vec![AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Emphasize,
                    product_category: "toner",
                    reason: "Oily skin shines within hours in this weather",
                    suggestion: "Blot and re-tone at midday instead of over-washing",
                }],
            )],
        },
        WeatherRule {
            trigger: WeatherTrigger::Windy,
            matches: |weather| weather.wind_speed > WINDY_THRESHOLD,
            base_adjustments: vec![AdjustmentTemplate {
                adjustment_type: AdjustmentType::Emphasize,
                product_category: "moisturizer",
                reason: "Wind physically abrades and dehydrates exposed skin",
                suggestion: "Apply a protective layer before going outside",
            }],
            skin_type_extras: vec![(
                SkinType::Sensitive,
                vec![AdjustmentTemplate {
                    adjustment_type: AdjustmentType::Avoid,
                    product_category: "exfoliant",
                    reason: "Windburned skin reacts to anything active",
                    suggestion: "Keep the routine bland until redness settles",
                }],
            )],
        },
    ]
}

/// Subset of the Open-Meteo current-conditions payload this core reads.
#[derive(Debug, Deserialize)]
pub struct OpenMeteoResponse {
    pub current: OpenMeteoCurrent,
}

#[derive(Debug, Deserialize)]
pub struct OpenMeteoCurrent {
    pub temperature_2m: f64,
    pub apparent_temperature: f64,
    pub relative_humidity_2m: f64,
    #[serde(default)]
    pub uv_index: f64,
    pub wind_speed_10m: f64,
    pub weather_code: i64,
}

#[derive(Debug, Serialize)]
pub struct WeatherAdjustmentsView {
    pub snapshot: WeatherSnapshot,
    pub adjustments: Vec<RoutineAdjustment>,
}
