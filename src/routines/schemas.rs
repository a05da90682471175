use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::cycle::schemas::CyclePhase;
use crate::weather::schemas::WeatherTrigger;

pub const COLLECTION_ROUTINES: &str = "routines";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Routine {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub name: String,
    pub product_ids: Vec<String>,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Add,
    Remove,
    Swap,
    Emphasize,
    Reduce,
    Avoid,
}

/// Which rule fired. Weather rules carry their trigger id, cycle rules the
/// phase they belong to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "source", content = "value")]
pub enum AdjustmentTrigger {
    Weather(WeatherTrigger),
    Cycle(CyclePhase),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoutineAdjustment {
    pub adjustment_type: AdjustmentType,
    pub product_category: String,
    pub reason: String,
    pub suggestion: String,
    pub trigger: AdjustmentTrigger,
}

/// Rule-table building block: a routine adjustment without its trigger.
/// The engines stamp the trigger on when a rule fires.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentTemplate {
    pub adjustment_type: AdjustmentType,
    pub product_category: &'static str,
    pub reason: &'static str,
    pub suggestion: &'static str,
}

impl AdjustmentTemplate {
    pub fn materialize(&self, trigger: AdjustmentTrigger) -> RoutineAdjustment {
        RoutineAdjustment {
            adjustment_type: self.adjustment_type,
            product_category: self.product_category.to_string(),
            reason: self.reason.to_string(),
            suggestion: self.suggestion.to_string(),
            trigger,
        }
    }
}
