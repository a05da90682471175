use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::profiles::schemas::SkinType;

pub const COLLECTION_FEEDBACK_EVENTS: &str = "feedback_events";
pub const COLLECTION_INGREDIENT_EFFECTIVENESS: &str = "ingredient_effectiveness";
pub const COLLECTION_PRODUCT_EFFECTIVENESS: &str = "product_effectiveness";

/// Storage sentinel for the "not specific to any skin type / concern"
/// bucket. Code never matches on this string; it only exists at the
/// serialization boundary.
pub const WILDCARD_SEGMENT: &str = "__all__";

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    HolyGrail,
    Good,
    Okay,
    Bad,
    BrokeMeOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionClass {
    Positive,
    Neutral,
    Negative,
}

/// Skin-type dimension of an effectiveness key. `Any` is the wildcard
/// bucket for events that carried no skin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkinSegment {
    Any,
    Type(SkinType),
}

impl SkinSegment {
    pub fn from_event(skin_type: Option<SkinType>) -> Self {
        match skin_type {
            Some(skin_type) => SkinSegment::Type(skin_type),
            None => SkinSegment::Any,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            SkinSegment::Any => WILDCARD_SEGMENT,
            SkinSegment::Type(skin_type) => skin_type.label(),
        }
    }
}

impl Serialize for SkinSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for SkinSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == WILDCARD_SEGMENT {
            return Ok(SkinSegment::Any);
        }
        SkinType::from_label(&raw)
            .map(SkinSegment::Type)
            .ok_or_else(|| serde::de::Error::custom("unknown skin segment"))
    }
}

/// Concern dimension of an ingredient effectiveness key. Concerns are
/// free-form user vocabulary, so the specific variant stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConcernSegment {
    Any,
    Concern(String),
}

impl ConcernSegment {
    pub fn from_event(concern: Option<&str>) -> Self {
        match concern {
            Some(concern) => ConcernSegment::Concern(concern.to_string()),
            None => ConcernSegment::Any,
        }
    }

    pub fn as_key(&self) -> &str {
        match self {
            ConcernSegment::Any => WILDCARD_SEGMENT,
            ConcernSegment::Concern(concern) => concern,
        }
    }
}

impl Serialize for ConcernSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for ConcernSegment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == WILDCARD_SEGMENT {
            Ok(ConcernSegment::Any)
        } else {
            Ok(ConcernSegment::Concern(raw))
        }
    }
}

/// Immutable record of one user's reaction to one product. Written once on
/// review intake, replayed in full by recompute_all.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeedbackEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event_id: String,
    pub product_id: String,
    pub user_skin_type: Option<SkinType>,
    pub concern: Option<String>,
    pub reaction: Reaction,
    pub rating: Option<i64>,
    pub created_at: DateTime,
}

fn neutral_score() -> f64 {
    0.5
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IngredientEffectivenessRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub ingredient_id: String,
    pub skin_segment: SkinSegment,
    pub concern_segment: ConcernSegment,
    #[serde(default = "neutral_score")]
    pub effectiveness_score: f64,
    pub sample_size: i64,
    pub positive_reports: i64,
    pub negative_reports: i64,
    pub neutral_reports: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductEffectivenessRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_id: String,
    pub skin_segment: SkinSegment,
    #[serde(default = "neutral_score")]
    pub effectiveness_score: f64,
    pub sample_size: i64,
    /// Sum of normalized ratings. Lets the incremental path be a pure $inc
    /// and keeps it bit-identical with batch recomputation.
    pub rating_sum: f64,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackIn {
    pub product_id: String,
    pub user_skin_type: Option<SkinType>,
    pub concern: Option<String>,
    pub reaction: Reaction,
    pub rating: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackAck {
    pub status: &'static str,
    pub event_id: String,
}

#[derive(Debug, Serialize)]
pub struct RecomputeSummary {
    pub events_replayed: usize,
    pub ingredient_records: usize,
    pub product_records: usize,
    pub records_reset: usize,
}
