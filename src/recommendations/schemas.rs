use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::profiles::schemas::SkinType;

pub const COLLECTION_TREND_SIGNALS: &str = "trend_signals";
pub const COLLECTION_LEARNING_PATTERNS: &str = "learning_patterns";

/// Scores backed by fewer reports than this are treated as noise.
pub const MIN_SAMPLE_SIZE: i64 = 3;
pub const MIN_PRODUCT_EFFECTIVENESS: f64 = 0.6;
pub const MIN_BOOST_INGREDIENT_SCORE: f64 = 0.7;
pub const CANDIDATE_LIMIT: i64 = 30;
pub const INGREDIENT_BOOST_WEIGHT: f64 = 10.0;
pub const MAX_INGREDIENT_BOOST: f64 = 20.0;
/// 100 is never awarded; nothing is a perfect match.
pub const MAX_MATCH_SCORE: i64 = 99;
pub const MAX_RECOMMENDATIONS: usize = 10;
pub const MIN_FALLBACK_RATING: f64 = 4.0;
pub const MAX_FALLBACK_RESULTS: i64 = 10;
pub const TRUST_SAMPLE_SIZE: i64 = 10;
pub const HIGHLIGHT_EFFECTIVENESS: f64 = 0.8;
pub const MIN_PATTERN_CONFIDENCE: f64 = 0.6;
pub const MAX_INSIGHTS: usize = 6;
pub const MAX_INGREDIENT_INSIGHTS: usize = 5;
pub const MAX_TREND_INSIGHTS: i64 = 3;
pub const MAX_PATTERN_INSIGHTS: i64 = 3;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct EffectivenessData {
    pub effectiveness_score: f64,
    pub sample_size: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PersonalizedRecommendation {
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub match_score: i64,
    pub reasons: Vec<String>,
    /// None on the raw-rating fallback path; consumers use this to tell a
    /// learned score from a popularity score.
    pub effectiveness_data: Option<EffectivenessData>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recommendations: Vec<PersonalizedRecommendation>,
    pub generated_at: DateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    IngredientEffectiveness,
    Trending,
    LearningPattern,
    Onboarding,
}

#[derive(Debug, Serialize, Clone)]
pub struct LearningInsight {
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub user_id: String,
    pub insights: Vec<LearningInsight>,
    pub generated_at: DateTime,
}

/// Emerging/trending term from the external trend-signal feed. Read-only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrendSignal {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub term: String,
    pub category: Option<String>,
    pub mention_count: i64,
    pub last_seen: DateTime,
}

/// Cross-user pattern mined elsewhere; surfaced once confident enough.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LearningPattern {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub skin_type: SkinType,
    pub pattern: String,
    pub confidence_score: f64,
    pub sample_size: i64,
}
