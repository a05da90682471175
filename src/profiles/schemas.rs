use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const COLLECTION_USER_PROFILES: &str = "user_profiles";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SkinType {
    Oily,
    Dry,
    Combination,
    Sensitive,
    Normal,
}

impl SkinType {
    pub fn label(&self) -> &'static str {
        match self {
            SkinType::Oily => "oily",
            SkinType::Dry => "dry",
            SkinType::Combination => "combination",
            SkinType::Sensitive => "sensitive",
            SkinType::Normal => "normal",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "oily" => Some(SkinType::Oily),
            "dry" => Some(SkinType::Dry),
            "combination" => Some(SkinType::Combination),
            "sensitive" => Some(SkinType::Sensitive),
            "normal" => Some(SkinType::Normal),
            _ => None,
        }
    }
}

/// Skin profile as stored by the user-profile collaborator. This core only
/// reads it; onboarding writes it elsewhere.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub skin_type: Option<SkinType>,
    #[serde(default)]
    pub concerns: Vec<String>,
    /// ISO date, e.g. "2026-08-01". Paired with cycle_length for phase
    /// computation; both absent when the user has not opted in.
    pub cycle_start_date: Option<String>,
    pub cycle_length: Option<i64>,
}
