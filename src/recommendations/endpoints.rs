use axum::{Json, extract::Path};

use super::{delegates, schemas::*};
use crate::apex::utils::VerboseHTTPError;

pub async fn get_recommendations_endpoint(
    Path(user_id): Path<String>,
) -> Result<Json<RecommendationResponse>, VerboseHTTPError> {
    let recommendations = delegates::get_personalized_recommendations(&user_id).await?;
    Ok(Json(recommendations))
}

pub async fn get_insights_endpoint(
    Path(user_id): Path<String>,
) -> Result<Json<InsightsResponse>, VerboseHTTPError> {
    let insights = delegates::get_learning_insights(&user_id).await?;
    Ok(Json(insights))
}
