use axum::{Json, http::StatusCode, response::Json as JsonResponse};
use mongodb::bson::DateTime as BsonDateTime;
use uuid::Uuid;

use super::{delegates, schemas::*};
use crate::{apex::utils::VerboseHTTPError, catalog};

fn validate_feedback(body: &FeedbackIn) -> Result<(), VerboseHTTPError> {
    if body.product_id.is_empty() {
        return Err(VerboseHTTPError::bad_request("product_id must not be empty"));
    }
    if let Some(rating) = body.rating {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(VerboseHTTPError::bad_request("rating must be between 1 and 5"));
        }
    }
    Ok(())
}

/// Review-submission hook: the review itself is persisted elsewhere, this
/// endpoint feeds the reaction into the learning core.
pub async fn submit_feedback_endpoint(
    Json(body): Json<FeedbackIn>,
) -> Result<JsonResponse<FeedbackAck>, VerboseHTTPError> {
    validate_feedback(&body)?;

    // Events are replayed verbatim by recompute; reject products the
    // catalog has never heard of before one enters the history.
    if catalog::delegates::get_product(&body.product_id).await?.is_none() {
        return Err(VerboseHTTPError::Standard(
            StatusCode::NOT_FOUND,
            "Unknown product".to_string(),
        ));
    }

    let event = FeedbackEvent {
        id: None,
        event_id: Uuid::new_v4().to_string(),
        product_id: body.product_id,
        user_skin_type: body.user_skin_type,
        concern: body.concern,
        reaction: body.reaction,
        rating: body.rating,
        created_at: BsonDateTime::now(),
    };
    let event_id = event.event_id.clone();

    delegates::apply_feedback(event).await?;

    Ok(JsonResponse(FeedbackAck {
        status: "ok",
        event_id,
    }))
}

/// Operator-triggered maintenance job. Must not run concurrently with
/// feedback intake; scheduling that exclusion is the operator's job.
pub async fn recompute_effectiveness_endpoint()
-> Result<JsonResponse<RecomputeSummary>, VerboseHTTPError> {
    let summary = delegates::recompute_all().await?;
    Ok(JsonResponse(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(product_id: &str, rating: Option<i64>) -> FeedbackIn {
        FeedbackIn {
            product_id: product_id.to_string(),
            user_skin_type: None,
            concern: None,
            reaction: Reaction::Good,
            rating,
        }
    }

    fn is_bad_request(result: Result<(), VerboseHTTPError>) -> bool {
        matches!(
            result,
            Err(VerboseHTTPError::Standard(StatusCode::BAD_REQUEST, _))
        )
    }

    #[test]
    fn out_of_range_ratings_are_rejected() {
        assert!(is_bad_request(validate_feedback(&feedback("p1", Some(0)))));
        assert!(is_bad_request(validate_feedback(&feedback("p1", Some(6)))));
        for rating in MIN_RATING..=MAX_RATING {
            assert!(validate_feedback(&feedback("p1", Some(rating))).is_ok());
        }
    }

    #[test]
    fn empty_product_id_is_rejected() {
        assert!(is_bad_request(validate_feedback(&feedback("", None))));
    }

    #[test]
    fn rating_is_optional() {
        assert!(validate_feedback(&feedback("p1", None)).is_ok());
    }
}
