use mongodb::{Collection, bson::doc};

use super::schemas::*;
use crate::{DB, apex::utils::VerboseHTTPError};

/// An absent profile is a normal condition (the user has not onboarded),
/// never an error.
pub async fn get_profile(user_id: &str) -> Result<Option<UserProfile>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<UserProfile> = database.collection(COLLECTION_USER_PROFILES);

    collection
        .find_one(doc! { "user_id": user_id })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))
}
