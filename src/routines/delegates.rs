use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};
use std::collections::HashSet;

use super::schemas::*;
use crate::{DB, apex::utils::VerboseHTTPError};

pub async fn get_owned_product_ids(user_id: &str) -> Result<HashSet<String>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<Routine> = database.collection(COLLECTION_ROUTINES);

    let cursor = collection
        .find(doc! { "user_id": user_id, "active": true })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let routines: Vec<Routine> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    Ok(routines
        .into_iter()
        .flat_map(|routine| routine.product_ids)
        .collect())
}
