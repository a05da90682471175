use futures::TryStreamExt;
use mongodb::{Collection, bson::doc};
use std::collections::HashMap;

use super::schemas::*;
use crate::{DB, apex::utils::VerboseHTTPError};

pub async fn get_product(product_id: &str) -> Result<Option<Product>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<Product> = database.collection(COLLECTION_PRODUCTS);

    collection
        .find_one(doc! { "product_id": product_id, "enabled": true })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))
}

pub async fn get_attributed_ingredients(
    product_id: &str,
) -> Result<Vec<String>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<ProductIngredientLink> =
        database.collection(COLLECTION_PRODUCT_INGREDIENTS);

    let cursor = collection
        .find(doc! {
            "product_id": product_id,
            "position": { "$lte": MAX_ATTRIBUTED_POSITION }
        })
        .sort(doc! { "position": 1 })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let links: Vec<ProductIngredientLink> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    Ok(links.into_iter().map(|link| link.ingredient_id).collect())
}

pub async fn get_attributed_ingredients_for(
    product_ids: &[String],
) -> Result<HashMap<String, Vec<String>>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let collection: Collection<ProductIngredientLink> =
        database.collection(COLLECTION_PRODUCT_INGREDIENTS);

    let cursor = collection
        .find(doc! {
            "product_id": { "$in": product_ids.to_vec() },
            "position": { "$lte": MAX_ATTRIBUTED_POSITION }
        })
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let links: Vec<ProductIngredientLink> = cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for link in links {
        grouped.entry(link.product_id).or_default().push(link.ingredient_id);
    }

    Ok(grouped)
}

pub async fn get_top_rated_products(
    min_rating: f64,
    limit: i64,
) -> Result<Vec<Product>, VerboseHTTPError> {
    let Some(database) = DB.get() else {
        return Err(VerboseHTTPError::internal("Database unavailable"));
    };

    let collection: Collection<Product> = database.collection(COLLECTION_PRODUCTS);

    let cursor = collection
        .find(doc! {
            "enabled": true,
            "rating_avg": { "$gte": min_rating },
            "review_count": { "$gte": 1 }
        })
        .sort(doc! { "rating_avg": -1 })
        .limit(limit)
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))?;

    cursor
        .try_collect()
        .await
        .map_err(|_| VerboseHTTPError::internal("Database error"))
}
