use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Ingredient positions past this point on a label carry too little
/// concentration to attribute effectiveness to. Tunable.
pub const MAX_ATTRIBUTED_POSITION: i64 = 10;

pub const COLLECTION_PRODUCTS: &str = "products";
pub const COLLECTION_PRODUCT_INGREDIENTS: &str = "product_ingredients";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Cleanser,
    Toner,
    Essence,
    Serum,
    Moisturizer,
    EyeCream,
    FaceOil,
    Sunscreen,
    Exfoliant,
    Mask,
    SpotTreatment,
    Mist,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_id: String,
    pub name: String,
    pub brand: String,
    pub category: ProductCategory,
    pub rating_avg: f64,
    pub review_count: i64,
    pub enabled: bool,
}

/// Label ordering of one ingredient within one product. Position 1 is the
/// highest-concentration ingredient. Owned by the catalog; read-only here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductIngredientLink {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub product_id: String,
    pub ingredient_id: String,
    pub position: i64,
}
