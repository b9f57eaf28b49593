use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Product row joined with its seller's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductListing {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub device: String,
    pub manufacturer: String,
    pub compatibility: Vec<String>,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub in_stock: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub seller_name: Option<String>,
}

/// Summary returned after creation. No seller name, compatibility or timestamp.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CreatedProduct {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub device: String,
    pub manufacturer: String,
    pub price: f64,
    pub in_stock: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    pub category: String,
    pub device: String,
    pub manufacturer: String,
    pub compatibility: Vec<String>,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub in_stock: bool,
}
