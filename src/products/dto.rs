use serde::{Deserialize, Serialize};

use super::repo_types::{CreatedProduct, ProductListing};

pub const COMPATIBILITY_DELIMITER: char = ',';
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Clients send compatibility either pre-joined (`"a,b"`) or as a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompatibilityInput {
    Joined(String),
    List(Vec<String>),
}

impl CompatibilityInput {
    /// Normalize to a list. Empty segments are dropped; list elements may not
    /// contain the delimiter since the joined form must stay unambiguous.
    pub fn into_list(self) -> Result<Vec<String>, String> {
        match self {
            CompatibilityInput::Joined(s) => Ok(split_compatibility(&s)),
            CompatibilityInput::List(items) => {
                if let Some(bad) = items.iter().find(|i| i.contains(COMPATIBILITY_DELIMITER)) {
                    return Err(format!(
                        "compatibility entry must not contain '{COMPATIBILITY_DELIMITER}': {bad}"
                    ));
                }
                Ok(items.into_iter().filter(|i| !i.is_empty()).collect())
            }
        }
    }
}

pub fn split_compatibility(joined: &str) -> Vec<String> {
    joined
        .split(COMPATIBILITY_DELIMITER)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub seller_id: Option<i64>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub device: Option<String>,
    pub manufacturer: Option<String>,
    pub price: Option<f64>,
    pub compatibility: Option<CompatibilityInput>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductListing>,
}

#[derive(Debug, Serialize)]
pub struct CreatedProductResponse {
    pub success: bool,
    pub product: CreatedProduct,
}
