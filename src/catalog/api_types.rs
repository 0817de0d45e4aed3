//! Serde types matching the catalog API's JSON.
//!
//! The backend is loose about optional fields (nulls, missing keys, two names
//! for the category image), so responses land here first and are normalized
//! into the domain types.

use serde::{Deserialize, Serialize};

use super::types::{Category, CategoryDraft, Product, ProductDraft};

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
  pub id: i64,
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub category_id: Option<i64>,
  pub images: Option<Vec<String>>,
  pub best_seller: Option<bool>,
  pub purchase_count: Option<u64>,
  pub country_of_origin: Option<String>,
  pub address: Option<String>,
  pub product_information: Option<String>,
}

impl ApiProduct {
  pub fn into_product(self) -> Product {
    Product {
      id: self.id,
      name: self.name.unwrap_or_default(),
      description: self.description.unwrap_or_default(),
      price: self.price.unwrap_or(0.0),
      category_id: self.category_id.unwrap_or(0),
      images: self.images.unwrap_or_default(),
      best_seller: self.best_seller.unwrap_or(false),
      purchase_count: self.purchase_count.unwrap_or(0),
      country_of_origin: self.country_of_origin.unwrap_or_default(),
      address: self.address.unwrap_or_default(),
      product_information: self.product_information.unwrap_or_default(),
      is_local: false,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
  pub id: i64,
  pub name: Option<String>,
  pub description: Option<String>,
  pub image: Option<String>,
  pub image_url: Option<String>,
}

impl From<ApiCategory> for Category {
  fn from(c: ApiCategory) -> Self {
    Category {
      id: c.id,
      name: c.name.unwrap_or_default(),
      description: c.description.unwrap_or_default(),
      image: c.image.or(c.image_url).unwrap_or_default(),
    }
  }
}

/// Pull the URL out of an upload response.
///
/// The endpoint has answered `{"imageUrl": ..}`, `{"url": ..}` and a bare
/// JSON string at various times.
pub fn upload_response_url(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Object(map) => map
      .get("imageUrl")
      .or_else(|| map.get("url"))
      .and_then(|v| v.as_str())
      .map(String::from),
    _ => None,
  }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProductPayload<'a> {
  pub id: i64,
  pub name: &'a str,
  pub description: &'a str,
  pub price: f64,
  pub category_id: i64,
  pub images: &'a [String],
  pub best_seller: bool,
  pub country_of_origin: &'a str,
  pub address: &'a str,
  pub product_information: &'a str,
}

impl<'a> ApiProductPayload<'a> {
  /// `id` is 0 for creation, letting the server assign one.
  pub fn new(id: i64, draft: &'a ProductDraft) -> Self {
    let description = draft.description.as_deref().unwrap_or("").trim();
    Self {
      id,
      name: draft.name.trim(),
      description,
      price: draft.price.unwrap_or(0.0),
      category_id: draft.category_id.unwrap_or(0),
      images: &draft.images,
      best_seller: draft.best_seller,
      country_of_origin: draft.country_of_origin.as_deref().unwrap_or("").trim(),
      address: draft.address.as_deref().unwrap_or("").trim(),
      product_information: draft
        .product_information
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(description),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiCategoryPayload<'a> {
  pub id: i64,
  pub name: &'a str,
  pub description: &'a str,
  pub image: &'a str,
}

impl<'a> ApiCategoryPayload<'a> {
  pub fn new(id: i64, draft: &'a CategoryDraft) -> Self {
    Self {
      id,
      name: draft.name.trim(),
      description: draft.description.as_deref().unwrap_or("").trim(),
      image: draft.image.as_deref().unwrap_or(""),
    }
  }
}
