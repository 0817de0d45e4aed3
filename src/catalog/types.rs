use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// A catalog product.
///
/// This is also the on-disk shape of local overlay entries, so every field
/// tolerates being absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub category_id: i64,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub best_seller: bool,
  #[serde(default)]
  pub purchase_count: u64,
  #[serde(default)]
  pub country_of_origin: String,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub product_information: String,
  /// Set when the record only exists in the local overlay
  #[serde(default, skip_serializing_if = "is_false")]
  pub is_local: bool,
}

fn is_false(v: &bool) -> bool {
  !*v
}

/// A product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub image: String,
}

/// Input for creating or updating a product.
///
/// Mirrors the admin form: everything but the name and category may be
/// left out and is defaulted when a record is built from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
  pub name: String,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub category_id: Option<i64>,
  pub images: Vec<String>,
  pub best_seller: bool,
  pub country_of_origin: Option<String>,
  pub address: Option<String>,
  pub product_information: Option<String>,
}

impl ProductDraft {
  pub fn new(name: impl Into<String>, price: f64, category_id: i64) -> Self {
    Self {
      name: name.into(),
      price: Some(price),
      category_id: Some(category_id),
      ..Self::default()
    }
  }

  /// Field-level checks run before any network call.
  pub fn validate(&self) -> SyncResult<()> {
    if self.name.trim().is_empty() {
      return Err(SyncError::validation("name", "Name is required"));
    }

    match self.category_id {
      Some(id) if id > 0 => {}
      _ => return Err(SyncError::validation("category_id", "Category is required")),
    }

    if let Some(price) = self.price {
      if !price.is_finite() || price < 0.0 {
        return Err(SyncError::validation(
          "price",
          "Price must be a non-negative number",
        ));
      }
    }

    Ok(())
  }

  /// Build the local representation of this draft.
  pub fn to_local_product(&self, id: i64, purchase_count: u64) -> Product {
    let description = trimmed(&self.description);
    let product_information = self
      .product_information
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(String::from)
      .unwrap_or_else(|| description.clone());

    Product {
      id,
      name: self.name.trim().to_string(),
      description,
      price: self.price.unwrap_or(0.0),
      category_id: self.category_id.unwrap_or(1),
      images: self.images.clone(),
      best_seller: self.best_seller,
      purchase_count,
      country_of_origin: trimmed(&self.country_of_origin),
      address: trimmed(&self.address),
      product_information,
      is_local: true,
    }
  }
}

impl From<&Product> for ProductDraft {
  fn from(p: &Product) -> Self {
    Self {
      name: p.name.clone(),
      description: Some(p.description.clone()),
      price: Some(p.price),
      category_id: Some(p.category_id),
      images: p.images.clone(),
      best_seller: p.best_seller,
      country_of_origin: Some(p.country_of_origin.clone()),
      address: Some(p.address.clone()),
      product_information: Some(p.product_information.clone()),
    }
  }
}

/// Input for creating or updating a category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryDraft {
  pub name: String,
  pub description: Option<String>,
  pub image: Option<String>,
}

impl CategoryDraft {
  pub fn validate(&self) -> SyncResult<()> {
    if self.name.trim().is_empty() {
      return Err(SyncError::validation("name", "Category name is required"));
    }
    Ok(())
  }
}

fn trimmed(v: &Option<String>) -> String {
  v.as_deref().map(str::trim).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_requires_category() {
    let draft = ProductDraft {
      name: "Shoe A".to_string(),
      price: Some(500.0),
      ..Default::default()
    };
    match draft.validate() {
      Err(SyncError::Validation { field, .. }) => assert_eq!(field, "category_id"),
      other => panic!("expected validation error, got {:?}", other),
    }
  }

  #[test]
  fn test_validate_rejects_negative_price() {
    let draft = ProductDraft::new("Shoe A", -1.0, 2);
    assert!(matches!(
      draft.validate(),
      Err(SyncError::Validation { field: "price", .. })
    ));
  }

  #[test]
  fn test_validate_rejects_blank_name() {
    let draft = ProductDraft::new("   ", 10.0, 2);
    assert!(matches!(
      draft.validate(),
      Err(SyncError::Validation { field: "name", .. })
    ));
    assert!(ProductDraft::new("Ball", 10.0, 2).validate().is_ok());
  }

  #[test]
  fn test_local_product_defaults() {
    let draft = ProductDraft {
      name: "  Shoe A ".to_string(),
      description: Some(" Light ".to_string()),
      category_id: Some(2),
      ..Default::default()
    };

    let p = draft.to_local_product(42, 0);
    assert_eq!(p.id, 42);
    assert_eq!(p.name, "Shoe A");
    assert_eq!(p.price, 0.0);
    assert_eq!(p.product_information, "Light");
    assert!(p.images.is_empty());
    assert!(p.is_local);
  }

  #[test]
  fn test_overlay_entry_tolerates_missing_fields() {
    let p: Product = serde_json::from_str(r#"{"id": 5, "name": "Old"}"#).unwrap();
    assert_eq!(p.purchase_count, 0);
    assert!(!p.is_local);

    let json = serde_json::to_value(&p).unwrap();
    assert!(json.get("isLocal").is_none());
    assert_eq!(json["categoryId"], 0);
  }
}
