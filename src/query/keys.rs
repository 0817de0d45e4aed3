//! Query keys for catalog reads.

use sha2::{Digest, Sha256};

/// Identifies one cached catalog read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogKey {
  ProductList,
  ProductDetail(i64),
  MostRequested,
  BestSellers,
  ProductsByCategory(i64),
  /// Search results for a term
  ProductSearch(String),
  CategoryList,
  CategoryDetail(i64),
}

impl CatalogKey {
  /// Stable, fixed-length key used for storage lookups.
  pub fn cache_hash(&self) -> String {
    let input = match self {
      Self::ProductList => "products".to_string(),
      Self::ProductDetail(id) => format!("product:{}", id),
      Self::MostRequested => "products:most_requested".to_string(),
      Self::BestSellers => "products:best_sellers".to_string(),
      Self::ProductsByCategory(id) => format!("products:category:{}", id),
      Self::ProductSearch(term) => format!("products:search:{}", normalize_term(term)),
      Self::CategoryList => "categories".to_string(),
      Self::CategoryDetail(id) => format!("category:{}", id),
    };

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn description(&self) -> String {
    match self {
      Self::ProductList => "all products".to_string(),
      Self::ProductDetail(id) => format!("product {}", id),
      Self::MostRequested => "most requested products".to_string(),
      Self::BestSellers => "best sellers".to_string(),
      Self::ProductsByCategory(id) => format!("products in category {}", id),
      Self::ProductSearch(term) => format!("products matching {:?}", term),
      Self::CategoryList => "all categories".to_string(),
      Self::CategoryDetail(id) => format!("category {}", id),
    }
  }

  /// Whether this key holds a list of products that a product write can
  /// change.
  pub fn is_product_list(&self) -> bool {
    matches!(
      self,
      Self::ProductList
        | Self::MostRequested
        | Self::BestSellers
        | Self::ProductsByCategory(_)
        | Self::ProductSearch(_)
    )
  }
}

/// Search terms match case-insensitively, so they share a key.
fn normalize_term(term: &str) -> String {
  term.trim().to_lowercase()
}
