use crate::catalog::Product;

/// Upper bound of the default price range
pub const DEFAULT_MAX_PRICE: f64 = 20_000.0;

/// Predicate over products: name search, price range, category.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
  /// Case-insensitive substring of the product name
  pub search: String,
  /// Inclusive price bounds
  pub min_price: f64,
  pub max_price: f64,
  /// `None` matches every category
  pub category_id: Option<i64>,
}

impl Default for ProductFilter {
  fn default() -> Self {
    Self {
      search: String::new(),
      min_price: 0.0,
      max_price: DEFAULT_MAX_PRICE,
      category_id: None,
    }
  }
}

impl ProductFilter {
  pub fn matches(&self, product: &Product) -> bool {
    name_matches(&product.name, &self.search)
      && product.price >= self.min_price
      && product.price <= self.max_price
      && self.category_id.map_or(true, |id| product.category_id == id)
  }

  /// Matching products, in input order
  pub fn apply<'a>(&self, items: &'a [Product]) -> Vec<&'a Product> {
    items.iter().filter(|p| self.matches(p)).collect()
  }
}

pub fn name_matches(name: &str, term: &str) -> bool {
  term.is_empty() || name.to_lowercase().contains(&term.to_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::ProductDraft;

  fn product(id: i64, name: &str, price: f64, category_id: i64) -> Product {
    let mut p = ProductDraft::new(name, price, category_id).to_local_product(id, 0);
    p.is_local = false;
    p
  }

  fn test_products() -> Vec<Product> {
    vec![
      product(1, "Court Shoe", 500.0, 1),
      product(2, "Match Ball", 120.0, 3),
      product(3, "Training Shirt", 20_000.0, 2),
      product(4, "Knee Pads", 20_000.5, 4),
    ]
  }

  #[test]
  fn test_default_filter_bounds() {
    let items = test_products();
    let filtered = ProductFilter::default().apply(&items);
    let ids: Vec<i64> = filtered.iter().map(|p| p.id).collect();
    // Upper bound is inclusive
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[test]
  fn test_search_is_case_insensitive() {
    let items = test_products();
    let filter = ProductFilter {
      search: "BALL".to_string(),
      ..Default::default()
    };
    let filtered = filter.apply(&items);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, 2);
  }

  #[test]
  fn test_price_and_category() {
    let items = test_products();
    let filter = ProductFilter {
      min_price: 120.0,
      max_price: 500.0,
      category_id: Some(1),
      ..Default::default()
    };
    let filtered = filter.apply(&items);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, 1);
  }
}
