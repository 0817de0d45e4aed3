use std::convert::Infallible;
use std::str::FromStr;

use crate::catalog::Product;

/// Ordering applied to a filtered product list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
  /// Keep filter order
  #[default]
  None,
  PriceAsc,
  PriceDesc,
  /// Only best sellers, order kept
  BestSeller,
  /// Only products bought at least once, most bought first
  MostRequested,
}

impl SortMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortMode::None => "",
      SortMode::PriceAsc => "price-asc",
      SortMode::PriceDesc => "price-desc",
      SortMode::BestSeller => "best-seller",
      SortMode::MostRequested => "most-requested",
    }
  }

  pub fn apply<'a>(&self, mut items: Vec<&'a Product>) -> Vec<&'a Product> {
    match self {
      SortMode::None => {}
      SortMode::PriceAsc => items.sort_by(|a, b| a.price.total_cmp(&b.price)),
      SortMode::PriceDesc => items.sort_by(|a, b| b.price.total_cmp(&a.price)),
      SortMode::BestSeller => items.retain(|p| p.best_seller),
      SortMode::MostRequested => {
        items.retain(|p| p.purchase_count > 0);
        items.sort_by(|a, b| b.purchase_count.cmp(&a.purchase_count));
      }
    }
    items
  }
}

impl FromStr for SortMode {
  type Err = Infallible;

  /// Unknown names fall back to `None`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.trim().to_lowercase().as_str() {
      "price-asc" => SortMode::PriceAsc,
      "price-desc" => SortMode::PriceDesc,
      "best-seller" => SortMode::BestSeller,
      "most-requested" => SortMode::MostRequested,
      _ => SortMode::None,
    })
  }
}

/// The `limit` most purchased products, excluding never-purchased ones.
pub fn rank_most_requested(products: &[Product], limit: usize) -> Vec<Product> {
  SortMode::MostRequested
    .apply(products.iter().collect())
    .into_iter()
    .take(limit)
    .cloned()
    .collect()
}
