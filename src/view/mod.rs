//! Derived list views: filtering, sorting and pagination over a
//! materialized product list, plus search-input debouncing.
//!
//! Everything except `Debouncer` is synchronous and pure over its input.

mod debounce;
mod filter;
mod pagination;
mod sort;

pub use debounce::Debouncer;
pub use filter::{name_matches, ProductFilter, DEFAULT_MAX_PRICE};
pub use pagination::{clamp_page, paginate, total_pages, Page, DEFAULT_PAGE_SIZE};
pub use sort::{rank_most_requested, SortMode};

use crate::catalog::Product;

/// Filter, sort and page state of the shop listing.
///
/// Changing the filter returns to the first page. The current page is
/// re-clamped on every render, so a list that shrinks between renders never
/// leaves the view past its last page.
#[derive(Debug, Clone)]
pub struct CatalogView {
  filter: ProductFilter,
  sort: SortMode,
  page: usize,
  page_size: usize,
}

impl Default for CatalogView {
  fn default() -> Self {
    Self::new(DEFAULT_PAGE_SIZE)
  }
}

impl CatalogView {
  pub fn new(page_size: usize) -> Self {
    Self {
      filter: ProductFilter::default(),
      sort: SortMode::None,
      page: 1,
      page_size: page_size.max(1),
    }
  }

  pub fn filter(&self) -> &ProductFilter {
    &self.filter
  }

  pub fn sort(&self) -> SortMode {
    self.sort
  }

  pub fn page(&self) -> usize {
    self.page
  }

  pub fn set_search(&mut self, term: impl Into<String>) {
    let term = term.into();
    if self.filter.search != term {
      self.filter.search = term;
      self.page = 1;
    }
  }

  pub fn set_price_range(&mut self, min: f64, max: f64) {
    if self.filter.min_price != min || self.filter.max_price != max {
      self.filter.min_price = min;
      self.filter.max_price = max;
      self.page = 1;
    }
  }

  pub fn set_category(&mut self, category_id: Option<i64>) {
    if self.filter.category_id != category_id {
      self.filter.category_id = category_id;
      self.page = 1;
    }
  }

  pub fn set_sort(&mut self, sort: SortMode) {
    if self.sort != sort {
      self.sort = sort;
      self.page = 1;
    }
  }

  pub fn reset_filters(&mut self) {
    self.filter = ProductFilter::default();
    self.sort = SortMode::None;
    self.page = 1;
  }

  pub fn set_page(&mut self, page: usize) {
    self.page = page.max(1);
  }

  pub fn next_page(&mut self) {
    self.page = self.page.saturating_add(1);
  }

  pub fn prev_page(&mut self) {
    self.page = self.page.saturating_sub(1).max(1);
  }

  /// Filtered and sorted products, without paging.
  pub fn visible<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
    self.sort.apply(self.filter.apply(products))
  }

  /// Render the current page of `products`.
  pub fn render<'a>(&mut self, products: &'a [Product]) -> Page<&'a Product> {
    let visible = self.visible(products);
    let page = paginate(&visible, self.page, self.page_size);
    self.page = page.page;
    page
  }
}
