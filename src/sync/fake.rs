//! In-memory catalog API for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::catalog::{
  CatalogApi, Category, CategoryDraft, ImageUpload, Product, ProductDraft, UploadTarget,
};
use crate::error::{RemoteError, RemoteResult};
use crate::view::rank_most_requested;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outage {
  /// Connection refused, DNS failure and the like
  Network,
  /// Server answers with this status
  Status(u16),
}

#[derive(Default)]
struct FakeState {
  outage: Option<Outage>,
  products: Vec<Product>,
  categories: Vec<Category>,
  next_id: i64,
}

pub(crate) struct FakeCatalog {
  state: Mutex<FakeState>,
  calls: AtomicUsize,
}

impl FakeCatalog {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(FakeState {
        next_id: 1,
        ..Default::default()
      }),
      calls: AtomicUsize::new(0),
    }
  }

  /// Seed server-side products; ids are taken as given.
  pub fn with_products(products: Vec<Product>) -> Self {
    let fake = Self::new();
    {
      let mut state = fake.state.lock().unwrap();
      state.next_id = products.iter().map(|p| p.id).max().unwrap_or(0) + 1;
      state.products = products;
    }
    fake
  }

  pub fn with_categories(self, categories: Vec<Category>) -> Self {
    self.state.lock().unwrap().categories = categories;
    self
  }

  pub fn set_outage(&self, outage: Option<Outage>) {
    self.state.lock().unwrap().outage = outage;
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn server_products(&self) -> Vec<Product> {
    self.state.lock().unwrap().products.clone()
  }

  fn check(&self) -> RemoteResult<std::sync::MutexGuard<'_, FakeState>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let state = self.state.lock().unwrap();
    match state.outage {
      None => Ok(state),
      Some(Outage::Network) => Err(RemoteError::Network("connection refused".to_string())),
      Some(Outage::Status(status)) => Err(RemoteError::Server { status }),
    }
  }
}

/// Server-side copy of a product built from a draft
pub(crate) fn server_product(id: i64, draft: &ProductDraft) -> Product {
  let mut product = draft.to_local_product(id, 0);
  product.is_local = false;
  product
}

fn not_found() -> RemoteError {
  RemoteError::Server { status: 404 }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
  async fn list_products(&self) -> RemoteResult<Vec<Product>> {
    Ok(self.check()?.products.clone())
  }

  async fn get_product(&self, id: i64) -> RemoteResult<Product> {
    let state = self.check()?;
    state
      .products
      .iter()
      .find(|p| p.id == id)
      .cloned()
      .ok_or_else(not_found)
  }

  async fn create_product(&self, draft: &ProductDraft) -> RemoteResult<Product> {
    let mut state = self.check()?;
    let product = server_product(state.next_id, draft);
    state.next_id += 1;
    state.products.push(product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: i64, draft: &ProductDraft) -> RemoteResult<Product> {
    let mut state = self.check()?;
    let existing = state
      .products
      .iter_mut()
      .find(|p| p.id == id)
      .ok_or_else(not_found)?;
    let purchase_count = existing.purchase_count;
    *existing = server_product(id, draft);
    existing.purchase_count = purchase_count;
    Ok(existing.clone())
  }

  async fn delete_product(&self, id: i64) -> RemoteResult<()> {
    let mut state = self.check()?;
    let before = state.products.len();
    state.products.retain(|p| p.id != id);
    if state.products.len() == before {
      return Err(not_found());
    }
    Ok(())
  }

  async fn increment_purchase_count(&self, id: i64) -> RemoteResult<Product> {
    let mut state = self.check()?;
    let product = state
      .products
      .iter_mut()
      .find(|p| p.id == id)
      .ok_or_else(not_found)?;
    product.purchase_count += 1;
    Ok(product.clone())
  }

  async fn most_requested(&self) -> RemoteResult<Vec<Product>> {
    let state = self.check()?;
    Ok(rank_most_requested(&state.products, 10))
  }

  async fn best_sellers(&self) -> RemoteResult<Vec<Product>> {
    let state = self.check()?;
    Ok(state.products.iter().filter(|p| p.best_seller).cloned().collect())
  }

  async fn products_by_category(&self, category_id: i64) -> RemoteResult<Vec<Product>> {
    let state = self.check()?;
    Ok(
      state
        .products
        .iter()
        .filter(|p| p.category_id == category_id)
        .cloned()
        .collect(),
    )
  }

  async fn search_products(&self, term: &str) -> RemoteResult<Vec<Product>> {
    let state = self.check()?;
    Ok(
      state
        .products
        .iter()
        .filter(|p| crate::view::name_matches(&p.name, term))
        .cloned()
        .collect(),
    )
  }

  async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
    Ok(self.check()?.categories.clone())
  }

  async fn get_category(&self, id: i64) -> RemoteResult<Category> {
    let state = self.check()?;
    state
      .categories
      .iter()
      .find(|c| c.id == id)
      .cloned()
      .ok_or_else(not_found)
  }

  async fn create_category(&self, draft: &CategoryDraft) -> RemoteResult<Category> {
    let mut state = self.check()?;
    let category = Category {
      id: state.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1,
      name: draft.name.trim().to_string(),
      description: draft.description.clone().unwrap_or_default(),
      image: draft.image.clone().unwrap_or_default(),
    };
    state.categories.push(category.clone());
    Ok(category)
  }

  async fn update_category(&self, id: i64, draft: &CategoryDraft) -> RemoteResult<Category> {
    let mut state = self.check()?;
    let category = state
      .categories
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or_else(not_found)?;
    category.name = draft.name.trim().to_string();
    category.description = draft.description.clone().unwrap_or_default();
    category.image = draft.image.clone().unwrap_or_default();
    Ok(category.clone())
  }

  async fn delete_category(&self, id: i64) -> RemoteResult<()> {
    let mut state = self.check()?;
    state.categories.retain(|c| c.id != id);
    Ok(())
  }

  async fn upload_image(&self, target: UploadTarget, upload: &ImageUpload) -> RemoteResult<String> {
    self.check()?;
    let folder = match target {
      UploadTarget::Product => "products",
      UploadTarget::Category => "categories",
    };
    Ok(format!("https://cdn.test/{}/{}", folder, upload.file_name))
  }

  async fn probe(&self, _path: &str) -> RemoteResult<u16> {
    self.check()?;
    Ok(200)
  }
}
