//! Catalog store with transparent query caching.

use std::convert::Infallible;

use crate::catalog::{CatalogApi, Category, CategoryDraft, Product, ProductDraft};
use crate::error::SyncResult;
use crate::storage::LocalStore;
use crate::sync::{SyncStore, WriteOrigin};

use super::client::QueryClient;
use super::keys::CatalogKey;

/// `SyncStore` with reads served through a `QueryClient`.
///
/// Provides the same operations as the store. Writes go straight to the
/// store and then invalidate the cached reads they affect.
pub struct CachedCatalog<A: CatalogApi, S: LocalStore> {
  store: SyncStore<A, S>,
  queries: QueryClient,
}

impl<A: CatalogApi, S: LocalStore> Clone for CachedCatalog<A, S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
      queries: self.queries.clone(),
    }
  }
}

impl<A: CatalogApi, S: LocalStore> CachedCatalog<A, S> {
  pub fn new(store: SyncStore<A, S>, queries: QueryClient) -> Self {
    Self { store, queries }
  }

  pub fn store(&self) -> &SyncStore<A, S> {
    &self.store
  }

  pub fn queries(&self) -> &QueryClient {
    &self.queries
  }

  pub async fn list_products(&self) -> Vec<Product> {
    self
      .always(CatalogKey::ProductList, || self.store.list_products())
      .await
  }

  pub async fn get_product(&self, id: i64) -> SyncResult<Product> {
    self
      .queries
      .fetch(&CatalogKey::ProductDetail(id), || self.store.get_product(id))
      .await
  }

  pub async fn most_requested(&self) -> Vec<Product> {
    self
      .always(CatalogKey::MostRequested, || self.store.most_requested())
      .await
  }

  pub async fn best_sellers(&self) -> Vec<Product> {
    self
      .always(CatalogKey::BestSellers, || self.store.best_sellers())
      .await
  }

  pub async fn products_by_category(&self, category_id: i64) -> Vec<Product> {
    self
      .always(CatalogKey::ProductsByCategory(category_id), || {
        self.store.products_by_category(category_id)
      })
      .await
  }

  pub async fn search_products(&self, term: &str) -> Vec<Product> {
    self
      .always(CatalogKey::ProductSearch(term.to_string()), || {
        self.store.search_products(term)
      })
      .await
  }

  pub async fn list_categories(&self) -> Vec<Category> {
    self
      .always(CatalogKey::CategoryList, || self.store.list_categories())
      .await
  }

  pub async fn get_category(&self, id: i64) -> SyncResult<Category> {
    self
      .queries
      .fetch(&CatalogKey::CategoryDetail(id), || self.store.get_category(id))
      .await
  }

  pub async fn create_product(&self, draft: &ProductDraft) -> SyncResult<Product> {
    let product = self.store.create_product(draft).await?;
    self.queries.product_created();
    Ok(product)
  }

  pub async fn update_product(&self, id: i64, draft: &ProductDraft) -> SyncResult<Product> {
    let product = self.store.update_product(id, draft).await?;
    self.queries.product_updated(id);
    Ok(product)
  }

  pub async fn delete_product(&self, id: i64) -> SyncResult<WriteOrigin> {
    let origin = self.store.delete_product(id).await?;
    self.queries.product_deleted(id);
    Ok(origin)
  }

  pub async fn increment_purchase_count(&self, id: i64) -> SyncResult<Product> {
    let product = self.store.increment_purchase_count(id).await?;
    self.queries.purchase_recorded(id);
    Ok(product)
  }

  pub async fn create_category(&self, draft: &CategoryDraft) -> SyncResult<Category> {
    let category = self.store.create_category(draft).await?;
    self.queries.category_created();
    Ok(category)
  }

  pub async fn update_category(&self, id: i64, draft: &CategoryDraft) -> SyncResult<Category> {
    let category = self.store.update_category(id, draft).await?;
    self.queries.category_updated(id);
    Ok(category)
  }

  pub async fn delete_category(&self, id: i64) -> SyncResult<WriteOrigin> {
    let origin = self.store.delete_category(id).await?;
    self.queries.category_deleted(id);
    Ok(origin)
  }

  /// Drop the overlay and every cached read built on it.
  pub fn clear_local(&self) -> SyncResult<()> {
    self.store.clear_local()?;
    self.queries.clear();
    Ok(())
  }

  // Reads that never fail
  async fn always<T, F, Fut>(&self, key: CatalogKey, read: F) -> T
  where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
  {
    let result = self
      .queries
      .fetch(&key, || async move { Ok::<_, Infallible>(read().await) })
      .await;
    match result {
      Ok(value) => value,
      Err(never) => match never {},
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::{MemoryStorage, LOCAL_PRODUCTS_KEY};
  use crate::sync::fake::{server_product, FakeCatalog, Outage};
  use std::sync::Arc;

  fn cached(fake: FakeCatalog) -> (Arc<FakeCatalog>, CachedCatalog<FakeCatalog, MemoryStorage>) {
    let api = Arc::new(fake);
    let store = SyncStore::from_shared(api.clone(), Arc::new(MemoryStorage::new()));
    (api, CachedCatalog::new(store, QueryClient::new()))
  }

  #[tokio::test]
  async fn test_reads_hit_cache() {
    let (api, catalog) = cached(FakeCatalog::with_products(vec![server_product(
      1,
      &ProductDraft::new("Court Shoe", 900.0, 1),
    )]));

    assert_eq!(catalog.list_products().await.len(), 1);
    assert_eq!(catalog.list_products().await.len(), 1);
    assert_eq!(api.calls(), 1);
  }

  #[tokio::test]
  async fn test_offline_create_shows_up_in_list() {
    let (api, catalog) = cached(FakeCatalog::new());
    assert!(catalog.list_products().await.is_empty());

    api.set_outage(Some(Outage::Network));
    let created = catalog
      .create_product(&ProductDraft::new("Shoe A", 500.0, 2))
      .await
      .unwrap();

    assert_eq!(catalog.list_products().await, vec![created]);
  }

  #[tokio::test]
  async fn test_purchase_refreshes_most_requested() {
    let (_, catalog) = cached(FakeCatalog::with_products(vec![server_product(
      1,
      &ProductDraft::new("Match Ball", 120.0, 3),
    )]));

    assert!(catalog.most_requested().await.is_empty());
    catalog.increment_purchase_count(1).await.unwrap();
    assert_eq!(catalog.most_requested().await[0].purchase_count, 1);
  }

  #[tokio::test]
  async fn test_delete_refreshes_list_despite_corrupt_overlay() {
    let (api, catalog) = cached(FakeCatalog::with_products(vec![server_product(
      1,
      &ProductDraft::new("Court Shoe", 900.0, 1),
    )]));
    assert_eq!(catalog.list_products().await.len(), 1);

    catalog
      .store()
      .local_store()
      .set(LOCAL_PRODUCTS_KEY, "{not json")
      .unwrap();
    catalog.delete_product(1).await.unwrap();

    assert!(api.server_products().is_empty());
    assert!(catalog.list_products().await.is_empty());
  }

  #[tokio::test]
  async fn test_failed_write_keeps_cache() {
    let (api, catalog) = cached(FakeCatalog::new());
    catalog.list_categories().await;

    api.set_outage(Some(Outage::Network));
    let draft = CategoryDraft {
      name: "Bags".to_string(),
      ..Default::default()
    };
    assert!(catalog.create_category(&draft).await.is_err());
    assert!(catalog.queries().is_fresh(&CatalogKey::CategoryList));
  }
}
