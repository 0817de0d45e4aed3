use std::slice;
use tracing::{info, warn};

use crate::catalog::{CatalogApi, ImageUpload, Product, ProductDraft, UploadTarget};
use crate::error::{SyncError, SyncResult};
use crate::storage::LocalStore;
use crate::view::{name_matches, rank_most_requested};

use super::{allocate_local_id, merge, SyncStore, WriteOrigin};

/// Size of the locally derived most-requested list
pub const MOST_REQUESTED_LIMIT: usize = 10;

impl<A: CatalogApi, S: LocalStore> SyncStore<A, S> {
  /// All products: remote records followed by local overlay entries, or the
  /// overlay alone when the API is unreachable. Never fails.
  pub async fn list_products(&self) -> Vec<Product> {
    match self.api.list_products().await {
      Ok(remote) => {
        self.note_remote_ids(&remote);
        merge(remote, self.overlay.load())
      }
      Err(e) => {
        warn!(error = %e, "listing products failed, serving local overlay");
        self.overlay.load()
      }
    }
  }

  /// A single product, looked up in the overlay when the API can't answer.
  pub async fn get_product(&self, id: i64) -> SyncResult<Product> {
    match self.api.get_product(id).await {
      Ok(product) => Ok(product),
      Err(e) => {
        warn!(id, error = %e, "fetching product failed, checking local overlay");
        self
          .overlay
          .get(id)
          .ok_or_else(|| SyncError::not_found("product", id))
      }
    }
  }

  /// Create a product.
  ///
  /// When the API is unreachable the product is kept in the local overlay
  /// under a fresh id and returned with `is_local` set.
  pub async fn create_product(&self, draft: &ProductDraft) -> SyncResult<Product> {
    draft.validate()?;

    match self.api.create_product(draft).await {
      Ok(product) => {
        self.note_remote_ids(slice::from_ref(&product));
        Ok(product)
      }
      Err(e) => {
        warn!(error = %e, "creating product failed, saving locally");
        let max_remote_id = self.max_remote_id.load(std::sync::atomic::Ordering::SeqCst);

        let product = self.overlay.modify(|local| {
          let id = allocate_local_id(local, max_remote_id)?;
          let product = draft.to_local_product(id, 0);
          local.push(product.clone());
          Ok::<_, SyncError>(product)
        })??;

        info!(id = product.id, name = %product.name, "product saved to local overlay");
        Ok(product)
      }
    }
  }

  /// Update a product, replacing or adding its overlay entry when the API is
  /// unreachable.
  pub async fn update_product(&self, id: i64, draft: &ProductDraft) -> SyncResult<Product> {
    draft.validate()?;

    match self.api.update_product(id, draft).await {
      Ok(product) => Ok(product),
      Err(e) => {
        warn!(id, error = %e, "updating product failed, saving locally");

        let product = self.overlay.modify(|local| {
          match local.iter().position(|p| p.id == id) {
            Some(index) => {
              let product = draft.to_local_product(id, local[index].purchase_count);
              local[index] = product.clone();
              product
            }
            None => {
              let product = draft.to_local_product(id, 0);
              local.push(product.clone());
              product
            }
          }
        })?;

        info!(id, "product update saved to local overlay");
        Ok(product)
      }
    }
  }

  /// Delete a product. Succeeds whether or not the id was known anywhere.
  pub async fn delete_product(&self, id: i64) -> SyncResult<WriteOrigin> {
    let origin = match self.api.delete_product(id).await {
      Ok(()) => WriteOrigin::Remote,
      Err(e) => {
        warn!(id, error = %e, "deleting product failed, deleting locally");
        WriteOrigin::Local
      }
    };

    // An unreadable overlay holds no usable copy of the id either way
    let removed = self.overlay.modify(|local| {
      let before = local.len();
      local.retain(|p| p.id != id);
      before != local.len()
    });

    match removed {
      Ok(true) => info!(id, "product removed from local overlay"),
      Ok(false) => {}
      Err(e) => warn!(id, error = %e, "local overlay unreadable, skipping local delete"),
    }
    Ok(origin)
  }

  /// Record a purchase, counting it in the overlay when the API is
  /// unreachable.
  pub async fn increment_purchase_count(&self, id: i64) -> SyncResult<Product> {
    match self.api.increment_purchase_count(id).await {
      Ok(product) => Ok(product),
      Err(e) => {
        warn!(id, error = %e, "recording purchase failed, counting locally");

        self
          .overlay
          .modify(|local| {
            local.iter_mut().find(|p| p.id == id).map(|p| {
              p.purchase_count += 1;
              p.clone()
            })
          })?
          .ok_or_else(|| SyncError::not_found("product", id))
      }
    }
  }

  /// Most purchased products, ranked locally from the overlay when the API
  /// is unreachable.
  pub async fn most_requested(&self) -> Vec<Product> {
    match self.api.most_requested().await {
      Ok(products) => products,
      Err(e) => {
        warn!(error = %e, "most-requested failed, ranking local overlay");
        rank_most_requested(&self.overlay.load(), MOST_REQUESTED_LIMIT)
      }
    }
  }

  pub async fn best_sellers(&self) -> Vec<Product> {
    match self.api.best_sellers().await {
      Ok(products) => products,
      Err(e) => {
        warn!(error = %e, "best sellers failed, filtering local overlay");
        self.local_where(|p| p.best_seller)
      }
    }
  }

  pub async fn products_by_category(&self, category_id: i64) -> Vec<Product> {
    match self.api.products_by_category(category_id).await {
      Ok(products) => products,
      Err(e) => {
        warn!(category_id, error = %e, "category listing failed, filtering local overlay");
        self.local_where(|p| p.category_id == category_id)
      }
    }
  }

  pub async fn search_products(&self, term: &str) -> Vec<Product> {
    match self.api.search_products(term).await {
      Ok(products) => products,
      Err(e) => {
        warn!(term, error = %e, "search failed, searching local overlay");
        self.local_where(|p| name_matches(&p.name, term))
      }
    }
  }

  /// Upload a product image.
  ///
  /// When the upload endpoint is unreachable the image is inlined as a
  /// `data:` URL so the product can still be saved with it.
  pub async fn upload_product_image(&self, upload: &ImageUpload) -> SyncResult<String> {
    upload.validate()?;

    match self.api.upload_image(UploadTarget::Product, upload).await {
      Ok(url) => Ok(url),
      Err(e) => {
        warn!(file = %upload.file_name, error = %e, "image upload failed, inlining image");
        Ok(upload.to_data_url())
      }
    }
  }

  fn local_where(&self, predicate: impl Fn(&Product) -> bool) -> Vec<Product> {
    self
      .overlay
      .load()
      .into_iter()
      .filter(|p| predicate(p))
      .collect()
  }
}
