use tracing::warn;

use crate::catalog::seed::{seed_categories, seed_category};
use crate::catalog::{CatalogApi, Category, CategoryDraft, ImageUpload, UploadTarget};
use crate::error::{SyncError, SyncResult};
use crate::storage::LocalStore;

use super::{SyncStore, WriteOrigin};

// Categories have no overlay: reads fall back to the seed list and writes
// can only go to the server.
impl<A: CatalogApi, S: LocalStore> SyncStore<A, S> {
  pub async fn list_categories(&self) -> Vec<Category> {
    match self.api.list_categories().await {
      Ok(categories) => categories,
      Err(e) => {
        warn!(error = %e, "listing categories failed, serving seed list");
        seed_categories()
      }
    }
  }

  pub async fn get_category(&self, id: i64) -> SyncResult<Category> {
    match self.api.get_category(id).await {
      Ok(category) => Ok(category),
      Err(e) => {
        warn!(id, error = %e, "fetching category failed, checking seed list");
        seed_category(id).ok_or_else(|| SyncError::not_found("category", id))
      }
    }
  }

  pub async fn create_category(&self, draft: &CategoryDraft) -> SyncResult<Category> {
    draft.validate()?;

    self
      .api
      .create_category(draft)
      .await
      .map_err(|source| SyncError::Unavailable {
        operation: "create category",
        source,
      })
  }

  pub async fn update_category(&self, id: i64, draft: &CategoryDraft) -> SyncResult<Category> {
    draft.validate()?;

    self
      .api
      .update_category(id, draft)
      .await
      .map_err(|source| SyncError::Unavailable {
        operation: "update category",
        source,
      })
  }

  pub async fn delete_category(&self, id: i64) -> SyncResult<WriteOrigin> {
    self
      .api
      .delete_category(id)
      .await
      .map(|()| WriteOrigin::Remote)
      .map_err(|source| SyncError::Unavailable {
        operation: "delete category",
        source,
      })
  }

  pub async fn upload_category_image(&self, upload: &ImageUpload) -> SyncResult<String> {
    upload.validate()?;

    self
      .api
      .upload_image(UploadTarget::Category, upload)
      .await
      .map_err(|source| SyncError::Unavailable {
        operation: "category image upload",
        source,
      })
  }
}
