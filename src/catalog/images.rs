//! Image upload input and validation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{SyncError, SyncResult};

/// Largest accepted upload (5 MiB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_TYPES: &[&str] = &[
  "image/jpeg",
  "image/jpg",
  "image/png",
  "image/gif",
  "image/webp",
];

/// An image file to upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl ImageUpload {
  /// Build an upload from a file name, guessing the content type from its
  /// extension.
  pub fn from_file(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
    let file_name = file_name.into();
    let content_type = content_type_for(&file_name).to_string();
    Self {
      file_name,
      content_type,
      bytes,
    }
  }

  pub fn validate(&self) -> SyncResult<()> {
    if !ACCEPTED_TYPES.contains(&self.content_type.as_str()) {
      return Err(SyncError::Image(format!(
        "unsupported type {}; use JPG, PNG, GIF or WebP",
        self.content_type
      )));
    }

    if self.bytes.len() > MAX_IMAGE_BYTES {
      return Err(SyncError::Image(format!(
        "{} bytes exceeds the 5 MB limit",
        self.bytes.len()
      )));
    }

    Ok(())
  }

  /// Inline `data:` URL for the image, used when the upload endpoint is
  /// unreachable.
  pub fn to_data_url(&self) -> String {
    format!(
      "data:{};base64,{}",
      self.content_type,
      STANDARD.encode(&self.bytes)
    )
  }
}

fn content_type_for(file_name: &str) -> &'static str {
  let ext = file_name
    .rsplit_once('.')
    .map(|(_, ext)| ext.to_ascii_lowercase())
    .unwrap_or_default();

  match ext.as_str() {
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => "application/octet-stream",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_content_type_from_extension() {
    assert_eq!(ImageUpload::from_file("a.JPG", vec![]).content_type, "image/jpeg");
    assert_eq!(ImageUpload::from_file("b.webp", vec![]).content_type, "image/webp");
    assert_eq!(
      ImageUpload::from_file("notes.txt", vec![]).content_type,
      "application/octet-stream"
    );
  }

  #[test]
  fn test_validate_type_and_size() {
    assert!(ImageUpload::from_file("a.png", vec![0; 16]).validate().is_ok());
    assert!(matches!(
      ImageUpload::from_file("a.bmp", vec![0; 16]).validate(),
      Err(SyncError::Image(_))
    ));
    assert!(matches!(
      ImageUpload::from_file("a.png", vec![0; MAX_IMAGE_BYTES + 1]).validate(),
      Err(SyncError::Image(_))
    ));
  }

  #[test]
  fn test_data_url() {
    let upload = ImageUpload::from_file("a.gif", b"GIF".to_vec());
    assert_eq!(upload.to_data_url(), "data:image/gif;base64,R0lG");
  }
}
