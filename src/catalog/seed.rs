//! Categories served when the API cannot be reached.
//!
//! Categories are not authored offline, so the fallback is a fixed list
//! rather than an overlay.

use super::types::Category;

const SEED: &[(i64, &str, &str, &str)] = &[
  (
    1,
    "Shoes",
    "Professional handball shoes for all levels",
    "https://images.unsplash.com/photo-1549298916-b41d501d3772?w=400&h=300&fit=crop",
  ),
  (
    2,
    "Clothing",
    "Handball clothing and accessories",
    "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400&h=300&fit=crop",
  ),
  (
    3,
    "Handballs",
    "Professional handballs for training and matches",
    "https://images.unsplash.com/photo-1600185365483-26d7a4cc7519?w=400&h=300&fit=crop",
  ),
  (
    4,
    "Gear",
    "Protective gear and accessories",
    "https://images.unsplash.com/photo-1608231387042-66d1773070a5?w=400&h=300&fit=crop",
  ),
];

pub fn seed_categories() -> Vec<Category> {
  SEED
    .iter()
    .map(|(id, name, description, image)| Category {
      id: *id,
      name: name.to_string(),
      description: description.to_string(),
      image: image.to_string(),
    })
    .collect()
}

pub fn seed_category(id: i64) -> Option<Category> {
  seed_categories().into_iter().find(|c| c.id == id)
}
