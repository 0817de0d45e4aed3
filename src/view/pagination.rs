/// Products per page in the shop listing
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// One page of a list. `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: usize,
  pub total_pages: usize,
  pub total_items: usize,
}

impl<T> Page<T> {
  pub fn has_next(&self) -> bool {
    self.page < self.total_pages
  }

  pub fn has_prev(&self) -> bool {
    self.page > 1
  }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
  total_items.div_ceil(page_size.max(1))
}

/// Clamp a requested page into `1..=total_pages` (page 1 when empty).
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
  page.clamp(1, total_pages.max(1))
}

pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
  let page_size = page_size.max(1);
  let total_items = items.len();
  let total_pages = total_pages(total_items, page_size);
  let page = clamp_page(page, total_pages);

  let start = ((page - 1) * page_size).min(total_items);
  let end = (start + page_size).min(total_items);

  Page {
    items: items[start..end].to_vec(),
    page,
    total_pages,
    total_items,
  }
}
