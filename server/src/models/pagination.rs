use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=&limit=` as sent by clients.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
}

impl PageQuery {
  pub fn resolve(&self, default_limit: u32) -> Result<PageRequest> {
    let page = self.page.unwrap_or(1);
    let limit = self.limit.unwrap_or(default_limit);
    if page < 1 {
      return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
      return Err(AppError::Validation(format!(
        "limit must be between 1 and {}",
        MAX_PAGE_SIZE
      )));
    }
    Ok(PageRequest { page, limit })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub limit: u32,
}

impl PageRequest {
  pub fn offset(&self) -> i64 {
    i64::from(self.page - 1) * i64::from(self.limit)
  }

  pub fn limit_i64(&self) -> i64 {
    i64::from(self.limit)
  }

  /// Slices an already filtered and ordered list.
  pub fn slice<T: Clone>(&self, all: &[T]) -> Page<T> {
    let start = (self.offset() as usize).min(all.len());
    let end = (start + self.limit as usize).min(all.len());
    Page {
      items: all[start..end].to_vec(),
      total: all.len() as i64,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: i64,
}

impl<T> Page<T> {
  pub fn pagination(&self, request: PageRequest) -> Pagination {
    let limit = i64::from(request.limit);
    Pagination {
      page: request.page,
      limit: request.limit,
      total: self.total,
      pages: (self.total + limit - 1) / limit,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
  pub page: u32,
  pub limit: u32,
  pub total: i64,
  pub pages: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_and_bounds() {
    let req = PageQuery::default().resolve(12).unwrap();
    assert_eq!(req, PageRequest { page: 1, limit: 12 });

    let zero_page = PageQuery {
      page: Some(0),
      limit: None,
    };
    assert!(zero_page.resolve(10).is_err());

    let huge = PageQuery {
      page: None,
      limit: Some(101),
    };
    assert!(huge.resolve(10).is_err());
  }

  #[test]
  fn pages_round_up() {
    let req = PageRequest { page: 2, limit: 10 };
    let page = req.slice(&(0..25).collect::<Vec<_>>());
    assert_eq!(page.items, (10..20).collect::<Vec<_>>());
    assert_eq!(page.pagination(req).pages, 3);

    let empty: Page<i32> = Page { items: vec![], total: 0 };
    assert_eq!(empty.pagination(req).pages, 0);
  }
}
