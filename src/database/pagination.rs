use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAGE_SIZE;

use super::error::{NotFoundError, TypeError};

/// `?page=N&limit=M`, pages counted from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, TypeError> {
        if page < 1 {
            return Err(TypeError::new("Invalid page"));
        }
        if limit < 1 {
            return Err(TypeError::new("Invalid limit"));
        }
        let limit = limit.min(MAX_PAGE_SIZE);

        // OFFSET has to fit in a BIGINT.
        if (page - 1).checked_mul(limit).is_none() {
            return Err(TypeError::new("Invalid page"));
        }

        Ok(Self { page, limit })
    }

    pub fn first(limit: i64) -> Self {
        Self {
            page: 1,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `total_rows` is the window count of the fetched rows. An empty page
    /// past the first one is out of range, since nothing is left to count.
    pub fn from_rows(
        results: Vec<T>,
        total_rows: i64,
        request: &PageRequest,
    ) -> Result<Self, NotFoundError> {
        if results.is_empty() && request.page > 1 {
            return Err(NotFoundError::new("Invalid page"));
        }

        let next = if request.offset().saturating_add(request.limit) < total_rows {
            Some(request.page + 1)
        } else {
            None
        };
        let previous = if request.page > 1 {
            Some(request.page - 1)
        } else {
            None
        };

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results,
        })
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
