use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Table};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;
/// Keeps `(page - 1) * limit` well inside i64.
const MAX_PAGE: i64 = 1_000_000;

fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).clamp(1, MAX_PAGE)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Criteria for the paginated order list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    /// Matches the order code or the customer name, ignoring case.
    pub search: Option<String>,
    #[serde(default)]
    pub statuses: Vec<OrderStatusType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    /// The search term, if it is not blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn page(&self) -> i64 {
        clamp_page(self.page)
    }

    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuQueryFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub available_only: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl MenuQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn available_only(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn page(&self) -> i64 {
        clamp_page(self.page)
    }

    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of a listing, along with the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self { items, total, page, limit }
    }

    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(), total: self.total, page: self.page, limit: self.limit }
    }
}

/// The result of an order status change. `table` is set when the change also moved the order's table to a new
/// status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order: Order,
    pub table: Option<Table>,
    /// False when the order was already in the requested state and nothing was written.
    pub changed: bool,
}

impl OrderUpdate {
    pub fn new(order: Order, table: Option<Table>) -> Self {
        Self { order, table, changed: true }
    }

    pub fn unchanged(order: Order) -> Self {
        Self { order, table: None, changed: false }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpiryResult {
    pub orders: Vec<Order>,
    pub tables: Vec<Table>,
}

impl ExpiryResult {
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
