use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    db_types::{
        NewOrder,
        Order,
        OrderCode,
        OrderItem,
        OrderItemDetail,
        OrderItemStatus,
        OrderRow,
        OrderStatusType,
        Rupiah,
    },
    pricing::{CartLine, PriceOverflow},
    traits::data_objects::{ExpiryResult, OrderQueryFilter, OrderUpdate, Page},
    validation::FormErrors,
};

/// Storage for the order lifecycle.
///
/// Implementations enforce the state machine: guards are checked inside the same transaction as the write, so two
/// requests racing on the same order cannot both succeed with an illegal transition.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: Clone {
    /// Inserts a new order. If the order has a table, the table must be `available`, and it takes on
    /// [`OrderStatusType::table_status`] of the new order. Both writes happen atomically.
    async fn create_order(&self, order: NewOrder) -> Result<OrderUpdate, OrderFlowError>;

    /// Moves a `reserved` order to `process` (the customer sat down) or `canceled`. The table follows.
    async fn update_reservation(
        &self,
        order_id: &OrderCode,
        status: OrderStatusType,
    ) -> Result<OrderUpdate, OrderFlowError>;

    /// Adds lines to an order that is in `process`. Nominals are priced from the current menu at the time of the
    /// call. Lines for the same menu are merged.
    async fn add_order_items(&self, order_id: &OrderCode, lines: &[CartLine]) -> Result<Vec<OrderItem>, OrderFlowError>;

    /// Advances a single item to `status`, which must be the next status in the kitchen pipeline.
    ///
    /// Returns the updated item and the code of the order it belongs to.
    async fn update_item_status(
        &self,
        item_id: i64,
        status: OrderItemStatus,
    ) -> Result<(OrderItem, OrderCode), OrderFlowError>;

    async fn fetch_order(&self, order_id: &OrderCode) -> Result<Option<Order>, OrderFlowError>;

    /// Fetches the order along with the name of its table.
    async fn fetch_order_row(&self, order_id: &OrderCode) -> Result<Option<OrderRow>, OrderFlowError>;

    /// Items for the order (internal id), joined with their menus and sorted by kitchen status, then id.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, OrderFlowError>;

    /// Newest orders first.
    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Page<OrderRow>, OrderFlowError>;

    async fn set_payment_token(&self, order_id: &OrderCode, token: &str) -> Result<Order, OrderFlowError>;

    /// Marks an order in `process` as `settled` and frees its table. Settling an already settled order is a no-op.
    async fn settle_order(&self, order_id: &OrderCode) -> Result<OrderUpdate, OrderFlowError>;

    /// Cancels reservations that have not been touched for longer than `older_than`, and frees their tables.
    async fn expire_reservations(&self, older_than: Duration) -> Result<ExpiryResult, OrderFlowError>;

    /// Creation times of every order created at or after `since`.
    async fn order_timestamps_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, OrderFlowError>;

    /// The item subtotal of each order settled in `[from, to)`.
    async fn settled_order_subtotals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Rupiah>, OrderFlowError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderCode),
    #[error("Order item {0} does not exist")]
    OrderItemNotFound(i64),
    #[error("Table {0} does not exist")]
    TableNotFound(i64),
    #[error("Menu {0} does not exist")]
    MenuNotFound(i64),
    #[error("{0} is not available")]
    MenuNotAvailable(String),
    #[error("Table {0} is not available")]
    TableNotAvailable(String),
    #[error("{0}")]
    IllegalStatusTransition(String),
    #[error("{0}")]
    ValidationError(#[from] FormErrors),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<PriceOverflow> for OrderFlowError {
    fn from(e: PriceOverflow) -> Self {
        let mut errors = FormErrors::new();
        errors.add("quantity", e);
        OrderFlowError::ValidationError(errors)
    }
}
