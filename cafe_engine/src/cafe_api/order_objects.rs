use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderItemDetail, OrderItemStatus, OrderRow, OrderStatusType},
    pricing::OrderSummary,
};

/// Everything the order page shows: the order, its items and the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: OrderRow,
    pub items: Vec<OrderItemDetail>,
    pub summary: OrderSummary,
}

impl OrderDetail {
    pub fn new(order: OrderRow, items: Vec<OrderItemDetail>) -> Self {
        let summary = OrderSummary::from_nominals(items.iter().map(|i| i.item.nominal));
        Self { order, items, summary }
    }

    pub fn all_items_served(&self) -> bool {
        self.items.iter().all(|i| i.item.status == OrderItemStatus::Served)
    }

    /// An order can be paid for once it is in process, has at least one item, and every item has been served.
    pub fn is_payable(&self) -> bool {
        self.order.order.status == OrderStatusType::Process && !self.items.is_empty() && self.all_items_served()
    }

    /// Why the order cannot be paid for yet, if it cannot.
    pub fn payment_blocker(&self) -> Option<String> {
        let code = &self.order.order.order_id;
        if self.order.order.status != OrderStatusType::Process {
            Some(format!("Order {code} is {} and cannot be paid for", self.order.order.status))
        } else if self.items.is_empty() {
            Some(format!("Order {code} has no items"))
        } else if !self.all_items_served() {
            Some("Every item must be served before payment".to_string())
        } else {
            None
        }
    }
}
