use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    cafe_api::order_objects::OrderDetail,
    db_types::{OrderCode, OrderItem, OrderItemStatus, OrderRow, OrderStatusType},
    events::{ChangeKind, RealtimeEvent, RealtimeHub},
    pricing::CartLine,
    receipt::Receipt,
    traits::{ExpiryResult, OrderFlowError, OrderManagement, OrderQueryFilter, OrderUpdate, Page},
    validation::{validate_cart_lines, DineInOrderForm, TakeawayOrderForm},
};

/// `OrderFlowApi` drives an order from creation to settlement, and tells realtime subscribers about every change.
pub struct OrderFlowApi<B> {
    db: B,
    hub: RealtimeHub,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), hub: self.hub.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn hub(&self) -> &RealtimeHub {
        &self.hub
    }

    fn publish_order_update(&self, change: ChangeKind, update: &OrderUpdate) {
        self.hub.publish_event(RealtimeEvent::order(change, update.order.clone()));
        if let Some(table) = &update.table {
            self.hub.publish_event(RealtimeEvent::table(ChangeKind::Update, table.clone()));
        }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Seats a customer at a table, either as a reservation or straight into service.
    ///
    /// The table must be available. It becomes `reserved` or `unavailable` in the same transaction that stores the
    /// order.
    pub async fn create_dine_in_order(&self, form: DineInOrderForm) -> Result<OrderUpdate, OrderFlowError> {
        let order = form.validate()?;
        let update = self.db.create_order(order).await?;
        info!("🔄️ Dine-in order {} created for {}", update.order.order_id, update.order.customer_name);
        self.publish_order_update(ChangeKind::Insert, &update);
        Ok(update)
    }

    pub async fn create_takeaway_order(&self, form: TakeawayOrderForm) -> Result<OrderUpdate, OrderFlowError> {
        let order = form.validate()?;
        let update = self.db.create_order(order).await?;
        info!("🔄️ Takeaway order {} created for {}", update.order.order_id, update.order.customer_name);
        self.publish_order_update(ChangeKind::Insert, &update);
        Ok(update)
    }

    /// Confirms (`process`) or cancels a reservation.
    pub async fn update_reservation(
        &self,
        order_id: &OrderCode,
        status: OrderStatusType,
    ) -> Result<OrderUpdate, OrderFlowError> {
        let update = self.db.update_reservation(order_id, status).await?;
        debug!("🔄️ Reservation {order_id} changed to {status}");
        self.publish_order_update(ChangeKind::Update, &update);
        Ok(update)
    }

    pub async fn add_order_items(
        &self,
        order_id: &OrderCode,
        lines: &[CartLine],
    ) -> Result<Vec<OrderItem>, OrderFlowError> {
        validate_cart_lines(lines)?;
        let items = self.db.add_order_items(order_id, lines).await?;
        debug!("🔄️ {} lines added to order {order_id}", items.len());
        for item in &items {
            self.hub.publish_event(RealtimeEvent::order_item(ChangeKind::Insert, order_id.clone(), item.clone()));
        }
        Ok(items)
    }

    /// Moves an item one step along the kitchen pipeline. Anyone viewing the order is asked to refresh.
    pub async fn update_item_status(&self, item_id: i64, status: OrderItemStatus) -> Result<OrderItem, OrderFlowError> {
        let (item, order_id) = self.db.update_item_status(item_id, status).await?;
        debug!("🔄️ Item {item_id} of order {order_id} is now {status}");
        let channel = order_id.sync_channel();
        self.hub.publish_event(RealtimeEvent::order_item(ChangeKind::Update, order_id, item.clone()));
        self.hub.publish_event(RealtimeEvent::force_refresh(channel));
        Ok(item)
    }

    pub async fn order_list(&self, filter: OrderQueryFilter) -> Result<Page<OrderRow>, OrderFlowError> {
        self.db.search_orders(filter).await
    }

    /// Every order that is reserved or in process, newest first.
    pub async fn active_orders(&self) -> Result<Vec<OrderRow>, OrderFlowError> {
        let mut result = Vec::new();
        let mut page = 1;
        loop {
            let filter = OrderQueryFilter::default()
                .with_status(OrderStatusType::Process)
                .with_status(OrderStatusType::Reserved)
                .with_page(page, 100);
            let rows = self.db.search_orders(filter).await?;
            let total = rows.total;
            let fetched = rows.items.len();
            result.extend(rows.items);
            if fetched == 0 || result.len() as i64 >= total {
                break;
            }
            page += 1;
        }
        Ok(result)
    }

    pub async fn order_detail(&self, order_id: &OrderCode) -> Result<OrderDetail, OrderFlowError> {
        let order =
            self.db.fetch_order_row(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let items = self.db.fetch_order_items(order.order.id).await?;
        Ok(OrderDetail::new(order, items))
    }

    /// Marks the order as paid and frees its table. Settling twice is harmless.
    pub async fn settle_order(&self, order_id: &OrderCode) -> Result<OrderUpdate, OrderFlowError> {
        let update = self.db.settle_order(order_id).await?;
        if update.changed {
            info!("🔄️ Order {order_id} settled");
            self.publish_order_update(ChangeKind::Update, &update);
        }
        Ok(update)
    }

    pub async fn receipt(&self, order_id: &OrderCode) -> Result<Receipt, OrderFlowError> {
        let detail = self.order_detail(order_id).await?;
        if detail.order.order.status != OrderStatusType::Settled {
            return Err(OrderFlowError::IllegalStatusTransition(format!(
                "Order {order_id} has not been paid for yet"
            )));
        }
        let table = detail.order.table_label().to_string();
        let OrderDetail { order, items, .. } = detail;
        Ok(Receipt::new(order.order.order_id, table, order.order.customer_name, order.order.updated_at, &items))
    }

    /// Cancels reservations that nobody has touched for `older_than`, and frees their tables.
    pub async fn expire_stale_reservations(&self, older_than: Duration) -> Result<ExpiryResult, OrderFlowError> {
        let result = self.db.expire_reservations(older_than).await?;
        for order in &result.orders {
            info!("🔄️ Reservation {} for {} expired", order.order_id, order.customer_name);
            self.hub.publish_event(RealtimeEvent::order(ChangeKind::Update, order.clone()));
        }
        for table in &result.tables {
            self.hub.publish_event(RealtimeEvent::table(ChangeKind::Update, table.clone()));
        }
        Ok(result)
    }

    /// Asks every client listening on `channel` to reload.
    pub fn broadcast_refresh(&self, channel: &str) {
        trace!("🔄️ Broadcasting refresh on {channel}");
        self.hub.publish_event(RealtimeEvent::force_refresh(channel));
    }
}
