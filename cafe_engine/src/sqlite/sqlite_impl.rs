//! `SqliteDatabase` is the concrete backend of the cafe engine.
//!
//! It implements the storage traits defined in [`crate::traits`]. Each method that checks a guard and then writes
//! does both inside one transaction.
use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, menus, new_pool, order_items, orders, profiles, tables};
use crate::{
    db_types::{
        Menu,
        NewMenu,
        NewOrder,
        NewProfile,
        NewTable,
        Order,
        OrderCode,
        OrderItem,
        OrderItemDetail,
        OrderItemStatus,
        OrderRow,
        OrderStatusType,
        Profile,
        Role,
        Rupiah,
        Table,
        TableStatus,
    },
    pricing::{Cart, CartLine},
    traits::{
        AuthApiError,
        CatalogError,
        CatalogManagement,
        ExpiryResult,
        MenuQueryFilter,
        OrderFlowError,
        OrderManagement,
        OrderQueryFilter,
        OrderUpdate,
        Page,
        ProfileManagement,
    },
};

/// How many codes `create_order` tries before giving up on a clash with an existing order.
const ORDER_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_order(&self, order: NewOrder) -> Result<OrderUpdate, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let seat = match order.table_id {
            Some(table_id) => {
                let table = tables::fetch_table(table_id, &mut tx).await?.ok_or(OrderFlowError::TableNotFound(table_id))?;
                if table.status != TableStatus::Available {
                    return Err(OrderFlowError::TableNotAvailable(table.name));
                }
                Some(table.id)
            },
            None => None,
        };
        let status = order.status;
        let mut order = order;
        let mut attempt = 1;
        let order = loop {
            match orders::insert_order(order.clone(), &mut tx).await {
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() && attempt < ORDER_CODE_ATTEMPTS => {
                    warn!("🗃️ Order code {} is already taken. Generating a new one", order.order_id);
                    order = order.with_order_id(OrderCode::generate());
                    attempt += 1;
                },
                result => break result?,
            }
        };
        debug!("🗃️ Order [{}] inserted with id {}", order.order_id, order.id);
        let table = match seat {
            Some(id) => Some(tables::update_table_status(id, status.table_status(), &mut tx).await?),
            None => None,
        };
        tx.commit().await?;
        Ok(OrderUpdate::new(order, table))
    }

    async fn update_reservation(
        &self,
        order_id: &OrderCode,
        status: OrderStatusType,
    ) -> Result<OrderUpdate, OrderFlowError> {
        if !matches!(status, OrderStatusType::Process | OrderStatusType::Canceled) {
            return Err(OrderFlowError::IllegalStatusTransition(format!("A reservation cannot be changed to {status}")));
        }
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Reserved {
            return Err(OrderFlowError::IllegalStatusTransition(format!(
                "Order {order_id} is {}. Only reserved orders can be updated",
                order.status
            )));
        }
        let order = orders::update_order_status(order.id, status, &mut tx).await?;
        let table = match order.table_id {
            Some(id) => Some(tables::update_table_status(id, status.table_status(), &mut tx).await?),
            None => None,
        };
        tx.commit().await?;
        debug!("🗃️ Reservation {order_id} is now {status}");
        Ok(OrderUpdate::new(order, table))
    }

    async fn add_order_items(&self, order_id: &OrderCode, lines: &[CartLine]) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.status != OrderStatusType::Process {
            return Err(OrderFlowError::IllegalStatusTransition(format!(
                "Order {order_id} is {}. Items can only be added to orders in process",
                order.status
            )));
        }
        let mut cart = Cart::new();
        for line in lines {
            let menu = menus::fetch_menu(line.menu_id, &mut tx).await?.ok_or(OrderFlowError::MenuNotFound(line.menu_id))?;
            if !menu.is_available {
                return Err(OrderFlowError::MenuNotAvailable(menu.name));
            }
            cart.add_quantity(&menu, line.quantity, line.notes.clone())?;
        }
        let mut items = Vec::with_capacity(cart.entries().len());
        for entry in cart.entries() {
            items.push(order_items::insert_item(order.id, entry, &mut tx).await?);
        }
        tx.commit().await?;
        debug!("🗃️ {} items added to order {order_id}", items.len());
        Ok(items)
    }

    async fn update_item_status(
        &self,
        item_id: i64,
        status: OrderItemStatus,
    ) -> Result<(OrderItem, OrderCode), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let item = order_items::fetch_item(item_id, &mut tx).await?.ok_or(OrderFlowError::OrderItemNotFound(item_id))?;
        if !item.status.can_transition_to(status) {
            return Err(OrderFlowError::IllegalStatusTransition(format!(
                "Order item {item_id} cannot move from {} to {status}",
                item.status
            )));
        }
        let item = order_items::update_item_status(item_id, status, &mut tx).await?;
        let order = orders::fetch_order_by_id(item.order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::DatabaseError(format!("Order item {item_id} has no parent order")))?;
        tx.commit().await?;
        trace!("🗃️ Order item {item_id} of {} is now {status}", order.order_id);
        Ok((item, order.order_id))
    }

    async fn fetch_order(&self, order_id: &OrderCode) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_row(&self, order_id: &OrderCode) -> Result<Option<OrderRow>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let row = orders::fetch_order_row(order_id, &mut conn).await?;
        Ok(row)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItemDetail>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Page<OrderRow>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let page = orders::search_orders(&filter, &mut conn).await?;
        Ok(page)
    }

    async fn set_payment_token(&self, order_id: &OrderCode, token: &str) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        let order = orders::set_payment_token(order.id, token, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn settle_order(&self, order_id: &OrderCode) -> Result<OrderUpdate, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        match order.status {
            OrderStatusType::Settled => {
                debug!("🗃️ Order {order_id} is already settled");
                return Ok(OrderUpdate::unchanged(order));
            },
            OrderStatusType::Process => {},
            status => {
                return Err(OrderFlowError::IllegalStatusTransition(format!(
                    "Order {order_id} is {status} and cannot be settled"
                )))
            },
        }
        let order = orders::update_order_status(order.id, OrderStatusType::Settled, &mut tx).await?;
        let table = match order.table_id {
            Some(id) => Some(tables::update_table_status(id, TableStatus::Available, &mut tx).await?),
            None => None,
        };
        tx.commit().await?;
        info!("🗃️ Order {order_id} has been settled");
        Ok(OrderUpdate::new(order, table))
    }

    async fn expire_reservations(&self, older_than: Duration) -> Result<ExpiryResult, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let orders = orders::cancel_stale_reservations(older_than, &mut tx).await?;
        let mut tables = Vec::new();
        for table_id in orders.iter().filter_map(|o| o.table_id) {
            tables.push(tables::update_table_status(table_id, TableStatus::Available, &mut tx).await?);
        }
        tx.commit().await?;
        Ok(ExpiryResult { orders, tables })
    }

    async fn order_timestamps_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let timestamps = orders::order_timestamps_since(since, &mut conn).await?;
        Ok(timestamps)
    }

    async fn settled_order_subtotals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Rupiah>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let subtotals = orders::settled_order_subtotals(from, to, &mut conn).await?;
        Ok(subtotals)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_menu(&self, menu: NewMenu) -> Result<Menu, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let menu = menus::insert_menu(menu, &mut conn).await?;
        debug!("🗃️ Menu '{}' inserted with id {}", menu.name, menu.id);
        Ok(menu)
    }

    async fn update_menu(&self, id: i64, menu: NewMenu) -> Result<Menu, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        menus::update_menu(id, menu, &mut conn).await?.ok_or(CatalogError::MenuNotFound(id))
    }

    async fn delete_menu(&self, id: i64) -> Result<Menu, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let menu = menus::fetch_menu(id, &mut tx).await?.ok_or(CatalogError::MenuNotFound(id))?;
        if order_items::count_items_for_menu(id, &mut tx).await? > 0 {
            return Err(CatalogError::InUse(menu.name));
        }
        let menu = menus::delete_menu(id, &mut tx).await?.ok_or(CatalogError::MenuNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Menu #{id} deleted");
        Ok(menu)
    }

    async fn fetch_menu(&self, id: i64) -> Result<Option<Menu>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let menu = menus::fetch_menu(id, &mut conn).await?;
        Ok(menu)
    }

    async fn search_menus(&self, filter: MenuQueryFilter) -> Result<Page<Menu>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let page = menus::search_menus(&filter, &mut conn).await?;
        Ok(page)
    }

    async fn insert_table(&self, table: NewTable) -> Result<Table, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let table = tables::insert_table(table, &mut conn).await?;
        debug!("🗃️ Table '{}' inserted with id {}", table.name, table.id);
        Ok(table)
    }

    async fn update_table(&self, id: i64, table: NewTable) -> Result<Table, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        tables::update_table(id, table, &mut conn).await?.ok_or(CatalogError::TableNotFound(id))
    }

    async fn delete_table(&self, id: i64) -> Result<Table, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let table = tables::fetch_table(id, &mut tx).await?.ok_or(CatalogError::TableNotFound(id))?;
        if orders::count_orders_for_table(id, &mut tx).await? > 0 {
            return Err(CatalogError::InUse(table.name));
        }
        let table = tables::delete_table(id, &mut tx).await?.ok_or(CatalogError::TableNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Table #{id} deleted");
        Ok(table)
    }

    async fn fetch_table(&self, id: i64) -> Result<Option<Table>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let table = tables::fetch_table(id, &mut conn).await?;
        Ok(table)
    }

    async fn fetch_tables(&self, status: Option<TableStatus>) -> Result<Vec<Table>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let tables = tables::fetch_tables(status, &mut conn).await?;
        Ok(tables)
    }

    async fn update_table_position(&self, id: i64, x: i64, y: i64) -> Result<Table, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        tables::update_position(id, x, y, &mut conn).await?.ok_or(CatalogError::TableNotFound(id))
    }
}

impl ProfileManagement for SqliteDatabase {
    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::insert_profile(profile, &mut conn).await?;
        debug!("🗃️ Profile for {} ({}) created", profile.email, profile.role);
        Ok(profile)
    }

    async fn fetch_profile_by_email(&self, email: &str) -> Result<Option<Profile>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile_by_email(email, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_profile(&self, id: i64) -> Result<Option<Profile>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile(id, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_profiles(&self) -> Result<Vec<Profile>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let profiles = profiles::fetch_profiles(&mut conn).await?;
        Ok(profiles)
    }

    async fn count_profiles_with_role(&self, role: Role) -> Result<i64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = profiles::count_profiles_with_role(role, &mut conn).await?;
        Ok(count)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CAFE_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
