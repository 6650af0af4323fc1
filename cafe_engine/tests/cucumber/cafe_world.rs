use std::collections::HashMap;

use cafe_engine::{
    db_types::{Menu, OrderCode, Table},
    events::RealtimeHub,
    MenuApi,
    OrderFlowApi,
    SqliteDatabase,
    TableApi,
};
use cucumber::World;
use log::*;

#[path = "../support/prepare_env.rs"]
mod prepare_env;

#[derive(Default, Debug, World)]
pub struct CafeWorld {
    pub system: Option<CafeSystem>,
    /// The order the scenario is working on
    pub current_order: Option<OrderCode>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct CafeSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub menus: MenuApi<SqliteDatabase>,
    pub tables: TableApi<SqliteDatabase>,
    pub menu_ids: HashMap<String, Menu>,
    pub table_ids: HashMap<String, Table>,
}

impl CafeWorld {
    pub fn system(&self) -> &CafeSystem {
        self.system.as_ref().expect("Cafe system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut CafeSystem {
        self.system.as_mut().expect("Cafe system not initialised")
    }

    pub fn orders(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system().orders
    }

    pub fn current_order(&self) -> &OrderCode {
        self.current_order.as_ref().expect("No order has been created in this scenario")
    }

    pub fn menu(&self, name: &str) -> &Menu {
        self.system().menu_ids.get(name).unwrap_or_else(|| panic!("Menu {name} has not been created"))
    }

    pub fn table(&self, name: &str) -> &Table {
        self.system().table_ids.get(name).unwrap_or_else(|| panic!("Table {name} has not been created"))
    }
}

impl CafeSystem {
    pub async fn new() -> Self {
        let url = prepare_env::prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let hub = RealtimeHub::default();
        let orders = OrderFlowApi::new(db.clone(), hub.clone());
        let menus = MenuApi::new(db.clone(), hub.clone());
        let tables = TableApi::new(db.clone(), hub);
        Self { db_path: url, db, orders, menus, tables, menu_ids: HashMap::new(), table_ids: HashMap::new() }
    }

    /// Drops the scenario database, unless the scenario failed and it should be kept for inspection.
    pub async fn teardown(&self, keep_database: bool) {
        if keep_database {
            error!("🚀️ Scenario failed. Database kept at {}", self.db_path);
            return;
        }
        self.db.close().await;
        prepare_env::drop_database(&self.db_path).await;
        debug!("🚀️ Removed scenario database {}", self.db_path);
    }
}
