//! Management of the menu and the floor plan. Every write is announced to realtime subscribers.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Menu, Table, TableStatus},
    events::{ChangeKind, RealtimeEvent, RealtimeHub},
    traits::{CatalogError, CatalogManagement, MenuQueryFilter, Page},
    validation::{round_coordinate, MenuForm, TableForm},
};

pub struct MenuApi<B> {
    db: B,
    hub: RealtimeHub,
}

impl<B> Debug for MenuApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MenuApi")
    }
}

impl<B> MenuApi<B> {
    pub fn new(db: B, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }
}

impl<B> MenuApi<B>
where B: CatalogManagement
{
    pub async fn create_menu(&self, form: MenuForm) -> Result<Menu, CatalogError> {
        let menu = self.db.insert_menu(form.validate()?).await?;
        info!("🔄️ Menu '{}' created", menu.name);
        self.hub.publish_event(RealtimeEvent::menu(ChangeKind::Insert, menu.clone()));
        Ok(menu)
    }

    pub async fn update_menu(&self, id: i64, form: MenuForm) -> Result<Menu, CatalogError> {
        let menu = self.db.update_menu(id, form.validate()?).await?;
        debug!("🔄️ Menu #{id} updated");
        self.hub.publish_event(RealtimeEvent::menu(ChangeKind::Update, menu.clone()));
        Ok(menu)
    }

    pub async fn delete_menu(&self, id: i64) -> Result<Menu, CatalogError> {
        let menu = self.db.delete_menu(id).await?;
        info!("🔄️ Menu '{}' deleted", menu.name);
        self.hub.publish_event(RealtimeEvent::menu(ChangeKind::Delete, menu.clone()));
        Ok(menu)
    }

    pub async fn fetch_menu(&self, id: i64) -> Result<Menu, CatalogError> {
        self.db.fetch_menu(id).await?.ok_or(CatalogError::MenuNotFound(id))
    }

    pub async fn menu_list(&self, filter: MenuQueryFilter) -> Result<Page<Menu>, CatalogError> {
        self.db.search_menus(filter).await
    }
}

pub struct TableApi<B> {
    db: B,
    hub: RealtimeHub,
}

impl<B> Debug for TableApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TableApi")
    }
}

impl<B> TableApi<B> {
    pub fn new(db: B, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }
}

impl<B> TableApi<B>
where B: CatalogManagement
{
    pub async fn create_table(&self, form: TableForm) -> Result<Table, CatalogError> {
        let table = self.db.insert_table(form.validate()?).await?;
        info!("🔄️ Table '{}' created", table.name);
        self.hub.publish_event(RealtimeEvent::table(ChangeKind::Insert, table.clone()));
        Ok(table)
    }

    pub async fn update_table(&self, id: i64, form: TableForm) -> Result<Table, CatalogError> {
        let table = self.db.update_table(id, form.validate()?).await?;
        debug!("🔄️ Table #{id} updated");
        self.hub.publish_event(RealtimeEvent::table(ChangeKind::Update, table.clone()));
        Ok(table)
    }

    pub async fn delete_table(&self, id: i64) -> Result<Table, CatalogError> {
        let table = self.db.delete_table(id).await?;
        info!("🔄️ Table '{}' deleted", table.name);
        self.hub.publish_event(RealtimeEvent::table(ChangeKind::Delete, table.clone()));
        Ok(table)
    }

    pub async fn fetch_table(&self, id: i64) -> Result<Table, CatalogError> {
        self.db.fetch_table(id).await?.ok_or(CatalogError::TableNotFound(id))
    }

    pub async fn table_list(&self, status: Option<TableStatus>) -> Result<Vec<Table>, CatalogError> {
        self.db.fetch_tables(status).await
    }

    /// Moves the table on the floor plan. Coordinates are rounded to whole pixels.
    pub async fn update_position(&self, id: i64, x: f64, y: f64) -> Result<Table, CatalogError> {
        let table = self.db.update_table_position(id, round_coordinate(x), round_coordinate(y)).await?;
        trace!("🔄️ Table #{id} moved to ({}, {})", table.position_x, table.position_y);
        self.hub.publish_event(RealtimeEvent::table(ChangeKind::Update, table.clone()));
        Ok(table)
    }
}
