use thiserror::Error;

use crate::{
    db_types::{Menu, NewMenu, NewTable, Table, TableStatus},
    traits::data_objects::{MenuQueryFilter, Page},
    validation::FormErrors,
};

/// Menus and the floor plan.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn insert_menu(&self, menu: NewMenu) -> Result<Menu, CatalogError>;

    async fn update_menu(&self, id: i64, menu: NewMenu) -> Result<Menu, CatalogError>;

    /// Deletes the menu and returns the deleted record. Menus that have been ordered cannot be deleted.
    async fn delete_menu(&self, id: i64) -> Result<Menu, CatalogError>;

    async fn fetch_menu(&self, id: i64) -> Result<Option<Menu>, CatalogError>;

    /// Oldest menus first.
    async fn search_menus(&self, filter: MenuQueryFilter) -> Result<Page<Menu>, CatalogError>;

    async fn insert_table(&self, table: NewTable) -> Result<Table, CatalogError>;

    async fn update_table(&self, id: i64, table: NewTable) -> Result<Table, CatalogError>;

    /// Deletes the table and returns the deleted record. Tables that orders were seated at cannot be deleted.
    async fn delete_table(&self, id: i64) -> Result<Table, CatalogError>;

    async fn fetch_table(&self, id: i64) -> Result<Option<Table>, CatalogError>;

    /// Oldest tables first, optionally restricted to a single status.
    async fn fetch_tables(&self, status: Option<TableStatus>) -> Result<Vec<Table>, CatalogError>;

    async fn update_table_position(&self, id: i64, x: i64, y: i64) -> Result<Table, CatalogError>;
}

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Menu {0} does not exist")]
    MenuNotFound(i64),
    #[error("Table {0} does not exist")]
    TableNotFound(i64),
    #[error("{0} cannot be deleted because it is still referenced by orders")]
    InUse(String),
    #[error("{0}")]
    ValidationError(#[from] FormErrors),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}
