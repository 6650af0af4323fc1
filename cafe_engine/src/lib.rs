//! STAR Cafe engine
//!
//! The engine holds the business rules of the cafe's point-of-sale system: orders and their kitchen pipeline, the
//! menu and the floor plan, staff accounts, and the bridge to the payment gateway. It knows nothing about HTTP.
//!
//! The library is divided into three sections:
//! 1. Storage contracts ([`mod@traits`]) and their SQLite implementation ([`SqliteDatabase`]). Callers should not
//!    need to touch the database directly; the data types stored in it are defined in [`db_types`].
//! 2. The public API objects ([`OrderFlowApi`], [`MenuApi`], [`TableApi`], [`AuthApi`], [`PaymentApi`] and
//!    [`DashboardApi`]). These validate input, enforce the order state machine and publish change events.
//! 3. Realtime events ([`mod@events`]). Every change made through the API is published on a [`events::RealtimeHub`],
//!    which the server streams to dashboards.
mod cafe_api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod pricing;
pub mod receipt;
pub mod traits;
pub mod validation;

pub use cafe_api::{
    auth_api::{hash_password, verify_password, AuthApi},
    catalog_api::{MenuApi, TableApi},
    dashboard_api::{DailyCount, DashboardApi, RevenueSummary},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::{PaymentApi, PaymentStatus, PaymentToken, PAYMENT_CODE_BANK},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::DEFAULT_DATABASE_URL, SqliteDatabase};
pub use traits::{
    AuthApiError,
    CatalogError,
    CatalogManagement,
    OrderFlowError,
    OrderManagement,
    PaymentError,
    PaymentGateway,
    ProfileManagement,
};
