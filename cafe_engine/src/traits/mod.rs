//! # Backend contracts
//!
//! This module defines the interfaces that a storage backend must provide for the cafe engine, plus the contract for
//! the external payment gateway.
//!
//! * [`OrderManagement`] covers the order lifecycle: creating orders, seating them at tables, adding items, moving
//!   items through the kitchen and settling the bill. Every status change that touches a table happens in the same
//!   atomic transaction as the order change.
//! * [`CatalogManagement`] manages menus and the tables on the floor plan.
//! * [`ProfileManagement`] stores staff profiles and their roles.
//! * [`PaymentGateway`] is implemented by the HTTP client of the payment provider rather than the database.
mod catalog_management;
mod data_objects;
mod order_management;
mod payment_gateway;
mod profile_management;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{ExpiryResult, MenuQueryFilter, OrderQueryFilter, OrderUpdate, Page, DEFAULT_PAGE_SIZE};
pub use order_management::{OrderFlowError, OrderManagement};
pub use payment_gateway::{GatewayStatus, PaymentError, PaymentGateway, PaymentNotification, PaymentRequest, VaNumber};
pub use profile_management::{AuthApiError, ProfileManagement};
