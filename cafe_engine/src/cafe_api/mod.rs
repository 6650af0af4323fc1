pub mod auth_api;
pub mod catalog_api;
pub mod dashboard_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_api;
