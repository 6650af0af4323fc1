//! # STAR Cafe server
//! This crate hosts the HTTP front end of the cafe's point-of-sale system. It is responsible for:
//! * Authenticating staff and issuing session tokens.
//! * Exposing the order, menu, table, dashboard and payment operations of [`cafe_engine`] as a JSON API.
//! * Streaming realtime change events to dashboards over server-sent events.
//! * Receiving payment notifications from Midtrans.
//! * Cancelling reservations that were never honoured.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/auth`: Log in with an email and password, or refresh an existing session token.
//! * `/payment/notification`: The Midtrans notification webhook.
//! * `/api/...`: Everything else. A valid session token is required. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
