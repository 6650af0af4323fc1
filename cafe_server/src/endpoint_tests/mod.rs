mod auth;
mod catalog;
mod helpers;
mod payment;
