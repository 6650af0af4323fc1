mod api;
mod config;
mod error;

mod data_objects;
pub mod helpers;

pub use api::MidtransApi;
pub use config::MidtransConfig;
pub use data_objects::{CustomerDetails, ErrorMessages, SnapToken, SnapTransaction, TransactionDetails, TransactionStatus, VaNumber};
pub use error::MidtransApiError;
