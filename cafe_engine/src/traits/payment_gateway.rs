use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{OrderCode, Rupiah},
    traits::OrderFlowError,
};

/// What the engine asks of the payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// Opens a transaction for the order and returns the token the payment widget is opened with.
    async fn create_transaction(&self, request: &PaymentRequest) -> Result<String, PaymentError>;

    async fn transaction_status(&self, order_id: &OrderCode) -> Result<GatewayStatus, PaymentError>;

    /// Checks that a payment notification really came from the provider.
    fn verify_notification(&self, notification: &PaymentNotification) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_id: OrderCode,
    pub gross_amount: Rupiah,
    pub customer_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaNumber {
    pub bank: String,
    pub va_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStatus {
    #[serde(default)]
    pub va_numbers: Vec<VaNumber>,
    pub payment_code: Option<String>,
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<String>,
}

impl GatewayStatus {
    pub fn is_paid(&self) -> bool {
        is_paid(self.transaction_status.as_deref().unwrap_or_default(), self.fraud_status.as_deref())
    }
}

/// Money has been received once a transaction settles, or once a card capture passes the fraud check.
fn is_paid(transaction_status: &str, fraud_status: Option<&str>) -> bool {
    match transaction_status {
        "settlement" => true,
        "capture" => fraud_status == Some("accept"),
        _ => false,
    }
}

/// The body of the provider's HTTP notification callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    #[serde(default)]
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: String,
    #[serde(default)]
    pub signature_key: String,
    pub transaction_status: String,
    pub fraud_status: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_type: Option<String>,
}

impl PaymentNotification {
    /// Whether the notification reports money that has actually been received.
    pub fn is_paid(&self) -> bool {
        is_paid(&self.transaction_status, self.fraud_status.as_deref())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Could not reach the payment gateway. {0}")]
    GatewayError(String),
    #[error("The payment gateway rejected the request. {}", .0.join("; "))]
    Rejected(Vec<String>),
    #[error("The payment notification signature is invalid")]
    InvalidSignature,
    #[error("{0}")]
    NotPayable(String),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
}
