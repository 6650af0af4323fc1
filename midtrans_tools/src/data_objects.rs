use serde::{Deserialize, Serialize};

use crate::MidtransApiError;

//--------------------------------------   Snap transactions   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub order_id: String,
    /// Whole Rupiah. IDR transactions may not carry decimals.
    pub gross_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTransaction {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
}

impl SnapTransaction {
    pub fn new<S: Into<String>>(order_id: S, gross_amount: i64, customer_name: S) -> Self {
        Self {
            transaction_details: TransactionDetails { order_id: order_id.into(), gross_amount },
            customer_details: CustomerDetails { first_name: customer_name.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapToken {
    pub token: String,
    pub redirect_url: String,
}

/// Midtrans reports request failures as a list of human readable messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorMessages {
    #[serde(default)]
    pub error_messages: Vec<String>,
    pub status_message: Option<String>,
}

impl ErrorMessages {
    pub fn into_messages(self) -> Vec<String> {
        match (self.error_messages.is_empty(), self.status_message) {
            (false, _) => self.error_messages,
            (true, Some(msg)) => vec![msg],
            (true, None) => vec![],
        }
    }
}

//--------------------------------------  Transaction status   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaNumber {
    pub bank: String,
    pub va_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub status_code: Option<String>,
    pub status_message: Option<String>,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub va_numbers: Vec<VaNumber>,
    pub payment_code: Option<String>,
}

impl TransactionStatus {
    /// The status API answers with HTTP 200 even for unknown transactions; the real outcome is in `status_code`.
    pub fn check(self) -> Result<Self, MidtransApiError> {
        let code = self.status_code.as_deref().and_then(|c| c.parse::<u16>().ok()).unwrap_or(200);
        if (200..300).contains(&code) {
            Ok(self)
        } else {
            let message = self.status_message.unwrap_or_else(|| "Unknown error".to_string());
            Err(MidtransApiError::HttpStatus { status: code, message })
        }
    }
}
