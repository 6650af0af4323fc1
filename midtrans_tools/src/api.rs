use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MidtransConfig,
    data_objects::{ErrorMessages, SnapToken, SnapTransaction, TransactionStatus},
    helpers::verify_signature,
    MidtransApiError,
};

/// A thin client for the Midtrans Snap and Core APIs.
#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MidtransApiError::ClientSetup(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    /// Sends an authenticated request. Midtrans uses HTTP basic auth with the server key as the user name and an
    /// empty password.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: String,
        body: Option<B>,
    ) -> Result<T, MidtransApiError> {
        trace!("💳️ Sending REST query: {url}");
        let mut req = self.client.request(method, url).basic_auth(self.config.server_key.reveal(), Some(""));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::Unreachable(e.to_string()))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| MidtransApiError::UnreadableResponse(e.to_string()))?;
        if status.is_success() {
            trace!("💳️ REST query successful. {status}");
            serde_json::from_str::<T>(&text).map_err(|e| MidtransApiError::UnreadableResponse(e.to_string()))
        } else {
            match serde_json::from_str::<ErrorMessages>(&text).map(ErrorMessages::into_messages) {
                Ok(messages) if !messages.is_empty() => Err(MidtransApiError::Rejected(messages)),
                _ => Err(MidtransApiError::HttpStatus { status: status.as_u16(), message: text }),
            }
        }
    }

    /// Opens a Snap transaction. The returned token is what the browser widget needs to take the payment.
    pub async fn create_transaction(&self, transaction: &SnapTransaction) -> Result<SnapToken, MidtransApiError> {
        let url = format!("{}/snap/v1/transactions", self.config.snap_url());
        let order_id = &transaction.transaction_details.order_id;
        debug!("💳️ Creating Snap transaction for {order_id}");
        let token = self.rest_query::<SnapToken, _>(Method::POST, url, Some(transaction)).await?;
        info!("💳️ Snap transaction created for {order_id}");
        Ok(token)
    }

    pub async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, MidtransApiError> {
        let url = format!("{}/v2/{order_id}/status", self.config.api_url());
        debug!("💳️ Fetching transaction status for {order_id}");
        let status = self.rest_query::<TransactionStatus, ()>(Method::GET, url, None).await?.check()?;
        debug!("💳️ Transaction {order_id} is {}", status.transaction_status.as_deref().unwrap_or("unknown"));
        Ok(status)
    }

    /// Checks a notification `signature_key` against our own server key.
    pub fn verify_notification(&self, signature_key: &str, order_id: &str, status_code: &str, gross_amount: &str) -> bool {
        verify_signature(signature_key, order_id, status_code, gross_amount, self.config.server_key.reveal())
    }
}
