//! Midtrans as the engine's [`PaymentGateway`].
use cafe_engine::{
    db_types::OrderCode,
    traits::{GatewayStatus, PaymentError, PaymentGateway, PaymentNotification, PaymentRequest, VaNumber},
};
use log::*;
use midtrans_tools::{MidtransApi, MidtransApiError, MidtransConfig, SnapTransaction, TransactionStatus};

#[derive(Clone)]
pub struct MidtransGateway {
    api: MidtransApi,
    verify_signature: bool,
}

impl MidtransGateway {
    pub fn new(config: MidtransConfig, verify_signature: bool) -> Result<Self, MidtransApiError> {
        let api = MidtransApi::new(config)?;
        Ok(Self { api, verify_signature })
    }

    pub fn config(&self) -> &MidtransConfig {
        self.api.config()
    }
}

fn gateway_error(e: MidtransApiError) -> PaymentError {
    match e {
        MidtransApiError::Rejected(messages) => PaymentError::Rejected(messages),
        e => PaymentError::GatewayError(e.to_string()),
    }
}

fn into_gateway_status(status: TransactionStatus) -> GatewayStatus {
    GatewayStatus {
        va_numbers: status.va_numbers.into_iter().map(|v| VaNumber { bank: v.bank, va_number: v.va_number }).collect(),
        payment_code: status.payment_code,
        transaction_status: status.transaction_status,
        fraud_status: status.fraud_status,
    }
}

impl PaymentGateway for MidtransGateway {
    async fn create_transaction(&self, request: &PaymentRequest) -> Result<String, PaymentError> {
        let transaction = SnapTransaction::new(
            request.order_id.as_str(),
            request.gross_amount.value(),
            request.customer_name.as_str(),
        );
        let token = self.api.create_transaction(&transaction).await.map_err(gateway_error)?;
        Ok(token.token)
    }

    async fn transaction_status(&self, order_id: &OrderCode) -> Result<GatewayStatus, PaymentError> {
        let status = self.api.transaction_status(order_id.as_str()).await.map_err(gateway_error)?;
        Ok(into_gateway_status(status))
    }

    fn verify_notification(&self, notification: &PaymentNotification) -> bool {
        if !self.verify_signature {
            warn!("💳️ Accepting notification for {} without checking its signature", notification.order_id);
            return true;
        }
        self.api.verify_notification(
            &notification.signature_key,
            &notification.order_id,
            &notification.status_code,
            &notification.gross_amount,
        )
    }
}
