//! The bridge between orders and the payment gateway.
//!
//! Payment tokens are requested from the gateway once an order is fully served. Completion is reported back either by
//! the gateway's notification webhook or by the payment widget's success callback. The widget callback comes from the
//! browser, so the order is only settled once the gateway itself confirms the payment.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    cafe_api::order_flow_api::OrderFlowApi,
    db_types::{OrderCode, OrderStatusType, Rupiah},
    traits::{OrderManagement, OrderUpdate, PaymentError, PaymentGateway, PaymentNotification, PaymentRequest},
};

/// Label shown when the customer pays with a retail payment code instead of a bank virtual account.
pub const PAYMENT_CODE_BANK: &str = "Payment Code";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
    pub order_id: OrderCode,
    pub token: String,
    pub gross_amount: Rupiah,
    /// False when an existing token was handed back.
    pub created: bool,
}

/// How the customer is paying. Every field is `None` when the gateway could not be reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    pub va_number: Option<String>,
    pub bank: Option<String>,
    pub status: Option<String>,
}

impl From<crate::traits::GatewayStatus> for PaymentStatus {
    fn from(status: crate::traits::GatewayStatus) -> Self {
        let first = status.va_numbers.into_iter().next();
        let (va_number, bank) = match first {
            Some(va) => (Some(va.va_number), Some(va.bank)),
            None => (status.payment_code, Some(PAYMENT_CODE_BANK.to_string())),
        };
        Self { va_number, bank, status: status.transaction_status }
    }
}

pub struct PaymentApi<B, G> {
    orders: OrderFlowApi<B>,
    gateway: G,
}

impl<B, G> Debug for PaymentApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi")
    }
}

impl<B, G> PaymentApi<B, G> {
    pub fn new(orders: OrderFlowApi<B>, gateway: G) -> Self {
        Self { orders, gateway }
    }
}

impl<B, G> PaymentApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Returns the gateway token for the order, opening a new transaction if the order does not have one yet.
    pub async fn generate_payment(&self, order_id: &OrderCode) -> Result<PaymentToken, PaymentError> {
        let detail = self.orders.order_detail(order_id).await?;
        if let Some(reason) = detail.payment_blocker() {
            debug!("💳️ Payment for {order_id} refused. {reason}");
            return Err(PaymentError::NotPayable(reason));
        }
        let gross_amount = detail.summary.grand_total;
        if let Some(token) = detail.order.order.payment_token.clone() {
            debug!("💳️ Re-using payment token for {order_id}");
            return Ok(PaymentToken { order_id: order_id.clone(), token, gross_amount, created: false });
        }
        let request = PaymentRequest {
            order_id: order_id.clone(),
            gross_amount,
            customer_name: detail.order.order.customer_name.clone(),
        };
        let token = self.gateway.create_transaction(&request).await?;
        self.orders.db().set_payment_token(order_id, &token).await?;
        info!("💳️ Payment of {gross_amount} opened for {order_id}");
        Ok(PaymentToken { order_id: order_id.clone(), token, gross_amount, created: true })
    }

    /// Asks the gateway how the order is being paid. Gateway failures are logged and reported as an empty status.
    pub async fn payment_status(&self, order_id: &OrderCode) -> PaymentStatus {
        match self.gateway.transaction_status(order_id).await {
            Ok(status) => status.into(),
            Err(e) => {
                warn!("💳️ Could not fetch payment status for {order_id}. {e}");
                PaymentStatus::default()
            },
        }
    }

    /// Processes the gateway's notification callback. Returns the settled order if the notification reported a
    /// completed payment.
    pub async fn handle_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<Option<OrderUpdate>, PaymentError> {
        if !self.gateway.verify_notification(notification) {
            warn!("💳️ Rejected payment notification for {} with a bad signature", notification.order_id);
            return Err(PaymentError::InvalidSignature);
        }
        let order_id = OrderCode::from(notification.order_id.as_str());
        if !notification.is_paid() {
            info!(
                "💳️ Payment notification for {order_id}: {} (fraud status {})",
                notification.transaction_status,
                notification.fraud_status.as_deref().unwrap_or("n/a")
            );
            return Ok(None);
        }
        let update = self.orders.settle_order(&order_id).await?;
        info!("💳️ Payment for {order_id} received");
        Ok(Some(update))
    }

    /// Called when the payment widget reports success. The order must be payable, must have an open payment, and
    /// the gateway must report that payment as received. An order that is already settled is returned unchanged.
    pub async fn payment_success(&self, order_id: &OrderCode) -> Result<OrderUpdate, PaymentError> {
        let detail = self.orders.order_detail(order_id).await?;
        let order = detail.order.order.clone();
        if order.status == OrderStatusType::Settled {
            return Ok(OrderUpdate::unchanged(order));
        }
        if let Some(reason) = detail.payment_blocker() {
            debug!("💳️ Payment success for {order_id} refused. {reason}");
            return Err(PaymentError::NotPayable(reason));
        }
        if order.payment_token.is_none() {
            return Err(PaymentError::NotPayable(format!("No payment has been opened for order {order_id}")));
        }
        let status = self.gateway.transaction_status(order_id).await?;
        if !status.is_paid() {
            warn!(
                "💳️ Payment widget reported success for {order_id}, but the gateway says {}",
                status.transaction_status.as_deref().unwrap_or("nothing")
            );
            return Err(PaymentError::NotPayable(format!("Payment for order {order_id} has not been received")));
        }
        let update = self.orders.settle_order(order_id).await?;
        info!("💳️ Payment for {order_id} confirmed by the gateway");
        Ok(update)
    }
}
