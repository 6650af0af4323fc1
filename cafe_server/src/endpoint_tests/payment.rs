use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use cafe_engine::{
    db_types::{Order, OrderCode, OrderItem, OrderItemDetail, OrderItemStatus, OrderRow, OrderStatusType, Role, Rupiah},
    events::{RealtimeEvent, RealtimeHub},
    traits::{GatewayStatus, OrderUpdate, PaymentError, VaNumber},
    OrderFlowApi,
    PaymentApi,
};
use chrono::{TimeZone, Utc};
use midtrans_tools::MidtransConfig;
use serde_json::{json, Value};

use super::{
    helpers::{api_request, first_error, issue_token, public_request},
    mocks::{MockGateway, MockOrderManager},
};
use crate::{
    data_objects::PaymentWidgetConfig,
    routes::{
        payment_config,
        BroadcastRoute,
        CreatePaymentRoute,
        PaymentNotificationRoute,
        PaymentStatusRoute,
        PaymentSuccessRoute,
    },
};

const CODE: &str = "STARCAFE-1718028300000";

#[actix_web::test]
async fn open_payment_for_served_order() {
    let _ = env_logger::try_init();
    let mut db = served_order(None, OrderItemStatus::Served);
    db.expect_set_payment_token()
        .withf(|code, token| code.as_str() == CODE && token.to_string() == "snap-7f3a")
        .times(1)
        .returning(|_, token| {
            let mut order = order(OrderStatusType::Process);
            order.payment_token = Some(token.to_string());
            Ok(order)
        });
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_transaction()
        .withf(|r| r.gross_amount == Rupiah::from(52_650) && r.customer_name == "Sari")
        .times(1)
        .returning(|_| Ok("snap-7f3a".to_string()));
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["token"], "snap-7f3a");
    assert_eq!(payment["gross_amount"], 52_650);
    assert_eq!(payment["created"], true);
}

#[actix_web::test]
async fn existing_payment_token_is_reused() {
    let _ = env_logger::try_init();
    let db = served_order(Some("snap-old"), OrderItemStatus::Served);
    let token = issue_token(Role::Admin);
    let path = format!("/payment/{CODE}");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let payment: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payment["token"], "snap-old");
    assert_eq!(payment["created"], false);
}

#[actix_web::test]
async fn unserved_orders_cannot_be_paid() {
    let _ = env_logger::try_init();
    let db = served_order(None, OrderItemStatus::Ready);
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body, "_form"), "Every item must be served before payment");
}

#[actix_web::test]
async fn gateway_rejects_payment() {
    let _ = env_logger::try_init();
    let db = served_order(None, OrderItemStatus::Served);
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_transaction()
        .returning(|_| Err(PaymentError::Rejected(vec!["transaction_details.gross_amount is not equal".into()])));
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(first_error(&body, "_form"), "transaction_details.gross_amount is not equal");
}

#[actix_web::test]
async fn kitchen_cannot_take_payment() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Kitchen);
    let path = format!("/payment/{CODE}");
    let (status, _) =
        api_request(Method::POST, &token, &path, None, configure(MockOrderManager::new(), MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn payment_status_with_virtual_account() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().returning(|_| {
        Ok(GatewayStatus {
            va_numbers: vec![VaNumber { bank: "bca".into(), va_number: "12345678901".into() }],
            payment_code: None,
            transaction_status: Some("pending".into()),
            fraud_status: None,
        })
    });
    let token = issue_token(Role::Kitchen);
    let path = format!("/payment/{CODE}/status");
    let (status, body) =
        api_request(Method::GET, &token, &path, None, configure(MockOrderManager::new(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"va_number":"12345678901","bank":"bca","status":"pending"}"#);
}

#[actix_web::test]
async fn payment_status_when_gateway_is_down() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().returning(|_| Err(PaymentError::GatewayError("timeout".into())));
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}/status");
    let (status, body) =
        api_request(Method::GET, &token, &path, None, configure(MockOrderManager::new(), gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"va_number":null,"bank":null,"status":null}"#);
}

#[actix_web::test]
async fn widget_reports_success() {
    let _ = env_logger::try_init();
    let mut db = served_order(Some("snap-7f3a"), OrderItemStatus::Served);
    db.expect_settle_order()
        .withf(|code| code.as_str() == CODE)
        .times(1)
        .returning(|_| Ok(OrderUpdate::new(order(OrderStatusType::Settled), None)));
    let mut gateway = MockGateway::new();
    gateway
        .expect_transaction_status()
        .withf(|code| code.as_str() == CODE)
        .times(1)
        .returning(|_| Ok(gateway_status("settlement")));
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}/success");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let update: OrderUpdate = serde_json::from_str(&body).unwrap();
    assert_eq!(update.order.status, OrderStatusType::Settled);
}

#[actix_web::test]
async fn widget_success_needs_served_items() {
    let _ = env_logger::try_init();
    let db = served_order(Some("snap-7f3a"), OrderItemStatus::Process);
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}/success");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body, "_form"), "Every item must be served before payment");
}

#[actix_web::test]
async fn widget_success_needs_an_open_payment() {
    let _ = env_logger::try_init();
    let db = served_order(None, OrderItemStatus::Served);
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}/success");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body, "_form"), format!("No payment has been opened for order {CODE}"));
}

#[actix_web::test]
async fn widget_success_before_gateway_confirms() {
    let _ = env_logger::try_init();
    let db = served_order(Some("snap-7f3a"), OrderItemStatus::Served);
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().times(1).returning(|_| Ok(gateway_status("pending")));
    let token = issue_token(Role::Cashier);
    let path = format!("/payment/{CODE}/success");
    let (status, body) = api_request(Method::POST, &token, &path, None, configure(db, gateway)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(first_error(&body, "_form"), format!("Payment for order {CODE} has not been received"));
}

#[actix_web::test]
async fn settlement_notification() {
    let _ = env_logger::try_init();
    let mut db = MockOrderManager::new();
    db.expect_settle_order().times(1).returning(|_| Ok(OrderUpdate::new(order(OrderStatusType::Settled), None)));
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|n| n.signature_key == "valid");
    let body = notification("settlement", "valid");
    let (status, body) =
        public_request(Method::POST, "", "/payment/notification", Some(body), configure(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("settled"), "was: {body}");
}

#[actix_web::test]
async fn pending_notification_does_not_settle() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| true);
    let body = notification("pending", "valid");
    let (status, _) = public_request(
        Method::POST,
        "",
        "/payment/notification",
        Some(body),
        configure(MockOrderManager::new(), gateway),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn forged_notification() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| false);
    let body = notification("settlement", "forged");
    let (status, body) = public_request(
        Method::POST,
        "",
        "/payment/notification",
        Some(body),
        configure(MockOrderManager::new(), gateway),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(first_error(&body, "_form"), "The payment notification signature is invalid.");
}

#[actix_web::test]
async fn widget_config() {
    let _ = env_logger::try_init();
    let config = PaymentWidgetConfig::from(&MidtransConfig::new("SB-Mid-server-x", "SB-Mid-client-x", false));
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(payment_config).app_data(web::Data::new(config));
    };
    let token = issue_token(Role::Cashier);
    let (status, body) = api_request(Method::GET, &token, "/payment/config", None, configure).await;
    assert_eq!(status, StatusCode::OK);
    let config: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(config["client_key"], "SB-Mid-client-x");
    assert_eq!(config["is_production"], false);
    assert!(config.get("server_key").is_none());
}

#[actix_web::test]
async fn broadcast_refresh() {
    let _ = env_logger::try_init();
    let hub = RealtimeHub::default();
    let mut receiver = hub.subscribe();
    let api = OrderFlowApi::new(MockOrderManager::new(), hub);
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(BroadcastRoute::<MockOrderManager>::new()).app_data(web::Data::new(api));
    };
    let token = issue_token(Role::Kitchen);
    let body = json!({"channel": "order-sync-STARCAFE-1"});
    let (status, _) = api_request(Method::POST, &token, "/realtime/broadcast", Some(body), configure).await;
    assert_eq!(status, StatusCode::OK);
    let event = receiver.try_recv().expect("No refresh event was published");
    assert_eq!(event, RealtimeEvent::force_refresh("order-sync-STARCAFE-1"));
}

fn configure(db: MockOrderManager, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) + 'static {
    move |cfg| {
        let api = PaymentApi::new(OrderFlowApi::new(db, RealtimeHub::default()), gateway);
        cfg.service(PaymentNotificationRoute::<MockOrderManager, MockGateway>::new())
            .service(CreatePaymentRoute::<MockOrderManager, MockGateway>::new())
            .service(PaymentStatusRoute::<MockOrderManager, MockGateway>::new())
            .service(PaymentSuccessRoute::<MockOrderManager, MockGateway>::new())
            .app_data(web::Data::new(api));
    }
}

fn notification(status: &str, signature: &str) -> Value {
    json!({
        "order_id": CODE,
        "status_code": "200",
        "gross_amount": "52650.00",
        "signature_key": signature,
        "transaction_status": status,
        "payment_type": "bank_transfer",
    })
}

fn gateway_status(transaction_status: &str) -> GatewayStatus {
    GatewayStatus { transaction_status: Some(transaction_status.into()), ..Default::default() }
}

fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 14, 5, 0).unwrap()
}

fn order(status: OrderStatusType) -> Order {
    Order {
        id: 1,
        order_id: OrderCode::from(CODE),
        customer_name: "Sari".into(),
        table_id: Some(3),
        status,
        payment_token: None,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

/// An order in process with a single line of two discounted coffees.
fn served_order(payment_token: Option<&str>, item_status: OrderItemStatus) -> MockOrderManager {
    let mut db = MockOrderManager::new();
    let payment_token = payment_token.map(String::from);
    db.expect_fetch_order_row().returning(move |_| {
        let mut order = order(OrderStatusType::Process);
        order.payment_token = payment_token.clone();
        Ok(Some(OrderRow { order, table_name: Some("A1".into()) }))
    });
    db.expect_fetch_order_items().returning(move |_| {
        Ok(vec![OrderItemDetail {
            item: OrderItem {
                id: 1,
                order_id: 1,
                menu_id: 1,
                quantity: 2,
                nominal: Rupiah::from(45_000),
                notes: None,
                status: item_status,
                created_at: timestamp(),
                updated_at: timestamp(),
            },
            menu_name: "Kopi Susu".into(),
            menu_category: "coffee".into(),
            menu_price: Rupiah::from(25_000),
            menu_discount: 10,
            menu_image_url: None,
        }])
    });
    db
}
