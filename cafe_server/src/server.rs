use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use cafe_engine::{
    events::RealtimeHub,
    AuthApi,
    DashboardApi,
    MenuApi,
    OrderFlowApi,
    PaymentApi,
    SqliteDatabase,
    TableApi,
};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    data_objects::PaymentWidgetConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::midtrans::MidtransGateway,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        payment_config,
        realtime_events,
        ActiveOrdersRoute,
        AddOrderItemsRoute,
        AuthRoute,
        BroadcastRoute,
        CreateDineInOrderRoute,
        CreateMenuRoute,
        CreatePaymentRoute,
        CreateTableRoute,
        CreateTakeawayOrderRoute,
        CreateUserRoute,
        DeleteMenuRoute,
        DeleteTableRoute,
        MeRoute,
        MenuByIdRoute,
        MenuListRoute,
        OrderDetailRoute,
        OrderListRoute,
        OrderReceiptRoute,
        OrdersPerDayRoute,
        PaymentNotificationRoute,
        PaymentStatusRoute,
        PaymentSuccessRoute,
        RevenueSummaryRoute,
        TableByIdRoute,
        TableListRoute,
        UpdateItemStatusRoute,
        UpdateMenuRoute,
        UpdateReservationRoute,
        UpdateTablePositionRoute,
        UpdateTableRoute,
        UserByIdRoute,
        UserListRoute,
    },
};

const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if let Some(admin) = &config.bootstrap_admin {
        AuthApi::new(db.clone())
            .ensure_admin(&admin.email, admin.password.reveal())
            .await
            .map_err(|e| ServerError::InitializeError(format!("Could not create the admin account. {e}")))?;
    }
    let hub = RealtimeHub::default();
    match config.reservation_timeout {
        Some(timeout) => {
            let _handle = start_expiry_worker(OrderFlowApi::new(db.clone(), hub.clone()), timeout);
        },
        None => warn!("🕰️ Stale reservation worker is disabled. Abandoned reservations will hold their tables."),
    }
    if !config.verify_payment_signature {
        warn!("🚨️ Payment notification signatures are NOT being checked. Do not run like this in production.");
    }
    let gateway = MidtransGateway::new(config.midtrans.clone(), config.verify_payment_signature)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db, hub, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    hub: RealtimeHub,
    gateway: MidtransGateway,
) -> Result<Server, ServerError> {
    let widget_config = PaymentWidgetConfig::from(gateway.config());
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), hub.clone());
        let menu_api = MenuApi::new(db.clone(), hub.clone());
        let table_api = TableApi::new(db.clone(), hub.clone());
        let auth_api = AuthApi::new(db.clone());
        let dashboard_api = DashboardApi::new(db.clone());
        let payment_api = PaymentApi::new(orders_api.clone(), gateway.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("cafe::access_log"))
            .app_data(request_error_handlers())
            .app_data(query_error_handlers())
            .app_data(path_error_handlers())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(menu_api))
            .app_data(web::Data::new(table_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(dashboard_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(hub.clone()))
            .app_data(web::Data::new(widget_config.clone()))
            .app_data(web::Data::new(jwt_signer.clone()));
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(jwt_signer))
            .service(MeRoute::<SqliteDatabase>::new())
            .service(ActiveOrdersRoute::<SqliteDatabase>::new())
            .service(CreateDineInOrderRoute::<SqliteDatabase>::new())
            .service(CreateTakeawayOrderRoute::<SqliteDatabase>::new())
            .service(OrderListRoute::<SqliteDatabase>::new())
            .service(OrderDetailRoute::<SqliteDatabase>::new())
            .service(OrderReceiptRoute::<SqliteDatabase>::new())
            .service(UpdateReservationRoute::<SqliteDatabase>::new())
            .service(AddOrderItemsRoute::<SqliteDatabase>::new())
            .service(UpdateItemStatusRoute::<SqliteDatabase>::new())
            .service(MenuListRoute::<SqliteDatabase>::new())
            .service(MenuByIdRoute::<SqliteDatabase>::new())
            .service(CreateMenuRoute::<SqliteDatabase>::new())
            .service(UpdateMenuRoute::<SqliteDatabase>::new())
            .service(DeleteMenuRoute::<SqliteDatabase>::new())
            .service(TableListRoute::<SqliteDatabase>::new())
            .service(TableByIdRoute::<SqliteDatabase>::new())
            .service(CreateTableRoute::<SqliteDatabase>::new())
            .service(UpdateTableRoute::<SqliteDatabase>::new())
            .service(DeleteTableRoute::<SqliteDatabase>::new())
            .service(UpdateTablePositionRoute::<SqliteDatabase>::new())
            .service(UserListRoute::<SqliteDatabase>::new())
            .service(UserByIdRoute::<SqliteDatabase>::new())
            .service(CreateUserRoute::<SqliteDatabase>::new())
            .service(OrdersPerDayRoute::<SqliteDatabase>::new())
            .service(RevenueSummaryRoute::<SqliteDatabase>::new())
            .service(payment_config)
            .service(CreatePaymentRoute::<SqliteDatabase, MidtransGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, MidtransGateway>::new())
            .service(PaymentSuccessRoute::<SqliteDatabase, MidtransGateway>::new())
            .service(realtime_events)
            .service(BroadcastRoute::<SqliteDatabase>::new());
        app.service(auth_scope)
            .service(health)
            .service(AuthRoute::<SqliteDatabase>::new())
            .service(PaymentNotificationRoute::<SqliteDatabase, MidtransGateway>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed bodies get the same structured error body as every other failure.
pub fn request_error_handlers() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_error_handlers() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}

pub fn path_error_handlers() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}
