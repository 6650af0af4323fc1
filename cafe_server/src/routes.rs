//! Request handler definitions
//!
//! Define each route and its handler here. Anything longer than a few lines belongs in the engine, not in a handler.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the current thread stalls every
//! other request on that worker. Database and gateway calls are therefore always awaited, never blocked on.
//!
//! Role gates are attached per route with the `requires [...]` clause of the [`route!`](crate::route) macro. A caller
//! needs any one of the listed roles. Routes without the clause are open to every logged-in user, and the whole
//! `/api` scope sits behind the session token middleware.
use actix_web::{get, http::header::ContentType, web, HttpRequest, HttpResponse, Responder};
use cafe_engine::{
    db_types::{OrderCode, Role},
    events::{RealtimeHub, TopicFilter},
    pricing::CartLine,
    traits::{CatalogManagement, OrderManagement, PaymentGateway, PaymentNotification, ProfileManagement},
    validation::{DineInOrderForm, LoginForm, MenuForm, NewUserForm, TableForm, TakeawayOrderForm},
    AuthApi,
    DashboardApi,
    MenuApi,
    OrderFlowApi,
    PaymentApi,
    TableApi,
};
use log::*;

use crate::{
    auth::{token_from_headers, JwtClaims, TokenIssuer},
    data_objects::{
        BroadcastRequest,
        DaysParams,
        ItemStatusUpdate,
        JsonResponse,
        LoginResponse,
        MenuListParams,
        OrderListParams,
        PaymentWidgetConfig,
        PositionUpdate,
        RealtimeParams,
        ReceiptParams,
        ReservationUpdate,
        TableListParams,
        DEFAULT_DASHBOARD_DAYS,
        DEFAULT_REVENUE_DAYS,
    },
    errors::{AuthError, ServerError},
    realtime::{event_stream, KEEP_ALIVE},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
            impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds >], )+ >( $( core::marker::PhantomData<fn() -> [< T $bounds >]>, )+ );}
        paste::paste! { impl< $( [< T $bounds >], )+ > [<$name:camel Route>]< $( [< T $bounds >], )+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds >]>, )+)
            }
        }}
        paste::paste! { impl< $( [< T $bounds >], )+ > actix_web::dev::HttpServiceFactory for [<$name:camel Route>]< $( [< T $bounds >], )+ >
        where
            $( [< T $bounds >]: $bounds + 'static, )+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds >], )+ >)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds >], )+ >( $( core::marker::PhantomData<fn() -> [< T $bounds >]>, )+ );}
        paste::paste! { impl< $( [< T $bounds >], )+ > [<$name:camel Route>]< $( [< T $bounds >], )+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds >]>, )+)
            }
        }}
        paste::paste! { impl< $( [< T $bounds >], )+ > actix_web::dev::HttpServiceFactory for [<$name:camel Route>]< $( [< T $bounds >], )+ >
        where
            $( [< T $bounds >]: $bounds + 'static, )+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds >], )+ >);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth => Post "/auth" impl ProfileManagement);
/// Route handler for the auth endpoint
///
/// Staff log in by posting `{"email": ..., "password": ...}`. On success the response carries a session token and the
/// caller's profile.
///
/// A request without credentials but with a still-valid session token gets a fresh token instead, which lets the
/// dashboard keep a session alive without asking for the password again.
pub async fn auth<B: ProfileManagement>(
    req: HttpRequest,
    body: Option<web::Json<LoginForm>>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received auth request");
    let profile = match body {
        Some(form) => api.authenticate(form.into_inner()).await?,
        None => {
            let token = token_from_headers(req.headers()).ok_or(AuthError::MissingToken)?;
            let claims = signer.validate(token)?;
            debug!("💻️ Re-issuing session token for {}", claims.email);
            api.profile(claims.sub).await.map_err(|e| {
                debug!("💻️ Cannot re-issue token for profile {}. {e}", claims.sub);
                AuthError::AccountNotFound
            })?
        },
    };
    let token = signer.issue_token(&profile)?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, profile }))
}

route!(me => Get "/me" impl ProfileManagement);
pub async fn me<B: ProfileManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET me for {}", claims.email);
    let profile = api.profile(claims.sub).await?;
    Ok(HttpResponse::Ok().json(profile))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_list => Get "/orders" impl OrderManagement);
/// Paginated order list. Supports `search` (order code or customer name), `status` (comma separated), `page` and
/// `limit` query parameters.
pub async fn order_list<B: OrderManagement>(
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().try_into()?;
    debug!("💻️ GET orders {filter:?}");
    let page = api.order_list(filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(active_orders => Get "/orders/active" impl OrderManagement);
pub async fn active_orders<B: OrderManagement>(api: web::Data<OrderFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET active orders");
    let orders = api.active_orders().await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_detail => Get "/orders/{order_id}" impl OrderManagement);
pub async fn order_detail<B: OrderManagement>(
    path: web::Path<OrderCode>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let detail = api.order_detail(&order_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(order_receipt => Get "/orders/{order_id}/receipt" impl OrderManagement);
/// The receipt of a settled order, as JSON or, with `?format=text`, as printable plain text.
pub async fn order_receipt<B: OrderManagement>(
    path: web::Path<OrderCode>,
    query: web::Query<ReceiptParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET receipt for {order_id}");
    let receipt = api.receipt(&order_id).await?;
    if query.wants_text() {
        Ok(HttpResponse::Ok().insert_header(ContentType::plaintext()).body(receipt.to_string()))
    } else {
        Ok(HttpResponse::Ok().json(receipt))
    }
}

route!(create_dine_in_order => Post "/orders/dine-in" impl OrderManagement where requires [Role::Admin, Role::Cashier]);
pub async fn create_dine_in_order<B: OrderManagement>(
    body: web::Json<DineInOrderForm>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST dine-in order for {}", body.customer_name);
    let update = api.create_dine_in_order(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(update))
}

route!(create_takeaway_order => Post "/orders/takeaway" impl OrderManagement where requires [Role::Admin, Role::Cashier]);
pub async fn create_takeaway_order<B: OrderManagement>(
    body: web::Json<TakeawayOrderForm>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST takeaway order for {}", body.customer_name);
    let update = api.create_takeaway_order(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(update))
}

route!(update_reservation => Post "/orders/{order_id}/reservation" impl OrderManagement where requires [Role::Admin, Role::Cashier]);
pub async fn update_reservation<B: OrderManagement>(
    path: web::Path<OrderCode>,
    body: web::Json<ReservationUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST reservation {order_id} -> {}", body.status);
    let update = api.update_reservation(&order_id, body.status).await?;
    Ok(HttpResponse::Ok().json(update))
}

route!(add_order_items => Post "/orders/{order_id}/items" impl OrderManagement where requires [Role::Admin, Role::Cashier]);
pub async fn add_order_items<B: OrderManagement>(
    path: web::Path<OrderCode>,
    body: web::Json<Vec<CartLine>>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST {} lines to order {order_id}", body.len());
    let items = api.add_order_items(&order_id, &body).await?;
    Ok(HttpResponse::Created().json(items))
}

route!(update_item_status => Patch "/items/{id}" impl OrderManagement);
pub async fn update_item_status<B: OrderManagement>(
    path: web::Path<i64>,
    body: web::Json<ItemStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PATCH item {id} -> {}", body.status);
    let item = api.update_item_status(id, body.status).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Menus  ----------------------------------------------------
route!(menu_list => Get "/menus" impl CatalogManagement);
pub async fn menu_list<B: CatalogManagement>(
    query: web::Query<MenuListParams>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner().into();
    trace!("💻️ GET menus {filter:?}");
    let page = api.menu_list(filter).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(menu_by_id => Get "/menus/{id}" impl CatalogManagement);
pub async fn menu_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let menu = api.fetch_menu(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(menu))
}

route!(create_menu => Post "/menus" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_menu<B: CatalogManagement>(
    body: web::Json<MenuForm>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST menu {}", body.name);
    let menu = api.create_menu(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(menu))
}

route!(update_menu => Put "/menus/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_menu<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<MenuForm>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PUT menu {id}");
    let menu = api.update_menu(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(menu))
}

route!(delete_menu => Delete "/menus/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_menu<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<MenuApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE menu {id}");
    let menu = api.delete_menu(id).await?;
    Ok(HttpResponse::Ok().json(menu))
}

//----------------------------------------------   Tables  ----------------------------------------------------
route!(table_list => Get "/tables" impl CatalogManagement);
pub async fn table_list<B: CatalogManagement>(
    query: web::Query<TableListParams>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tables = api.table_list(query.status).await?;
    Ok(HttpResponse::Ok().json(tables))
}

route!(table_by_id => Get "/tables/{id}" impl CatalogManagement);
pub async fn table_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let table = api.fetch_table(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(table))
}

route!(create_table => Post "/tables" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_table<B: CatalogManagement>(
    body: web::Json<TableForm>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST table {}", body.name);
    let table = api.create_table(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(table))
}

route!(update_table => Put "/tables/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_table<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<TableForm>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PUT table {id}");
    let table = api.update_table(id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(table))
}

route!(delete_table => Delete "/tables/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_table<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE table {id}");
    let table = api.delete_table(id).await?;
    Ok(HttpResponse::Ok().json(table))
}

route!(update_table_position => Patch "/tables/{id}/position" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_table_position<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<PositionUpdate>,
    api: web::Data<TableApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ PATCH table {id} position ({}, {})", body.x, body.y);
    let table = api.update_position(id, body.x, body.y).await?;
    Ok(HttpResponse::Ok().json(table))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(user_list => Get "/users" impl ProfileManagement where requires [Role::Admin]);
pub async fn user_list<B: ProfileManagement>(api: web::Data<AuthApi<B>>) -> Result<HttpResponse, ServerError> {
    let profiles = api.profiles().await?;
    Ok(HttpResponse::Ok().json(profiles))
}

route!(user_by_id => Get "/users/{id}" impl ProfileManagement where requires [Role::Admin]);
pub async fn user_by_id<B: ProfileManagement>(
    path: web::Path<i64>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let profile = api.profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(create_user => Post "/users" impl ProfileManagement where requires [Role::Admin]);
pub async fn create_user<B: ProfileManagement>(
    claims: JwtClaims,
    body: web::Json<NewUserForm>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ {} is creating a {} account for {}", claims.email, body.role, body.email);
    let profile = api.create_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

//----------------------------------------------   Dashboard  ----------------------------------------------------
route!(orders_per_day => Get "/dashboard/orders" impl OrderManagement where requires [Role::Admin]);
pub async fn orders_per_day<B: OrderManagement>(
    query: web::Query<DaysParams>,
    api: web::Data<DashboardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let counts = api.orders_per_day(query.days.unwrap_or(DEFAULT_DASHBOARD_DAYS)).await?;
    Ok(HttpResponse::Ok().json(counts))
}

route!(revenue_summary => Get "/dashboard/revenue" impl OrderManagement where requires [Role::Admin]);
pub async fn revenue_summary<B: OrderManagement>(
    query: web::Query<DaysParams>,
    api: web::Data<DashboardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let summary = api.revenue_summary(query.days.unwrap_or(DEFAULT_REVENUE_DAYS)).await?;
    Ok(HttpResponse::Ok().json(summary))
}

//----------------------------------------------   Payment  ----------------------------------------------------
#[get("/payment/config")]
pub async fn payment_config(config: web::Data<PaymentWidgetConfig>) -> impl Responder {
    HttpResponse::Ok().json(config.get_ref())
}

route!(create_payment => Post "/payment/{order_id}" impl OrderManagement, PaymentGateway where requires [Role::Admin, Role::Cashier]);
/// Returns the payment widget token for a fully served order.
pub async fn create_payment<B: OrderManagement, G: PaymentGateway>(
    path: web::Path<OrderCode>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST payment for {order_id}");
    let token = api.generate_payment(&order_id).await?;
    Ok(HttpResponse::Ok().json(token))
}

route!(payment_status => Get "/payment/{order_id}/status" impl OrderManagement, PaymentGateway);
pub async fn payment_status<B: OrderManagement, G: PaymentGateway>(
    path: web::Path<OrderCode>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET payment status for {order_id}");
    let status = api.payment_status(&order_id).await;
    Ok(HttpResponse::Ok().json(status))
}

route!(payment_success => Post "/payment/{order_id}/success" impl OrderManagement, PaymentGateway where requires [Role::Admin, Role::Cashier]);
pub async fn payment_success<B: OrderManagement, G: PaymentGateway>(
    path: web::Path<OrderCode>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Payment widget reported success for {order_id}");
    let update = api.payment_success(&order_id).await?;
    Ok(HttpResponse::Ok().json(update))
}

route!(payment_notification => Post "/payment/notification" impl OrderManagement, PaymentGateway);
/// The Midtrans HTTP notification webhook. Lives outside `/api`, since Midtrans cannot log in; the notification's
/// signature authenticates it instead.
pub async fn payment_notification<B: OrderManagement, G: PaymentGateway>(
    body: web::Json<PaymentNotification>,
    api: web::Data<PaymentApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let notification = body.into_inner();
    debug!("💻️ Payment notification for {}: {}", notification.order_id, notification.transaction_status);
    let result = api.handle_notification(&notification).await?;
    let message = match result {
        Some(_) => format!("Order {} settled", notification.order_id),
        None => format!("Notification for {} acknowledged", notification.order_id),
    };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Realtime  ----------------------------------------------------
#[get("/realtime")]
pub async fn realtime_events(query: web::Query<RealtimeParams>, hub: web::Data<RealtimeHub>) -> impl Responder {
    let filter = query.topics.as_deref().map(TopicFilter::parse).unwrap_or_else(TopicFilter::all);
    debug!("💻️ New realtime connection for {filter:?}");
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(event_stream(hub.subscribe(), filter, KEEP_ALIVE))
}

route!(broadcast => Post "/realtime/broadcast" impl OrderManagement);
/// Asks every client on `channel` to reload its data.
pub async fn broadcast<B: OrderManagement>(
    body: web::Json<BroadcastRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let channel = body.into_inner().channel;
    if channel.trim().is_empty() {
        return Err(ServerError::InvalidRequestBody("A channel name is required".into()));
    }
    api.broadcast_refresh(&channel);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Refresh sent on {channel}"))))
}
