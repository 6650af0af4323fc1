use actix_web::{
    http::{Method, StatusCode},
    web,
    web::ServiceConfig,
};
use cafe_engine::{
    db_types::{Menu, Role, Rupiah, Table, TableStatus},
    events::RealtimeHub,
    traits::{CatalogError, Page},
    DashboardApi,
    MenuApi,
    TableApi,
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use super::{
    helpers::{api_request, first_error, issue_token},
    mocks::{MockCatalogManager, MockOrderManager},
};
use crate::routes::{
    CreateMenuRoute,
    CreateTableRoute,
    DeleteMenuRoute,
    DeleteTableRoute,
    MenuByIdRoute,
    MenuListRoute,
    OrdersPerDayRoute,
    RevenueSummaryRoute,
    TableByIdRoute,
    TableListRoute,
    UpdateMenuRoute,
    UpdateTablePositionRoute,
    UpdateTableRoute,
};

#[actix_web::test]
async fn anyone_can_browse_the_menu() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_search_menus()
        .withf(|f| f.category.as_deref() == Some("coffee") && f.available_only && f.search.is_none())
        .times(1)
        .returning(|_| Ok(Page::new(vec![menu(1)], 1, 1, 10)));
    let token = issue_token(Role::Kitchen);
    let (status, body) =
        api_request(Method::GET, &token, "/menus?category=coffee&available=true&search=", None, configure_menus(db)).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["items"][0]["price"], 25_000);
}

#[actix_web::test]
async fn unknown_menu() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_menu().returning(|_| Ok(None));
    let token = issue_token(Role::Cashier);
    let (status, body) = api_request(Method::GET, &token, "/menus/42", None, configure_menus(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(first_error(&body, "_form"), "Menu 42 does not exist");
}

#[actix_web::test]
async fn cashiers_cannot_edit_the_menu() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Cashier);
    let body = json!({"name": "Kopi Susu", "description": "Iced", "price": 25000, "category": "coffee"});
    let (status, _) = api_request(Method::POST, &token, "/menus", Some(body), configure_menus(MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = api_request(Method::DELETE, &token, "/menus/1", None, configure_menus(MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admin_adds_a_menu() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_insert_menu()
        .withf(|m| m.price == Rupiah::from(25_000) && m.discount == 10 && m.is_available)
        .times(1)
        .returning(|m| {
            let mut menu = menu(7);
            menu.name = m.name;
            Ok(menu)
        });
    let token = issue_token(Role::Admin);
    let body =
        json!({"name": "Kopi Susu", "description": "Iced", "price": "25000", "discount": 10, "category": "coffee"});
    let (status, body) = api_request(Method::POST, &token, "/menus", Some(body), configure_menus(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Menu = serde_json::from_str(&body).unwrap();
    assert_eq!(created.id, 7);
}

#[actix_web::test]
async fn menu_form_errors() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Admin);
    let body = json!({"name": "Kopi Susu", "price": -5, "discount": 120});
    let (status, body) =
        api_request(Method::PUT, &token, "/menus/1", Some(body), configure_menus(MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(first_error(&body, "description"), "Description is required");
    assert_eq!(first_error(&body, "price"), "Price cannot be negative");
    assert_eq!(first_error(&body, "discount"), "Discount must be between 0 and 100");
}

#[actix_web::test]
async fn menus_on_orders_cannot_be_deleted() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_delete_menu().returning(|_| Err(CatalogError::InUse("Kopi Susu".into())));
    let token = issue_token(Role::Admin);
    let (status, _) = api_request(Method::DELETE, &token, "/menus/1", None, configure_menus(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[actix_web::test]
async fn tables_by_status() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_tables()
        .withf(|s| *s == Some(TableStatus::Available))
        .times(1)
        .returning(|_| Ok(vec![table(1, TableStatus::Available)]));
    let token = issue_token(Role::Cashier);
    let (status, body) = api_request(Method::GET, &token, "/tables?status=available", None, configure_tables(db)).await;
    assert_eq!(status, StatusCode::OK);
    let tables: Vec<Table> = serde_json::from_str(&body).unwrap();
    assert_eq!(tables.len(), 1);
}

#[actix_web::test]
async fn table_capacity_is_restricted() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Admin);
    let body = json!({"name": "A9", "capacity": 3});
    let (status, body) =
        api_request(Method::POST, &token, "/tables", Some(body), configure_tables(MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(first_error(&body, "capacity"), "Capacity must be one of 2, 4, 6, 8 or 10");
}

#[actix_web::test]
async fn dragging_a_table() {
    let _ = env_logger::try_init();
    let mut db = MockCatalogManager::new();
    db.expect_update_table_position()
        .withf(|id, x, y| *id == 3 && *x == 121 && *y == 80)
        .times(1)
        .returning(|id, x, y| {
            let mut table = table(id, TableStatus::Available);
            table.position_x = x;
            table.position_y = y;
            Ok(table)
        });
    let token = issue_token(Role::Admin);
    let body = json!({"x": 120.6, "y": 79.5});
    let (status, body) = api_request(Method::PATCH, &token, "/tables/3/position", Some(body), configure_tables(db)).await;
    assert_eq!(status, StatusCode::OK);
    let table: Table = serde_json::from_str(&body).unwrap();
    assert_eq!((table.position_x, table.position_y), (121, 80));
}

#[actix_web::test]
async fn kitchen_cannot_move_tables() {
    let _ = env_logger::try_init();
    let token = issue_token(Role::Kitchen);
    let body = json!({"x": 1.0, "y": 1.0});
    let (status, _) =
        api_request(Method::PATCH, &token, "/tables/3/position", Some(body), configure_tables(MockCatalogManager::new()))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn revenue_dashboard() {
    let _ = env_logger::try_init();
    let mut db = MockOrderManager::new();
    let now = Utc::now();
    db.expect_settled_order_subtotals()
        .withf(move |from, _| *from > now - Duration::days(31))
        .times(1)
        .returning(|_, _| Ok(vec![Rupiah::from(100_000), Rupiah::from(50_000)]));
    db.expect_settled_order_subtotals()
        .withf(move |from, _| *from <= now - Duration::days(59))
        .times(1)
        .returning(|_, _| Ok(vec![Rupiah::from(100_000)]));
    let token = issue_token(Role::Admin);
    let (status, body) = api_request(Method::GET, &token, "/dashboard/revenue", None, configure_dashboard(db)).await;
    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["period_days"], 30);
    assert_eq!(summary["current"], 175_500);
    assert_eq!(summary["previous"], 117_000);
    assert_eq!(summary["growth_rate"], "50.0");
}

#[actix_web::test]
async fn orders_per_day_dashboard() {
    let _ = env_logger::try_init();
    let mut db = MockOrderManager::new();
    db.expect_order_timestamps_since().returning(|_| Ok(vec![Utc::now(), Utc::now()]));
    let token = issue_token(Role::Admin);
    let (status, body) =
        api_request(Method::GET, &token, "/dashboard/orders?days=3", None, configure_dashboard(db)).await;
    assert_eq!(status, StatusCode::OK);
    let counts: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts[2]["count"], 2);

    let token = issue_token(Role::Cashier);
    let (status, _) = api_request(
        Method::GET,
        &token,
        "/dashboard/orders",
        None,
        configure_dashboard(MockOrderManager::new()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

fn configure_menus(db: MockCatalogManager) -> impl FnOnce(&mut ServiceConfig) + 'static {
    move |cfg| {
        cfg.service(MenuListRoute::<MockCatalogManager>::new())
            .service(MenuByIdRoute::<MockCatalogManager>::new())
            .service(CreateMenuRoute::<MockCatalogManager>::new())
            .service(UpdateMenuRoute::<MockCatalogManager>::new())
            .service(DeleteMenuRoute::<MockCatalogManager>::new())
            .app_data(web::Data::new(MenuApi::new(db, RealtimeHub::default())));
    }
}

fn configure_tables(db: MockCatalogManager) -> impl FnOnce(&mut ServiceConfig) + 'static {
    move |cfg| {
        cfg.service(TableListRoute::<MockCatalogManager>::new())
            .service(TableByIdRoute::<MockCatalogManager>::new())
            .service(CreateTableRoute::<MockCatalogManager>::new())
            .service(UpdateTableRoute::<MockCatalogManager>::new())
            .service(DeleteTableRoute::<MockCatalogManager>::new())
            .service(UpdateTablePositionRoute::<MockCatalogManager>::new())
            .app_data(web::Data::new(TableApi::new(db, RealtimeHub::default())));
    }
}

fn configure_dashboard(db: MockOrderManager) -> impl FnOnce(&mut ServiceConfig) + 'static {
    move |cfg| {
        cfg.service(OrdersPerDayRoute::<MockOrderManager>::new())
            .service(RevenueSummaryRoute::<MockOrderManager>::new())
            .app_data(web::Data::new(DashboardApi::new(db)));
    }
}

fn menu(id: i64) -> Menu {
    Menu {
        id,
        name: "Kopi Susu".into(),
        description: "Iced".into(),
        price: Rupiah::from(25_000),
        discount: 10,
        category: "coffee".into(),
        image_url: Some("https://cdn.starcafe.id/kopi-susu.jpg".into()),
        is_available: true,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
}

fn table(id: i64, status: TableStatus) -> Table {
    Table {
        id,
        name: format!("A{id}"),
        description: None,
        capacity: 4,
        status,
        position_x: 0,
        position_y: 0,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
}
