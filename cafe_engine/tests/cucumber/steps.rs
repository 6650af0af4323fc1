use cafe_engine::{
    db_types::{OrderItemStatus, OrderStatusType, Rupiah, TableStatus},
    pricing::CartLine,
    validation::{DineInOrderForm, TakeawayOrderForm},
    TableApi,
};
use cucumber::{then, when};
use serde_json::json;

use crate::cucumber::CafeWorld;

#[when(expr = "{word} books table {word}")]
async fn book_table(world: &mut CafeWorld, customer: String, table: String) {
    dine_in(world, customer, table, "reserved").await;
}

#[when(expr = "{word} sits down at table {word}")]
async fn sit_down(world: &mut CafeWorld, customer: String, table: String) {
    dine_in(world, customer, table, "process").await;
}

async fn dine_in(world: &mut CafeWorld, customer: String, table: String, status: &str) {
    let table_id = world.table(&table).id;
    let form = DineInOrderForm { customer_name: customer, table_id: Some(json!(table_id)), status: status.into() };
    match world.orders().create_dine_in_order(form).await {
        Ok(update) => {
            world.current_order = Some(update.order.order_id);
            world.last_error = None;
        },
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} orders takeaway")]
async fn takeaway(world: &mut CafeWorld, customer: String) {
    let form = TakeawayOrderForm { customer_name: customer };
    let update = world.orders().create_takeaway_order(form).await.expect("Error creating takeaway order");
    world.current_order = Some(update.order.order_id);
}

#[when("the customer arrives")]
async fn customer_arrives(world: &mut CafeWorld) {
    let order_id = world.current_order().clone();
    world.orders().update_reservation(&order_id, OrderStatusType::Process).await.expect("Error confirming reservation");
}

#[when("the reservation is canceled")]
async fn cancel_reservation(world: &mut CafeWorld) {
    let order_id = world.current_order().clone();
    world.orders().update_reservation(&order_id, OrderStatusType::Canceled).await.expect("Error canceling reservation");
}

#[when(expr = "the customer orders {int} {string}")]
async fn order_items(world: &mut CafeWorld, quantity: i64, menu: String) {
    let order_id = world.current_order().clone();
    let line = CartLine::new(world.menu(&menu).id, quantity);
    match world.orders().add_order_items(&order_id, &[line]).await {
        Ok(_) => world.last_error = None,
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when("the kitchen serves everything")]
async fn serve_everything(world: &mut CafeWorld) {
    let detail = world.orders().order_detail(world.current_order()).await.expect("Error fetching order");
    for item in detail.items {
        let mut status = item.item.status;
        while let Some(next) = status.next() {
            world.orders().update_item_status(item.item.id, next).await.expect("Error updating item");
            status = next;
        }
    }
}

#[when("the order is settled")]
async fn settle(world: &mut CafeWorld) {
    let order_id = world.current_order().clone();
    world.orders().settle_order(&order_id).await.expect("Error settling order");
}

#[then(expr = "table {word} is {word}")]
async fn check_table_status(world: &mut CafeWorld, table: String, status: String) {
    let id = world.table(&table).id;
    let api = TableApi::new(world.system().db.clone(), world.orders().hub().clone());
    let table = api.fetch_table(id).await.expect("Error fetching table");
    let expected = status.parse::<TableStatus>().expect("Not a table status");
    assert_eq!(table.status, expected, "Table {} has the wrong status", table.name);
}

#[then(expr = "the order is {word}")]
async fn check_order_status(world: &mut CafeWorld, status: String) {
    let detail = world.orders().order_detail(world.current_order()).await.expect("Error fetching order");
    let expected = status.parse::<OrderStatusType>().expect("Not an order status");
    assert_eq!(detail.order.order.status, expected);
}

#[then(expr = "every item is {word}")]
async fn check_items(world: &mut CafeWorld, status: String) {
    let detail = world.orders().order_detail(world.current_order()).await.expect("Error fetching order");
    let expected = status.parse::<OrderItemStatus>().expect("Not an item status");
    assert!(detail.items.iter().all(|i| i.item.status == expected));
}

#[then(expr = "the bill comes to {int} with a subtotal of {int}")]
async fn check_bill(world: &mut CafeWorld, total: i64, subtotal: i64) {
    let detail = world.orders().order_detail(world.current_order()).await.expect("Error fetching order");
    assert_eq!(detail.summary.subtotal, Rupiah::from(subtotal));
    assert_eq!(detail.summary.grand_total, Rupiah::from(total));
}

#[then(expr = "the request fails with {string}")]
async fn check_error(world: &mut CafeWorld, message: String) {
    let err = world.last_error.as_deref().expect("The last request succeeded");
    assert!(err.contains(&message), "Expected '{message}' in '{err}'");
}
