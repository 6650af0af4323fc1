use sqlx::SqliteConnection;

use crate::{
    db_types::{OrderItem, OrderItemDetail, OrderItemStatus},
    pricing::CartEntry,
};

pub async fn insert_item(order_id: i64, entry: &CartEntry, conn: &mut SqliteConnection) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO orders_menus (order_id, menu_id, quantity, nominal, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(entry.menu_id)
    .bind(entry.quantity)
    .bind(entry.nominal)
    .bind(entry.notes.as_deref())
    .bind(OrderItemStatus::Pending)
    .fetch_one(conn)
    .await
}

pub async fn fetch_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders_menus WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn update_item_status(
    id: i64,
    status: OrderItemStatus,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as("UPDATE orders_menus SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(status)
        .bind(id)
        .fetch_one(conn)
        .await
}

/// The items of an order joined with their menus, in kitchen pipeline order.
pub async fn fetch_items_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT orders_menus.*,
                menus.name AS menu_name,
                menus.category AS menu_category,
                menus.price AS menu_price,
                menus.discount AS menu_discount,
                menus.image_url AS menu_image_url
            FROM orders_menus JOIN menus ON menus.id = orders_menus.menu_id
            WHERE orders_menus.order_id = $1
            ORDER BY
                CASE orders_menus.status
                    WHEN 'pending' THEN 0
                    WHEN 'process' THEN 1
                    WHEN 'ready' THEN 2
                    ELSE 3
                END,
                orders_menus.id;
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await
}

pub async fn count_items_for_menu(menu_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders_menus WHERE menu_id = $1").bind(menu_id).fetch_one(conn).await
}
