use chrono::{DateTime, Duration, Utc};
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderCode, OrderRow, OrderStatusType, Rupiah},
    traits::{OrderQueryFilter, Page},
};

const ORDER_ROW_SELECT: &str = r#"
    SELECT orders.*, tables.name AS table_name
    FROM orders LEFT JOIN tables ON tables.id = orders.table_id
"#;

/// Inserts a new order. This is not atomic on its own; embed it in a transaction when the table must change too.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, customer_name, table_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order.order_id)
    .bind(order.customer_name)
    .bind(order.table_id)
    .bind(order.status)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderCode,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_row(order_id: &OrderCode, conn: &mut SqliteConnection) -> Result<Option<OrderRow>, sqlx::Error> {
    let sql = format!("{ORDER_ROW_SELECT} WHERE orders.order_id = $1");
    let row = sqlx::query_as(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(row)
}

fn push_order_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderQueryFilter) {
    let search = filter.search_term().map(|s| format!("%{s}%"));
    if search.is_none() && filter.statuses.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(term) = search {
        where_clause.push("(orders.order_id LIKE ");
        where_clause.push_bind_unseparated(term.clone());
        where_clause.push_unseparated(" OR orders.customer_name LIKE ");
        where_clause.push_bind_unseparated(term);
        where_clause.push_unseparated(")");
    }
    if !filter.statuses.is_empty() {
        where_clause.push("orders.status IN (");
        for (i, status) in filter.statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.as_str());
        }
        where_clause.push_unseparated(")");
    }
}

/// Fetches a page of orders matching the filter, newest first, along with the total number of matches.
pub async fn search_orders(
    filter: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Page<OrderRow>, sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_order_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new(ORDER_ROW_SELECT);
    push_order_filters(&mut builder, filter);
    builder.push(" ORDER BY orders.created_at DESC, orders.id DESC LIMIT ");
    builder.push_bind(filter.limit());
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(conn).await?;
    trace!("🗃️ Order search returned {} of {total} rows", rows.len());
    Ok(Page::new(rows, total, filter.page(), filter.limit()))
}

pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(status)
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn set_payment_token(id: i64, token: &str, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    sqlx::query_as("UPDATE orders SET payment_token = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(token)
        .bind(id)
        .fetch_one(conn)
        .await
}

/// Cancels every reservation that has not been updated for longer than `older_than`, returning the canceled orders.
pub async fn cancel_stale_reservations(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'canceled', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'reserved' AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > $1
            RETURNING *;
        "#,
    )
    .bind(older_than.num_seconds())
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn order_timestamps_since(
    since: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar("SELECT created_at FROM orders WHERE unixepoch(created_at) >= unixepoch($1) ORDER BY created_at")
        .bind(since)
        .fetch_all(conn)
        .await
}

/// Sums the item nominals of each order settled within `[from, to)`. Orders without items contribute zero.
pub async fn settled_order_subtotals(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Rupiah>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
            SELECT COALESCE(SUM(orders_menus.nominal), 0)
            FROM orders LEFT JOIN orders_menus ON orders_menus.order_id = orders.id
            WHERE orders.status = 'settled'
              AND unixepoch(orders.updated_at) >= unixepoch($1)
              AND unixepoch(orders.updated_at) < unixepoch($2)
            GROUP BY orders.id;
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(conn)
    .await
}

/// Number of orders ever seated at the table.
pub async fn count_orders_for_table(table_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE table_id = $1").bind(table_id).fetch_one(conn).await
}
