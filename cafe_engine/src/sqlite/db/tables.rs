use sqlx::SqliteConnection;

use crate::db_types::{NewTable, Table, TableStatus};

pub async fn insert_table(table: NewTable, conn: &mut SqliteConnection) -> Result<Table, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO tables (name, description, capacity, status, position_x, position_y)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(table.name)
    .bind(table.description)
    .bind(table.capacity)
    .bind(table.status)
    .bind(table.position_x)
    .bind(table.position_y)
    .fetch_one(conn)
    .await
}

pub async fn update_table(id: i64, table: NewTable, conn: &mut SqliteConnection) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE tables SET
                name = $1,
                description = $2,
                capacity = $3,
                status = $4,
                position_x = $5,
                position_y = $6,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $7
            RETURNING *;
        "#,
    )
    .bind(table.name)
    .bind(table.description)
    .bind(table.capacity)
    .bind(table.status)
    .bind(table.position_x)
    .bind(table.position_y)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn update_table_status(
    id: i64,
    status: TableStatus,
    conn: &mut SqliteConnection,
) -> Result<Table, sqlx::Error> {
    sqlx::query_as("UPDATE tables SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(status)
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn update_position(id: i64, x: i64, y: i64, conn: &mut SqliteConnection) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE tables SET position_x = $1, position_y = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3 RETURNING *",
    )
    .bind(x)
    .bind(y)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn delete_table(id: i64, conn: &mut SqliteConnection) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as("DELETE FROM tables WHERE id = $1 RETURNING *").bind(id).fetch_optional(conn).await
}

pub async fn fetch_table(id: i64, conn: &mut SqliteConnection) -> Result<Option<Table>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tables WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_tables(status: Option<TableStatus>, conn: &mut SqliteConnection) -> Result<Vec<Table>, sqlx::Error> {
    match status {
        Some(status) => {
            sqlx::query_as("SELECT * FROM tables WHERE status = $1 ORDER BY created_at ASC, id ASC")
                .bind(status)
                .fetch_all(conn)
                .await
        },
        None => sqlx::query_as("SELECT * FROM tables ORDER BY created_at ASC, id ASC").fetch_all(conn).await,
    }
}
