use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Menu, NewMenu},
    traits::{MenuQueryFilter, Page},
};

pub async fn insert_menu(menu: NewMenu, conn: &mut SqliteConnection) -> Result<Menu, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO menus (name, description, price, discount, category, image_url, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(menu.name)
    .bind(menu.description)
    .bind(menu.price)
    .bind(menu.discount)
    .bind(menu.category)
    .bind(menu.image_url)
    .bind(menu.is_available)
    .fetch_one(conn)
    .await
}

/// Overwrites every editable column of the menu. Returns `None` if the menu does not exist.
pub async fn update_menu(id: i64, menu: NewMenu, conn: &mut SqliteConnection) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE menus SET
                name = $1,
                description = $2,
                price = $3,
                discount = $4,
                category = $5,
                image_url = $6,
                is_available = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $8
            RETURNING *;
        "#,
    )
    .bind(menu.name)
    .bind(menu.description)
    .bind(menu.price)
    .bind(menu.discount)
    .bind(menu.category)
    .bind(menu.image_url)
    .bind(menu.is_available)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn delete_menu(id: i64, conn: &mut SqliteConnection) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as("DELETE FROM menus WHERE id = $1 RETURNING *").bind(id).fetch_optional(conn).await
}

pub async fn fetch_menu(id: i64, conn: &mut SqliteConnection) -> Result<Option<Menu>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM menus WHERE id = $1").bind(id).fetch_optional(conn).await
}

fn push_menu_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &MenuQueryFilter) {
    let search = filter.search_term().map(|s| format!("%{s}%"));
    let category = filter.category().map(String::from);
    if search.is_none() && category.is_none() && !filter.available_only {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(term) = search {
        where_clause.push("name LIKE ");
        where_clause.push_bind_unseparated(term);
    }
    if let Some(category) = category {
        where_clause.push("category = ");
        where_clause.push_bind_unseparated(category);
    }
    if filter.available_only {
        where_clause.push("is_available = TRUE");
    }
}

/// Fetches a page of menus, oldest first, along with the total number of matches.
pub async fn search_menus(filter: &MenuQueryFilter, conn: &mut SqliteConnection) -> Result<Page<Menu>, sqlx::Error> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM menus");
    push_menu_filters(&mut count, filter);
    let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM menus");
    push_menu_filters(&mut builder, filter);
    builder.push(" ORDER BY created_at ASC, id ASC LIMIT ");
    builder.push_bind(filter.limit());
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let menus = builder.build_query_as::<Menu>().fetch_all(conn).await?;
    Ok(Page::new(menus, total, filter.page(), filter.limit()))
}
