use sqlx::SqliteConnection;

use crate::db_types::{NewProfile, Profile, Role};

pub async fn insert_profile(profile: NewProfile, conn: &mut SqliteConnection) -> Result<Profile, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO profiles (email, password_hash, name, role, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(profile.email)
    .bind(profile.password_hash)
    .bind(profile.name)
    .bind(profile.role)
    .bind(profile.avatar_url)
    .fetch_one(conn)
    .await
}

pub async fn fetch_profile_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM profiles WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn fetch_profile(id: i64, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM profiles WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_profiles(conn: &mut SqliteConnection) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM profiles ORDER BY name ASC, id ASC").fetch_all(conn).await
}

pub async fn count_profiles_with_role(role: Role, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = $1").bind(role).fetch_one(conn).await
}
