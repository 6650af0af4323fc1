use cafe_engine::SqliteDatabase;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// Creates a fresh, migrated SQLite file under the system temp dir and returns its URL.
pub async fn prepare_test_env() -> String {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = format!("sqlite://{}/cafe_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
    Sqlite::create_database(&url).await.expect("Error creating test database");
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error connecting to test database");
    db.migrate().await.expect("Error running migrations on test database");
    db.close().await;
    debug!("🚀️ Test database ready at {url}");
    url
}

pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Could not drop test database {url}: {e:?}");
    }
}
