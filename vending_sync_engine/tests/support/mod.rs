use chrono::{DateTime, NaiveDateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use vending_sync_engine::{SqliteDatabase, SyncGatewayDatabase};

pub async fn setup() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    if let Err(e) = Sqlite::drop_database(&url).await {
        trace!("Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(&url).await.expect("Error creating database");
    // A single connection keeps the sequential test flows on one SQLite connection; with a
    // larger pool, a transaction begun right after a committed write can land on a second
    // connection and hit a transient SQLITE_BUSY from the sqlx worker's lagging statement reset.
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database pool");
    db.migrate().await.expect("Error running DB migrations");
    db
}

pub async fn tear_down(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(&url).await.expect("Error dropping test database");
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/vgw_test_store_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub fn ts(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("bad test timestamp").and_utc()
}
