use sqlx::SqliteConnection;

use crate::db_types::Account;

/// Returns every configured merchant account, oldest first.
pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Account>, sqlx::Error> {
    let accounts = sqlx::query_as("SELECT * FROM accounts ORDER BY id").fetch_all(conn).await?;
    Ok(accounts)
}

/// Creates a merchant account. Operator tooling and tests only; the sync cycle never writes here.
pub async fn insert(
    username: &str,
    password: &str,
    shbh: Option<&str>,
    userid: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Account, sqlx::Error> {
    let account = sqlx::query_as(
        r#"
            INSERT INTO accounts (username, password, shbh, userid)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(username)
    .bind(password)
    .bind(shbh)
    .bind(userid)
    .fetch_one(conn)
    .await?;
    Ok(account)
}
