use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Machine;

pub async fn fetch_by_number(
    number: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Machine>, sqlx::Error> {
    let machine =
        sqlx::query_as("SELECT * FROM machines WHERE number = $1").bind(number).fetch_optional(conn).await?;
    Ok(machine)
}

pub async fn fetch_for_account(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Machine>, sqlx::Error> {
    let machines = sqlx::query_as("SELECT * FROM machines WHERE account_id = $1 ORDER BY id")
        .bind(account_id)
        .fetch_all(conn)
        .await?;
    Ok(machines)
}

/// Fetches the machine by its business key, creating it on first sighting. A newly created
/// machine is seeded with the given display name (falling back to the number itself); an
/// existing machine with an empty name picks the name up too.
pub async fn get_or_create(
    account_id: i64,
    number: &str,
    name: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Machine, sqlx::Error> {
    if let Some(machine) = fetch_by_number(number, &mut *conn).await? {
        if machine.name.is_empty() {
            if let Some(name) = name {
                let machine = sqlx::query_as(
                    "UPDATE machines SET name = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
                )
                .bind(name)
                .bind(machine.id)
                .fetch_one(conn)
                .await?;
                return Ok(machine);
            }
        }
        return Ok(machine);
    }
    let machine: Machine = sqlx::query_as(
        r#"
            INSERT INTO machines (account_id, number, name)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(account_id)
    .bind(number)
    .bind(name.unwrap_or(number))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Machine {number} sighted for the first time, created with id {}", machine.id);
    Ok(machine)
}

/// Moves `last_order` forward to `payment_time` if it is newer than the stored value.
pub async fn advance_last_order(
    id: i64,
    payment_time: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE machines SET last_order = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND (last_order IS NULL OR last_order < $1)
        "#,
    )
    .bind(payment_time)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Clears the broken flag if it is set. A fresh order is proof of life, regardless of what the
/// last health pass concluded.
pub async fn clear_broken(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE machines SET is_broken = 0, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND is_broken = 1")
            .bind(id)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_broken(
    id: i64,
    is_broken: bool,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE machines SET is_broken = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(is_broken)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// The oldest `last_order` among the account's healthy machines, or `None` when no machine
/// qualifies. Used as the scan resume point.
pub async fn oldest_healthy_last_order(
    account_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    let oldest: Option<Option<DateTime<Utc>>> = sqlx::query_scalar(
        r#"
            SELECT MIN(last_order) FROM machines
            WHERE account_id = $1 AND is_broken = 0 AND last_order IS NOT NULL
        "#,
    )
    .bind(account_id)
    .fetch_optional(conn)
    .await?;
    Ok(oldest.flatten())
}
