//! Bootstraps the first admin account. Idempotent: re-running against a
//! database that already has the admin email is a no-op.
//!
//! Reads `CB__DATABASE__URL`, `CB__ADMIN_EMAIL`, and `CB__ADMIN_PASSWORD`
//! from the environment (a local `.env` is honored).

use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use auth_adapters::password;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("CB__DATABASE__URL").context("CB__DATABASE__URL is required")?;
    let email = std::env::var("CB__ADMIN_EMAIL").context("CB__ADMIN_EMAIL is required")?;
    let plain = std::env::var("CB__ADMIN_PASSWORD").context("CB__ADMIN_PASSWORD is required")?;

    let pool = sqlx::PgPool::connect(&url).await.context("connecting")?;
    let hash = password::hash(&plain).map_err(|e| anyhow::anyhow!("{e}"))?;

    let result = sqlx::query(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, role, \
         is_enabled, is_verified, created_at) \
         VALUES ($1, 'Site', 'Admin', $2, $3, 'admin', TRUE, TRUE, $4) \
         ON CONFLICT DO NOTHING",
    )
    .bind(Uuid::now_v7())
    .bind(&email)
    .bind(&hash)
    .bind(Utc::now())
    .execute(&pool)
    .await?;

    if result.rows_affected() > 0 {
        println!("admin account created: {email}");
    } else {
        println!("admin account already present: {email}");
    }
    Ok(())
}
