//! Seeds the database with the development login.
//!
//! Usage: `cargo run --bin seed`. Safe to run repeatedly.

use anyhow::Context;
use doorkeep::auth::password::hash_password;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    println!("Creating test user...");
    let password_hash = hash_password("password123")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash)
        VALUES ($1, $2)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind("test@example.com")
    .bind(&password_hash)
    .execute(&db)
    .await?;

    if result.rows_affected() == 1 {
        println!("Test user created successfully!");
    } else {
        println!("Test user already exists, nothing to do.");
    }
    println!("Email: test@example.com");
    println!("Password: password123");

    Ok(())
}
