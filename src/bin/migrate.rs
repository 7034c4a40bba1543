use anyhow::Context;
use gitdocify::config::Settings;
use gitdocify::db;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("gitdocify=info,sqlx=warn"))
        .init();

    let settings = Settings::load().context("Failed to load application settings")?;
    let database = settings
        .database
        .as_ref()
        .context("DATABASE_URL must be set to run migrations")?;

    info!("Running database migrations");
    // create_pool applies pending migrations before returning
    let pool = db::create_pool(database).await?;
    pool.close().await;

    info!("Migrations completed successfully");
    Ok(())
}
