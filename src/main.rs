use anyhow::Result;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use unimarket_service::app::{
    app_state::AppState,
    bootstrap::{self, build_app, serve},
    config, db,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    tracing::info!("Bootstrapping...");
    let state = AppState::init(&config).await?;
    let app = build_app(state)?;

    serve("UniMarket", app, config.server.port).await
}
