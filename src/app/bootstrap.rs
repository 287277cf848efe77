use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::{
    app::{app_state::AppState, middleware, swagger},
    routes,
};

/// Loads `.env`, then installs the subscriber so a `RUST_LOG` set in the file applies.
/// A missing `.env` is not an error.
pub fn init() {
    let env_file = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    if let Err(err) = env_file {
        tracing::debug!("No .env file loaded: {err}");
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Assembles every route, the API docs and the per-request layers.
pub fn build_app(state: AppState) -> Result<Router> {
    let (router, mut openapi) = routes::routes_with_openapi().split_for_parts();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("UniMarket API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    Ok(router
        .merge(swagger_ui)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_session,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn serve(name: &str, app: Router, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    tracing::info!("{name} listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("{name} stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_comes_from_the_env_file() {
        let path = std::env::temp_dir().join(format!("unimarket-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, "RUST_LOG=unimarket_service=debug\n").unwrap();

        dotenvy::from_path_override(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(env_filter().to_string(), "unimarket_service=debug");
    }
}
