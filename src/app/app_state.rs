use anyhow::Result;

use crate::{
    api::ApiUrls,
    app::{aliases::DbPool, config::AppConfig, db},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub http_client: reqwest::Client,
    pub api_urls: ApiUrls,
}

impl AppState {
    pub async fn init(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            db_pool: db::create_pool(&config.database).await?,
            http_client: reqwest::Client::new(),
            api_urls: ApiUrls::init(&config.auth),
        })
    }

    /// State whose pool connects on first use. Lets the router be exercised without a database.
    pub fn lazy(config: &AppConfig) -> Self {
        Self {
            db_pool: db::create_lazy_pool(&config.database),
            http_client: reqwest::Client::new(),
            api_urls: ApiUrls::init(&config.auth),
        }
    }
}
