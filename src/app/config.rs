use anyhow::{Context, Result, anyhow};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

/// Hosted authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_POOL_SIZE: u32 = 10;

/// Loads the configuration from the process environment.
pub fn load() -> Result<AppConfig> {
    from_lookup(|key| std::env::var(key).ok())
}

pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let required = |key: &str| {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("Missing required environment variable {key}"))
    };

    let port = match lookup("SERVER_PORT") {
        Some(port) => port
            .parse()
            .with_context(|| format!("SERVER_PORT must be a port number, got {port:?}"))?,
        None => DEFAULT_PORT,
    };
    let pool_size = match lookup("DATABASE_POOL_SIZE") {
        Some(size) => size
            .parse()
            .with_context(|| format!("DATABASE_POOL_SIZE must be a number, got {size:?}"))?,
        None => DEFAULT_POOL_SIZE,
    };

    Ok(AppConfig {
        server: ServerConfig { port },
        database: DatabaseConfig {
            url: required("DATABASE_URL")?,
            pool_size,
        },
        auth: AuthConfig {
            url: required("AUTH_URL")?.trim_end_matches('/').to_string(),
            anon_key: required("AUTH_ANON_KEY")?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn loads_with_defaults() {
        let vars = env(&[
            ("DATABASE_URL", "postgres://localhost/unimarket"),
            ("AUTH_URL", "https://project.supabase.co/"),
            ("AUTH_ANON_KEY", "anon"),
        ]);
        let config = from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.auth.url, "https://project.supabase.co");
    }

    #[test]
    fn missing_database_url_is_reported() {
        let vars = env(&[("AUTH_URL", "http://auth"), ("AUTH_ANON_KEY", "anon")]);
        let err = from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn malformed_port_is_rejected() {
        let vars = env(&[
            ("SERVER_PORT", "eighty"),
            ("DATABASE_URL", "postgres://localhost/unimarket"),
            ("AUTH_URL", "http://auth"),
            ("AUTH_ANON_KEY", "anon"),
        ]);
        assert!(from_lookup(|k| vars.get(k).cloned()).is_err());
    }
}
