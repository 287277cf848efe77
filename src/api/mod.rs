pub mod auth;

use crate::app::config::AuthConfig;

#[derive(Debug, Clone)]
pub struct ApiUrls {
    pub auth_service_url: String,
    pub auth_anon_key: String,
}

impl ApiUrls {
    pub fn init(config: &AuthConfig) -> Self {
        Self {
            auth_service_url: config.url.clone(),
            auth_anon_key: config.anon_key.clone(),
        }
    }

    pub fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.auth_service_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_auth_endpoints() {
        let urls = ApiUrls::init(&AuthConfig {
            url: "https://project.supabase.co".into(),
            anon_key: "anon".into(),
        });
        assert_eq!(
            urls.auth_endpoint("token"),
            "https://project.supabase.co/auth/v1/token"
        );
    }
}
