use anyhow::Context;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{api::ApiUrls, domain::role::Role};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth service is unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    InvalidResponse(anyhow::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthUser {
    fn metadata_str(&self, key: &str) -> Option<String> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn name(&self) -> Option<String> {
        self.metadata_str("name")
    }

    pub fn phone(&self) -> Option<String> {
        self.metadata_str("phone")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: AuthUser,
}

/// Sign-up either signs the user in right away or waits for e-mail confirmation.
#[derive(Debug)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationPending(AuthUser),
}

impl SignUpOutcome {
    pub fn user(&self) -> &AuthUser {
        match self {
            SignUpOutcome::SignedIn(session) => &session.user,
            SignUpOutcome::ConfirmationPending(user) => user,
        }
    }
}

pub struct SignUpMetadata<'a> {
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub role: Role,
}

#[derive(Deserialize, Default)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl AuthErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

fn with_key(request: RequestBuilder, urls: &ApiUrls) -> RequestBuilder {
    request.header("apikey", &urls.auth_anon_key)
}

async fn send(request: RequestBuilder) -> Result<Response, AuthError> {
    let response = request.send().await.map_err(AuthError::Unreachable)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: AuthErrorBody = response.json().await.unwrap_or_default();
    Err(AuthError::Rejected {
        status,
        message: body
            .into_message()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Auth error").to_string()),
    })
}

pub async fn sign_up(
    client: &Client,
    urls: &ApiUrls,
    email: &str,
    password: &str,
    metadata: SignUpMetadata<'_>,
) -> Result<SignUpOutcome, AuthError> {
    let request = client.post(urls.auth_endpoint("signup")).json(&json!({
        "email": email,
        "password": password,
        "data": {
            "name": metadata.name,
            "phone": metadata.phone,
            "role": metadata.role,
        }
    }));
    let body: Value = send(with_key(request, urls))
        .await?
        .json()
        .await
        .context("Failed to parse sign-up response")
        .map_err(AuthError::InvalidResponse)?;

    parse_sign_up(body).map_err(AuthError::InvalidResponse)
}

fn parse_sign_up(body: Value) -> anyhow::Result<SignUpOutcome> {
    if body.get("access_token").is_some() {
        let session = serde_json::from_value(body).context("Malformed session")?;
        Ok(SignUpOutcome::SignedIn(session))
    } else {
        let user = match body.get("user") {
            Some(user) => serde_json::from_value(user.clone()),
            None => serde_json::from_value(body),
        }
        .context("Malformed user")?;
        Ok(SignUpOutcome::ConfirmationPending(user))
    }
}

pub async fn sign_in(
    client: &Client,
    urls: &ApiUrls,
    email: &str,
    password: &str,
) -> Result<AuthSession, AuthError> {
    let request = client
        .post(urls.auth_endpoint("token"))
        .query(&[("grant_type", "password")])
        .json(&json!({ "email": email, "password": password }));

    send(with_key(request, urls))
        .await?
        .json()
        .await
        .context("Failed to parse sign-in response")
        .map_err(AuthError::InvalidResponse)
}

pub async fn sign_out(client: &Client, urls: &ApiUrls, access_token: &str) -> Result<(), AuthError> {
    let request = client
        .post(urls.auth_endpoint("logout"))
        .bearer_auth(access_token);
    send(with_key(request, urls)).await?;
    Ok(())
}

/// Resolves the user owning `access_token`.
pub async fn get_user(
    client: &Client,
    urls: &ApiUrls,
    access_token: &str,
) -> Result<AuthUser, AuthError> {
    let request = client
        .get(urls.auth_endpoint("user"))
        .bearer_auth(access_token);

    send(with_key(request, urls))
        .await?
        .json()
        .await
        .context("Failed to parse user response")
        .map_err(AuthError::InvalidResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_with_session_signs_in() {
        let id = Uuid::new_v4();
        let outcome = parse_sign_up(json!({
            "access_token": "token",
            "refresh_token": "refresh",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": id, "email": "a@ur.ac.rw", "user_metadata": { "name": "Aline" } }
        }))
        .unwrap();

        assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
        assert_eq!(outcome.user().id, id);
        assert_eq!(outcome.user().name().as_deref(), Some("Aline"));
    }

    #[test]
    fn sign_up_without_session_waits_for_confirmation() {
        let id = Uuid::new_v4();
        let outcome = parse_sign_up(json!({ "id": id, "email": "a@ur.ac.rw" })).unwrap();

        assert!(matches!(outcome, SignUpOutcome::ConfirmationPending(_)));
        assert_eq!(outcome.user().phone(), None);
    }

    #[test]
    fn error_body_prefers_description() {
        let body: AuthErrorBody = serde_json::from_value(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));
    }
}
