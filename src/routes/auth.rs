use anyhow::Context;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    api::auth::{self, AuthSession, SignUpMetadata, SignUpOutcome},
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::{self, CurrentUser, ensure_profile},
    },
    domain::{
        role::Role,
        validation::{Validator, is_contact_number, is_email, non_blank},
    },
    models::ProfileEntity,
};

const MIN_PASSWORD_LEN: usize = 6;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(routes!(sign_up))
        .routes(routes!(sign_in));

    let private = OpenApiRouter::new()
        .routes(routes!(sign_out))
        .routes(routes!(get_session))
        .route_layer(axum::middleware::from_fn(
            middleware::customers_authorization,
        ));

    OpenApiRouter::new().nest("/auth", public.merge(private))
}

#[derive(Serialize, ToSchema)]
pub struct SessionRes {
    /// Absent when the account still has to be confirmed by e-mail.
    pub session: Option<AuthSession>,
    pub profile: ProfileEntity,
}

#[derive(Deserialize, ToSchema)]
struct SignUpReq {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Register a customer account.
#[utoipa::path(
    post,
    path = "/sign-up",
    tags = ["Auth"],
    request_body = SignUpReq,
    responses(
        (status = 200, description = "Account created", body = StdResponse<SessionRes, String>),
        (status = 400, description = "Rejected by the auth service"),
        (status = 422, description = "Invalid form"),
        (status = 503, description = "Auth service unreachable")
    )
)]
async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpReq>,
) -> Result<impl IntoResponse, AppError> {
    let phone = non_blank(body.phone);
    Validator::new()
        .check(is_email(&body.email), "email", "Enter a valid e-mail address")
        .check(
            body.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            format!("password must have at least {MIN_PASSWORD_LEN} characters"),
        )
        .required("name", Some(body.name.as_str()))
        .check(
            phone.as_deref().is_none_or(is_contact_number),
            "phone",
            "phone must have at least 10 characters",
        )
        .finish()?;

    let outcome = auth::sign_up(
        &state.http_client,
        &state.api_urls,
        body.email.trim(),
        &body.password,
        SignUpMetadata {
            name: body.name.trim(),
            phone: phone.as_deref(),
            role: Role::Customer,
        },
    )
    .await?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;
    let profile = ensure_profile(conn, outcome.user()).await?;

    tracing::info!(user_id = %profile.id, "Account created");

    let session = match outcome {
        SignUpOutcome::SignedIn(session) => Some(session),
        SignUpOutcome::ConfirmationPending(_) => None,
    };
    let message = if session.is_some() {
        "Account created"
    } else {
        "Account created, check your e-mail to confirm it"
    };

    Ok(StdResponse {
        data: Some(SessionRes { session, profile }),
        message: Some(message),
    })
}

#[derive(Deserialize, ToSchema)]
struct SignInReq {
    pub email: String,
    pub password: String,
}

/// Sign in with e-mail and password.
#[utoipa::path(
    post,
    path = "/sign-in",
    tags = ["Auth"],
    request_body = SignInReq,
    responses(
        (status = 200, description = "Signed in", body = StdResponse<SessionRes, String>),
        (status = 400, description = "Invalid credentials"),
        (status = 503, description = "Auth service unreachable")
    )
)]
async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInReq>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .required("email", Some(body.email.as_str()))
        .required("password", Some(body.password.as_str()))
        .finish()?;

    let session = auth::sign_in(
        &state.http_client,
        &state.api_urls,
        body.email.trim(),
        &body.password,
    )
    .await?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;
    let profile = ensure_profile(conn, &session.user).await?;

    Ok(StdResponse {
        data: Some(SessionRes {
            session: Some(session),
            profile,
        }),
        message: Some("Signed in"),
    })
}

/// Revoke the caller's session.
#[utoipa::path(
    post,
    path = "/sign-out",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Signed out", body = StdResponse<String, String>)
    )
)]
async fn sign_out(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    auth::sign_out(&state.http_client, &state.api_urls, &user.access_token).await?;

    Ok(StdResponse::<String, &str> {
        data: None,
        message: Some("Signed out"),
    })
}

/// The caller's profile and role.
#[utoipa::path(
    get,
    path = "/session",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current session", body = StdResponse<ProfileEntity, String>),
        (status = 401, description = "Not signed in")
    )
)]
async fn get_session(Extension(user): Extension<CurrentUser>) -> Result<impl IntoResponse, AppError> {
    Ok(StdResponse {
        data: Some(user.profile),
        message: Some("Get session successfully"),
    })
}
