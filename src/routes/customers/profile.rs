use anyhow::Context;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::CurrentUser,
    },
    domain::validation::{Validator, is_contact_number, non_blank},
    models::{ProfileEntity, UpdateProfileEntity},
    schema::profiles,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/profile",
        OpenApiRouter::new().routes(routes!(get_profile, update_profile)),
    )
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Profile"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get profile successfully", body = StdResponse<ProfileEntity, String>)
    )
)]
async fn get_profile(Extension(user): Extension<CurrentUser>) -> Result<impl IntoResponse, AppError> {
    Ok(StdResponse {
        data: Some(user.profile),
        message: Some("Get profile successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateProfileReq {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Update the caller's name and phone. Omitted fields are left unchanged.
#[utoipa::path(
    patch,
    path = "/",
    tags = ["Profile"],
    security(("bearerAuth" = [])),
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = StdResponse<ProfileEntity, String>),
        (status = 422, description = "Invalid phone number")
    )
)]
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateProfileReq>,
) -> Result<impl IntoResponse, AppError> {
    let name = non_blank(body.name);
    let phone = non_blank(body.phone);
    Validator::new()
        .check(
            phone.as_deref().is_none_or(is_contact_number),
            "phone",
            "phone must have at least 10 characters",
        )
        .finish()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let profile: ProfileEntity = diesel::update(profiles::table.find(user.id()))
        .set(UpdateProfileEntity {
            name,
            phone,
            updated_at: chrono::Utc::now(),
        })
        .returning(ProfileEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(user_id = %profile.id, "Profile updated");

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Profile updated"),
    })
}
