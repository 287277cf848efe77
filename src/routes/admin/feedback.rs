use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, NullableExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::{
        feedback::FeedbackStatus,
        validation::{Validator, non_blank},
    },
    models::FeedbackEntity,
    schema::{feedback, products, profiles},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/feedback",
        OpenApiRouter::new()
            .routes(routes!(get_feedback))
            .routes(routes!(delete_feedback))
            .routes(routes!(update_feedback_status))
            .routes(routes!(respond_to_feedback)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct AdminFeedback {
    pub feedback: FeedbackEntity,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub product_name: Option<String>,
}

impl AdminFeedback {
    fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        let contains = |value: &str| value.to_lowercase().contains(&term);
        term.is_empty()
            || contains(&self.feedback.comment)
            || contains(&self.customer_email)
            || self.customer_name.as_deref().is_some_and(contains)
            || self.product_name.as_deref().is_some_and(contains)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct AdminFeedbackQuery {
    pub status: Option<FeedbackStatus>,
    /// Matched against the comment, customer and product.
    pub search: Option<String>,
}

/// List feedback, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Feedback"],
    security(("bearerAuth" = [])),
    params(AdminFeedbackQuery),
    responses(
        (status = 200, description = "List feedback", body = StdResponse<Vec<AdminFeedback>, String>)
    )
)]
async fn get_feedback(
    Query(query): Query<AdminFeedbackQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut feedback_query = feedback::table
        .inner_join(profiles::table)
        .left_join(products::table)
        .select((
            FeedbackEntity::as_select(),
            profiles::name,
            profiles::email,
            products::name.nullable(),
        ))
        .into_boxed();
    if let Some(status) = query.status {
        feedback_query = feedback_query.filter(feedback::status.eq(status.as_str()));
    }

    let rows: Vec<(FeedbackEntity, Option<String>, String, Option<String>)> = feedback_query
        .order_by(feedback::created_at.desc())
        .load(conn)
        .await
        .context("Failed to get feedback")?;

    let search = query.search.unwrap_or_default();
    let entries: Vec<AdminFeedback> = rows
        .into_iter()
        .map(
            |(feedback, customer_name, customer_email, product_name)| AdminFeedback {
                feedback,
                customer_name,
                customer_email,
                product_name,
            },
        )
        .filter(|entry| entry.matches(&search))
        .collect();

    Ok(StdResponse {
        data: Some(entries),
        message: Some("Get feedback successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateFeedbackStatusReq {
    pub status: FeedbackStatus,
}

/// Set the review status. Reviewed and resolved product reviews are shown on the product page.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Admin Feedback"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Feedback ID to update")
    ),
    request_body = UpdateFeedbackStatusReq,
    responses(
        (status = 200, description = "Feedback status updated", body = StdResponse<FeedbackEntity, String>),
        (status = 404, description = "Feedback not found")
    )
)]
async fn update_feedback_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateFeedbackStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let entry: FeedbackEntity = diesel::update(feedback::table.find(id))
        .set((
            feedback::status.eq(body.status.as_str()),
            feedback::updated_at.eq(diesel::dsl::now),
        ))
        .returning(FeedbackEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(feedback_id = %entry.id, status = %body.status, "Feedback status updated");

    Ok(StdResponse {
        data: Some(entry),
        message: Some("Feedback status updated"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RespondReq {
    pub response: String,
}

/// Reply to feedback. Replying resolves it.
#[utoipa::path(
    post,
    path = "/{id}/response",
    tags = ["Admin Feedback"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Feedback ID to answer")
    ),
    request_body = RespondReq,
    responses(
        (status = 200, description = "Response saved", body = StdResponse<FeedbackEntity, String>),
        (status = 404, description = "Feedback not found"),
        (status = 422, description = "Empty response")
    )
)]
async fn respond_to_feedback(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<RespondReq>,
) -> Result<impl IntoResponse, AppError> {
    let response = non_blank(Some(body.response));
    Validator::new()
        .required("response", response.as_deref())
        .finish()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let entry: FeedbackEntity = diesel::update(feedback::table.find(id))
        .set((
            feedback::admin_response.eq(response),
            feedback::status.eq(FeedbackStatus::Resolved.as_str()),
            feedback::updated_at.eq(diesel::dsl::now),
        ))
        .returning(FeedbackEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(feedback_id = %entry.id, "Feedback answered");

    Ok(StdResponse {
        data: Some(entry),
        message: Some("Response saved"),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Feedback"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Feedback ID to delete")
    ),
    responses(
        (status = 200, description = "Feedback deleted", body = StdResponse<FeedbackEntity, String>),
        (status = 404, description = "Feedback not found")
    )
)]
async fn delete_feedback(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let entry: FeedbackEntity = diesel::delete(feedback::table.find(id))
        .returning(FeedbackEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(feedback_id = %entry.id, "Feedback deleted");

    Ok(StdResponse {
        data: Some(entry),
        message: Some("Feedback deleted"),
    })
}
