use anyhow::Context;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::CurrentUser,
    },
    domain::{
        feedback::{FeedbackInput, FeedbackStatus},
        validation::FieldError,
    },
    models::{CreateFeedbackEntity, FeedbackEntity},
    schema::{feedback, products},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/feedback",
        OpenApiRouter::new().routes(routes!(submit_feedback, get_my_feedback)),
    )
}

/// Submit feedback or a product review. It stays pending until an admin reviews it.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Feedback"],
    security(("bearerAuth" = [])),
    request_body = FeedbackInput,
    responses(
        (status = 200, description = "Feedback submitted", body = StdResponse<FeedbackEntity, String>),
        (status = 422, description = "Rating, comment or product is missing")
    )
)]
async fn submit_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<FeedbackInput>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product_id = body.reviewed_product();
    if let Some(product_id) = product_id {
        let found: i64 = products::table
            .find(product_id)
            .count()
            .get_result(conn)
            .await
            .context("Failed to look up product")?;
        if found == 0 {
            return Err(AppError::Validation(vec![FieldError {
                field: "product_id".into(),
                message: "Product does not exist".into(),
            }]));
        }
    }

    let entry: FeedbackEntity = diesel::insert_into(feedback::table)
        .values(CreateFeedbackEntity {
            user_id: user.id(),
            product_id,
            feedback_type: body.feedback_type.to_string(),
            rating: body.rating,
            comment: body.comment.trim().to_string(),
            status: FeedbackStatus::Pending.to_string(),
        })
        .returning(FeedbackEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(feedback_id = %entry.id, user_id = %entry.user_id, "Feedback submitted");

    Ok(StdResponse {
        data: Some(entry),
        message: Some("Thank you for your feedback"),
    })
}

/// Fetch the caller's feedback, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Feedback"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my feedback", body = StdResponse<Vec<FeedbackEntity>, String>)
    )
)]
async fn get_my_feedback(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let entries: Vec<FeedbackEntity> = feedback::table
        .filter(feedback::user_id.eq(user.id()))
        .order_by(feedback::created_at.desc())
        .select(FeedbackEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get my feedback")?;

    Ok(StdResponse {
        data: Some(entries),
        message: Some("Get my feedback successfully"),
    })
}
