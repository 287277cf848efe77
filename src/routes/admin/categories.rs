use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper, dsl::max};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::{
        ordering::{self, MoveDirection},
        validation::{FieldError, Validator, non_blank, slugify},
    },
    models::{CategoryEntity, SaveCategoryEntity},
    schema::categories,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/categories",
        OpenApiRouter::new()
            .routes(routes!(get_categories, create_category))
            .routes(routes!(get_category, update_category, delete_category))
            .routes(routes!(move_category)),
    )
}

async fn ordered_categories(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<CategoryEntity>, AppError> {
    let categories = categories::table
        .order_by((categories::display_order.asc(), categories::name.asc()))
        .select(CategoryEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get categories")?;
    Ok(categories)
}

#[derive(Deserialize, ToSchema)]
struct SaveCategoryReq {
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// Appended after the last category when omitted on create, kept on update.
    pub display_order: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SaveCategoryReq {
    fn into_entity(self, fallback_order: i32) -> Result<SaveCategoryEntity, Vec<FieldError>> {
        let slug = non_blank(self.slug)
            .map(|slug| slugify(&slug))
            .unwrap_or_else(|| slugify(&self.name));
        Validator::new()
            .required("name", Some(self.name.as_str()))
            .check(!slug.is_empty(), "slug", "slug must contain letters or digits")
            .finish()?;

        Ok(SaveCategoryEntity {
            name: self.name.trim().to_string(),
            slug,
            description: non_blank(self.description),
            icon: non_blank(self.icon),
            display_order: self.display_order.unwrap_or(fallback_order),
            is_active: self.is_active,
            updated_at: chrono::Utc::now(),
        })
    }
}

/// All categories in display order.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List categories", body = StdResponse<Vec<CategoryEntity>, String>)
    )
)]
async fn get_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let categories = ordered_categories(conn).await?;

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Get categories successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to fetch")
    ),
    responses(
        (status = 200, description = "Get category successfully", body = StdResponse<CategoryEntity, String>),
        (status = 404, description = "Category not found")
    )
)]
async fn get_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: CategoryEntity = categories::table
        .find(id)
        .select(CategoryEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(category),
        message: Some("Get category successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    request_body = SaveCategoryReq,
    responses(
        (status = 200, description = "Category created", body = StdResponse<CategoryEntity, String>),
        (status = 409, description = "Slug already used"),
        (status = 422, description = "Invalid category")
    )
)]
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<SaveCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let last: Option<i32> = categories::table
        .select(max(categories::display_order))
        .get_result(conn)
        .await
        .context("Failed to get the last display order")?;
    let values = body.into_entity(last.unwrap_or(0) + 1)?;

    let category: CategoryEntity = diesel::insert_into(categories::table)
        .values(values)
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(category_id = %category.id, "Category created");

    Ok(StdResponse {
        data: Some(category),
        message: Some("Category created"),
    })
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to update")
    ),
    request_body = SaveCategoryReq,
    responses(
        (status = 200, description = "Category updated", body = StdResponse<CategoryEntity, String>),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Invalid category")
    )
)]
async fn update_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<SaveCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let current: i32 = categories::table
        .find(id)
        .select(categories::display_order)
        .get_result(conn)
        .await?;
    let values = body.into_entity(current)?;

    let category: CategoryEntity = diesel::update(categories::table.find(id))
        .set(values)
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(category_id = %category.id, "Category updated");

    Ok(StdResponse {
        data: Some(category),
        message: Some("Category updated"),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to delete")
    ),
    responses(
        (status = 200, description = "Category deleted", body = StdResponse<CategoryEntity, String>),
        (status = 404, description = "Category not found")
    )
)]
async fn delete_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let category: CategoryEntity = diesel::delete(categories::table.find(id))
        .returning(CategoryEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(category_id = %category.id, "Category deleted");

    Ok(StdResponse {
        data: Some(category),
        message: Some("Category deleted"),
    })
}

#[derive(Deserialize, ToSchema)]
struct MoveCategoryReq {
    pub direction: MoveDirection,
}

/// Swap a category with its neighbour in display order. Returns the reordered list.
#[utoipa::path(
    post,
    path = "/{id}/move",
    tags = ["Admin Categories"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Category ID to move")
    ),
    request_body = MoveCategoryReq,
    responses(
        (status = 200, description = "Category moved", body = StdResponse<Vec<CategoryEntity>, String>),
        (status = 404, description = "Category not found")
    )
)]
async fn move_category(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<MoveCategoryReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let direction = body.direction;
    let categories = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let entries: Vec<(Uuid, i32)> = categories::table
                    .order_by((categories::display_order.asc(), categories::name.asc()))
                    .select((categories::id, categories::display_order))
                    .for_update()
                    .load(conn)
                    .await?;
                if !entries.iter().any(|(entry, _)| *entry == id) {
                    return Err(AppError::NotFound);
                }

                let writes = ordering::plan_move(&entries, id, direction);
                for (category_id, display_order) in writes.iter().copied() {
                    diesel::update(categories::table.find(category_id))
                        .set((
                            categories::display_order.eq(display_order),
                            categories::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;
                }
                if !writes.is_empty() {
                    tracing::info!(category_id = %id, %direction, "Category moved");
                }

                ordered_categories(conn).await
            })
        })
        .await?;

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Category order updated"),
    })
}
