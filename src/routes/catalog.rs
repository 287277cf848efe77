//! Public storefront: products, reviews, categories and where to send mobile money.

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods, PgTextExpressionMethods,
    QueryDsl, SelectableHelper,
};
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
    domain::feedback::ReviewSummary,
    models::{CategoryEntity, FeedbackEntity, PaymentAccountEntity, ProductEntity},
    schema::{categories, feedback, payment_accounts, products, profiles},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest(
            "/products",
            OpenApiRouter::new()
                .routes(routes!(list_products))
                .routes(routes!(show_product))
                .routes(routes!(get_product_reviews)),
        )
        .routes(routes!(list_categories))
        .routes(routes!(list_payment_accounts))
}

/// `%term%` for ILIKE, with the wildcard characters of `term` escaped.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct ProductsQuery {
    /// Category name to filter by.
    pub category: Option<String>,
    /// Matched against the name and description.
    pub search: Option<String>,
}

/// List active products, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Catalog"],
    params(ProductsQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn list_products(
    Query(query): Query<ProductsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut products_query = products::table
        .filter(products::is_active.eq(true))
        .select(ProductEntity::as_select())
        .into_boxed();

    if let Some(category) = query.category.filter(|c| !c.trim().is_empty()) {
        products_query = products_query.filter(products::category.eq(category));
    }
    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(&search);
        products_query = products_query.filter(
            products::name
                .ilike(pattern.clone())
                .or(products::description.assume_not_null().ilike(pattern)),
        );
    }

    let products: Vec<ProductEntity> = products_query
        .order_by(products::created_at.desc())
        .load(conn)
        .await
        .context("Failed to get products")?;

    Ok(StdResponse {
        data: Some(products),
        message: Some("Get products successfully"),
    })
}

/// Fetch an active product.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Catalog"],
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found or inactive")
    )
)]
async fn show_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = products::table
        .find(id)
        .filter(products::is_active.eq(true))
        .select(ProductEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}

#[derive(Serialize, ToSchema)]
pub struct Review {
    pub review: FeedbackEntity,
    pub reviewer_name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductReviews {
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

impl ProductReviews {
    /// Keeps the public reviews among a product's feedback and summarizes their ratings.
    fn from_rows(rows: Vec<(FeedbackEntity, Option<String>)>) -> Self {
        let reviews: Vec<Review> = rows
            .into_iter()
            .filter(|(review, _)| review.is_public_review())
            .map(|(review, reviewer_name)| Review {
                review,
                reviewer_name,
            })
            .collect();
        let summary = ReviewSummary::from_ratings(reviews.iter().map(|r| r.review.rating));
        Self { summary, reviews }
    }
}

/// Product reviews an admin has seen, with their rating summary.
#[utoipa::path(
    get,
    path = "/{id}/reviews",
    tags = ["Catalog"],
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get reviews successfully", body = StdResponse<ProductReviews, String>)
    )
)]
async fn get_product_reviews(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rows: Vec<(FeedbackEntity, Option<String>)> = feedback::table
        .inner_join(profiles::table)
        .filter(feedback::product_id.eq(id))
        .order_by(feedback::created_at.desc())
        .select((FeedbackEntity::as_select(), profiles::name))
        .load(conn)
        .await
        .context("Failed to get reviews")?;

    Ok(StdResponse {
        data: Some(ProductReviews::from_rows(rows)),
        message: Some("Get reviews successfully"),
    })
}

/// Active categories in display order.
#[utoipa::path(
    get,
    path = "/categories",
    tags = ["Catalog"],
    responses(
        (status = 200, description = "List categories", body = StdResponse<Vec<CategoryEntity>, String>)
    )
)]
async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let categories: Vec<CategoryEntity> = categories::table
        .filter(categories::is_active.eq(true))
        .order_by((categories::display_order.asc(), categories::name.asc()))
        .select(CategoryEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get categories")?;

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Get categories successfully"),
    })
}

/// Active mobile money accounts customers can pay into.
#[utoipa::path(
    get,
    path = "/payment-accounts",
    tags = ["Catalog"],
    responses(
        (status = 200, description = "List payment accounts", body = StdResponse<Vec<PaymentAccountEntity>, String>)
    )
)]
async fn list_payment_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let accounts: Vec<PaymentAccountEntity> = payment_accounts::table
        .filter(payment_accounts::is_active.eq(true))
        .order_by(payment_accounts::display_order.asc())
        .select(PaymentAccountEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get payment accounts")?;

    Ok(StdResponse {
        data: Some(accounts),
        message: Some("Get payment accounts successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" phone "), "%phone%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    fn entry(feedback_type: &str, status: &str, rating: i32) -> (FeedbackEntity, Option<String>) {
        let review = FeedbackEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Some(Uuid::new_v4()),
            feedback_type: feedback_type.into(),
            rating,
            comment: "Works as described".into(),
            status: status.into(),
            admin_response: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (review, Some("Aline".into()))
    }

    #[test]
    fn reviews_only_count_seen_product_reviews() {
        let reviews = ProductReviews::from_rows(vec![
            entry("product", "reviewed", 5),
            entry("product", "resolved", 4),
            entry("product", "pending", 2),
            entry("bug", "reviewed", 1),
            entry("general", "resolved", 1),
        ]);

        assert_eq!(reviews.reviews.len(), 2);
        assert_eq!(reviews.summary.total, 2);
        assert_eq!(reviews.summary.average, 4.5);
        assert_eq!(reviews.summary.distribution, [0, 0, 0, 1, 1]);
    }
}
