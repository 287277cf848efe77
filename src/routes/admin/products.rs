use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods, PgTextExpressionMethods,
    QueryDsl, SelectableHelper,
};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::{
        pricing,
        validation::{FieldError, Validator, non_blank},
    },
    models::{ProductEntity, SaveProductEntity},
    routes::catalog::like_pattern,
    schema::products,
};

/// Shown when a product is saved without an image.
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=400&fit=crop";

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(routes!(get_products, create_product))
            .routes(routes!(get_product, update_product, delete_product)),
    )
}

#[derive(Deserialize, ToSchema)]
struct SaveProductReq {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Defaults to 30% of the price when omitted or zero.
    pub deposit_amount: Option<f64>,
    pub supplier_price: Option<f64>,
    pub category: String,
    /// Defaults to a stock image.
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SaveProductReq {
    fn into_entity(self) -> Result<SaveProductEntity, Vec<FieldError>> {
        let mut validator = Validator::new();
        validator
            .required("name", Some(self.name.as_str()))
            .required("category", Some(self.category.as_str()))
            .check(
                self.price.is_finite() && self.price > 0.0,
                "price",
                "price must be greater than zero",
            );
        if let Some(deposit) = self.deposit_amount {
            validator.amount("deposit_amount", deposit).check(
                deposit <= self.price,
                "deposit_amount",
                "deposit_amount cannot exceed the price",
            );
        }
        if let Some(supplier_price) = self.supplier_price {
            validator.amount("supplier_price", supplier_price);
        }
        validator.finish()?;

        Ok(SaveProductEntity {
            name: self.name.trim().to_string(),
            description: non_blank(self.description),
            deposit_amount: Some(pricing::unit_deposit(self.price, self.deposit_amount)),
            price: self.price,
            supplier_price: self.supplier_price,
            category: self.category.trim().to_string(),
            image_url: Some(
                non_blank(self.image_url).unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
            ),
            is_active: self.is_active,
            updated_at: chrono::Utc::now(),
        })
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct AdminProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

/// List every product, active or not, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Products"],
    security(("bearerAuth" = [])),
    params(AdminProductsQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductEntity>, String>)
    )
)]
async fn get_products(
    Query(query): Query<AdminProductsQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut products_query = products::table
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

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin Products"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to fetch")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn get_product(
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
        .select(ProductEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin Products"],
    security(("bearerAuth" = [])),
    request_body = SaveProductReq,
    responses(
        (status = 200, description = "Product created", body = StdResponse<ProductEntity, String>),
        (status = 422, description = "Invalid product")
    )
)]
async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<SaveProductReq>,
) -> Result<impl IntoResponse, AppError> {
    let values = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::insert_into(products::table)
        .values(values)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(product_id = %product.id, "Product created");

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product created"),
    })
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin Products"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to update")
    ),
    request_body = SaveProductReq,
    responses(
        (status = 200, description = "Product updated", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Invalid product")
    )
)]
async fn update_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<SaveProductReq>,
) -> Result<impl IntoResponse, AppError> {
    let values = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::update(products::table.find(id))
        .set(values)
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(product_id = %product.id, "Product updated");

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product updated"),
    })
}

/// Hard-delete a product. Products that were ordered cannot be deleted, deactivate them instead.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Products"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Product ID to delete")
    ),
    responses(
        (status = 200, description = "Product deleted", body = StdResponse<ProductEntity, String>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product is referenced by orders")
    )
)]
async fn delete_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = diesel::delete(products::table.find(id))
        .returning(ProductEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(product_id = %product.id, "Product deleted");

    Ok(StdResponse {
        data: Some(product),
        message: Some("Product deleted"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(price: f64, deposit_amount: Option<f64>) -> SaveProductReq {
        SaveProductReq {
            name: " Desk lamp ".into(),
            description: Some("  ".into()),
            price,
            deposit_amount,
            supplier_price: Some(8000.0),
            category: "Electronics".into(),
            image_url: None,
            is_active: true,
        }
    }

    #[test]
    fn fills_defaults() {
        let entity = req(10000.0, None).into_entity().unwrap();
        assert_eq!(entity.name, "Desk lamp");
        assert_eq!(entity.description, None);
        assert_eq!(entity.deposit_amount, Some(3000.0));
        assert_eq!(entity.image_url.as_deref(), Some(DEFAULT_PRODUCT_IMAGE));
    }

    #[test]
    fn keeps_explicit_deposit() {
        let entity = req(10000.0, Some(2500.0)).into_entity().unwrap();
        assert_eq!(entity.deposit_amount, Some(2500.0));
    }

    #[test]
    fn rejects_bad_amounts() {
        let errors = req(0.0, None).into_entity().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "price"));

        let errors = req(1000.0, Some(2000.0)).into_entity().unwrap_err();
        assert!(errors.iter().any(|e| e.field == "deposit_amount"));
    }
}
