use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::CurrentUser,
    },
    domain::{
        cart::{Cart, CartLine, CartProduct},
        payment::PaymentMethod,
        pricing::{self, Quote},
        validation::Validator,
    },
    models::{CartEntity, CreateCartEntity, ProductEntity},
    schema::{carts, products},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/cart",
        OpenApiRouter::new()
            .routes(routes!(get_cart, clear_cart))
            .routes(routes!(add_item))
            .routes(routes!(update_item, remove_item))
            .routes(routes!(get_quote)),
    )
}

/// Reads the stored cart without locking it. A user without a row has an empty cart.
pub(crate) async fn load_cart(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<Cart, AppError> {
    let cart: Option<CartEntity> = carts::table
        .find(user_id)
        .select(CartEntity::as_select())
        .get_result(conn)
        .await
        .optional()?;

    match cart {
        Some(cart) => Ok(Cart::from_value(cart.items).context("Stored cart is malformed")?),
        None => Ok(Cart::default()),
    }
}

/// Locks the user's cart row until the surrounding transaction ends, creating it if needed.
pub(crate) async fn lock_cart(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> Result<Cart, AppError> {
    diesel::insert_into(carts::table)
        .values(CreateCartEntity {
            user_id,
            items: serde_json::Value::Array(vec![]),
        })
        .on_conflict(carts::user_id)
        .do_nothing()
        .execute(conn)
        .await?;

    let cart: CartEntity = carts::table
        .find(user_id)
        .select(CartEntity::as_select())
        .for_update()
        .get_result(conn)
        .await?;

    Ok(Cart::from_value(cart.items).context("Stored cart is malformed")?)
}

pub(crate) async fn save_cart(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    cart: &Cart,
) -> Result<(), AppError> {
    let items = cart.to_value().context("Failed to serialize cart")?;
    diesel::update(carts::table.find(user_id))
        .set((
            carts::items.eq(items),
            carts::updated_at.eq(diesel::dsl::now),
        ))
        .execute(conn)
        .await?;
    Ok(())
}

/// Applies `change` to the locked cart and stores the result.
async fn mutate_cart<F>(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    change: F,
) -> Result<Cart, AppError>
where
    F: FnOnce(&mut Cart) -> Result<(), AppError> + Send + 'static,
{
    conn.transaction(move |conn| {
        Box::pin(async move {
            let mut cart = lock_cart(conn, user_id).await?;
            change(&mut cart)?;
            save_cart(conn, user_id, &cart).await?;
            Ok::<Cart, AppError>(cart)
        })
    })
    .await
}

#[derive(Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub count: i32,
    pub total: f64,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            count: cart.count(),
            total: cart.total(),
            items: cart.items,
        }
    }
}

/// Fetch the caller's cart.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Get cart successfully", body = StdResponse<CartView, String>)
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = load_cart(conn, user.id()).await?;

    Ok(StdResponse {
        data: Some(CartView::from(cart)),
        message: Some("Get cart successfully"),
    })
}

/// Remove every line from the caller's cart.
#[utoipa::path(
    delete,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Cart cleared", body = StdResponse<CartView, String>)
    )
)]
async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = mutate_cart(conn, user.id(), |cart| {
        cart.clear();
        Ok(())
    })
    .await?;

    Ok(StdResponse {
        data: Some(CartView::from(cart)),
        message: Some("Cart cleared"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddItemReq {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Add a product to the cart, merging with an existing line for the same product.
#[utoipa::path(
    post,
    path = "/items",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = AddItemReq,
    responses(
        (status = 200, description = "Item added", body = StdResponse<CartView, String>),
        (status = 404, description = "Product not found or inactive")
    )
)]
async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<AddItemReq>,
) -> Result<impl IntoResponse, AppError> {
    Validator::new()
        .check(body.quantity > 0, "quantity", "quantity must be at least 1")
        .finish()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let product: ProductEntity = products::table
        .find(body.product_id)
        .filter(products::is_active.eq(true))
        .select(ProductEntity::as_select())
        .get_result(conn)
        .await?;

    let snapshot = CartProduct::from(&product);
    let quantity = body.quantity;
    let cart = mutate_cart(conn, user.id(), move |cart| {
        cart.add(snapshot, quantity);
        Ok(())
    })
    .await?;

    Ok(StdResponse {
        data: Some(CartView::from(cart)),
        message: Some("Item added to cart"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateItemReq {
    pub quantity: i32,
}

/// Set the quantity of a cart line. Zero or less removes the line.
#[utoipa::path(
    patch,
    path = "/items/{product_id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(
        ("product_id" = Uuid, Path, description = "Product of the cart line")
    ),
    request_body = UpdateItemReq,
    responses(
        (status = 200, description = "Cart line updated", body = StdResponse<CartView, String>),
        (status = 404, description = "Product is not in the cart")
    )
)]
async fn update_item(
    Path(product_id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<UpdateItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = mutate_cart(conn, user.id(), move |cart| {
        if cart.update_quantity(product_id, body.quantity) {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    })
    .await?;

    Ok(StdResponse {
        data: Some(CartView::from(cart)),
        message: Some("Cart line updated"),
    })
}

/// Remove a product from the cart.
#[utoipa::path(
    delete,
    path = "/items/{product_id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(
        ("product_id" = Uuid, Path, description = "Product of the cart line")
    ),
    responses(
        (status = 200, description = "Cart line removed", body = StdResponse<CartView, String>),
        (status = 404, description = "Product is not in the cart")
    )
)]
async fn remove_item(
    Path(product_id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = mutate_cart(conn, user.id(), move |cart| {
        if cart.remove(product_id) {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    })
    .await?;

    Ok(StdResponse {
        data: Some(CartView::from(cart)),
        message: Some("Cart line removed"),
    })
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct QuoteQuery {
    pub payment_method: PaymentMethod,
}

/// Preview the totals of checking out the current cart with a payment method.
#[utoipa::path(
    get,
    path = "/quote",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(QuoteQuery),
    responses(
        (status = 200, description = "Quote computed", body = StdResponse<Quote, String>)
    )
)]
async fn get_quote(
    Query(query): Query<QuoteQuery>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let cart = load_cart(conn, user.id()).await?;

    Ok(StdResponse {
        data: Some(pricing::quote(&cart.items, query.payment_method)),
        message: Some("Quote computed"),
    })
}
