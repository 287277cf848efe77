use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
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
        checkout::{CheckoutInput, CheckoutPlan},
        payment::PaymentStatus,
        validation::FieldError,
    },
    models::{
        CreateOrderEntity, CreateOrderItemEntity, CreatePaymentEntity, OrderEntity,
        ProductEntity,
    },
    routes::{
        customers::carts::{lock_cart, save_cart},
        orders::{OrderDetail, fetch_order_detail, fetch_order_details},
    },
    schema::{order_items, orders, payments, products},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(routes!(create_order, get_my_orders))
            .routes(routes!(get_my_order)),
    )
}

/// Rebuilds the cart lines from the live catalog so orders are priced at current prices.
async fn reprice_cart(
    conn: &mut AsyncPgConnection,
    cart: &Cart,
) -> Result<Vec<CartLine>, AppError> {
    let live: HashMap<Uuid, ProductEntity> = products::table
        .filter(products::id.eq_any(cart.product_ids()))
        .filter(products::is_active.eq(true))
        .select(ProductEntity::as_select())
        .load(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut unavailable = Vec::new();
    let mut lines = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        match live.get(&line.product.id) {
            Some(product) => lines.push(CartLine {
                product: CartProduct::from(product),
                quantity: line.quantity,
            }),
            None => unavailable.push(FieldError {
                field: "cart".into(),
                message: format!("{} is no longer available", line.product.name),
            }),
        }
    }

    if unavailable.is_empty() {
        Ok(lines)
    } else {
        Err(AppError::Validation(unavailable))
    }
}

async fn insert_order(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    plan: CheckoutPlan,
    lines: &[CartLine],
) -> Result<OrderEntity, AppError> {
    let quote = plan.quote;
    let order: OrderEntity = diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            user_id,
            status: plan.status.to_string(),
            payment_method: quote.payment_method.to_string(),
            payment_provider: plan.payment_provider.map(|p| p.to_string()),
            payment_name: plan.payment_name,
            payment_phone: plan.payment_phone,
            payment_status: plan.payment_status.map(|s| s.to_string()),
            total_amount: quote.total_amount,
            deposit_amount: quote.deposit_amount,
            balance_due: quote.balance_due,
            delivery_address: plan.delivery_address,
            phone: plan.phone,
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await?;

    let items: Vec<CreateOrderItemEntity> = lines
        .iter()
        .map(|line| CreateOrderItemEntity {
            order_id: order.id,
            product_id: line.product.id,
            quantity: line.quantity,
            unit_price: line.product.price,
            supplier_price: line.product.supplier_price,
            subtotal: line.line_total(),
        })
        .collect();

    diesel::insert_into(order_items::table)
        .values(items)
        .execute(conn)
        .await?;

    if let Some(payment) = plan.payment {
        diesel::insert_into(payments::table)
            .values(CreatePaymentEntity {
                order_id: order.id,
                provider: payment.provider.to_string(),
                amount: payment.amount,
                payer_name: payment.payer_name,
                payer_phone: payment.payer_phone,
                status: PaymentStatus::Pending.to_string(),
            })
            .execute(conn)
            .await?;
    }

    Ok(order)
}

/// Check out the caller's cart.
///
/// The order, its items, the pending payment and the emptied cart are written together or not
/// at all.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    request_body = CheckoutInput,
    responses(
        (status = 200, description = "Order placed", body = StdResponse<OrderDetail, String>),
        (status = 422, description = "Checkout form or cart is invalid")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CheckoutInput>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let user_id = user.id();
    let order = conn
        .transaction(move |conn| {
            Box::pin(async move {
                let mut cart = lock_cart(conn, user_id).await?;
                let lines = reprice_cart(conn, &cart).await?;
                let plan = body.plan(&lines)?;

                let order = insert_order(conn, user_id, plan, &lines).await?;

                cart.clear();
                save_cart(conn, user_id, &cart).await?;

                Ok::<OrderEntity, AppError>(order)
            })
        })
        .await?;

    tracing::info!(order_id = %order.id, %user_id, total = order.total_amount, "Order placed");

    let detail = fetch_order_detail(conn, order).await?;

    Ok(StdResponse {
        data: Some(detail),
        message: Some("Order placed successfully"),
    })
}

/// Fetch all orders of the caller, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List my orders", body = StdResponse<Vec<OrderDetail>, String>)
    )
)]
async fn get_my_orders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let orders: Vec<OrderEntity> = orders::table
        .filter(orders::user_id.eq(user.id()))
        .order_by(orders::created_at.desc())
        .select(OrderEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get my orders")?;

    let details = fetch_order_details(conn, orders).await?;

    Ok(StdResponse {
        data: Some(details),
        message: Some("Get my orders successfully"),
    })
}

/// Fetch one of the caller's orders.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderDetail, String>),
        (status = 404, description = "No such order for the caller")
    )
)]
async fn get_my_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
        .filter(orders::user_id.eq(user.id()))
        .select(OrderEntity::as_select())
        .get_result(conn)
        .await?;

    let detail = fetch_order_detail(conn, order).await?;

    Ok(StdResponse {
        data: Some(detail),
        message: Some("Get order successfully"),
    })
}
