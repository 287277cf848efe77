use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper, dsl::count_star};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::{payment::PaymentVerdict, status::OrderStatus},
    models::OrderEntity,
    routes::orders::{
        OrderDetail, OrderItemDetail, StatusScope, change_status, fetch_order_detail,
        fetch_order_details, verify_payment,
    },
    schema::{orders, profiles},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(routes!(get_orders))
            .routes(routes!(get_order))
            .routes(routes!(update_order_status))
            .routes(routes!(verify_order_payment)),
    )
}

#[derive(Serialize, ToSchema)]
pub struct AdminOrder {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemDetail>,
    pub customer_name: Option<String>,
    pub customer_email: String,
}

#[derive(Serialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AdminOrdersRes {
    pub orders: Vec<AdminOrder>,
    /// Orders per status across the whole store, regardless of the filters.
    pub counts: Vec<StatusCount>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct AdminOrdersQuery {
    pub status: Option<OrderStatus>,
    /// Matched against the order id, customer name, phone and delivery address.
    pub search: Option<String>,
}

fn matches_search(order: &OrderEntity, customer_name: Option<&str>, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    term.is_empty()
        || order.id.to_string().contains(&term)
        || order.phone.contains(&term)
        || order.delivery_address.to_lowercase().contains(&term)
        || customer_name.is_some_and(|name| name.to_lowercase().contains(&term))
}

async fn status_counts(conn: &mut AsyncPgConnection) -> Result<Vec<StatusCount>, AppError> {
    let rows: Vec<(String, i64)> = orders::table
        .group_by(orders::status)
        .select((orders::status, count_star()))
        .load(conn)
        .await
        .context("Failed to count orders")?;
    let rows: HashMap<String, i64> = rows.into_iter().collect();

    Ok(OrderStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: rows.get(status.as_str()).copied().unwrap_or(0),
        })
        .collect())
}

/// List orders, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(AdminOrdersQuery),
    responses(
        (status = 200, description = "List orders", body = StdResponse<AdminOrdersRes, String>)
    )
)]
async fn get_orders(
    Query(query): Query<AdminOrdersQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut orders_query = orders::table
        .inner_join(profiles::table)
        .select((OrderEntity::as_select(), profiles::name, profiles::email))
        .into_boxed();
    if let Some(status) = query.status {
        orders_query = orders_query.filter(orders::status.eq(status.as_str()));
    }

    let rows: Vec<(OrderEntity, Option<String>, String)> = orders_query
        .order_by(orders::created_at.desc())
        .load(conn)
        .await
        .context("Failed to get orders")?;

    let search = query.search.unwrap_or_default();
    let mut customers: HashMap<Uuid, (Option<String>, String)> = HashMap::new();
    let mut matching = Vec::new();
    for (order, name, email) in rows {
        if matches_search(&order, name.as_deref(), &search) {
            customers.insert(order.id, (name, email));
            matching.push(order);
        }
    }

    let orders = fetch_order_details(conn, matching)
        .await?
        .into_iter()
        .map(|detail| {
            let (customer_name, customer_email) =
                customers.remove(&detail.order.id).unwrap_or_default();
            AdminOrder {
                order: detail.order,
                order_items: detail.order_items,
                customer_name,
                customer_email,
            }
        })
        .collect();
    let counts = status_counts(conn).await?;

    Ok(StdResponse {
        data: Some(AdminOrdersRes { orders, counts }),
        message: Some("Get orders successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<OrderDetail, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order: OrderEntity = orders::table
        .find(id)
        .select(OrderEntity::as_select())
        .get_result(conn)
        .await?;
    let detail = fetch_order_detail(conn, order).await?;

    Ok(StdResponse {
        data: Some(detail),
        message: Some("Get order successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: OrderStatus,
}

/// Move an order along its lifecycle. Entering DELIVERED records the order's profit.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Order status updated", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed from the current status")
    )
)]
async fn update_order_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = change_status(conn, id, body.status, StatusScope::Any).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Order status updated"),
    })
}

#[derive(Deserialize, ToSchema)]
struct VerifyPaymentReq {
    pub verdict: PaymentVerdict,
}

/// Mark the mobile money payment of an order as verified or rejected.
#[utoipa::path(
    post,
    path = "/{id}/payment/verify",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID whose payment is checked")
    ),
    request_body = VerifyPaymentReq,
    responses(
        (status = 200, description = "Payment decided", body = StdResponse<OrderEntity, String>),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order has no pending mobile money payment")
    )
)]
async fn verify_order_payment(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<VerifyPaymentReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = verify_payment(conn, id, body.verdict).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Payment decided"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order() -> OrderEntity {
        OrderEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: OrderStatus::PendingPayment.to_string(),
            payment_method: "COD".into(),
            payment_provider: Some("CASH".into()),
            payment_name: None,
            payment_phone: None,
            payment_status: None,
            total_amount: 2000.0,
            deposit_amount: 0.0,
            balance_due: 2000.0,
            delivery_address: "Gikondo Campus, Block C".into(),
            phone: "0788123456".into(),
            profit: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn search_covers_id_phone_address_and_name() {
        let order = order();
        let id_prefix = order.id.to_string()[..8].to_uppercase();

        assert!(matches_search(&order, None, ""));
        assert!(matches_search(&order, None, &id_prefix));
        assert!(matches_search(&order, None, "0788"));
        assert!(matches_search(&order, None, "block c"));
        assert!(matches_search(&order, Some("Aline Uwase"), "uwase"));
        assert!(!matches_search(&order, Some("Aline Uwase"), "kigali"));
    }
}
