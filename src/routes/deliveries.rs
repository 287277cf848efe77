//! Orders on their way to customers, handled by delivery staff and admins.

use std::collections::HashMap;

use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    domain::status::OrderStatus,
    models::OrderEntity,
    routes::orders::{OrderItemDetail, StatusScope, change_status, fetch_order_details},
    schema::{orders, profiles},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/deliveries",
        OpenApiRouter::new()
            .routes(routes!(get_deliveries))
            .routes(routes!(update_delivery_status))
            .route_layer(axum::middleware::from_fn(
                middleware::couriers_authorization,
            )),
    )
}

#[derive(Serialize, ToSchema)]
pub struct Delivery {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemDetail>,
    pub customer_name: Option<String>,
    pub customer_email: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeliveriesRes {
    pub deliveries: Vec<Delivery>,
    /// Sourced orders waiting to be dispatched.
    pub ready: usize,
    pub out_for_delivery: usize,
}

impl DeliveriesRes {
    fn new(deliveries: Vec<Delivery>) -> Self {
        let count = |stage: OrderStatus| {
            deliveries
                .iter()
                .filter(|delivery| delivery.order.status == stage.as_str())
                .count()
        };
        Self {
            ready: count(OrderStatus::Sourced),
            out_for_delivery: count(OrderStatus::OutForDelivery),
            deliveries,
        }
    }
}

/// Orders that are sourced or out for delivery, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Deliveries"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List deliveries", body = StdResponse<DeliveriesRes, String>)
    )
)]
async fn get_deliveries(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let stages: Vec<&str> = OrderStatus::ALL
        .iter()
        .filter(|status| status.is_delivery_stage())
        .map(|status| status.as_str())
        .collect();

    let rows: Vec<(OrderEntity, Option<String>, String)> = orders::table
        .inner_join(profiles::table)
        .filter(orders::status.eq_any(stages))
        .order_by(orders::created_at.desc())
        .select((OrderEntity::as_select(), profiles::name, profiles::email))
        .load(conn)
        .await
        .context("Failed to get deliveries")?;

    let mut customers: HashMap<Uuid, (Option<String>, String)> = HashMap::new();
    let orders: Vec<OrderEntity> = rows
        .into_iter()
        .map(|(order, name, email)| {
            customers.insert(order.id, (name, email));
            order
        })
        .collect();

    let deliveries: Vec<Delivery> = fetch_order_details(conn, orders)
        .await?
        .into_iter()
        .map(|detail| {
            let (customer_name, customer_email) =
                customers.remove(&detail.order.id).unwrap_or_default();
            Delivery {
                order: detail.order,
                order_items: detail.order_items,
                customer_name,
                customer_email,
            }
        })
        .collect();

    Ok(StdResponse {
        data: Some(DeliveriesRes::new(deliveries)),
        message: Some("Get deliveries successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct UpdateDeliveryStatusReq {
    pub status: OrderStatus,
}

/// Dispatch a sourced order or mark it delivered.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Deliveries"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = UpdateDeliveryStatusReq,
    responses(
        (status = 200, description = "Delivery status updated", body = StdResponse<OrderEntity, String>),
        (status = 403, description = "Order is not in a delivery stage"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed from the current status")
    )
)]
async fn update_delivery_status(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<UpdateDeliveryStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let order = change_status(conn, id, body.status, StatusScope::DeliveryStages).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Delivery status updated"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn delivery(status: OrderStatus) -> Delivery {
        Delivery {
            order: OrderEntity {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                status: status.to_string(),
                payment_method: "COD".into(),
                payment_provider: Some("CASH".into()),
                payment_name: None,
                payment_phone: None,
                payment_status: None,
                total_amount: 2000.0,
                deposit_amount: 0.0,
                balance_due: 2000.0,
                delivery_address: "Remera Campus, Block A".into(),
                phone: "0788123456".into(),
                profit: 0.0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            order_items: Vec::new(),
            customer_name: Some("Eric Mugisha".into()),
            customer_email: "eric@example.com".into(),
        }
    }

    #[test]
    fn counts_orders_per_delivery_stage() {
        let res = DeliveriesRes::new(vec![
            delivery(OrderStatus::Sourced),
            delivery(OrderStatus::OutForDelivery),
            delivery(OrderStatus::Sourced),
        ]);

        assert_eq!(res.ready, 2);
        assert_eq!(res.out_for_delivery, 1);
        assert_eq!(res.deliveries.len(), 3);
    }
}
