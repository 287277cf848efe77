//! Order read model and status changes shared by the customer, admin and delivery routes.

use std::collections::HashMap;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    app::app_error::AppError,
    domain::{
        payment::{PaymentStatus, PaymentVerdict},
        pricing::{self, ProfitLine},
        status::{self, OrderStatus},
    },
    models::{OrderEntity, OrderItemEntity},
    schema::{order_items, orders, payments, products},
};

#[derive(Serialize, ToSchema, Debug)]
pub struct OrderItemDetail {
    pub order_item: OrderItemEntity,
    pub product_name: String,
    pub image_url: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct OrderDetail {
    pub order: OrderEntity,
    pub order_items: Vec<OrderItemDetail>,
}

/// Attaches items to each order, keeping the order of `orders`.
pub async fn fetch_order_details(
    conn: &mut AsyncPgConnection,
    orders: Vec<OrderEntity>,
) -> Result<Vec<OrderDetail>, AppError> {
    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();

    let rows: Vec<(OrderItemEntity, String, Option<String>)> = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq_any(&order_ids))
        .order_by(order_items::created_at.asc())
        .select((
            OrderItemEntity::as_select(),
            products::name,
            products::image_url,
        ))
        .load(conn)
        .await?;

    let mut group: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for (order_item, product_name, image_url) in rows {
        group
            .entry(order_item.order_id)
            .or_default()
            .push(OrderItemDetail {
                order_item,
                product_name,
                image_url,
            });
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            order_items: group.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

pub async fn fetch_order_detail(
    conn: &mut AsyncPgConnection,
    order: OrderEntity,
) -> Result<OrderDetail, AppError> {
    fetch_order_details(conn, vec![order])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

/// Which current statuses a caller may move an order out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusScope {
    Any,
    DeliveryStages,
}

impl StatusScope {
    fn permits(self, from: OrderStatus) -> bool {
        match self {
            StatusScope::Any => true,
            StatusScope::DeliveryStages => from.is_delivery_stage(),
        }
    }
}

async fn order_profit(conn: &mut AsyncPgConnection, order_id: Uuid) -> Result<f64, AppError> {
    let rows: Vec<(OrderItemEntity, Option<f64>)> = order_items::table
        .inner_join(products::table)
        .filter(order_items::order_id.eq(order_id))
        .select((OrderItemEntity::as_select(), products::supplier_price))
        .load(conn)
        .await?;

    let lines: Vec<ProfitLine> = rows
        .into_iter()
        .map(|(item, live_supplier_price)| ProfitLine {
            product_id: item.product_id,
            unit_price: item.unit_price,
            quantity: item.quantity,
            captured_supplier_price: item.supplier_price,
            live_supplier_price,
        })
        .collect();

    Ok(pricing::profit(order_id, &lines))
}

/// Moves an order to `to`.
///
/// The row is locked for the duration of the transaction and the update only applies while the
/// status is still the one that was validated. Entering DELIVERED stores the profit.
pub async fn change_status(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    to: OrderStatus,
    scope: StatusScope,
) -> Result<OrderEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let order: OrderEntity = orders::table
                .find(id)
                .select(OrderEntity::as_select())
                .for_update()
                .get_result(conn)
                .await?;

            let from = order.order_status()?;
            if !scope.permits(from) {
                return Err(AppError::ForbiddenResource(format!(
                    "Orders in {from} are not handled by delivery staff"
                )));
            }

            let step = status::transition(from, to, order.payment_state()?)?;
            let profit = if step.records_profit() {
                Some(order_profit(conn, id).await?)
            } else {
                None
            };

            let updated: OrderEntity = diesel::update(
                orders::table
                    .find(id)
                    .filter(orders::status.eq(from.as_str())),
            )
            .set((
                orders::status.eq(to.as_str()),
                profit.map(|profit| orders::profit.eq(profit)),
                orders::updated_at.eq(diesel::dsl::now),
            ))
            .returning(OrderEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or_else(|| AppError::Conflict("Order status changed concurrently".into()))?;

            tracing::info!(order_id = %id, %from, %to, ?profit, "Order status changed");
            Ok::<OrderEntity, AppError>(updated)
        })
    })
    .await
}

/// Records the admin's decision on a pending mobile money payment.
pub async fn verify_payment(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    verdict: PaymentVerdict,
) -> Result<OrderEntity, AppError> {
    conn.transaction(move |conn| {
        Box::pin(async move {
            let order: OrderEntity = orders::table
                .find(id)
                .select(OrderEntity::as_select())
                .for_update()
                .get_result(conn)
                .await?;

            let decided =
                status::verify_payment(order.order_status()?, order.payment_state()?, verdict)?;

            diesel::update(
                payments::table
                    .filter(payments::order_id.eq(id))
                    .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
            )
            .set((
                payments::status.eq(decided.as_str()),
                payments::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
            .await?;

            let updated: OrderEntity = diesel::update(orders::table.find(id))
                .set((
                    orders::payment_status.eq(decided.as_str()),
                    orders::updated_at.eq(diesel::dsl::now),
                ))
                .returning(OrderEntity::as_returning())
                .get_result(conn)
                .await?;

            tracing::info!(order_id = %id, payment_status = %decided, "Payment decided");
            Ok::<OrderEntity, AppError>(updated)
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_scope_only_covers_delivery_stages() {
        assert!(StatusScope::DeliveryStages.permits(OrderStatus::Sourced));
        assert!(StatusScope::DeliveryStages.permits(OrderStatus::OutForDelivery));
        assert!(!StatusScope::DeliveryStages.permits(OrderStatus::Confirmed));
        assert!(!StatusScope::DeliveryStages.permits(OrderStatus::Delivered));
        assert!(StatusScope::Any.permits(OrderStatus::Cancelled));
    }
}
