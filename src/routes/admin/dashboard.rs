use std::collections::BTreeMap;

use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use diesel::{
    ExpressionMethods, QueryDsl, SelectableHelper,
    dsl::{count_star, sum},
};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::status::OrderStatus,
    models::OrderEntity,
    routes::orders::{OrderDetail, fetch_order_details},
    schema::{order_items, orders, products},
};

const RECENT_ORDERS: i64 = 10;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_dashboard))
        .routes(routes!(get_reports))
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct DashboardStats {
    pub total_orders: i64,
    /// Orders waiting for payment or confirmation.
    pub pending_orders: i64,
    pub total_revenue: f64,
    pub total_profit: f64,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardRes {
    pub stats: DashboardStats,
    pub recent_orders: Vec<OrderDetail>,
}

/// Store totals and the latest orders.
#[utoipa::path(
    get,
    path = "/dashboard",
    tags = ["Admin Reports"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Dashboard", body = StdResponse<DashboardRes, String>)
    )
)]
async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let (total_orders, total_revenue, total_profit): (i64, Option<f64>, Option<f64>) =
        orders::table
            .select((count_star(), sum(orders::total_amount), sum(orders::profit)))
            .get_result(conn)
            .await
            .context("Failed to aggregate orders")?;

    let pending: Vec<&str> = OrderStatus::ALL
        .iter()
        .filter(|status| status.is_pending())
        .map(|status| status.as_str())
        .collect();
    let pending_orders: i64 = orders::table
        .filter(orders::status.eq_any(pending))
        .count()
        .get_result(conn)
        .await
        .context("Failed to count pending orders")?;

    let recent: Vec<OrderEntity> = orders::table
        .order_by(orders::created_at.desc())
        .limit(RECENT_ORDERS)
        .select(OrderEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get recent orders")?;
    let recent_orders = fetch_order_details(conn, recent).await?;

    Ok(StdResponse {
        data: Some(DashboardRes {
            stats: DashboardStats {
                total_orders,
                pending_orders,
                total_revenue: total_revenue.unwrap_or(0.0),
                total_profit: total_profit.unwrap_or(0.0),
            },
            recent_orders,
        }),
        message: Some("Get dashboard successfully"),
    })
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

/// Figures over delivered orders only.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct SalesReport {
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
    /// Item subtotals per product category, largest first.
    pub revenue_by_category: Vec<CategoryRevenue>,
}

impl SalesReport {
    /// `orders` holds `(total_amount, profit)` pairs, `items` holds `(category, subtotal)` pairs.
    pub fn build(orders: &[(f64, f64)], items: &[(String, f64)]) -> Self {
        let total_revenue: f64 = orders.iter().map(|(total, _)| total).sum();
        let total_profit: f64 = orders.iter().map(|(_, profit)| profit).sum();
        let total_orders = orders.len();
        let average_order_value = if total_orders == 0 {
            0.0
        } else {
            total_revenue / total_orders as f64
        };

        let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
        for (category, subtotal) in items {
            *by_category.entry(category.as_str()).or_default() += subtotal;
        }
        let mut revenue_by_category: Vec<CategoryRevenue> = by_category
            .into_iter()
            .map(|(category, revenue)| CategoryRevenue {
                category: category.to_string(),
                revenue,
            })
            .collect();
        revenue_by_category.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

        Self {
            total_revenue,
            total_profit,
            total_orders,
            average_order_value,
            revenue_by_category,
        }
    }
}

#[utoipa::path(
    get,
    path = "/reports",
    tags = ["Admin Reports"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Sales report", body = StdResponse<SalesReport, String>)
    )
)]
async fn get_reports(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let delivered = OrderStatus::Delivered.as_str();
    let orders: Vec<(f64, f64)> = orders::table
        .filter(orders::status.eq(delivered))
        .select((orders::total_amount, orders::profit))
        .load(conn)
        .await
        .context("Failed to get delivered orders")?;

    let items: Vec<(String, f64)> = order_items::table
        .inner_join(orders::table)
        .inner_join(products::table)
        .filter(orders::status.eq(delivered))
        .select((products::category, order_items::subtotal))
        .load(conn)
        .await
        .context("Failed to get delivered items")?;

    Ok(StdResponse {
        data: Some(SalesReport::build(&orders, &items)),
        message: Some("Get reports successfully"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_over_delivered_orders() {
        let report = SalesReport::build(
            &[(4750.0, 750.0), (2000.0, 400.0)],
            &[
                ("Electronics".into(), 4750.0),
                ("Books".into(), 500.0),
                ("Books".into(), 1500.0),
            ],
        );

        assert_eq!(report.total_revenue, 6750.0);
        assert_eq!(report.total_profit, 1150.0);
        assert_eq!(report.total_orders, 2);
        assert_eq!(report.average_order_value, 3375.0);
        assert_eq!(
            report.revenue_by_category,
            vec![
                CategoryRevenue {
                    category: "Electronics".into(),
                    revenue: 4750.0
                },
                CategoryRevenue {
                    category: "Books".into(),
                    revenue: 2000.0
                },
            ]
        );
    }

    #[test]
    fn empty_report_has_no_average() {
        let report = SalesReport::build(&[], &[]);
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.average_order_value, 0.0);
        assert!(report.revenue_by_category.is_empty());
    }
}
