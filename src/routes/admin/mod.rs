//! Back office routes, restricted to admins.

pub mod categories;
pub mod dashboard;
pub mod feedback;
pub mod orders;
pub mod payment_accounts;
pub mod products;
pub mod suppliers;

use utoipa_axum::router::OpenApiRouter;

use crate::app::{app_state::AppState, middleware};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    let routes = OpenApiRouter::new()
        .merge(products::routes_with_openapi())
        .merge(categories::routes_with_openapi())
        .merge(suppliers::routes_with_openapi())
        .merge(payment_accounts::routes_with_openapi())
        .merge(orders::routes_with_openapi())
        .merge(feedback::routes_with_openapi())
        .merge(dashboard::routes_with_openapi())
        .route_layer(axum::middleware::from_fn(middleware::admins_authorization));

    OpenApiRouter::new().nest("/admin", routes)
}
