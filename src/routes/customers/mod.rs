//! Routes for any signed-in user.

pub mod carts;
pub mod feedback;
pub mod orders;
pub mod profile;

use utoipa_axum::router::OpenApiRouter;

use crate::app::{app_state::AppState, middleware};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(profile::routes_with_openapi())
        .merge(carts::routes_with_openapi())
        .merge(orders::routes_with_openapi())
        .merge(feedback::routes_with_openapi())
        .route_layer(axum::middleware::from_fn(
            middleware::customers_authorization,
        ))
}
