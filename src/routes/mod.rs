pub mod admin;
pub mod auth;
pub mod catalog;
pub mod customers;
pub mod deliveries;
pub mod orders;

use utoipa_axum::router::OpenApiRouter;

use crate::app::app_state::AppState;

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth::routes_with_openapi())
        .merge(catalog::routes_with_openapi())
        .merge(customers::routes_with_openapi())
        .merge(admin::routes_with_openapi())
        .merge(deliveries::routes_with_openapi())
}
