use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::{
    app::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    domain::validation::{FieldError, Validator, is_email, non_blank},
    models::{SaveSupplierEntity, SupplierEntity},
    schema::suppliers,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/suppliers",
        OpenApiRouter::new()
            .routes(routes!(get_suppliers, create_supplier))
            .routes(routes!(get_supplier, update_supplier, delete_supplier)),
    )
}

#[derive(Deserialize, ToSchema)]
struct SaveSupplierReq {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl SaveSupplierReq {
    fn into_entity(self) -> Result<SaveSupplierEntity, Vec<FieldError>> {
        let email = non_blank(self.email);
        Validator::new()
            .required("name", Some(self.name.as_str()))
            .check(
                email.as_deref().is_none_or(is_email),
                "email",
                "Enter a valid e-mail address",
            )
            .finish()?;

        Ok(SaveSupplierEntity {
            name: self.name.trim().to_string(),
            contact_person: non_blank(self.contact_person),
            phone: non_blank(self.phone),
            email,
            address: non_blank(self.address),
            updated_at: chrono::Utc::now(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Suppliers"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List suppliers", body = StdResponse<Vec<SupplierEntity>, String>)
    )
)]
async fn get_suppliers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let suppliers: Vec<SupplierEntity> = suppliers::table
        .order_by(suppliers::created_at.desc())
        .select(SupplierEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get suppliers")?;

    Ok(StdResponse {
        data: Some(suppliers),
        message: Some("Get suppliers successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin Suppliers"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Supplier ID to fetch")
    ),
    responses(
        (status = 200, description = "Get supplier successfully", body = StdResponse<SupplierEntity, String>),
        (status = 404, description = "Supplier not found")
    )
)]
async fn get_supplier(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier: SupplierEntity = suppliers::table
        .find(id)
        .select(SupplierEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(supplier),
        message: Some("Get supplier successfully"),
    })
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin Suppliers"],
    security(("bearerAuth" = [])),
    request_body = SaveSupplierReq,
    responses(
        (status = 200, description = "Supplier created", body = StdResponse<SupplierEntity, String>),
        (status = 422, description = "Invalid supplier")
    )
)]
async fn create_supplier(
    State(state): State<AppState>,
    Json(body): Json<SaveSupplierReq>,
) -> Result<impl IntoResponse, AppError> {
    let values = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier: SupplierEntity = diesel::insert_into(suppliers::table)
        .values(values)
        .returning(SupplierEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(supplier_id = %supplier.id, "Supplier created");

    Ok(StdResponse {
        data: Some(supplier),
        message: Some("Supplier created"),
    })
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin Suppliers"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Supplier ID to update")
    ),
    request_body = SaveSupplierReq,
    responses(
        (status = 200, description = "Supplier updated", body = StdResponse<SupplierEntity, String>),
        (status = 404, description = "Supplier not found"),
        (status = 422, description = "Invalid supplier")
    )
)]
async fn update_supplier(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<SaveSupplierReq>,
) -> Result<impl IntoResponse, AppError> {
    let values = body.into_entity()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier: SupplierEntity = diesel::update(suppliers::table.find(id))
        .set(values)
        .returning(SupplierEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(supplier_id = %supplier.id, "Supplier updated");

    Ok(StdResponse {
        data: Some(supplier),
        message: Some("Supplier updated"),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Suppliers"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Supplier ID to delete")
    ),
    responses(
        (status = 200, description = "Supplier deleted", body = StdResponse<SupplierEntity, String>),
        (status = 404, description = "Supplier not found")
    )
)]
async fn delete_supplier(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let supplier: SupplierEntity = diesel::delete(suppliers::table.find(id))
        .returning(SupplierEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(supplier_id = %supplier.id, "Supplier deleted");

    Ok(StdResponse {
        data: Some(supplier),
        message: Some("Supplier deleted"),
    })
}
