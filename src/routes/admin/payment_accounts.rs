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
    domain::{
        payment::PaymentProvider,
        validation::{FieldError, Validator, is_contact_number, non_blank},
    },
    models::{CreatePaymentAccountEntity, PaymentAccountEntity, UpdatePaymentAccountEntity},
    schema::payment_accounts,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/payment-accounts",
        OpenApiRouter::new()
            .routes(routes!(get_payment_accounts, create_payment_account))
            .routes(routes!(
                get_payment_account,
                update_payment_account,
                delete_payment_account
            ))
            .routes(routes!(toggle_payment_account)),
    )
}

#[derive(Deserialize, ToSchema)]
struct SavePaymentAccountReq {
    pub provider: PaymentProvider,
    pub account_name: String,
    pub account_phone: String,
    /// Merchant code, when the account has one.
    pub account_code: Option<String>,
    pub instructions: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SavePaymentAccountReq {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .check(
                self.provider.is_mobile_money(),
                "provider",
                "Payment accounts are for MTN or AIRTEL mobile money",
            )
            .required("account_name", Some(self.account_name.as_str()))
            .check(
                is_contact_number(&self.account_phone),
                "account_phone",
                "account_phone must have at least 10 characters",
            )
            .finish()
    }
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List payment accounts", body = StdResponse<Vec<PaymentAccountEntity>, String>)
    )
)]
async fn get_payment_accounts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let accounts: Vec<PaymentAccountEntity> = payment_accounts::table
        .order_by(payment_accounts::display_order.asc())
        .select(PaymentAccountEntity::as_select())
        .load(conn)
        .await
        .context("Failed to get payment accounts")?;

    Ok(StdResponse {
        data: Some(accounts),
        message: Some("Get payment accounts successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment account ID to fetch")
    ),
    responses(
        (status = 200, description = "Get payment account successfully", body = StdResponse<PaymentAccountEntity, String>),
        (status = 404, description = "Payment account not found")
    )
)]
async fn get_payment_account(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: PaymentAccountEntity = payment_accounts::table
        .find(id)
        .select(PaymentAccountEntity::as_select())
        .get_result(conn)
        .await?;

    Ok(StdResponse {
        data: Some(account),
        message: Some("Get payment account successfully"),
    })
}

/// Add a payment account at the end of the list.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    request_body = SavePaymentAccountReq,
    responses(
        (status = 200, description = "Payment account created", body = StdResponse<PaymentAccountEntity, String>),
        (status = 422, description = "Invalid payment account")
    )
)]
async fn create_payment_account(
    State(state): State<AppState>,
    Json(body): Json<SavePaymentAccountReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let count: i64 = payment_accounts::table
        .count()
        .get_result(conn)
        .await
        .context("Failed to count payment accounts")?;

    let account: PaymentAccountEntity = diesel::insert_into(payment_accounts::table)
        .values(CreatePaymentAccountEntity {
            provider: body.provider.to_string(),
            account_name: body.account_name.trim().to_string(),
            account_phone: body.account_phone.trim().to_string(),
            account_code: non_blank(body.account_code),
            instructions: non_blank(body.instructions),
            is_active: body.is_active,
            display_order: i32::try_from(count + 1).context("Too many payment accounts")?,
        })
        .returning(PaymentAccountEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(payment_account_id = %account.id, "Payment account created");

    Ok(StdResponse {
        data: Some(account),
        message: Some("Payment account created"),
    })
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment account ID to update")
    ),
    request_body = SavePaymentAccountReq,
    responses(
        (status = 200, description = "Payment account updated", body = StdResponse<PaymentAccountEntity, String>),
        (status = 404, description = "Payment account not found"),
        (status = 422, description = "Invalid payment account")
    )
)]
async fn update_payment_account(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<SavePaymentAccountReq>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: PaymentAccountEntity = diesel::update(payment_accounts::table.find(id))
        .set(UpdatePaymentAccountEntity {
            provider: body.provider.to_string(),
            account_name: body.account_name.trim().to_string(),
            account_phone: body.account_phone.trim().to_string(),
            account_code: non_blank(body.account_code),
            instructions: non_blank(body.instructions),
            is_active: body.is_active,
            updated_at: chrono::Utc::now(),
        })
        .returning(PaymentAccountEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(payment_account_id = %account.id, "Payment account updated");

    Ok(StdResponse {
        data: Some(account),
        message: Some("Payment account updated"),
    })
}

/// Flip whether customers see the account at checkout.
#[utoipa::path(
    post,
    path = "/{id}/toggle",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment account ID to toggle")
    ),
    responses(
        (status = 200, description = "Payment account toggled", body = StdResponse<PaymentAccountEntity, String>),
        (status = 404, description = "Payment account not found")
    )
)]
async fn toggle_payment_account(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: PaymentAccountEntity = diesel::update(payment_accounts::table.find(id))
        .set((
            payment_accounts::is_active.eq(diesel::dsl::not(payment_accounts::is_active)),
            payment_accounts::updated_at.eq(diesel::dsl::now),
        ))
        .returning(PaymentAccountEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(
        payment_account_id = %account.id,
        is_active = account.is_active,
        "Payment account toggled"
    );

    Ok(StdResponse {
        data: Some(account),
        message: Some("Payment account toggled"),
    })
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Payment Accounts"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Payment account ID to delete")
    ),
    responses(
        (status = 200, description = "Payment account deleted", body = StdResponse<PaymentAccountEntity, String>),
        (status = 404, description = "Payment account not found")
    )
)]
async fn delete_payment_account(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let account: PaymentAccountEntity = diesel::delete(payment_accounts::table.find(id))
        .returning(PaymentAccountEntity::as_returning())
        .get_result(conn)
        .await?;

    tracing::info!(payment_account_id = %account.id, "Payment account deleted");

    Ok(StdResponse {
        data: Some(account),
        message: Some("Payment account deleted"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(provider: PaymentProvider, account_phone: &str) -> SavePaymentAccountReq {
        SavePaymentAccountReq {
            provider,
            account_name: "UniMarket Ltd".into(),
            account_phone: account_phone.into(),
            account_code: None,
            instructions: None,
            is_active: true,
        }
    }

    #[test]
    fn accepts_mobile_money_accounts() {
        assert!(req(PaymentProvider::Mtn, "0788123456").validate().is_ok());
        assert!(req(PaymentProvider::Airtel, "0738123456").validate().is_ok());
    }

    #[test]
    fn rejects_cash_and_short_numbers() {
        let errors = req(PaymentProvider::Cash, "0788").validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["provider", "account_phone"]);
    }
}
