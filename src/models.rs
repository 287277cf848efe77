use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    UnknownVariant, feedback,
    payment::{PaymentProvider, PaymentStatus},
    role::Role,
    status::{OrderStatus, PaymentState},
};

// Profiles

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileEntity {
    /// Unknown role strings are treated as the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Customer)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::profiles)]
pub struct CreateProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::profiles)]
pub struct UpdateProfileEntity {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// Catalog

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub deposit_amount: Option<f64>,
    pub supplier_price: Option<f64>,
    pub category: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full product form, used for both inserts and whole-record updates.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct SaveProductEntity {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub deposit_amount: Option<f64>,
    pub supplier_price: Option<f64>,
    pub category: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(treat_none_as_null = true)]
pub struct SaveCategoryEntity {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::suppliers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SupplierEntity {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::suppliers)]
#[diesel(treat_none_as_null = true)]
pub struct SaveSupplierEntity {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payment_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentAccountEntity {
    pub id: Uuid,
    pub provider: String,
    pub account_name: String,
    pub account_phone: String,
    pub account_code: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::payment_accounts)]
pub struct CreatePaymentAccountEntity {
    pub provider: String,
    pub account_name: String,
    pub account_phone: String,
    pub account_code: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::payment_accounts)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePaymentAccountEntity {
    pub provider: String,
    pub account_name: String,
    pub account_phone: String,
    pub account_code: Option<String>,
    pub instructions: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, ToSchema)]
#[diesel(primary_key(user_id))]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartEntity {
    pub user_id: Uuid,
    pub items: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::carts)]
pub struct CreateCartEntity {
    pub user_id: Uuid,
    pub items: Value,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub payment_provider: Option<String>,
    pub payment_name: Option<String>,
    pub payment_phone: Option<String>,
    pub payment_status: Option<String>,
    pub total_amount: f64,
    pub deposit_amount: f64,
    pub balance_due: f64,
    pub delivery_address: String,
    pub phone: String,
    pub profit: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderEntity {
    pub fn order_status(&self) -> Result<OrderStatus, UnknownVariant> {
        self.status.parse()
    }

    pub fn payment_state(&self) -> Result<PaymentState, UnknownVariant> {
        let provider = self
            .payment_provider
            .as_deref()
            .map(str::parse::<PaymentProvider>)
            .transpose()?;
        let status = self
            .payment_status
            .as_deref()
            .map(str::parse::<PaymentStatus>)
            .transpose()?;
        Ok(PaymentState { provider, status })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub user_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub payment_provider: Option<String>,
    pub payment_name: Option<String>,
    pub payment_phone: Option<String>,
    pub payment_status: Option<String>,
    pub total_amount: f64,
    pub deposit_amount: f64,
    pub balance_due: f64,
    pub delivery_address: String,
    pub phone: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(belongs_to(OrderEntity, foreign_key = order_id))]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
    pub supplier_price: Option<f64>,
    pub subtotal: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::order_items)]
pub struct CreateOrderItemEntity {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: f64,
    pub supplier_price: Option<f64>,
    pub subtotal: f64,
}

#[derive(Queryable, Serialize, Selectable, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub provider: String,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub payer_phone: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreatePaymentEntity {
    pub order_id: Uuid,
    pub provider: String,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub payer_phone: Option<String>,
    pub status: String,
}

// Feedback

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedbackEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub feedback_type: String,
    pub rating: i32,
    pub comment: String,
    pub status: String,
    pub admin_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackEntity {
    pub fn is_public_review(&self) -> bool {
        feedback::is_public_review(&self.feedback_type, &self.status)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::feedback)]
pub struct CreateFeedbackEntity {
    pub user_id: Uuid,
    pub product_id: Option<Uuid>,
    pub feedback_type: String,
    pub rating: i32,
    pub comment: String,
    pub status: String,
}
