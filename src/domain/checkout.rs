use serde::Deserialize;
use utoipa::ToSchema;

use super::{
    cart::CartLine,
    payment::{PaymentMethod, PaymentProvider, PaymentStatus},
    pricing::{self, Quote},
    status::OrderStatus,
    validation::{FieldError, Validator, is_contact_number, is_mobile_number, non_blank},
};

/// Checkout form submitted by the customer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutInput {
    pub payment_method: PaymentMethod,
    pub delivery_address: String,
    pub phone: String,
    #[serde(default)]
    pub payment_provider: Option<PaymentProvider>,
    /// Name on the mobile money account the customer pays from.
    #[serde(default)]
    pub payment_name: Option<String>,
    #[serde(default)]
    pub payment_phone: Option<String>,
}

/// Payment row to record alongside the order.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPayment {
    pub provider: PaymentProvider,
    pub amount: f64,
    pub payer_name: Option<String>,
    pub payer_phone: Option<String>,
}

/// Everything needed to write a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    pub quote: Quote,
    pub status: OrderStatus,
    pub payment_provider: Option<PaymentProvider>,
    pub payment_name: Option<String>,
    pub payment_phone: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub delivery_address: String,
    pub phone: String,
    pub payment: Option<PendingPayment>,
}

impl CheckoutInput {
    /// Cash on delivery always settles in cash.
    fn provider(&self) -> Option<PaymentProvider> {
        match (self.payment_method, self.payment_provider) {
            (PaymentMethod::Cod, None) => Some(PaymentProvider::Cash),
            (_, provider) => provider,
        }
    }

    pub fn validate(&self, lines: &[CartLine]) -> Result<(), Vec<FieldError>> {
        let mut validator = Validator::new();
        validator
            .check(!lines.is_empty(), "items", "Your cart is empty")
            .required("delivery_address", Some(self.delivery_address.as_str()))
            .required("phone", Some(self.phone.as_str()));
        if !self.phone.trim().is_empty() {
            validator.check(
                is_contact_number(&self.phone),
                "phone",
                "Please enter a valid phone number",
            );
        }

        let provider = self.provider();
        if self.payment_method == PaymentMethod::Cod {
            validator.check(
                provider == Some(PaymentProvider::Cash),
                "payment_provider",
                "Cash on delivery is paid in cash",
            );
        }
        if provider.is_some_and(PaymentProvider::is_mobile_money) {
            validator.required("payment_name", self.payment_name.as_deref());
            match self.payment_phone.as_deref() {
                Some(phone) if !phone.trim().is_empty() => {
                    validator.check(
                        is_mobile_number(phone),
                        "payment_phone",
                        "Enter the mobile money number as 07XXXXXXXX or +2507XXXXXXXX",
                    );
                }
                _ => {
                    validator.required("payment_phone", None);
                }
            }
        }
        validator.finish()
    }

    /// Validates the form against the cart lines and prices the order.
    pub fn plan(&self, lines: &[CartLine]) -> Result<CheckoutPlan, Vec<FieldError>> {
        self.validate(lines)?;

        let quote = pricing::quote(lines, self.payment_method);
        let provider = self.provider();
        let mobile_money = provider.filter(|p| p.is_mobile_money());
        let (payment_name, payment_phone) = match mobile_money {
            Some(_) => (
                non_blank(self.payment_name.clone()),
                non_blank(self.payment_phone.clone()),
            ),
            None => (None, None),
        };
        let payment = mobile_money.map(|provider| PendingPayment {
            provider,
            amount: quote.amount_due_now(),
            payer_name: payment_name.clone(),
            payer_phone: payment_phone.clone(),
        });

        Ok(CheckoutPlan {
            quote,
            status: OrderStatus::PendingPayment,
            payment_provider: provider,
            payment_name,
            payment_phone,
            payment_status: mobile_money.map(|_| PaymentStatus::Pending),
            delivery_address: self.delivery_address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartProduct;
    use uuid::Uuid;

    fn lines() -> Vec<CartLine> {
        vec![CartLine {
            product: CartProduct {
                id: Uuid::new_v4(),
                name: "Power bank".into(),
                price: 1000.0,
                deposit_amount: Some(300.0),
                supplier_price: Some(700.0),
                category: "Power Banks".into(),
                image_url: None,
            },
            quantity: 2,
        }]
    }

    fn input(payment_method: PaymentMethod) -> CheckoutInput {
        CheckoutInput {
            payment_method,
            delivery_address: "Huye Campus".into(),
            phone: "0781234567".into(),
            payment_provider: None,
            payment_name: None,
            payment_phone: None,
        }
    }

    #[test]
    fn cash_on_delivery_defaults_to_cash_without_payment_row() {
        let plan = input(PaymentMethod::Cod).plan(&lines()).unwrap();

        assert_eq!(plan.payment_provider, Some(PaymentProvider::Cash));
        assert_eq!(plan.payment_status, None);
        assert_eq!(plan.payment, None);
        assert_eq!(plan.status, OrderStatus::PendingPayment);
    }

    #[test]
    fn mobile_money_deposit_records_pending_payment_for_the_deposit() {
        let mut form = input(PaymentMethod::Deposit);
        form.payment_provider = Some(PaymentProvider::Mtn);
        form.payment_name = Some(" Aline Uwase ".into());
        form.payment_phone = Some("0781234567".into());

        let plan = form.plan(&lines()).unwrap();

        assert_eq!(plan.payment_status, Some(PaymentStatus::Pending));
        assert_eq!(plan.payment_name.as_deref(), Some("Aline Uwase"));
        let payment = plan.payment.unwrap();
        assert_eq!(payment.provider, PaymentProvider::Mtn);
        assert_eq!(payment.amount, 600.0);
        assert_eq!(plan.quote.balance_due, 1400.0);
    }

    #[test]
    fn mobile_money_requires_payer_details() {
        let mut form = input(PaymentMethod::Full);
        form.payment_provider = Some(PaymentProvider::Airtel);
        form.payment_phone = Some("0741234567".into());

        let errors = form.plan(&lines()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["payment_name", "payment_phone"]);
    }

    #[test]
    fn cod_with_mobile_money_is_rejected() {
        let mut form = input(PaymentMethod::Cod);
        form.payment_provider = Some(PaymentProvider::Mtn);
        form.payment_name = Some("Aline".into());
        form.payment_phone = Some("0781234567".into());

        let errors = form.plan(&lines()).unwrap_err();
        assert_eq!(errors[0].field, "payment_provider");
    }

    #[test]
    fn empty_cart_and_missing_contact_block_checkout() {
        let mut form = input(PaymentMethod::Deposit);
        form.delivery_address = " ".into();
        form.phone = "0781".into();

        let errors = form.plan(&[]).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["items", "delivery_address", "phone"]);
    }
}
