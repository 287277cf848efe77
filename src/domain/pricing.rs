use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{cart::CartLine, payment::PaymentMethod};

/// Discount granted when the whole order is paid upfront.
pub const FULL_PAYMENT_DISCOUNT_RATE: f64 = 0.05;

/// Share of the price taken as deposit when a product has no explicit deposit.
pub const DEFAULT_DEPOSIT_RATE: f64 = 0.3;

/// A missing or zero deposit falls back to [`DEFAULT_DEPOSIT_RATE`] of the price.
pub fn unit_deposit(price: f64, deposit_amount: Option<f64>) -> f64 {
    match deposit_amount {
        Some(deposit) if deposit > 0.0 => deposit,
        _ => price * DEFAULT_DEPOSIT_RATE,
    }
}

/// Totals of a prospective order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Quote {
    pub payment_method: PaymentMethod,
    pub subtotal: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub deposit_amount: f64,
    pub balance_due: f64,
}

impl Quote {
    /// What the customer pays before delivery.
    pub fn amount_due_now(&self) -> f64 {
        match self.payment_method {
            PaymentMethod::Deposit => self.deposit_amount,
            PaymentMethod::Full => self.total_amount,
            PaymentMethod::Cod => 0.0,
        }
    }
}

pub fn quote(lines: &[CartLine], payment_method: PaymentMethod) -> Quote {
    let subtotal: f64 = lines.iter().map(CartLine::line_total).sum();
    let discount = match payment_method {
        PaymentMethod::Full => subtotal * FULL_PAYMENT_DISCOUNT_RATE,
        PaymentMethod::Deposit | PaymentMethod::Cod => 0.0,
    };
    let total_amount = subtotal - discount;
    let deposit_amount = match payment_method {
        PaymentMethod::Deposit => lines
            .iter()
            .map(|line| {
                unit_deposit(line.product.price, line.product.deposit_amount)
                    * f64::from(line.quantity)
            })
            .sum(),
        PaymentMethod::Full | PaymentMethod::Cod => 0.0,
    };

    Quote {
        payment_method,
        subtotal,
        discount,
        total_amount,
        deposit_amount,
        balance_due: total_amount - deposit_amount,
    }
}

/// One order item as seen by the profit calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitLine {
    pub product_id: Uuid,
    pub unit_price: f64,
    pub quantity: i32,
    /// Supplier price stored on the order item when the order was placed.
    pub captured_supplier_price: Option<f64>,
    /// Supplier price currently on the product.
    pub live_supplier_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostSource {
    Captured,
    Live,
    Missing,
}

impl ProfitLine {
    pub fn cost(&self) -> (f64, CostSource) {
        match (self.captured_supplier_price, self.live_supplier_price) {
            (Some(captured), _) => (captured, CostSource::Captured),
            (None, Some(live)) => (live, CostSource::Live),
            (None, None) => (0.0, CostSource::Missing),
        }
    }
}

/// Σ (unit_price − supplier_price) × quantity over the order's items.
pub fn profit(order_id: Uuid, lines: &[ProfitLine]) -> f64 {
    lines
        .iter()
        .map(|line| {
            let (cost, source) = line.cost();
            match source {
                CostSource::Captured => {}
                CostSource::Live => warn!(
                    %order_id,
                    product_id = %line.product_id,
                    "Order item has no captured supplier price, using the product's current one"
                ),
                CostSource::Missing => warn!(
                    %order_id,
                    product_id = %line.product_id,
                    "No supplier price known for order item, counting its cost as zero"
                ),
            }
            (line.unit_price - cost) * f64::from(line.quantity)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartProduct;

    fn line(price: f64, quantity: i32, deposit_amount: Option<f64>) -> CartLine {
        CartLine {
            product: CartProduct {
                id: Uuid::new_v4(),
                name: "Charger".into(),
                price,
                deposit_amount,
                supplier_price: None,
                category: "Chargers".into(),
                image_url: None,
            },
            quantity,
        }
    }

    #[test]
    fn deposit_order_uses_explicit_deposits() {
        let quote = quote(&[line(1000.0, 2, Some(300.0))], PaymentMethod::Deposit);

        assert_eq!(quote.total_amount, 2000.0);
        assert_eq!(quote.deposit_amount, 600.0);
        assert_eq!(quote.balance_due, 1400.0);
        assert_eq!(quote.amount_due_now(), 600.0);
    }

    #[test]
    fn missing_or_zero_deposit_defaults_to_thirty_percent() {
        let quote = quote(
            &[line(1000.0, 1, None), line(2000.0, 2, Some(0.0))],
            PaymentMethod::Deposit,
        );

        assert_eq!(quote.deposit_amount, 300.0 + 1200.0);
        assert_eq!(quote.balance_due, quote.total_amount - quote.deposit_amount);
    }

    #[test]
    fn full_payment_gets_five_percent_off_once() {
        let quote = quote(&[line(2500.0, 2, None)], PaymentMethod::Full);

        assert_eq!(quote.subtotal, 5000.0);
        assert_eq!(quote.discount, 250.0);
        assert_eq!(quote.total_amount, 4750.0);
        assert_eq!(quote.deposit_amount, 0.0);
        assert_eq!(quote.balance_due, 4750.0);
        assert_eq!(quote.amount_due_now(), 4750.0);
    }

    #[test]
    fn cash_on_delivery_has_no_discount_or_deposit() {
        let quote = quote(&[line(1200.0, 3, Some(100.0))], PaymentMethod::Cod);

        assert_eq!(quote.total_amount, 3600.0);
        assert_eq!(quote.deposit_amount, 0.0);
        assert_eq!(quote.balance_due, 3600.0);
        assert_eq!(quote.amount_due_now(), 0.0);
    }

    #[test]
    fn profit_prefers_captured_supplier_price() {
        let order_id = Uuid::new_v4();
        let lines = [
            ProfitLine {
                product_id: Uuid::new_v4(),
                unit_price: 5000.0,
                quantity: 2,
                captured_supplier_price: Some(3000.0),
                live_supplier_price: Some(3500.0),
            },
            ProfitLine {
                product_id: Uuid::new_v4(),
                unit_price: 1000.0,
                quantity: 1,
                captured_supplier_price: None,
                live_supplier_price: Some(600.0),
            },
            ProfitLine {
                product_id: Uuid::new_v4(),
                unit_price: 200.0,
                quantity: 5,
                captured_supplier_price: None,
                live_supplier_price: None,
            },
        ];

        assert_eq!(profit(order_id, &lines), 4000.0 + 400.0 + 1000.0);
        assert_eq!(lines[1].cost(), (600.0, CostSource::Live));
        assert_eq!(lines[2].cost(), (0.0, CostSource::Missing));
    }

    #[test]
    fn profit_of_an_empty_order_is_zero() {
        assert_eq!(profit(Uuid::new_v4(), &[]), 0.0);
    }
}
