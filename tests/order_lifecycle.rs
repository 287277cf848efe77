use unimarket_service::domain::{
    payment::{PaymentProvider, PaymentStatus, PaymentVerdict},
    pricing::{self, ProfitLine},
    status::{self, OrderStatus, PaymentState, TransitionError},
};
use uuid::Uuid;

const HAPPY_PATH: [OrderStatus; 6] = [
    OrderStatus::PendingPayment,
    OrderStatus::PendingConfirmation,
    OrderStatus::Confirmed,
    OrderStatus::Sourced,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];

fn items() -> Vec<ProfitLine> {
    vec![
        ProfitLine {
            product_id: Uuid::new_v4(),
            unit_price: 1000.0,
            quantity: 2,
            captured_supplier_price: Some(700.0),
            live_supplier_price: Some(750.0),
        },
        ProfitLine {
            product_id: Uuid::new_v4(),
            unit_price: 500.0,
            quantity: 1,
            captured_supplier_price: None,
            live_supplier_price: Some(400.0),
        },
    ]
}

#[test]
fn profit_is_recorded_only_on_delivery() {
    let order_id = Uuid::new_v4();
    let payment = PaymentState {
        provider: Some(PaymentProvider::Cash),
        status: None,
    };

    let mut profit = 0.0;
    for pair in HAPPY_PATH.windows(2) {
        let step = status::transition(pair[0], pair[1], payment).unwrap();
        if step.records_profit() {
            assert_eq!(pair[1], OrderStatus::Delivered);
            profit = pricing::profit(order_id, &items());
        } else {
            assert_eq!(profit, 0.0);
        }
    }

    assert_eq!(profit, 2.0 * 300.0 + 100.0);
}

#[test]
fn mobile_money_orders_wait_for_verification() {
    let mut payment = PaymentState {
        provider: Some(PaymentProvider::Mtn),
        status: Some(PaymentStatus::Pending),
    };

    assert_eq!(
        status::transition(
            OrderStatus::PendingPayment,
            OrderStatus::PendingConfirmation,
            payment
        ),
        Err(TransitionError::PaymentNotVerified)
    );

    let decided =
        status::verify_payment(OrderStatus::PendingPayment, payment, PaymentVerdict::Verified)
            .unwrap();
    payment.status = Some(decided);

    assert!(
        status::transition(
            OrderStatus::PendingPayment,
            OrderStatus::PendingConfirmation,
            payment
        )
        .is_ok()
    );
}

#[test]
fn delivered_orders_cannot_go_back() {
    let payment = PaymentState::default();
    for &to in OrderStatus::ALL {
        assert!(status::transition(OrderStatus::Delivered, to, payment).is_err());
    }
    assert!(OrderStatus::Delivered.is_final());
    assert!(OrderStatus::Refunded.is_final());
}

#[test]
fn cancelled_orders_can_still_be_refunded() {
    let payment = PaymentState::default();
    let path = [
        OrderStatus::Confirmed,
        OrderStatus::Cancelled,
        OrderStatus::WaitForRefund,
        OrderStatus::Refunded,
    ];
    for pair in path.windows(2) {
        let step = status::transition(pair[0], pair[1], payment).unwrap();
        assert!(!step.records_profit());
    }
}
