use unimarket_service::domain::{
    cart::{Cart, CartProduct},
    checkout::CheckoutInput,
    payment::{PaymentMethod, PaymentProvider, PaymentStatus},
    pricing,
    status::OrderStatus,
};
use uuid::Uuid;

fn product(name: &str, price: f64, deposit_amount: Option<f64>) -> CartProduct {
    CartProduct {
        id: Uuid::new_v4(),
        name: name.into(),
        price,
        deposit_amount,
        supplier_price: Some(price * 0.7),
        category: "Electronics".into(),
        image_url: None,
    }
}

fn form(payment_method: PaymentMethod) -> CheckoutInput {
    CheckoutInput {
        payment_method,
        delivery_address: "Nyarugenge Campus, Room 12".into(),
        phone: "0788123456".into(),
        payment_provider: None,
        payment_name: None,
        payment_phone: None,
    }
}

#[test]
fn deposit_order_from_cart() {
    let mut cart = Cart::default();
    cart.add(product("Desk lamp", 1000.0, Some(300.0)), 2);

    let plan = form(PaymentMethod::Deposit).plan(&cart.items).unwrap();

    assert_eq!(plan.quote.total_amount, 2000.0);
    assert_eq!(plan.quote.deposit_amount, 600.0);
    assert_eq!(plan.quote.balance_due, 1400.0);
    assert_eq!(plan.status, OrderStatus::PendingPayment);
}

#[test]
fn deposit_defaults_to_thirty_percent_of_price() {
    let mut cart = Cart::default();
    cart.add(product("Kettle", 2000.0, None), 1);
    cart.add(product("Mug", 500.0, Some(100.0)), 3);

    let quote = pricing::quote(&cart.items, PaymentMethod::Deposit);

    assert_eq!(quote.deposit_amount, 600.0 + 300.0);
    assert_eq!(quote.balance_due, quote.total_amount - quote.deposit_amount);
}

#[test]
fn full_payment_gets_five_percent_off() {
    let mut cart = Cart::default();
    cart.add(product("Headphones", 2500.0, None), 2);

    let mut checkout = form(PaymentMethod::Full);
    checkout.payment_provider = Some(PaymentProvider::Airtel);
    checkout.payment_name = Some("Jean Bosco".into());
    checkout.payment_phone = Some("0731234567".into());
    let plan = checkout.plan(&cart.items).unwrap();

    assert_eq!(plan.quote.subtotal, 5000.0);
    assert_eq!(plan.quote.discount, 250.0);
    assert_eq!(plan.quote.total_amount, 4750.0);
    assert_eq!(plan.quote.balance_due, 4750.0);
    assert_eq!(plan.payment_status, Some(PaymentStatus::Pending));
    assert_eq!(plan.payment.map(|p| p.amount), Some(4750.0));
}

#[test]
fn adding_the_same_product_twice_merges_lines() {
    let lamp = product("Desk lamp", 1000.0, None);
    let mut cart = Cart::default();
    cart.add(lamp.clone(), 1);
    cart.add(lamp.clone(), 2);

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.count(), 3);

    assert!(cart.update_quantity(lamp.id, 0));
    assert!(cart.is_empty());
}

#[test]
fn empty_cart_and_missing_contact_block_checkout() {
    let mut checkout = form(PaymentMethod::Cod);
    checkout.delivery_address = "  ".into();
    checkout.phone = "078".into();

    let errors = checkout.plan(&[]).unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

    assert!(fields.contains(&"items"));
    assert!(fields.contains(&"delivery_address"));
    assert!(fields.contains(&"phone"));
}
