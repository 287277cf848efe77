use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ProductEntity;

/// Product fields captured when a line is put in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartProduct {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub deposit_amount: Option<f64>,
    #[serde(default)]
    pub supplier_price: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<&ProductEntity> for CartProduct {
    fn from(product: &ProductEntity) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            deposit_amount: product.deposit_amount,
            supplier_price: product.supplier_price,
            category: product.category.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// Serialized flat, as `{...product fields, quantity}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: CartProduct,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Customer cart. Lines are unique per product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    pub items: Vec<CartLine>,
}

impl Cart {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Adds `quantity` of `product`. A product already in the cart has its quantity increased
    /// and its captured fields refreshed instead of gaining a second line.
    pub fn add(&mut self, product: CartProduct, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        match self.items.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                line.product = product;
            }
            None => self.items.push(CartLine { product, quantity }),
        }
    }

    pub fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product.id != product_id);
        self.items.len() != before
    }

    /// Sets a line's quantity; zero or less removes the line. Returns false when the product
    /// is not in the cart.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> bool {
        if quantity <= 0 {
            return self.remove(product_id);
        }
        match self.items.iter_mut().find(|line| line.product.id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(CartLine::line_total).sum()
    }

    pub fn count(&self) -> i32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(|line| line.product.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(price: f64) -> CartProduct {
        CartProduct {
            id: Uuid::new_v4(),
            name: "Flash disk 32GB".into(),
            price,
            deposit_amount: None,
            supplier_price: Some(price / 2.0),
            category: "Flash Disks".into(),
            image_url: None,
        }
    }

    #[test]
    fn adding_the_same_product_increments_quantity() {
        let mut cart = Cart::default();
        let disk = product(5000.0);
        cart.add(disk.clone(), 1);
        cart.add(disk.clone(), 2);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), 15000.0);
    }

    #[test]
    fn re_adding_refreshes_captured_price() {
        let mut cart = Cart::default();
        let mut charger = product(8000.0);
        cart.add(charger.clone(), 1);
        charger.price = 7500.0;
        cart.add(charger, 1);

        assert_eq!(cart.items[0].product.price, 7500.0);
        assert_eq!(cart.total(), 15000.0);
    }

    #[test]
    fn non_positive_add_is_ignored() {
        let mut cart = Cart::default();
        cart.add(product(1000.0), 0);
        cart.add(product(1000.0), -3);
        assert!(cart.is_empty());
    }

    #[test]
    fn add_then_set_to_zero_leaves_cart_empty() {
        let mut cart = Cart::default();
        let notes = product(1500.0);
        cart.add(notes.clone(), 4);

        assert!(cart.update_quantity(notes.id, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn negative_quantity_update_removes_line() {
        let mut cart = Cart::default();
        let a = product(100.0);
        let b = product(200.0);
        cart.add(a.clone(), 1);
        cart.add(b.clone(), 1);

        assert!(cart.update_quantity(a.id, -1));
        assert_eq!(cart.product_ids(), vec![b.id]);
    }

    #[test]
    fn updating_a_missing_line_reports_false() {
        let mut cart = Cart::default();
        assert!(!cart.update_quantity(Uuid::new_v4(), 2));
        assert!(!cart.remove(Uuid::new_v4()));
    }

    #[test]
    fn serializes_as_a_flat_list_of_product_fields_and_quantity() {
        let mut cart = Cart::default();
        let power_bank = product(12000.0);
        cart.add(power_bank.clone(), 2);

        let value = cart.to_value().unwrap();
        assert_eq!(value[0]["id"], json!(power_bank.id));
        assert_eq!(value[0]["price"], json!(12000.0));
        assert_eq!(value[0]["quantity"], json!(2));

        assert_eq!(Cart::from_value(value).unwrap(), cart);
    }

    #[test]
    fn loads_lines_missing_optional_fields() {
        let id = Uuid::new_v4();
        let cart = Cart::from_value(json!([
            { "id": id, "name": "Notes", "price": 1000.0, "quantity": 2 }
        ]))
        .unwrap();

        assert_eq!(cart.items[0].product.deposit_amount, None);
        assert_eq!(cart.total(), 2000.0);
    }
}
