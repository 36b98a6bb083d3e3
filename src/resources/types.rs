//! Resource record types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product: String,
    pub amount: f64,
}

/// Fields of an order to be created; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub product: String,
    pub amount: f64,
}

pub(crate) fn seed_users() -> Vec<User> {
    [
        (1, "Alice", "alice@example.com"),
        (2, "Bob", "bob@example.com"),
        (3, "Charlie", "charlie@example.com"),
    ]
    .into_iter()
    .map(|(id, name, email)| User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    })
    .collect()
}

pub(crate) fn seed_orders() -> Vec<Order> {
    [
        (101, 1, "Laptop", 999.99),
        (102, 2, "Mouse", 29.99),
        (103, 1, "Keyboard", 79.99),
    ]
    .into_iter()
    .map(|(id, user_id, product, amount)| Order {
        id,
        user_id,
        product: product.to_string(),
        amount,
    })
    .collect()
}
