//! In-memory resource store.

use std::sync::RwLock;

use crate::resources::types::{seed_orders, seed_users, NewOrder, Order, User};

/// Users and orders for the lifetime of the process.
///
/// Users are read-only; orders grow through [`ResourceStore::create_order`].
#[derive(Debug)]
pub struct ResourceStore {
    users: Vec<User>,
    orders: RwLock<Vec<Order>>,
}

impl ResourceStore {
    pub fn new(users: Vec<User>, orders: Vec<Order>) -> Self {
        Self {
            users,
            orders: RwLock::new(orders),
        }
    }

    /// Store holding the sample data set.
    pub fn seeded() -> Self {
        Self::new(seed_users(), seed_orders())
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// All orders, or those of one user.
    pub fn orders(&self, user_id: Option<i64>) -> Vec<Order> {
        let orders = self.orders.read().expect("order store lock poisoned");
        match user_id {
            Some(user_id) => orders
                .iter()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect(),
            None => orders.clone(),
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().expect("order store lock poisoned").len()
    }

    /// Append an order with the next free id.
    pub fn create_order(&self, new: NewOrder) -> Order {
        let mut orders = self.orders.write().expect("order store lock poisoned");
        let id = orders.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let order = Order {
            id,
            user_id: new.user_id,
            product: new.product,
            amount: new.amount,
        };
        orders.push(order.clone());
        order
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn new_order(product: &str) -> NewOrder {
        NewOrder {
            user_id: 2,
            product: product.to_string(),
            amount: 1.0,
        }
    }

    #[test]
    fn lookup_by_id() {
        let store = ResourceStore::seeded();
        assert_eq!(store.user(2).map(|u| u.name.as_str()), Some("Bob"));
        assert!(store.user(999).is_none());
    }

    #[test]
    fn orders_filtered_by_user() {
        let store = ResourceStore::seeded();
        let ids: Vec<i64> = store.orders(Some(1)).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![101, 103]);
        assert_eq!(store.orders(None).len(), 3);
        assert!(store.orders(Some(42)).is_empty());
    }

    #[test]
    fn new_order_gets_next_id() {
        let store = ResourceStore::seeded();
        let order = store.create_order(new_order("Monitor"));
        assert_eq!(order.id, 104);
        assert_eq!(store.order_count(), 4);
    }

    #[test]
    fn first_order_in_empty_store_is_one() {
        let store = ResourceStore::new(Vec::new(), Vec::new());
        assert_eq!(store.create_order(new_order("Cable")).id, 1);
    }

    #[test]
    fn concurrent_creates_keep_ids_unique() {
        let store = Arc::new(ResourceStore::seeded());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create_order(new_order(&format!("item-{i}"))).id)
            })
            .collect();

        let ids: HashSet<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(store.order_count(), 11);
    }
}
