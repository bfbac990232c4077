//! Planning: customer orders that work orders are created against

use shared::models::{Order, OrderCreate};
use shared::util::now_millis;

use crate::core::{FloorError, FloorResult};
use crate::store::{OrderBy, Store};

#[derive(Clone)]
pub struct OrderService {
    store: Store,
}

impl OrderService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: OrderCreate) -> FloorResult<Order> {
        let customer = input.customer.trim();
        if customer.is_empty() {
            return Err(FloorError::validation("customer must not be empty"));
        }

        let now = now_millis();
        let order = self
            .store
            .orders
            .insert(Order {
                id: 0,
                customer: customer.to_string(),
                delivery_date: input.delivery_date,
                status: input.status.unwrap_or_default(),
                created_at: now,
                updated_at: now,
                version: 0,
            })
            .await?;

        tracing::info!(order_id = order.id, customer = %order.customer, "Order created");
        Ok(order)
    }

    pub async fn get(&self, id: i64) -> FloorResult<Order> {
        self.store
            .orders
            .find_by_id(id)
            .await?
            .ok_or(FloorError::OrderNotFound(id))
    }

    /// All orders, id ascending
    pub async fn list(&self) -> FloorResult<Vec<Order>> {
        Ok(self.store.orders.list(OrderBy::IdAsc).await?)
    }

    pub async fn is_empty(&self) -> FloorResult<bool> {
        Ok(self.store.orders.count(&|_: &Order| true).await? == 0)
    }
}
