//! Order book
//!
//! Orders live behind one lock; numbering starts at [`FIRST_ORDER_ID`].

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::order::{Order, OrderDraft, OrderId, OrderStatus, OrderType, Tracking};
use crate::{OrderError, Result};

pub const FIRST_ORDER_ID: OrderId = 1000;

/// Order counts per status; revenue leaves out cancelled orders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub total_revenue: Decimal,
}

struct BookState {
    orders: BTreeMap<OrderId, Order>,
    next_id: OrderId,
}

pub struct OrderBook {
    state: RwLock<BookState>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BookState {
                orders: BTreeMap::new(),
                next_id: FIRST_ORDER_ID,
            }),
        }
    }

    /// Validate and store a checkout; totals are computed from the items
    pub fn create(&self, draft: OrderDraft) -> Result<Order> {
        draft.validate()?;
        let subtotal = draft.subtotal();
        let now = Utc::now();

        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id += 1;

        let mut order = Order {
            id,
            order_number: format!("ORD-{}", id),
            order_type: draft.order_type,
            customer_name: draft.customer_name.trim().to_string(),
            customer_email: draft.customer_email.trim().to_string(),
            customer_phone: draft.customer_phone.trim().to_string(),
            items: draft.items,
            subtotal,
            shipping: draft.shipping,
            total: subtotal + draft.shipping,
            shipping_address: draft.shipping_address,
            team_id: draft.team_id,
            status: OrderStatus::Pending,
            status_notes: String::new(),
            status_history: Vec::new(),
            tracking: None,
            created_at: now,
            updated_at: now,
        };
        order.record_status(OrderStatus::Pending, "Order placed");
        state.orders.insert(id, order.clone());
        tracing::info!(order_id = id, order_type = ?order.order_type, total = %order.total, "order placed");
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> Option<Order> {
        self.state.read().orders.get(&id).cloned()
    }

    /// Newest first, optionally one type only
    pub fn list(&self, order_type: Option<OrderType>) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .read()
            .orders
            .values()
            .filter(|o| order_type.map_or(true, |t| o.order_type == t))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        orders
    }

    pub fn by_email(&self, email: &str) -> Vec<Order> {
        let email = email.trim();
        self.list(None)
            .into_iter()
            .filter(|o| o.customer_email.eq_ignore_ascii_case(email))
            .collect()
    }

    /// Move to `status`, recording it in the history with `notes`
    pub fn update_status(&self, id: OrderId, status: OrderStatus, notes: &str) -> Result<Order> {
        let mut state = self.state.write();
        let order = state.orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        order.record_status(status, notes);
        tracing::info!(order_id = id, status = %status, "order status updated");
        Ok(order.clone())
    }

    pub fn add_tracking(&self, id: OrderId, number: &str, courier: &str) -> Result<Order> {
        if number.trim().is_empty() {
            return Err(OrderError::Validation("tracking number is required".into()));
        }
        let mut state = self.state.write();
        let order = state.orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        let now = Utc::now();
        order.tracking = Some(Tracking {
            number: number.trim().to_string(),
            courier: courier.trim().to_string(),
            added_at: now,
        });
        order.updated_at = now;
        Ok(order.clone())
    }

    pub fn delete(&self, id: OrderId) -> bool {
        let removed = self.state.write().orders.remove(&id).is_some();
        if removed {
            tracing::info!(order_id = id, "order deleted");
        }
        removed
    }

    pub fn stats(&self, order_type: Option<OrderType>) -> OrderStats {
        let state = self.state.read();
        let mut stats = OrderStats::default();
        for order in state
            .orders
            .values()
            .filter(|o| order_type.map_or(true, |t| o.order_type == t))
        {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Processing => stats.processing += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if order.status != OrderStatus::Cancelled {
                stats.total_revenue += order.total;
            }
        }
        stats
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
