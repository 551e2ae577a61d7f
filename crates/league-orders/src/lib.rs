//! League Portal Orders
//!
//! Supporter shop orders and paid registrations. Product orders credit a
//! commission to the customer's team and are confirmed by email; the server
//! does both after the order is committed here.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ORDER BOOK                           │
//! │                   (one RwLock over all orders)               │
//! │                                                              │
//! │   draft ──► validate ──► Order #ORD-n ──► status history     │
//! │                             │            pending ─► shipped  │
//! │                             │                 └─► cancelled  │
//! │                             ▼                                │
//! │                    items / address text for emails           │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod book;
pub mod order;

use thiserror::Error;

pub use book::{OrderBook, OrderStats, FIRST_ORDER_ID};
pub use order::{
    Order, OrderDraft, OrderId, OrderItem, OrderStatus, OrderType, ShippingAddress, StatusChange, Tracking,
};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, OrderError>;
