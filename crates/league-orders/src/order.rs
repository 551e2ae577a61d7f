//! Order model

use chrono::{DateTime, Utc};
use league_common::format_currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{OrderError, Result};

pub type OrderId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What was bought. Registrations are paid through the order book too but
/// send no shop emails and earn no commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    #[default]
    Product,
    PlayerRegistration,
    TeamRegistration,
}

impl OrderType {
    pub fn is_product(&self) -> bool {
        matches!(self, Self::Product)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

impl fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}, {}\n{}", self.street, self.city, self.province, self.postal_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracking {
    pub number: String,
    pub courier: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub order_type: OrderType,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub shipping_address: ShippingAddress,
    /// Team credited with the commission on this order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<u64>,
    pub status: OrderStatus,
    pub status_notes: String,
    pub status_history: Vec<StatusChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Tracking>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// One line per item: `- Premium Jersey x2 (Large) - R1198.00`
    pub fn items_text(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                let size = item.size.as_deref().map(|s| format!(" ({})", s)).unwrap_or_default();
                format!("- {} x{}{} - R{}", item.name, item.quantity, size, format_currency(item.line_total()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn record_status(&mut self, status: OrderStatus, notes: &str) {
        let now = Utc::now();
        self.status = status;
        self.status_notes = notes.to_string();
        self.status_history.push(StatusChange {
            status,
            notes: notes.to_string(),
            timestamp: now,
        });
        self.updated_at = now;
    }
}

/// Checkout payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub order_type: OrderType,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub team_id: Option<u64>,
}

impl OrderDraft {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.customer_name.trim().is_empty() {
            return Err(OrderError::Validation("customer name is required".into()));
        }
        if !self.customer_email.contains('@') {
            return Err(OrderError::Validation(format!(
                "invalid customer email '{}'",
                self.customer_email
            )));
        }
        if self.items.is_empty() {
            return Err(OrderError::Validation("an order needs at least one item".into()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0 || i.price < Decimal::ZERO) {
            return Err(OrderError::Validation(format!(
                "item '{}' needs a positive quantity and a non-negative price",
                item.name
            )));
        }
        if self.shipping < Decimal::ZERO {
            return Err(OrderError::Validation("shipping cannot be negative".into()));
        }
        Ok(())
    }

    pub(crate) fn subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}
