//! Order lifecycle: status enums and the stock-effect classification.
//!
//! Only two transitions touch inventory: PENDING -> CONFIRMED commits the
//! deduction, CONFIRMED -> CANCELLED undoes it. Every other status change
//! is a plain field write.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Failed => "FAILED",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::error::Error for UnknownStatus {}
impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown status: {}", self.0)
    }
}

/// Inventory side effect carried by a status transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockEffect {
    /// PENDING -> CONFIRMED: deduct each line item's quantity.
    Decrement,
    /// CONFIRMED -> CANCELLED: restore each line item's quantity.
    Restore,
    /// Plain field write, no inventory movement.
    None,
}

pub fn classify_transition(current: OrderStatus, requested: OrderStatus) -> StockEffect {
    match (current, requested) {
        (OrderStatus::Pending, OrderStatus::Confirmed) => StockEffect::Decrement,
        (OrderStatus::Confirmed, OrderStatus::Cancelled) => StockEffect::Restore,
        _ => StockEffect::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_from_pending_decrements() {
        assert_eq!(classify_transition(OrderStatus::Pending, OrderStatus::Confirmed), StockEffect::Decrement);
    }

    #[test]
    fn cancel_from_confirmed_restores() {
        assert_eq!(classify_transition(OrderStatus::Confirmed, OrderStatus::Cancelled), StockEffect::Restore);
    }

    #[test]
    fn other_transitions_are_plain_writes() {
        // Cancelling an unconfirmed order never touched stock, so nothing to restore.
        assert_eq!(classify_transition(OrderStatus::Pending, OrderStatus::Cancelled), StockEffect::None);
        // Re-confirming a confirmed order must not decrement twice.
        assert_eq!(classify_transition(OrderStatus::Confirmed, OrderStatus::Confirmed), StockEffect::None);
        assert_eq!(classify_transition(OrderStatus::Confirmed, OrderStatus::Shipped), StockEffect::None);
        assert_eq!(classify_transition(OrderStatus::Shipped, OrderStatus::Cancelled), StockEffect::None);
    }

    #[test]
    fn status_round_trips_through_text() {
        for s in ["PENDING", "CONFIRMED", "PROCESSING", "SHIPPED", "DELIVERED", "CANCELLED", "REFUNDED"] {
            assert_eq!(OrderStatus::from_str(s).unwrap().as_str(), s);
        }
        assert_eq!(OrderStatus::from_str("confirmed").unwrap(), OrderStatus::Confirmed);
        assert!(OrderStatus::from_str("ON_HOLD").is_err());
    }
}
