//! Order and payment status machines.

use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
///
/// Transitions driven by this engine:
/// ```text
/// pending ──► confirmed ──► delivered
/// ```
/// `processing` and `shipped` sit between confirmed and delivered for
/// orders a seller fulfills outside the dispatch flow; `cancelled` is a
/// terminal value no engine operation currently produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed at checkout, payment not yet settled.
    #[default]
    Pending,

    /// Payment settled, delivery job created.
    Confirmed,

    /// Seller is preparing the order.
    Processing,

    /// Order handed to a carrier outside the dispatch flow.
    Shipped,

    /// Order reached the buyer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if payment confirmation is accepted in this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be marked delivered in this status.
    pub fn can_mark_delivered(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped
        )
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of an order's payment.
///
/// Only the payment gateway moves this; the engine consumes the
/// `completed` signal and never initiates payment itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting settlement from the gateway.
    #[default]
    Pending,

    /// Funds settled.
    Completed,

    /// Gateway reported a failed charge.
    Failed,

    /// Funds returned to the buyer.
    Refunded,
}

impl PaymentStatus {
    /// Returns true if funds have settled.
    pub fn is_completed(&self) -> bool {
        matches!(self, PaymentStatus::Completed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
