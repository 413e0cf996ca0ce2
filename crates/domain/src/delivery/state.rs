//! Delivery job status machine.

use serde::{Deserialize, Serialize};

/// Status of a delivery job in its lifecycle.
///
/// Status transitions:
/// ```text
/// pending ──► assigned ──► picked_up ──► in_transit ──► delivered
/// ```
/// `pending → assigned` happens only through a claim; the remaining
/// steps advance one at a time, never skipping. `cancelled` is a
/// terminal value no engine operation currently produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting in the pool, no agent assigned.
    #[default]
    Pending,

    /// An agent claimed the job.
    Assigned,

    /// The agent collected the goods from the seller.
    PickedUp,

    /// The agent is on the way to the buyer.
    InTransit,

    /// The goods reached the buyer (terminal status).
    Delivered,

    /// Job was cancelled (terminal status).
    Cancelled,
}

impl JobStatus {
    /// Returns the immediate successor in the delivery chain.
    ///
    /// Terminal statuses have no successor.
    pub fn successor(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Pending => Some(JobStatus::Assigned),
            JobStatus::Assigned => Some(JobStatus::PickedUp),
            JobStatus::PickedUp => Some(JobStatus::InTransit),
            JobStatus::InTransit => Some(JobStatus::Delivered),
            JobStatus::Delivered | JobStatus::Cancelled => None,
        }
    }

    /// Returns true if the job can be claimed in this status.
    pub fn can_claim(&self) -> bool {
        matches!(self, JobStatus::Pending)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Delivered | JobStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Assigned => "assigned",
            JobStatus::PickedUp => "picked_up",
            JobStatus::InTransit => "in_transit",
            JobStatus::Delivered => "delivered",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
