//! Read model views for the CQRS query side.

pub mod admin_orders;
pub mod buyer_stats;
pub mod job_board;
pub mod seller_orders;

pub use admin_orders::{AdminOrderSummary, AdminOrdersView};
pub use buyer_stats::{BuyerStatsSummary, BuyerStatsView};
pub use job_board::{JobBoardView, JobSummary};
pub use seller_orders::{SellerOrderSummary, SellerOrdersView};
