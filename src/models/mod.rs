pub mod alert;
pub mod block;
pub mod burn;
pub mod entry;
pub mod message;
pub mod summary;

pub use alert::{AlertLevel, BudgetAlert};
pub use block::{BillingBlock, TokenCounts};
pub use burn::{BurnRate, TokenBurnRate, Trend};
pub use entry::UsageEntry;
pub use message::{LogLine, MessageUsage};
pub use summary::{ModelBreakdown, SessionSummary};
