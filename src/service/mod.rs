pub mod fund;

// Re-export FundService to make it accessible via `crate::service::FundService`
pub use fund::{status_line, FundService};
