// Handler modules
pub mod aggregate;

// Re-export all handler functions
pub use aggregate::{AggregateOptions, aggregate_content, handle_aggregate};
