//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! implementations.

pub mod services;

pub use services::{IngestionReport, IngestionService, RagService};
