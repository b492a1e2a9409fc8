//! pandera-common — Shared types and errors used across all Pandera crates.

pub mod error;
pub mod kind;
pub mod schema;
pub mod catalog;

// Re-export commonly used types
pub use error::{PanderaError, Result};
pub use kind::ComputationKind;
pub use schema::{Constraint, ConstraintSchema, TIME_PERIOD_LABEL};
pub use catalog::{default_cards, ModelCard};
