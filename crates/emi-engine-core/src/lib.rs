pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "calculator")]
pub mod calculator;

#[cfg(feature = "reconciliation")]
pub mod reconciliation;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "summary")]
pub mod summary;

#[cfg(feature = "draft")]
pub mod draft;

pub use error::EmiEngineError;
pub use types::*;

/// Standard result type for all EMI engine operations
pub type EmiEngineResult<T> = Result<T, EmiEngineError>;
