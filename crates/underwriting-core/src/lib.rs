pub mod amortization;
pub mod config;
pub mod error;
pub mod metrics;
pub mod projection;
pub mod types;

#[cfg(feature = "grading")]
pub mod grading;

#[cfg(feature = "advisor")]
pub mod advisor;

pub use error::UnderwritingError;
pub use types::*;

/// Standard result type for all underwriting computations
pub type UnderwritingResult<T> = Result<T, UnderwritingError>;
