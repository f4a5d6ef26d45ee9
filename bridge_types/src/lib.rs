//! # Bridge Types
//!
//! Shared vocabulary for both ends of a bridge.
//!
//! ## Key Types
//!
//! - [`CallKey`]: Correlation key linking an outbound call to its reply
//! - [`ErrorCode`]: Closed set of failure codes a call can settle with
//! - [`BridgeId`]: Identity of one bridge instance, used in log fields
//! - [`Value`]: The structured-data value carried as arguments and results

pub mod error_code;
pub mod ids;

pub use error_code::ErrorCode;
pub use ids::{BridgeId, CallKey};

/// Structured-data value used for call arguments and results.
pub use serde_json::Value;
