// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod control;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod series;
pub mod stats;

pub use control::CancelToken;
pub use error::BcpError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink};
pub use series::ReturnSeries;
pub use stats::{ln_half_normal_pdf, ln_normal_pdf, mean, population_std};

/// Core shared types for bcp-rs.
pub fn crate_name() -> &'static str {
    "bcp-core"
}
