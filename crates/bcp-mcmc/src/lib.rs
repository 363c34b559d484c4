// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod analysis;
pub mod diagnostics;
pub mod model;
pub mod params;
pub mod sampler;
pub mod summary;
pub mod trace;

pub use analysis::ChangePointAnalysis;
pub use diagnostics::{compute_diagnostics, DiagnosticsReport, ParameterDiagnostics};
pub use model::{ChangePointModel, PosteriorModel};
pub use params::{ParamKind, ParameterSpec};
pub use sampler::{ChainFailureReport, SampleOutcome, Sampler, SamplerConfig};
pub use summary::{summarize, PosteriorSummary};
pub use trace::{Chain, Trace};

/// Bayesian single change-point inference for bcp-rs.
pub fn crate_name() -> &'static str {
    "bcp-mcmc"
}
