// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error taxonomy for the change-point engine.
///
/// Every failing stage surfaces a typed variant naming the unmet
/// precondition; no stage logs and continues with partial state.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BcpError {
    /// Malformed price input: non-positive or non-finite prices,
    /// non-increasing dates.
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// Series too short to support the piecewise-mean model.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Rejected sampler settings.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A stage that requires a built model was invoked before model
    /// construction.
    #[error("model not built: {0}")]
    ModelNotBuilt(String),

    /// Numerical failure inside one chain. Non-fatal to the run as a
    /// whole; the failing chain is simply absent from the trace.
    #[error("chain {chain} failed: {message}")]
    ChainFailure { chain: usize, message: String },

    /// Diagnostics requested with fewer than two completed chains.
    #[error("insufficient chains: {0}")]
    InsufficientChains(String),

    /// Trace is missing a parameter series required by summarization.
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// Non-finite value where a finite one is required.
    #[error("numerical issue: {0}")]
    NumericalIssue(String),

    /// Cooperative cancellation was requested.
    #[error("cancelled")]
    Cancelled,
}

impl BcpError {
    pub fn invalid_series(message: impl Into<String>) -> Self {
        Self::InvalidSeries(message.into())
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::InsufficientData(message.into())
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub fn model_not_built(message: impl Into<String>) -> Self {
        Self::ModelNotBuilt(message.into())
    }

    pub fn chain_failure(chain: usize, message: impl Into<String>) -> Self {
        Self::ChainFailure {
            chain,
            message: message.into(),
        }
    }

    pub fn insufficient_chains(message: impl Into<String>) -> Self {
        Self::InsufficientChains(message.into())
    }

    pub fn summarization(message: impl Into<String>) -> Self {
        Self::Summarization(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// True for the variants that are fatal to the call that raised them.
    ///
    /// `ChainFailure` is the one non-fatal kind: it degrades the trace but
    /// does not abort sibling chains.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ChainFailure { .. })
    }
}
