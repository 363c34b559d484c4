// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::diagnostics::{compute_diagnostics, DiagnosticsReport};
use crate::model::ChangePointModel;
use crate::sampler::{ChainFailureReport, Sampler, SamplerConfig};
use crate::summary::{summarize, PosteriorSummary};
use crate::trace::Trace;
use bcp_core::{BcpError, ExecutionContext, ReturnSeries};
use chrono::NaiveDate;

/// Staged change-point analysis over one return series.
///
/// The stages mirror the modeling workflow: build the model, sample,
/// then diagnose or summarize the trace. Calling a stage before its
/// prerequisite fails with a stage-specific error rather than a panic.
#[derive(Debug)]
pub struct ChangePointAnalysis {
    series: ReturnSeries,
    model: Option<ChangePointModel>,
    trace: Option<Trace>,
    failures: Vec<ChainFailureReport>,
}

impl ChangePointAnalysis {
    pub fn new(series: ReturnSeries) -> Self {
        Self {
            series,
            model: None,
            trace: None,
            failures: Vec::new(),
        }
    }

    /// Builds the analysis straight from dated prices.
    pub fn from_prices(records: &[(NaiveDate, f64)]) -> Result<Self, BcpError> {
        Ok(Self::new(ReturnSeries::from_prices(records)?))
    }

    pub fn series(&self) -> &ReturnSeries {
        &self.series
    }

    /// Parameterizes the model from the series. Rebuilding replaces the
    /// previous model but leaves any existing trace untouched.
    pub fn build_model(&mut self) -> Result<&ChangePointModel, BcpError> {
        let model = ChangePointModel::new(&self.series)?;
        Ok(self.model.insert(model))
    }

    pub fn model(&self) -> Option<&ChangePointModel> {
        self.model.as_ref()
    }

    /// Runs the sampler against the built model and stores the trace.
    pub fn run_sampler(
        &mut self,
        config: SamplerConfig,
        ctx: &ExecutionContext<'_>,
    ) -> Result<&Trace, BcpError> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| BcpError::model_not_built("call build_model before run_sampler"))?;
        let outcome = Sampler::new(model, config)?.run(ctx)?;
        self.failures = outcome.failures;
        Ok(self.trace.insert(outcome.trace))
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Failure reports from the most recent sampling run.
    pub fn chain_failures(&self) -> &[ChainFailureReport] {
        &self.failures
    }

    pub fn diagnostics(&self) -> Result<DiagnosticsReport, BcpError> {
        let trace = self.trace.as_ref().ok_or_else(|| {
            BcpError::insufficient_chains("no completed chains; call run_sampler first")
        })?;
        compute_diagnostics(trace)
    }

    pub fn summarize(&self) -> Result<PosteriorSummary, BcpError> {
        let trace = self
            .trace
            .as_ref()
            .ok_or_else(|| BcpError::summarization("no trace; call run_sampler first"))?;
        summarize(trace, &self.series)
    }
}
