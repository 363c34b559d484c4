// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::control::CancelToken;
use crate::error::BcpError;
use crate::observability::{ProgressSink, TelemetrySink};

/// Execution context threaded through sampler calls.
///
/// Carries optional cooperative-cancellation and observability hooks.
/// Chains poll cancellation between iterations so a long sampling run
/// stays bounded even though one iteration is never interrupted.
pub struct ExecutionContext<'a> {
    pub cancel: Option<&'a CancelToken>,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl Default for ExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context with no hooks attached.
    pub fn new() -> Self {
        Self {
            cancel: None,
            progress: None,
            telemetry: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Returns `BcpError::Cancelled` once cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), BcpError> {
        if self.is_cancelled() {
            return Err(BcpError::cancelled());
        }
        Ok(())
    }

    /// Polls cancellation every `every` iterations; `every == 0` polls
    /// on every iteration.
    pub fn check_cancelled_every(&self, iteration: usize, every: usize) -> Result<(), BcpError> {
        let every = every.max(1);
        if iteration % every != 0 {
            return Ok(());
        }
        self.check_cancelled()
    }

    /// Emits clamped progress to the sink, if configured. Non-finite
    /// fractions are dropped.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    /// Emits a named scalar to the telemetry sink, if configured.
    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionContext;
    use crate::control::CancelToken;
    use crate::observability::{ProgressSink, TelemetrySink};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        fractions: Mutex<Vec<f32>>,
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, fraction: f32) {
            self.fractions.lock().expect("progress lock").push(fraction);
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        scalars: Mutex<Vec<(&'static str, f64)>>,
    }

    impl TelemetrySink for RecordingTelemetry {
        fn record_scalar(&self, key: &'static str, value: f64) {
            self.scalars.lock().expect("telemetry lock").push((key, value));
        }
    }

    #[test]
    fn default_context_has_no_hooks_and_never_cancels() {
        let ctx = ExecutionContext::new();
        assert!(!ctx.is_cancelled());
        assert!(ctx.check_cancelled().is_ok());
        ctx.report_progress(0.5);
        ctx.record_scalar("noop", 1.0);
    }

    #[test]
    fn check_cancelled_surfaces_cancelled_error() {
        let token = CancelToken::new();
        let ctx = ExecutionContext::new().with_cancel(&token);

        assert!(ctx.check_cancelled().is_ok());
        token.cancel();
        let err = ctx.check_cancelled().expect_err("must observe cancellation");
        assert_eq!(err.to_string(), "cancelled");
    }

    #[test]
    fn check_cancelled_every_respects_cadence_and_zero_means_always() {
        let token = CancelToken::new();
        let ctx = ExecutionContext::new().with_cancel(&token);
        token.cancel();

        assert!(ctx.check_cancelled_every(3, 4).is_ok());
        assert!(ctx.check_cancelled_every(4, 4).is_err());
        assert!(ctx.check_cancelled_every(7, 0).is_err());
    }

    #[test]
    fn report_progress_clamps_and_drops_non_finite() {
        let progress = RecordingProgress::default();
        let ctx = ExecutionContext::new().with_progress_sink(&progress);

        ctx.report_progress(-0.5);
        ctx.report_progress(0.75);
        ctx.report_progress(2.0);
        ctx.report_progress(f32::NAN);

        let seen = progress.fractions.lock().expect("progress lock").clone();
        assert_eq!(seen, vec![0.0, 0.75, 1.0]);
    }

    #[test]
    fn record_scalar_forwards_to_sink() {
        let telemetry = RecordingTelemetry::default();
        let ctx = ExecutionContext::new().with_telemetry_sink(&telemetry);

        ctx.record_scalar("accept_rate.mu1", 0.91);
        let seen = telemetry.scalars.lock().expect("telemetry lock").clone();
        assert_eq!(seen, vec![("accept_rate.mu1", 0.91)]);
    }
}
