// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::model::{PosteriorModel, MU1, MU2, SIGMA, TAU};
use crate::params::ParamWalker;
use crate::trace::{Chain, Trace};
use bcp_core::{BcpError, ExecutionContext};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

const DEFAULT_CANCEL_CHECK_EVERY: usize = 64;
/// Golden-ratio stride keeps per-chain seeds well separated.
const CHAIN_SEED_STRIDE: u64 = 0x9e37_79b9_7f4a_7c15;

/// Sampling configuration: `tune` adaptation iterations, `draws`
/// recorded iterations, `chains` independent walkers, and the
/// `target_accept` rate the continuous proposals adapt toward.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    pub tune: usize,
    pub draws: usize,
    pub chains: usize,
    pub target_accept: f64,
    /// Base seed; chain `c` derives its own stream from it.
    pub seed: u64,
    /// Cancellation poll cadence in iterations.
    pub cancel_check_every: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tune: 500,
            draws: 1000,
            chains: 2,
            target_accept: 0.9,
            seed: 0,
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<(), BcpError> {
        if self.draws == 0 {
            return Err(BcpError::invalid_configuration(
                "SamplerConfig.draws must be >= 1; got 0",
            ));
        }
        if self.chains == 0 {
            return Err(BcpError::invalid_configuration(
                "SamplerConfig.chains must be >= 1; got 0",
            ));
        }
        if !self.target_accept.is_finite()
            || self.target_accept <= 0.0
            || self.target_accept >= 1.0
        {
            return Err(BcpError::invalid_configuration(format!(
                "SamplerConfig.target_accept must be finite and in (0, 1); got {}",
                self.target_accept
            )));
        }
        Ok(())
    }

    fn normalized_cancel_check_every(&self) -> usize {
        self.cancel_check_every.max(1)
    }
}

/// One chain's numerical failure, reported without aborting the run.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainFailureReport {
    pub chain: usize,
    pub message: String,
}

/// Result of a sampling run: completed chains plus per-chain failure
/// reports for the ones that aborted.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleOutcome {
    pub trace: Trace,
    pub failures: Vec<ChainFailureReport>,
}

impl SampleOutcome {
    /// True when every configured chain completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Metropolis-within-Gibbs sampler over a [`PosteriorModel`] target.
///
/// Each chain owns its RNG stream and state; chains never communicate,
/// so the `rayon` feature runs them in parallel with bit-identical
/// results to the sequential fallback.
#[derive(Clone, Debug)]
pub struct Sampler<M> {
    model: M,
    config: SamplerConfig,
}

impl<M: PosteriorModel> Sampler<M> {
    pub fn new(model: M, config: SamplerConfig) -> Result<Self, BcpError> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Runs all configured chains and assembles the trace.
    ///
    /// Cancellation aborts the whole run with `Cancelled`; a numerical
    /// failure inside one chain only removes that chain from the trace
    /// and is reported in [`SampleOutcome::failures`].
    pub fn run(&self, ctx: &ExecutionContext<'_>) -> Result<SampleOutcome, BcpError> {
        ctx.check_cancelled()?;

        #[cfg(feature = "rayon")]
        let results: Vec<(usize, Result<Chain, BcpError>)> = (0..self.config.chains)
            .into_par_iter()
            .map(|chain| (chain, self.run_chain(chain, ctx)))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let results: Vec<(usize, Result<Chain, BcpError>)> = (0..self.config.chains)
            .map(|chain| {
                let result = self.run_chain(chain, ctx);
                ctx.report_progress((chain + 1) as f32 / self.config.chains as f32);
                (chain, result)
            })
            .collect();

        #[cfg(feature = "rayon")]
        ctx.report_progress(1.0);

        let mut chains = Vec::with_capacity(self.config.chains);
        let mut failures = Vec::new();
        for (chain_id, result) in results {
            match result {
                Ok(chain) => chains.push(chain),
                Err(BcpError::ChainFailure { chain, message }) => {
                    debug_assert_eq!(chain, chain_id);
                    failures.push(ChainFailureReport { chain, message });
                }
                Err(fatal) => return Err(fatal),
            }
        }

        Ok(SampleOutcome {
            trace: Trace::from_chains(chains),
            failures,
        })
    }

    /// Runs one independently seeded chain: `tune` adaptation iterations,
    /// then `draws` recorded iterations with frozen step sizes. The
    /// tuning trajectory is discarded.
    fn run_chain(&self, chain: usize, ctx: &ExecutionContext<'_>) -> Result<Chain, BcpError> {
        let specs = self.model.parameters();
        let seed = self
            .config
            .seed
            .wrapping_add((chain as u64).wrapping_mul(CHAIN_SEED_STRIDE));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        let mut state = self.model.sample_initial_state(&mut rng);
        let mut log_post = self.model.log_posterior(&state);
        if !log_post.is_finite() {
            return Err(BcpError::chain_failure(
                chain,
                format!("non-finite initial log-posterior: {log_post}"),
            ));
        }

        let mut walkers: Vec<ParamWalker> = specs
            .iter()
            .map(|spec| ParamWalker::new(spec.kind, spec.initial_step))
            .collect();

        let tune = self.config.tune;
        let draws = self.config.draws;
        let every = self.config.normalized_cancel_check_every();
        let mut storage: Vec<Vec<f64>> = specs.iter().map(|_| Vec::with_capacity(draws)).collect();

        for iteration in 0..tune + draws {
            ctx.check_cancelled_every(iteration, every)?;

            if iteration == tune {
                for walker in &mut walkers {
                    walker.freeze();
                }
            }

            for (idx, walker) in walkers.iter_mut().enumerate() {
                let proposal = walker.propose(state[idx], &mut rng);
                let current = state[idx];
                state[idx] = proposal.value;
                let candidate_log_post = self.model.log_posterior(&state);

                if candidate_log_post.is_nan() {
                    return Err(BcpError::chain_failure(
                        chain,
                        format!(
                            "non-finite density while updating '{}' at iteration {iteration}",
                            specs[idx].name
                        ),
                    ));
                }

                let log_alpha = candidate_log_post - log_post + proposal.log_jacobian;
                let accepted = log_alpha >= 0.0 || rng.random::<f64>().ln() < log_alpha;
                if accepted {
                    log_post = candidate_log_post;
                } else {
                    state[idx] = current;
                }
                walker.record(accepted, iteration, self.config.target_accept);
            }

            if iteration >= tune {
                for (idx, series) in storage.iter_mut().enumerate() {
                    series.push(state[idx]);
                }
            }
        }

        for (spec, walker) in specs.iter().zip(&walkers) {
            let key = match spec.name {
                TAU => "accept_rate.tau",
                MU1 => "accept_rate.mu1",
                MU2 => "accept_rate.mu2",
                SIGMA => "accept_rate.sigma",
                _ => continue,
            };
            ctx.record_scalar(key, walker.acceptance_rate());
        }

        Chain::from_series(
            chain,
            specs
                .iter()
                .map(|spec| spec.name)
                .zip(storage)
                .collect::<Vec<_>>(),
        )
    }
}
