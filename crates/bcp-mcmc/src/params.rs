// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Tagged parameter kinds, each with its own proposal-and-acceptance
/// strategy.
///
/// The tag isolates the "which distribution family" decision from the
/// "how do we walk the state space" mechanism: the generic
/// Metropolis-within-Gibbs loop in the sampler only ever sees a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Integer-valued parameter on `[lower, upper]`, updated by a
    /// symmetric random walk with reflection at the boundaries. The
    /// proposal width is fixed; only continuous steps adapt.
    DiscreteBounded { lower: i64, upper: i64, width: i64 },
    /// Real-valued parameter walked by a Gaussian step in its own scale.
    ContinuousUnconstrained,
    /// Strictly positive parameter walked by a Gaussian step on its
    /// logarithm; positivity holds by construction and the acceptance
    /// ratio carries the change-of-variable Jacobian.
    ContinuousPositive,
}

/// A sampled parameter: stable name, walk kind, and the natural scale
/// its walker starts from (log-space scale for positive parameters,
/// ignored by discrete walks).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub initial_step: f64,
}

const LOG_STEP_MIN: f64 = -20.0;
const LOG_STEP_MAX: f64 = 10.0;

/// Per-parameter random-walk state: proposal mechanics, adaptive step
/// size, and acceptance counters.
#[derive(Clone, Debug)]
pub(crate) struct ParamWalker {
    kind: ParamKind,
    log_step: f64,
    frozen: bool,
    proposed: u64,
    accepted: u64,
}

/// A proposed move: candidate value plus the log-proposal asymmetry
/// (`ln q(x'|x) - ln q(x|x')`-corrected term) to add to the Metropolis
/// ratio. Zero for the symmetric kinds.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ProposedMove {
    pub value: f64,
    pub log_jacobian: f64,
}

impl ParamWalker {
    /// Creates a walker with its initial step sized to the parameter's
    /// natural scale.
    pub fn new(kind: ParamKind, initial_scale: f64) -> Self {
        let scale = if initial_scale.is_finite() && initial_scale > 0.0 {
            initial_scale
        } else {
            1.0
        };
        Self {
            kind,
            log_step: scale.ln().clamp(LOG_STEP_MIN, LOG_STEP_MAX),
            frozen: false,
            proposed: 0,
            accepted: 0,
        }
    }

    fn step(&self) -> f64 {
        self.log_step.exp()
    }

    /// Draws a candidate move from the current value.
    pub fn propose<R: Rng>(&self, current: f64, rng: &mut R) -> ProposedMove {
        match self.kind {
            ParamKind::DiscreteBounded {
                lower,
                upper,
                width,
            } => {
                if upper <= lower {
                    // Degenerate one-point domain: nowhere to walk.
                    return ProposedMove {
                        value: lower as f64,
                        log_jacobian: 0.0,
                    };
                }
                let width = width.clamp(1, upper - lower);
                // Symmetric non-zero integer displacement in [-width, width].
                let magnitude = rng.random_range(1..=width);
                let delta = if rng.random::<bool>() {
                    magnitude
                } else {
                    -magnitude
                };

                let mut candidate = current as i64 + delta;
                while candidate < lower || candidate > upper {
                    if candidate < lower {
                        candidate = 2 * lower - candidate;
                    }
                    if candidate > upper {
                        candidate = 2 * upper - candidate;
                    }
                }

                ProposedMove {
                    value: candidate as f64,
                    log_jacobian: 0.0,
                }
            }
            ParamKind::ContinuousUnconstrained => {
                let z: f64 = StandardNormal.sample(rng);
                ProposedMove {
                    value: current + self.step() * z,
                    log_jacobian: 0.0,
                }
            }
            ParamKind::ContinuousPositive => {
                let z: f64 = StandardNormal.sample(rng);
                let log_candidate = current.ln() + self.step() * z;
                ProposedMove {
                    value: log_candidate.exp(),
                    // d(ln x) walk in x-space: q-ratio contributes x'/x.
                    log_jacobian: log_candidate - current.ln(),
                }
            }
        }
    }

    /// Records an accept/reject outcome and, while tuning, nudges the
    /// continuous step toward `target_accept` by a Robbins-Monro update
    /// with decaying gain. Discrete widths never adapt.
    pub fn record(&mut self, accepted: bool, tuning_iteration: usize, target_accept: f64) {
        self.proposed += 1;
        if accepted {
            self.accepted += 1;
        }

        if self.frozen || matches!(self.kind, ParamKind::DiscreteBounded { .. }) {
            return;
        }

        let outcome = if accepted { 1.0 } else { 0.0 };
        let gain = (tuning_iteration as f64 + 1.0).powf(-0.6);
        self.log_step =
            (self.log_step + gain * (outcome - target_accept)).clamp(LOG_STEP_MIN, LOG_STEP_MAX);
    }

    /// Freezes the step size at the end of tuning and resets counters so
    /// the reported acceptance rate covers the sampling phase only.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.proposed = 0;
        self.accepted = 0;
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.proposed as f64
    }
}
