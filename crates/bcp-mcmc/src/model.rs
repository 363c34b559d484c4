// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::params::{ParamKind, ParameterSpec};
use bcp_core::{ln_half_normal_pdf, ln_normal_pdf, mean, population_std, BcpError, ReturnSeries};
use rand::Rng;
use rand_distr::{Distribution, Normal};

pub const TAU: &str = "tau";
pub const MU1: &str = "mu1";
pub const MU2: &str = "mu2";
pub const SIGMA: &str = "sigma";

const LOG_SIGMA_INITIAL_STEP: f64 = 0.5;

/// Target density for the Metropolis-within-Gibbs sampler: parameter
/// declarations, prior initialization, and the joint log-density.
///
/// The sampler is generic over this seam, so chain mechanics (seeding,
/// adaptation, failure handling) are testable against targets other
/// than the change-point posterior.
pub trait PosteriorModel: Send + Sync {
    /// Declares the sampled parameters, in state order.
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Draws an initial state inside the support.
    fn sample_initial_state<R: Rng>(&self, rng: &mut R) -> Vec<f64>;

    /// Joint log-density of a state; `-inf` outside the support.
    fn log_posterior(&self, state: &[f64]) -> f64;
}

/// Immutable single change-point model over a log-return series.
///
/// Priors are parameterized from the series' empirical moments:
/// `tau ~ DiscreteUniform(0, n-1)`, `mu1, mu2 ~ Normal(ybar, s)`,
/// `sigma ~ HalfNormal(s)`. The likelihood assigns
/// `y[t] ~ Normal(mean(t), sigma)` with the per-index mean rule
///
/// ```text
/// mean(t) = mu2  if tau >= t  else mu1
/// ```
///
/// i.e. the regime-2 mean applies at and below the break index, the
/// regime-1 mean strictly after it. The rule is part of the published
/// output contract and is kept as-is even though it reads inverted
/// against the "mu1 = before, mu2 = after" naming of the summary labels.
///
/// Prefix sums over `y` and `y^2` reduce each likelihood evaluation to
/// O(1) given a split, so a full sampling run is O(iterations), not
/// O(iterations * n).
#[derive(Clone, Debug, PartialEq)]
pub struct ChangePointModel {
    n: usize,
    prior_location: f64,
    prior_scale: f64,
    prefix_sum: Vec<f64>,
    prefix_sum_sq: Vec<f64>,
}

impl ChangePointModel {
    /// Builds the model from a validated return series.
    ///
    /// Fails with `InsufficientData` for `n < 2` and with
    /// `NumericalIssue` when the series has zero variance, which would
    /// degenerate every prior scale to zero.
    pub fn new(series: &ReturnSeries) -> Result<Self, BcpError> {
        let y = series.returns();
        let n = y.len();
        if n < 2 {
            return Err(BcpError::insufficient_data(format!(
                "change-point model requires n >= 2 log-returns; got {n}"
            )));
        }

        let prior_location = mean(y);
        let prior_scale = population_std(y);
        if !prior_scale.is_finite() || prior_scale <= 0.0 {
            return Err(BcpError::numerical_issue(format!(
                "series standard deviation must be finite and > 0 to scale the priors; got {prior_scale}"
            )));
        }

        let mut prefix_sum = Vec::with_capacity(n + 1);
        let mut prefix_sum_sq = Vec::with_capacity(n + 1);
        prefix_sum.push(0.0);
        prefix_sum_sq.push(0.0);
        for &value in y {
            prefix_sum.push(prefix_sum[prefix_sum.len() - 1] + value);
            prefix_sum_sq.push(prefix_sum_sq[prefix_sum_sq.len() - 1] + value * value);
        }

        Ok(Self {
            n,
            prior_location,
            prior_scale,
            prefix_sum,
            prefix_sum_sq,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Empirical mean of the return series; location of the `mu` priors.
    pub fn prior_location(&self) -> f64 {
        self.prior_location
    }

    /// Empirical standard deviation; scale of the `mu` and `sigma` priors.
    pub fn prior_scale(&self) -> f64 {
        self.prior_scale
    }

    /// Declares the sampled parameters and their walk kinds, in state
    /// order: `tau`, `mu1`, `mu2`, `sigma`.
    pub fn parameters(&self) -> [ParameterSpec; 4] {
        [
            ParameterSpec {
                name: TAU,
                kind: ParamKind::DiscreteBounded {
                    lower: 0,
                    upper: self.n as i64 - 1,
                    width: ((self.n / 20) as i64).max(1),
                },
                initial_step: 1.0,
            },
            ParameterSpec {
                name: MU1,
                kind: ParamKind::ContinuousUnconstrained,
                initial_step: self.prior_scale,
            },
            ParameterSpec {
                name: MU2,
                kind: ParamKind::ContinuousUnconstrained,
                initial_step: self.prior_scale,
            },
            ParameterSpec {
                name: SIGMA,
                kind: ParamKind::ContinuousPositive,
                initial_step: LOG_SIGMA_INITIAL_STEP,
            },
        ]
    }

    /// Draws an initial state from the priors: `tau` uniform over its
    /// domain, `mu1`/`mu2` from their Normal priors, `sigma` from the
    /// half-normal (strictly positive).
    pub fn sample_initial_state<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let mu_prior = Normal::new(self.prior_location, self.prior_scale)
            .expect("prior scale is validated > 0 at construction");
        let half_normal_base =
            Normal::new(0.0, self.prior_scale).expect("prior scale is validated > 0");

        let tau = rng.random_range(0..self.n) as f64;
        let mu1 = mu_prior.sample(rng);
        let mu2 = mu_prior.sample(rng);
        let sigma = loop {
            let draw = half_normal_base.sample(rng).abs();
            if draw > 0.0 {
                break draw;
            }
        };

        vec![tau, mu1, mu2, sigma]
    }

    /// Joint log-density (prior x likelihood) of a state, `-inf` outside
    /// the support.
    ///
    /// State layout matches [`ChangePointModel::parameters`].
    pub fn log_posterior(&self, state: &[f64]) -> f64 {
        let (tau, mu1, mu2, sigma) = (state[0], state[1], state[2], state[3]);

        if tau < 0.0 || tau > (self.n - 1) as f64 {
            return f64::NEG_INFINITY;
        }
        if sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }

        let log_prior = -(self.n as f64).ln()
            + ln_normal_pdf(mu1, self.prior_location, self.prior_scale)
            + ln_normal_pdf(mu2, self.prior_location, self.prior_scale)
            + ln_half_normal_pdf(sigma, self.prior_scale);

        log_prior + self.log_likelihood(tau as usize, mu1, mu2, sigma)
    }

    /// Gaussian log-likelihood with the series split at `tau`: indices
    /// `0..=tau` against `mu2`, `tau+1..n` against `mu1`.
    fn log_likelihood(&self, tau: usize, mu1: f64, mu2: f64, sigma: f64) -> f64 {
        let n = self.n as f64;
        let head = tau + 1;

        let head_count = head as f64;
        let head_sum = self.prefix_sum[head];
        let head_sum_sq = self.prefix_sum_sq[head];
        let head_ss = head_sum_sq - 2.0 * mu2 * head_sum + head_count * mu2 * mu2;

        let tail_count = n - head_count;
        let tail_sum = self.prefix_sum[self.n] - head_sum;
        let tail_sum_sq = self.prefix_sum_sq[self.n] - head_sum_sq;
        let tail_ss = tail_sum_sq - 2.0 * mu1 * tail_sum + tail_count * mu1 * mu1;

        -0.5 * n * (2.0 * std::f64::consts::PI).ln()
            - n * sigma.ln()
            - (head_ss + tail_ss) / (2.0 * sigma * sigma)
    }
}

impl PosteriorModel for ChangePointModel {
    fn parameters(&self) -> Vec<ParameterSpec> {
        ChangePointModel::parameters(self).to_vec()
    }

    fn sample_initial_state<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        ChangePointModel::sample_initial_state(self, rng)
    }

    fn log_posterior(&self, state: &[f64]) -> f64 {
        ChangePointModel::log_posterior(self, state)
    }
}
