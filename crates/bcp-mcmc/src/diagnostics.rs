// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::trace::Trace;
use bcp_core::BcpError;

/// Variances below this are treated as exactly zero when forming the
/// R-hat ratio.
const VARIANCE_FLOOR: f64 = 1e-12;
/// Autocorrelation sums stop at the first lag below this, or at the cap.
const AUTOCORR_CUTOFF: f64 = 0.05;
const MAX_AUTOCORR_LAG: usize = 250;

/// Per-parameter convergence metrics.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDiagnostics {
    pub name: String,
    /// Gelman-Rubin potential scale reduction factor. Values near 1.0
    /// indicate the chains have mixed.
    pub r_hat: f64,
    /// Effective sample size pooled across chains.
    pub ess: f64,
}

/// Convergence report over every tracked parameter.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticsReport {
    pub chains: usize,
    pub draws_per_chain: usize,
    pub parameters: Vec<ParameterDiagnostics>,
}

impl DiagnosticsReport {
    /// True when every parameter's R-hat is at or below `threshold`.
    pub fn converged(&self, threshold: f64) -> bool {
        self.parameters.iter().all(|p| p.r_hat <= threshold)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDiagnostics> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Computes Gelman-Rubin R-hat and effective sample size for every
/// parameter in the trace.
///
/// At least two completed chains of equal, non-trivial length are
/// required; between-chain comparison is meaningless otherwise.
pub fn compute_diagnostics(trace: &Trace) -> Result<DiagnosticsReport, BcpError> {
    let chains = trace.chains();
    if chains.len() < 2 {
        return Err(BcpError::insufficient_chains(format!(
            "Gelman-Rubin diagnostics require >= 2 completed chains; got {}",
            chains.len()
        )));
    }
    let draws = chains[0].len();
    if draws < 2 {
        return Err(BcpError::insufficient_chains(format!(
            "Gelman-Rubin diagnostics require >= 2 draws per chain; got {draws}"
        )));
    }
    // Unequal lengths mean a bookkeeping bug upstream, not an
    // under-provisioned run, so they surface as a numerical issue.
    if chains.iter().any(|c| c.len() != draws) {
        return Err(BcpError::numerical_issue(
            "chains hold unequal draw counts; diagnostics need aligned chains",
        ));
    }

    let names: Vec<&'static str> = chains[0].parameter_names().collect();
    let mut parameters = Vec::with_capacity(names.len());
    for name in names {
        let mut per_chain = Vec::with_capacity(chains.len());
        for chain in chains {
            let draws = chain.parameter(name).ok_or_else(|| {
                BcpError::numerical_issue(format!(
                    "chain {} does not track parameter '{name}'",
                    chain.chain_id()
                ))
            })?;
            per_chain.push(draws);
        }
        parameters.push(ParameterDiagnostics {
            name: name.to_owned(),
            r_hat: gelman_rubin(&per_chain),
            ess: per_chain.iter().map(|c| effective_sample_size(c)).sum(),
        });
    }

    Ok(DiagnosticsReport {
        chains: chains.len(),
        draws_per_chain: draws,
        parameters,
    })
}

/// Classic (non-split) Gelman-Rubin potential scale reduction factor.
///
/// Degenerate cases: if both the within-chain variance W and the
/// between-chain variance B collapse to zero the chains agree on a
/// constant and R-hat is 1.0; if only W collapses the chains are stuck
/// at different constants and R-hat is infinite.
fn gelman_rubin(chains: &[&[f64]]) -> f64 {
    let m = chains.len() as f64;
    let n = chains[0].len() as f64;

    let means: Vec<f64> = chains.iter().map(|c| bcp_core::mean(c)).collect();
    let grand_mean = bcp_core::mean(&means);

    // W: mean of the per-chain sample variances (ddof = 1).
    let w = chains
        .iter()
        .zip(&means)
        .map(|(chain, &chain_mean)| {
            chain
                .iter()
                .map(|&x| (x - chain_mean).powi(2))
                .sum::<f64>()
                / (n - 1.0)
        })
        .sum::<f64>()
        / m;

    // B: n times the variance of the chain means (ddof = 1).
    let b = n * means
        .iter()
        .map(|&chain_mean| (chain_mean - grand_mean).powi(2))
        .sum::<f64>()
        / (m - 1.0);

    if w <= VARIANCE_FLOOR {
        return if b <= VARIANCE_FLOOR { 1.0 } else { f64::INFINITY };
    }

    let var_plus = (n - 1.0) / n * w + b / n;
    (var_plus / w).sqrt()
}

/// Effective sample size of a single chain via truncated autocorrelation:
/// `n / (1 + 2 * sum(rho_k))`, summed until the first lag whose
/// autocorrelation drops below the cutoff.
fn effective_sample_size(chain: &[f64]) -> f64 {
    let n = chain.len();
    if n < 2 {
        return n as f64;
    }

    let mean = bcp_core::mean(chain);
    let variance = chain.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= VARIANCE_FLOOR {
        // A constant chain carries no autocorrelation structure.
        return n as f64;
    }

    let max_lag = (n / 2).min(MAX_AUTOCORR_LAG);
    let mut rho_sum = 0.0;
    for lag in 1..=max_lag {
        let autocov = chain
            .iter()
            .zip(&chain[lag..])
            .map(|(&a, &b)| (a - mean) * (b - mean))
            .sum::<f64>()
            / n as f64;
        let rho = autocov / variance;
        if rho < AUTOCORR_CUTOFF {
            break;
        }
        rho_sum += rho;
    }

    n as f64 / (1.0 + 2.0 * rho_sum)
}
