// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use bcp_core::BcpError;
use std::collections::BTreeMap;

/// Post-tuning draws of one independent chain, stored as name-keyed
/// parameter series of equal length.
///
/// Draws are Markov-dependent within a series; tuning-phase states are
/// never stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct Chain {
    chain_id: usize,
    draws: BTreeMap<&'static str, Vec<f64>>,
    len: usize,
}

impl Chain {
    /// Builds a chain from complete parameter series; all series must
    /// have the same length.
    pub fn from_series(
        chain_id: usize,
        series: Vec<(&'static str, Vec<f64>)>,
    ) -> Result<Self, BcpError> {
        let mut draws = BTreeMap::new();
        let mut len = None;
        for (name, values) in series {
            match len {
                None => len = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(BcpError::numerical_issue(format!(
                        "chain {chain_id} parameter '{name}' has {} draws, expected {expected}",
                        values.len()
                    )));
                }
                Some(_) => {}
            }
            if draws.insert(name, values).is_some() {
                return Err(BcpError::numerical_issue(format!(
                    "chain {chain_id} declares parameter '{name}' twice"
                )));
            }
        }
        Ok(Self {
            chain_id,
            draws,
            len: len.unwrap_or(0),
        })
    }

    pub fn chain_id(&self) -> usize {
        self.chain_id
    }

    /// Number of retained draws.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn parameter(&self, name: &str) -> Option<&[f64]> {
        self.draws.get(name).map(Vec::as_slice)
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.draws.keys().copied()
    }
}

/// Read-only collection of completed chains from one sampling run.
///
/// Chains aborted by numerical failure are absent; callers check
/// [`Trace::num_chains`] before running diagnostics or summarization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    chains: Vec<Chain>,
}

impl Trace {
    pub fn from_chains(mut chains: Vec<Chain>) -> Self {
        chains.sort_by_key(Chain::chain_id);
        Self { chains }
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn chain(&self, chain_id: usize) -> Option<&Chain> {
        self.chains.iter().find(|c| c.chain_id() == chain_id)
    }

    /// Flattens one parameter's draws across all chains, in chain-id
    /// order. Fails with `Summarization` when any chain lacks the series.
    pub fn pooled(&self, name: &str) -> Result<Vec<f64>, BcpError> {
        if self.chains.is_empty() {
            return Err(BcpError::summarization(format!(
                "trace holds no completed chains; cannot pool '{name}'"
            )));
        }
        let mut pooled = Vec::new();
        for chain in &self.chains {
            let series = chain.parameter(name).ok_or_else(|| {
                BcpError::summarization(format!(
                    "chain {} is missing required parameter '{name}'",
                    chain.chain_id()
                ))
            })?;
            pooled.extend_from_slice(series);
        }
        Ok(pooled)
    }
}

#[cfg(test)]
mod tests {
    use super::{Chain, Trace};
    use bcp_core::BcpError;

    fn chain(id: usize, tau: Vec<f64>) -> Chain {
        Chain::from_series(id, vec![("tau", tau.clone()), ("mu1", vec![0.0; tau.len()])])
            .expect("test chain is well-formed")
    }

    #[test]
    fn from_series_rejects_ragged_and_duplicate_parameters() {
        let ragged = Chain::from_series(0, vec![("tau", vec![1.0, 2.0]), ("mu1", vec![1.0])]);
        assert!(ragged.is_err());

        let duplicate = Chain::from_series(0, vec![("tau", vec![1.0]), ("tau", vec![2.0])]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn pooled_concatenates_in_chain_id_order() {
        let trace = Trace::from_chains(vec![chain(1, vec![3.0, 4.0]), chain(0, vec![1.0, 2.0])]);
        assert_eq!(trace.num_chains(), 2);
        assert_eq!(
            trace.pooled("tau").expect("tau is present"),
            vec![1.0, 2.0, 3.0, 4.0]
        );
        assert_eq!(trace.chain(1).map(Chain::len), Some(2));
    }

    #[test]
    fn pooled_fails_on_missing_parameter_or_empty_trace() {
        let trace = Trace::from_chains(vec![chain(0, vec![1.0])]);
        let err = trace.pooled("sigma").expect_err("sigma was never tracked");
        assert!(matches!(err, BcpError::Summarization(_)));

        let empty = Trace::default();
        assert!(matches!(
            empty.pooled("tau"),
            Err(BcpError::Summarization(_))
        ));
    }
}
