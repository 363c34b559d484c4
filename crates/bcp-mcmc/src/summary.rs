// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::model::{MU1, MU2, TAU};
use crate::trace::Trace;
use bcp_core::{mean, BcpError, ReturnSeries};
use chrono::NaiveDate;

/// Posterior point summary of a single change point.
///
/// Serialized field names match the report layout consumed downstream,
/// hence the non-idiomatic renames.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PosteriorSummary {
    /// Rounded posterior mean of the change-point index into the
    /// return series.
    #[cfg_attr(feature = "serde", serde(rename = "ChangePoint_Index"))]
    pub change_point_index: usize,
    /// Calendar date of the regime change, one observation past the
    /// change-point index.
    #[cfg_attr(feature = "serde", serde(rename = "Date"))]
    pub date: NaiveDate,
    /// Pooled posterior mean of `mu1`.
    #[cfg_attr(feature = "serde", serde(rename = "Mean_Before"))]
    pub mu1_mean: f64,
    /// Pooled posterior mean of `mu2`.
    #[cfg_attr(feature = "serde", serde(rename = "Mean_After"))]
    pub mu2_mean: f64,
    /// `mu2_mean - mu1_mean`.
    #[cfg_attr(feature = "serde", serde(rename = "Difference"))]
    pub difference: f64,
}

/// Reduces a trace to a point summary against the series it was
/// sampled from.
///
/// The change-point index is the rounded pooled posterior mean of tau;
/// the date is taken one observation later, so it names the first day
/// of the new regime. Pure in the trace: summarizing twice yields the
/// same report.
pub fn summarize(trace: &Trace, series: &ReturnSeries) -> Result<PosteriorSummary, BcpError> {
    let tau_draws = trace.pooled(TAU)?;
    let mu2_draws = trace.pooled(MU2)?;
    let mu1_draws = trace.pooled(MU1)?;

    let tau_mean = mean(&tau_draws);
    if !tau_mean.is_finite() || tau_mean < 0.0 {
        return Err(BcpError::summarization(format!(
            "pooled tau mean must be finite and non-negative; got {tau_mean}"
        )));
    }
    let change_point_index = tau_mean.round() as usize;
    let date = series.change_date(change_point_index).ok_or_else(|| {
        BcpError::summarization(format!(
            "change-point index {change_point_index} has no date in a series of {} returns",
            series.n()
        ))
    })?;

    let mu1_mean = mean(&mu1_draws);
    let mu2_mean = mean(&mu2_draws);

    Ok(PosteriorSummary {
        change_point_index,
        date,
        mu1_mean,
        mu2_mean,
        difference: mu2_mean - mu1_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::summarize;
    use crate::model::{MU1, MU2, SIGMA, TAU};
    use crate::trace::{Chain, Trace};
    use bcp_core::{BcpError, ReturnSeries};
    use chrono::NaiveDate;

    fn series_of(n_prices: usize) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2020, 3, 2).expect("valid date");
        let records: Vec<(NaiveDate, f64)> = (0..n_prices)
            .map(|i| (start + chrono::Days::new(i as u64), 100.0 + i as f64))
            .collect();
        ReturnSeries::from_prices(&records).expect("valid series")
    }

    fn trace_with(tau: Vec<f64>, mu1: Vec<f64>, mu2: Vec<f64>) -> Trace {
        let len = tau.len();
        let chain = Chain::from_series(
            0,
            vec![
                (TAU, tau),
                (MU1, mu1),
                (MU2, mu2),
                (SIGMA, vec![0.02; len]),
            ],
        )
        .expect("valid chain");
        Trace::from_chains(vec![chain])
    }

    #[test]
    fn rounds_the_pooled_tau_mean_and_maps_one_day_past_it() {
        let series = series_of(12);
        // tau mean = 4.6 -> index 5 -> date at offset 6 from the start.
        let trace = trace_with(
            vec![4.0, 5.0, 5.0, 4.0, 5.0],
            vec![0.05; 5],
            vec![0.01; 5],
        );
        let summary = summarize(&trace, &series).expect("summary succeeds");
        assert_eq!(summary.change_point_index, 5);
        assert_eq!(
            summary.date,
            NaiveDate::from_ymd_opt(2020, 3, 8).expect("valid date")
        );
        assert!((summary.mu1_mean - 0.05).abs() < 1e-12);
        assert!((summary.mu2_mean - 0.01).abs() < 1e-12);
        assert!((summary.difference + 0.04).abs() < 1e-12);
    }

    #[test]
    fn pools_draws_across_chains_before_averaging() {
        let series = series_of(12);
        let a = Chain::from_series(
            0,
            vec![
                (TAU, vec![2.0, 2.0]),
                (MU1, vec![0.03, 0.03]),
                (MU2, vec![0.01, 0.01]),
                (SIGMA, vec![0.02, 0.02]),
            ],
        )
        .expect("valid chain");
        let b = Chain::from_series(
            1,
            vec![
                (TAU, vec![6.0, 6.0]),
                (MU1, vec![0.05, 0.05]),
                (MU2, vec![0.03, 0.03]),
                (SIGMA, vec![0.02, 0.02]),
            ],
        )
        .expect("valid chain");
        let trace = Trace::from_chains(vec![a, b]);

        let summary = summarize(&trace, &series).expect("summary succeeds");
        assert_eq!(summary.change_point_index, 4);
        assert!((summary.mu1_mean - 0.04).abs() < 1e-12);
        assert!((summary.mu2_mean - 0.02).abs() < 1e-12);
        assert!((summary.difference + 0.02).abs() < 1e-12);
    }

    #[test]
    fn summarizing_twice_yields_identical_reports() {
        let series = series_of(10);
        let trace = trace_with(vec![3.0, 4.0], vec![0.02, 0.04], vec![0.00, 0.01]);
        let first = summarize(&trace, &series).expect("first summary");
        let second = summarize(&trace, &series).expect("second summary");
        assert_eq!(first, second);
    }

    #[test]
    fn an_index_past_the_last_date_is_a_summarization_error() {
        // 5 prices -> 4 returns, dates run 0..=4; tau mean 4 needs the
        // date at offset 5, which does not exist.
        let series = series_of(5);
        let trace = trace_with(vec![4.0], vec![0.02], vec![0.01]);
        let err = summarize(&trace, &series).expect_err("index must be out of range");
        assert!(matches!(err, BcpError::Summarization(_)));
    }

    #[test]
    fn a_trace_missing_a_parameter_fails() {
        let series = series_of(10);
        let chain =
            Chain::from_series(0, vec![(TAU, vec![3.0])]).expect("valid chain");
        let trace = Trace::from_chains(vec![chain]);
        let err = summarize(&trace, &series).expect_err("missing mu draws must fail");
        assert!(matches!(err, BcpError::Summarization(_)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_the_published_field_names() {
        let series = series_of(12);
        let trace = trace_with(vec![3.0], vec![0.05], vec![0.01]);
        let summary = summarize(&trace, &series).expect("summary succeeds");

        let json = serde_json::to_value(&summary).expect("serializes");
        let object = json.as_object().expect("summary is a JSON object");
        for key in [
            "ChangePoint_Index",
            "Date",
            "Mean_Before",
            "Mean_After",
            "Difference",
        ] {
            assert!(object.contains_key(key), "missing field {key}");
        }
        assert_eq!(object["ChangePoint_Index"], 3);
    }
}
