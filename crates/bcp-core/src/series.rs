// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::BcpError;
use chrono::NaiveDate;

/// Validated, immutable log-return series derived from a dated price
/// series.
///
/// Holds the original dates (length `n + 1`) alongside the first-differenced
/// log-returns (length `n`); the summarizer needs both to map a break index
/// back to a calendar date, and keeping them in one value rules out pairing
/// a trace with the wrong date axis.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    returns: Vec<f64>,
}

impl ReturnSeries {
    /// Builds the series from ordered `(date, price)` records.
    ///
    /// Validation happens before any log is taken: every price must be
    /// finite and `> 0`, dates must be strictly increasing, and at least
    /// three records are required so that the differenced series has
    /// `n >= 2` observations.
    pub fn from_prices(records: &[(NaiveDate, f64)]) -> Result<Self, BcpError> {
        if records.len() < 3 {
            return Err(BcpError::insufficient_data(format!(
                "need at least 3 price records for n >= 2 log-returns; got {}",
                records.len()
            )));
        }

        for (idx, (_, price)) in records.iter().enumerate() {
            if !price.is_finite() || *price <= 0.0 {
                return Err(BcpError::invalid_series(format!(
                    "price at index {idx} must be finite and > 0; got {price}"
                )));
            }
        }

        for (idx, pair) in records.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(BcpError::invalid_series(format!(
                    "dates must be strictly increasing; record {} ({}) is not after record {} ({})",
                    idx + 1,
                    pair[1].0,
                    idx,
                    pair[0].0
                )));
            }
        }

        let dates = records.iter().map(|(date, _)| *date).collect();
        let returns = records
            .windows(2)
            .map(|pair| (pair[1].1 / pair[0].1).ln())
            .collect();

        Ok(Self { dates, returns })
    }

    /// Number of log-return observations.
    pub fn n(&self) -> usize {
        self.returns.len()
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    /// Original price dates; one longer than the return series.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Maps a break index in return-space back to the price date axis.
    ///
    /// The `+ 1` compensates for the observation dropped by differencing.
    pub fn change_date(&self, tau: usize) -> Option<NaiveDate> {
        self.dates.get(tau + 1).copied()
    }
}
