// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::f64::consts::PI;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor `n`), matching the moment used
/// to parameterize the priors.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Log-density of `Normal(mu, sigma)` at `x`; `-inf` when `sigma <= 0`.
pub fn ln_normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let z = (x - mu) / sigma;
    -0.5 * (2.0 * PI).ln() - sigma.ln() - 0.5 * z * z
}

/// Log-density of `HalfNormal(scale)` at `x`; `-inf` outside `x >= 0`.
pub fn ln_half_normal_pdf(x: f64, scale: f64) -> f64 {
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    2.0_f64.ln() + ln_normal_pdf(x, 0.0, scale)
}

#[cfg(test)]
mod tests {
    use super::{ln_half_normal_pdf, ln_normal_pdf, mean, population_std};
    use approx::assert_relative_eq;

    #[test]
    fn mean_and_population_std_match_hand_computation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(mean(&values), 2.5);
        // Population variance of 1..4 is 1.25.
        assert_relative_eq!(population_std(&values), 1.25_f64.sqrt());
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }

    #[test]
    fn standard_normal_log_density_at_zero() {
        assert_relative_eq!(
            ln_normal_pdf(0.0, 0.0, 1.0),
            -0.918_938_533_204_672_7,
            epsilon = 1e-12
        );
    }

    #[test]
    fn normal_log_density_degenerates_outside_support() {
        assert_eq!(ln_normal_pdf(0.0, 0.0, 0.0), f64::NEG_INFINITY);
        assert_eq!(ln_normal_pdf(0.0, 0.0, -1.0), f64::NEG_INFINITY);
    }

    #[test]
    fn half_normal_doubles_mass_on_the_positive_axis() {
        let scale = 0.7;
        let x = 0.3;
        assert_relative_eq!(
            ln_half_normal_pdf(x, scale),
            2.0_f64.ln() + ln_normal_pdf(x, 0.0, scale),
            epsilon = 1e-12
        );
        assert_eq!(ln_half_normal_pdf(-0.1, scale), f64::NEG_INFINITY);
    }
}
