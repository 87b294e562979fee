//! Pearson correlation of two return series.
//!
//! Observations are paired by date (inner join), so dates where either
//! series has no return are dropped before any arithmetic happens. Sample
//! statistics use the N-1 denominator; it cancels in the coefficient but is
//! kept so the intermediate covariance and deviations are the usual ones.

use crate::domain::error::StockcorrError;
use crate::domain::price_table::ReturnSeries;
use std::collections::HashMap;

pub const MIN_PAIRED_OBSERVATIONS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UndefinedReason {
    InsufficientObservations,
    ZeroVariance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Defined { coefficient: f64, observations: usize },
    Undefined {
        observations: usize,
        reason: UndefinedReason,
    },
}

impl Correlation {
    pub fn coefficient(&self) -> Option<f64> {
        match self {
            Correlation::Defined { coefficient, .. } => Some(*coefficient),
            Correlation::Undefined { .. } => None,
        }
    }

    pub fn observations(&self) -> usize {
        match self {
            Correlation::Defined { observations, .. }
            | Correlation::Undefined { observations, .. } => *observations,
        }
    }

    /// Coefficient, or the error matching why it is undefined.
    pub fn require(&self, instrument: &str, benchmark: &str) -> Result<f64, StockcorrError> {
        match *self {
            Correlation::Defined { coefficient, .. } => Ok(coefficient),
            Correlation::Undefined {
                observations,
                reason: UndefinedReason::InsufficientObservations,
            } => Err(StockcorrError::InsufficientPairedObservations {
                instrument: instrument.to_string(),
                benchmark: benchmark.to_string(),
                observations,
            }),
            Correlation::Undefined {
                observations,
                reason: UndefinedReason::ZeroVariance,
            } => Err(StockcorrError::ZeroVarianceReturns {
                instrument: instrument.to_string(),
                benchmark: benchmark.to_string(),
                observations,
            }),
        }
    }

    /// Fixed-precision rendering for the presentation layer.
    pub fn display(&self, decimals: usize) -> String {
        match self {
            Correlation::Defined { coefficient, .. } => format!("{coefficient:.decimals$}"),
            Correlation::Undefined {
                reason: UndefinedReason::InsufficientObservations,
                ..
            } => "Not enough data to calculate correlation".to_string(),
            Correlation::Undefined {
                reason: UndefinedReason::ZeroVariance,
                ..
            } => "Not enough price movement to calculate correlation".to_string(),
        }
    }
}

/// Pair the two series on dates where both have a return.
pub fn paired_observations(asset: &ReturnSeries, benchmark: &ReturnSeries) -> (Vec<f64>, Vec<f64>) {
    let bench_by_date: HashMap<_, _> = benchmark.observations().collect();
    asset
        .observations()
        .filter_map(|(date, r)| bench_by_date.get(&date).map(|b| (r, *b)))
        .unzip()
}

pub fn correlate(asset: &ReturnSeries, benchmark: &ReturnSeries) -> Correlation {
    let (xs, ys) = paired_observations(asset, benchmark);
    let observations = xs.len();
    if observations < MIN_PAIRED_OBSERVATIONS {
        return Correlation::Undefined {
            observations,
            reason: UndefinedReason::InsufficientObservations,
        };
    }
    match pearson(&xs, &ys) {
        Some(coefficient) => Correlation::Defined {
            coefficient,
            observations,
        },
        None => Correlation::Undefined {
            observations,
            reason: UndefinedReason::ZeroVariance,
        },
    }
}

/// Pearson product-moment coefficient of two equal-length samples.
///
/// `None` when fewer than two points or either sample has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < MIN_PAIRED_OBSERVATIONS {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    // the centred sums of a constant sample pick up rounding noise from the mean
    if is_constant(xs) || is_constant(ys) {
        return None;
    }
    let denom = (n - 1) as f64;

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let cov = cov / denom;
    let sd_x = (var_x / denom).sqrt();
    let sd_y = (var_y / denom).sqrt();

    if sd_x == 0.0 || sd_y == 0.0 {
        return None;
    }
    let r = cov / (sd_x * sd_y);
    // rounding can push |r| a hair past 1
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn is_constant(sample: &[f64]) -> bool {
    sample.split_first().is_none_or(|(first, rest)| rest.iter().all(|v| v == first))
}
