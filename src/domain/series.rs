//! Column-wise transforms over aligned price values.
//!
//! Every function here takes one column of an aligned table, where `None`
//! marks a date the instrument has no usable price for.

/// Replace each missing value with the most recent prior value.
/// Leading gaps stay missing.
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Simple returns `p[t] / p[t-1] - 1` for every date after the first.
///
/// The output is one shorter than the input. A return is missing when either
/// price is missing.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some(curr / prev - 1.0),
            _ => None,
        })
        .collect()
}

/// Divide by the first non-missing value and scale to `base`.
pub fn rebase(values: &[Option<f64>], base: f64) -> Vec<Option<f64>> {
    let Some(first) = values.iter().flatten().copied().find(|v| *v != 0.0) else {
        return vec![None; values.len()];
    };
    values.iter().map(|v| v.map(|p| p / first * base)).collect()
}
