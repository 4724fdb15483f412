//! Exponential Moving Average over a raw f64 series.
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//! Seed: SMA of the first `period` valid values.
//! A leading NaN prefix (warm-up of an upstream series, e.g. the MACD line)
//! is skipped; a NaN after the seed taints everything that follows.

/// Compute an EMA series, same length as `values`, NaN during warm-up.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    // Skip the leading NaN prefix (upstream warm-up).
    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(s) => s,
        None => return result,
    };
    if n - start < period {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` valid values.
    let mut sum = 0.0;
    for &v in &values[start..start + period] {
        if v.is_nan() {
            return result; // NaN inside the seed window → all NaN
        }
        sum += v;
    }
    let seed = sum / period as f64;
    let seed_index = start + period - 1;
    result[seed_index] = seed;

    let mut prev = seed;
    for i in (seed_index + 1)..n {
        if values[i].is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let e = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = e;
        prev = e;
    }

    result
}

/// Simple moving average, NaN wherever the window contains a NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    result
}
