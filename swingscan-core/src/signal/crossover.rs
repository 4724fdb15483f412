//! Crossover predicates over consecutive evaluation points.
//!
//! A "cross" is prior value on one side of a boundary (inclusive), current
//! value strictly on the other. NaN on any input means no cross — warm-up
//! values never fire a trigger.

/// Value moved from <= threshold to > threshold.
pub fn crossed_above_threshold(prev: f64, curr: f64, threshold: f64) -> bool {
    if prev.is_nan() || curr.is_nan() {
        return false;
    }
    prev <= threshold && curr > threshold
}

/// Value moved from >= threshold to < threshold.
pub fn crossed_below_threshold(prev: f64, curr: f64, threshold: f64) -> bool {
    if prev.is_nan() || curr.is_nan() {
        return false;
    }
    prev >= threshold && curr < threshold
}

/// Line `a` moved from at-or-below line `b` to above it.
pub fn crossed_above(prev_a: f64, prev_b: f64, curr_a: f64, curr_b: f64) -> bool {
    if prev_a.is_nan() || prev_b.is_nan() || curr_a.is_nan() || curr_b.is_nan() {
        return false;
    }
    prev_a <= prev_b && curr_a > curr_b
}

/// Line `a` moved from at-or-above line `b` to below it.
pub fn crossed_below(prev_a: f64, prev_b: f64, curr_a: f64, curr_b: f64) -> bool {
    if prev_a.is_nan() || prev_b.is_nan() || curr_a.is_nan() || curr_b.is_nan() {
        return false;
    }
    prev_a >= prev_b && curr_a < curr_b
}
