//! Performance metrics — pure functions from a closed-trade list to statistics.
//!
//! Undefined values are `None`, never 0.0: a zero-trade run has no win rate,
//! a run with no losers has no profit factor. Consumers decide how to
//! display the absence.

use serde::{Deserialize, Serialize};

use crate::domain::{Trade, TradeOutcome};

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Sum of per-trade percentage returns.
    pub total_pnl_pct: f64,
    /// wins / total_trades. None with no trades.
    pub win_rate: Option<f64>,
    /// Gross win pct over gross loss pct. None with no losing trades.
    pub profit_factor: Option<f64>,
    /// Largest peak-to-trough drop of the cumulative pnl curve, as a
    /// positive magnitude in percentage points. None with fewer than 2 trades.
    pub max_drawdown: Option<f64>,
    /// Annualized mean/std of per-trade returns. None with fewer than 2
    /// trades or zero variance.
    pub sharpe_ratio: Option<f64>,
    /// Average winning pct over average losing pct magnitude. None unless
    /// both wins and losses exist.
    pub avg_win_loss_ratio: Option<f64>,
    /// Mean holding period in trigger bars. None with no trades.
    pub avg_holding_period: Option<f64>,
}

/// Compute all metrics over the closed trades of a run.
///
/// `window_years` sizes the annualization when no explicit factor is
/// configured: the Sharpe scale defaults to the observed trades-per-year.
pub fn summarize(
    trades: &[Trade],
    window_years: f64,
    annualization_factor: Option<f64>,
) -> BacktestResult {
    let wins = trades.iter().filter(|t| t.is_winner()).count();
    let losses = trades
        .iter()
        .filter(|t| t.outcome == TradeOutcome::Loss)
        .count();

    BacktestResult {
        total_trades: trades.len(),
        wins,
        losses,
        total_pnl_pct: trades.iter().map(|t| t.pnl_pct).sum(),
        win_rate: win_rate(trades),
        profit_factor: profit_factor(trades),
        max_drawdown: max_drawdown(trades),
        sharpe_ratio: sharpe_ratio(trades, window_years, annualization_factor),
        avg_win_loss_ratio: avg_win_loss_ratio(trades),
        avg_holding_period: avg_holding_period(trades),
    }
}

/// Fraction of trades that closed as wins. None with no trades.
pub fn win_rate(trades: &[Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let wins = trades
        .iter()
        .filter(|t| t.outcome == TradeOutcome::Win)
        .count();
    Some(wins as f64 / trades.len() as f64)
}

/// Gross winning pct divided by gross losing pct magnitude.
///
/// None when there are no losing trades (division by zero is not a
/// meaningful "infinite" factor worth encoding).
pub fn profit_factor(trades: &[Trade]) -> Option<f64> {
    let gross_win: f64 = trades.iter().filter(|t| t.pnl_pct > 0.0).map(|t| t.pnl_pct).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl_pct < 0.0)
        .map(|t| -t.pnl_pct)
        .sum();
    if gross_loss <= 0.0 {
        return None;
    }
    Some(gross_win / gross_loss)
}

/// Largest peak-to-trough drop of the cumulative per-trade pnl curve, as a
/// positive magnitude. None with fewer than 2 trades.
pub fn max_drawdown(trades: &[Trade]) -> Option<f64> {
    if trades.len() < 2 {
        return None;
    }
    let mut cumulative = 0.0;
    let mut peak = 0.0;
    let mut worst = 0.0_f64;
    for trade in trades {
        cumulative += trade.pnl_pct;
        if cumulative > peak {
            peak = cumulative;
        }
        let drawdown = peak - cumulative;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    Some(worst)
}

/// Annualized Sharpe ratio over per-trade returns.
///
/// mean(pnl_pct) / std(pnl_pct) * sqrt(factor), where factor is the
/// configured override or the observed trades per year. None with fewer
/// than 2 trades, zero variance, or a non-positive window.
pub fn sharpe_ratio(
    trades: &[Trade],
    window_years: f64,
    annualization_factor: Option<f64>,
) -> Option<f64> {
    if trades.len() < 2 {
        return None;
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    let mean = mean_f64(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return None;
    }

    let factor = match annualization_factor {
        Some(f) => f,
        None => {
            if window_years <= 0.0 {
                return None;
            }
            trades.len() as f64 / window_years
        }
    };
    if factor <= 0.0 {
        return None;
    }
    Some(mean / std * factor.sqrt())
}

/// Average winning pct over average losing pct magnitude. None unless the
/// run has at least one win and one loss.
pub fn avg_win_loss_ratio(trades: &[Trade]) -> Option<f64> {
    let wins: Vec<f64> = trades.iter().filter(|t| t.pnl_pct > 0.0).map(|t| t.pnl_pct).collect();
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.pnl_pct < 0.0)
        .map(|t| -t.pnl_pct)
        .collect();
    if wins.is_empty() || losses.is_empty() {
        return None;
    }
    let avg_loss = mean_f64(&losses);
    if avg_loss <= 0.0 {
        return None;
    }
    Some(mean_f64(&wins) / avg_loss)
}

/// Mean holding period in trigger bars. None with no trades.
pub fn avg_holding_period(trades: &[Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let total: usize = trades.iter().map(|t| t.holding_period).sum();
    Some(total as f64 / trades.len() as f64)
}

fn mean_f64(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
