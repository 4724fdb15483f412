//! Position sizing under per-trade and portfolio-wide risk caps.
//!
//! # Formula
//! ```text
//! risk_per_share = |entry - stop|
//! risk_amount    = account_size * max_risk_per_trade,
//!                  reduced so current_open_risk + risk_amount
//!                  never exceeds account_size * max_total_risk
//! shares         = floor(risk_amount / risk_per_share)
//! ```
//!
//! shares == 0 (tiny account, wide stop) is not an error: the setup is
//! still reported, flagged untradable at the given account size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RiskError {
    #[error("invalid stop: entry {entry} equals stop {stop}, risk per share is zero")]
    InvalidStop { entry: f64, stop: f64 },
}

/// Result of sizing one setup against the account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    /// Dollar risk allotted to this trade after all caps.
    pub risk_amount: f64,
    /// Whole shares; floor of risk_amount / risk_per_share.
    pub shares: u64,
    /// Risk actually committed (shares * risk_per_share) over account size.
    pub risk_pct_of_account: f64,
}

impl PositionSize {
    /// False when the account cannot buy a single share at this risk budget
    /// (the zero-size warning: report the setup, do not trade it).
    pub fn is_tradable(&self) -> bool {
        self.shares > 0
    }
}

/// Size a position for a setup.
///
/// `current_open_risk` is the dollar risk already committed to open
/// positions; the portfolio cap only ever reduces the allotment, never
/// raises it.
pub fn size(
    account_size: f64,
    entry: f64,
    stop: f64,
    max_risk_per_trade: f64,
    current_open_risk: f64,
    max_total_risk: f64,
) -> Result<PositionSize, RiskError> {
    let risk_per_share = (entry - stop).abs();
    if risk_per_share == 0.0 {
        return Err(RiskError::InvalidStop { entry, stop });
    }

    let per_trade_cap = account_size * max_risk_per_trade;
    let portfolio_headroom = (account_size * max_total_risk - current_open_risk).max(0.0);
    let risk_amount = per_trade_cap.min(portfolio_headroom);

    let shares = (risk_amount / risk_per_share).floor().max(0.0) as u64;
    let committed = shares as f64 * risk_per_share;
    let risk_pct_of_account = if account_size > 0.0 {
        committed / account_size
    } else {
        0.0
    };

    Ok(PositionSize {
        risk_amount,
        shares,
        risk_pct_of_account,
    })
}

/// Reward-to-risk ratio of a setup's price geometry. Zero-width risk → 0.0.
pub fn reward_risk_ratio(entry: f64, stop: f64, target: f64) -> f64 {
    let risk = (entry - stop).abs();
    if risk <= 0.0 {
        return 0.0;
    }
    (target - entry).abs() / risk
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_matches_worked_example() {
        // account 1,000,000 at 3% per trade, entry 109 / stop 99:
        // risk_amount 30,000, risk_per_share 10 → 3000 shares
        let ps = size(1_000_000.0, 109.0, 99.0, 0.03, 0.0, 0.06).unwrap();
        assert!((ps.risk_amount - 30_000.0).abs() < 1e-9);
        assert_eq!(ps.shares, 3000);
        assert!((ps.risk_pct_of_account - 0.03).abs() < 1e-12);
        assert!(ps.is_tradable());
    }

    #[test]
    fn zero_width_stop_is_invalid() {
        let err = size(100_000.0, 50.0, 50.0, 0.03, 0.0, 0.06).unwrap_err();
        assert!(matches!(err, RiskError::InvalidStop { .. }));
    }

    #[test]
    fn portfolio_cap_reduces_allotment() {
        // 6% total cap on 100k = 6000; 4000 already open → 2000 headroom,
        // below the 3000 per-trade cap.
        let ps = size(100_000.0, 110.0, 100.0, 0.03, 4_000.0, 0.06).unwrap();
        assert!((ps.risk_amount - 2_000.0).abs() < 1e-9);
        assert_eq!(ps.shares, 200);
    }

    #[test]
    fn portfolio_cap_never_raises() {
        // Plenty of headroom: allotment stays at the per-trade cap.
        let ps = size(100_000.0, 110.0, 100.0, 0.01, 0.0, 0.50).unwrap();
        assert!((ps.risk_amount - 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn exhausted_headroom_sizes_to_zero() {
        let ps = size(100_000.0, 110.0, 100.0, 0.03, 7_000.0, 0.06).unwrap();
        assert_eq!(ps.shares, 0);
        assert!((ps.risk_amount - 0.0).abs() < 1e-12);
        assert!(!ps.is_tradable());
    }

    #[test]
    fn tiny_account_wide_stop_flags_untradable() {
        // 1% of 1000 = 10 risk dollars against a 50-point stop → 0 shares
        let ps = size(1_000.0, 200.0, 150.0, 0.01, 0.0, 0.06).unwrap();
        assert_eq!(ps.shares, 0);
        assert!(!ps.is_tradable());
    }

    #[test]
    fn committed_risk_never_exceeds_per_trade_cap() {
        let account = 100_000.0;
        let max_rpt = 0.03;
        for (entry, stop) in [(109.0, 99.0), (50.0, 49.7), (10.0, 3.0), (500.0, 499.99)] {
            let ps = size(account, entry, stop, max_rpt, 0.0, 0.06).unwrap();
            let committed = ps.shares as f64 * (entry - stop).abs();
            assert!(
                committed <= account * max_rpt + 1e-9,
                "committed {committed} exceeds cap for entry={entry} stop={stop}"
            );
        }
    }

    #[test]
    fn reward_risk_ratio_basic() {
        // risk 10, reward 11 → 1.1
        let rr = reward_risk_ratio(109.0, 99.0, 120.0);
        assert!((rr - 1.1).abs() < 1e-12);
        assert_eq!(reward_risk_ratio(100.0, 100.0, 120.0), 0.0);
    }
}
