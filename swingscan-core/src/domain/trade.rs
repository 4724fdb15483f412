//! Trade — a completed round-trip simulated by the backtest engine.

use super::setup::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Classification of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

/// A simulated round-trip trade: entry at next-bar open, exit at stop/target
/// touch or forced close at the window boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub direction: Direction,

    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    pub outcome: TradeOutcome,
    /// Signed return in percent of entry price.
    pub pnl_pct: f64,
    /// Trigger-timeframe bars between entry and exit.
    pub holding_period: usize,
    /// True when the trade was closed at the window boundary rather than at
    /// a stop/target touch.
    pub forced_close: bool,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }

    /// Signed percentage return for a fill at `exit_price`.
    pub fn pnl_pct_for(direction: Direction, entry_price: f64, exit_price: f64) -> f64 {
        if entry_price == 0.0 {
            return 0.0;
        }
        match direction {
            Direction::Long => (exit_price - entry_price) / entry_price * 100.0,
            Direction::Short => (entry_price - exit_price) / entry_price * 100.0,
        }
    }

    /// Classify an exit by the sign of its pnl.
    pub fn outcome_from_pnl(pnl_pct: f64) -> TradeOutcome {
        if pnl_pct > 0.0 {
            TradeOutcome::Win
        } else if pnl_pct < 0.0 {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }
}
