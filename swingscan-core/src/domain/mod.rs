//! Domain types for the scanner core.

pub mod bar;
pub mod setup;
pub mod trade;

pub use bar::{validate_series, PriceBar, SeriesError};
pub use setup::{Direction, PriceOrderingError, Setup};
pub use trade::{Trade, TradeOutcome};
