//! Market data records and the synthetic market generator.

pub mod synthetic;
pub mod types;

pub use synthetic::{SyntheticConfig, SyntheticMarket};
pub use types::{
    DecaySeries, HistoricalBar, OptionChain, OptionQuote, PricePoint, TickSample,
};
