//! Core domain types for the polypick engine.

pub mod market;
pub mod opportunity;
pub mod pick;
pub mod signal;
pub mod trader;

pub use market::{Market, MarketResolution};
pub use opportunity::{Opportunity, SignalType};
pub use pick::{Direction, Pick, PickStatus, PositionSize, TimeHorizon};
pub use signal::{CopySignal, TraderPosition};
pub use trader::{Trader, TraderTrade};
