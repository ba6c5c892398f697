//! Shadow Tracker
//!
//! Discovers and ranks top traders from the market data feed, then watches
//! their positions to emit copy signals for new qualifying entries.

pub mod detector;
pub mod ranker;

pub use detector::CopySignalDetector;
pub use ranker::TraderRanker;
