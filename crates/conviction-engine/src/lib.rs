//! Conviction Engine
//!
//! Pulls unscored opportunities from the queue, asks the reasoning service
//! for a structured judgment, and accepts the survivors as active picks.

pub mod judgment;
pub mod prompt;
pub mod scorer;

pub use judgment::Judgment;
pub use scorer::ConvictionScorer;
