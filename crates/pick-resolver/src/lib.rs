//! Pick Resolver
//!
//! Walks the active picks each tick and closes the ones whose market
//! resolved, whose stop or target was hit, or whose horizon elapsed.

pub mod resolver;

pub use resolver::{PickResolver, ResolutionStats};
