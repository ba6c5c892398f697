//! Clients for the external collaborators: market data feed, reasoning
//! judgment, news context, and the broadcast channel.

pub mod broadcast;
pub mod data;
pub mod news;
pub mod reasoning;

pub use broadcast::{ApiBroadcaster, Broadcast};
pub use data::{DataApiClient, LeaderboardPeriod, LeaderboardRow, MarketFeed};
pub use news::{NewsClient, NewsContext};
pub use reasoning::{Judge, ReasoningClient};
