//! Pick types: accepted, conviction-scored trade recommendations tracked
//! through a lifecycle state machine to a terminal outcome.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }

    /// Whether a resolved market outcome string matches this direction.
    pub fn matches_outcome(&self, outcome: &str) -> bool {
        outcome.eq_ignore_ascii_case(self.as_str())
    }
}

/// Lifecycle state of a pick. `Active` is the only non-terminal state;
/// no transition ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickStatus {
    Active,
    Won,
    Lost,
    Stopped,
    Expired,
}

impl PickStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Stopped => "stopped",
            Self::Expired => "expired",
        }
    }

    pub fn from_str_or_active(s: &str) -> Self {
        match s {
            "won" => Self::Won,
            "lost" => Self::Lost,
            "stopped" => Self::Stopped,
            "expired" => Self::Expired,
            _ => Self::Active,
        }
    }
}

/// Expected holding-period class of a pick, bounding its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    Hours,
    Days,
    Weeks,
}

impl TimeHorizon {
    /// Maximum age before a pick expires, in hours.
    pub fn max_hours(&self) -> i64 {
        match self {
            Self::Hours => 12,
            Self::Days => 72,
            Self::Weeks => 336,
        }
    }

    /// Unrecognized horizon strings fall back to `Days` (72h expiry).
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "hours" => Self::Hours,
            "weeks" => Self::Weeks,
            _ => Self::Days,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
        }
    }
}

/// Suggested position sizing from the reasoning judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl PositionSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

/// An accepted, scored trading recommendation.
///
/// Invariant: at most one `Active` pick exists per market id. A pick is
/// created only by the conviction scorer and moved to a terminal status
/// only by the pick resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub id: Uuid,
    pub market_id: String,
    pub direction: Direction,
    /// Conviction score in [0, 100] from the reasoning judgment.
    pub conviction_score: f64,
    /// Entry price in (0, 1).
    pub entry_price: Decimal,
    /// Target price in (0, 1).
    pub target_price: Decimal,
    /// Stop-loss price in (0, 1); zero disables the stop check.
    pub stop_loss: Decimal,
    /// Risk/reward ratio, >= 0.
    pub risk_reward: f64,
    pub time_horizon: TimeHorizon,
    pub status: PickStatus,
    /// Price at close; set when the pick reaches a terminal status.
    pub exit_price: Option<Decimal>,
    /// Rationale text from the judgment.
    pub edge_explanation: String,
    /// Short summary suitable for broadcast.
    pub summary: String,
    pub confidence_factors: Vec<String>,
    pub risk_factors: Vec<String>,
    pub position_size: PositionSize,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Pick {
    /// Age of the pick relative to `now`.
    pub fn age_hours(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_hours()
    }

    /// Whether the pick has outlived its horizon at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age_hours(now) > self.time_horizon.max_hours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_direction_matches_outcome() {
        assert!(Direction::Yes.matches_outcome("YES"));
        assert!(Direction::Yes.matches_outcome("yes"));
        assert!(!Direction::Yes.matches_outcome("NO"));
        assert!(Direction::No.matches_outcome("No"));
    }

    #[test]
    fn test_status_terminality() {
        assert!(!PickStatus::Active.is_terminal());
        for s in [
            PickStatus::Won,
            PickStatus::Lost,
            PickStatus::Stopped,
            PickStatus::Expired,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn test_horizon_expiry_caps() {
        assert_eq!(TimeHorizon::Hours.max_hours(), 12);
        assert_eq!(TimeHorizon::Days.max_hours(), 72);
        assert_eq!(TimeHorizon::Weeks.max_hours(), 336);
    }

    #[test]
    fn test_horizon_lenient_parse_defaults_to_days() {
        assert_eq!(TimeHorizon::parse_lenient("hours"), TimeHorizon::Hours);
        assert_eq!(TimeHorizon::parse_lenient("fortnight"), TimeHorizon::Days);
    }

    #[test]
    fn test_pick_expiry() {
        let mut pick = Pick {
            id: Uuid::new_v4(),
            market_id: "m1".to_string(),
            direction: Direction::Yes,
            conviction_score: 70.0,
            entry_price: Decimal::new(55, 2),
            target_price: Decimal::new(75, 2),
            stop_loss: Decimal::new(40, 2),
            risk_reward: 2.0,
            time_horizon: TimeHorizon::Hours,
            status: PickStatus::Active,
            exit_price: None,
            edge_explanation: String::new(),
            summary: String::new(),
            confidence_factors: vec![],
            risk_factors: vec![],
            position_size: PositionSize::Small,
            created_at: Utc::now() - Duration::hours(13),
            closed_at: None,
        };
        assert!(pick.is_expired(Utc::now()));

        pick.created_at = Utc::now() - Duration::hours(11);
        assert!(!pick.is_expired(Utc::now()));
    }
}
