//! Requirement kinds and the progress policies they select.
//!
//! Every achievement definition names a requirement kind as a string tag.
//! Known tags parse into [`RequirementKind`]; each kind maps to exactly one
//! [`ProgressPolicy`], which is a pure function from the current progress and
//! event payload to the next progress value. Tags that do not parse are kept
//! as [`Requirement::Unrecognized`] and use the increment policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optional event-specific data carried by a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Absolute number of days the user has been active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_active: Option<i32>,
    /// Absolute level the user has reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    /// Points to add to a cumulative total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i32>,
}

/// The requirement kinds the evaluator knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// User joined a lobby.
    LobbyJoined,
    /// User added a friend.
    FriendCount,
    /// User won a game.
    GameWins,
    /// User joined a tournament.
    TournamentParticipation,
    /// User completed their profile.
    ProfileComplete,
    /// User signed up during the launch window.
    EarlyAdopter,
    /// User took part in a beta.
    BetaParticipation,
    /// User logged in on N distinct days.
    DaysActive,
    /// User reached a level.
    LevelReached,
    /// User earned points.
    PointsEarned,
}

impl RequirementKind {
    /// All known kinds.
    pub const ALL: [Self; 10] = [
        Self::LobbyJoined,
        Self::FriendCount,
        Self::GameWins,
        Self::TournamentParticipation,
        Self::ProfileComplete,
        Self::EarlyAdopter,
        Self::BetaParticipation,
        Self::DaysActive,
        Self::LevelReached,
        Self::PointsEarned,
    ];

    /// The tag stored in `achievements.requirement_type`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LobbyJoined => "lobby_joined",
            Self::FriendCount => "friend_count",
            Self::GameWins => "game_wins",
            Self::TournamentParticipation => "tournament_participation",
            Self::ProfileComplete => "profile_complete",
            Self::EarlyAdopter => "early_adopter",
            Self::BetaParticipation => "beta_participation",
            Self::DaysActive => "days_active",
            Self::LevelReached => "level_reached",
            Self::PointsEarned => "points_earned",
        }
    }

    /// The progress policy this kind is scored with.
    #[must_use]
    pub fn policy(self) -> ProgressPolicy {
        match self {
            Self::LobbyJoined
            | Self::FriendCount
            | Self::GameWins
            | Self::TournamentParticipation => ProgressPolicy::Increment,
            Self::ProfileComplete | Self::EarlyAdopter | Self::BetaParticipation => {
                ProgressPolicy::Instant
            }
            Self::DaysActive => ProgressPolicy::SetDaysActive,
            Self::LevelReached => ProgressPolicy::SetLevel,
            Self::PointsEarned => ProgressPolicy::AddPoints,
        }
    }
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a requirement tag is not one of the known kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown requirement kind: {0}")]
pub struct UnknownRequirementKind(pub String);

impl FromStr for RequirementKind {
    type Err = UnknownRequirementKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownRequirementKind(s.to_owned()))
    }
}

/// A requirement tag as found on a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A tag that names a known kind.
    Known(RequirementKind),
    /// A tag the evaluator does not recognise; scored with
    /// [`ProgressPolicy::Increment`].
    Unrecognized(String),
}

impl Requirement {
    /// Interprets a stored requirement tag.
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.parse::<RequirementKind>() {
            Ok(kind) => Self::Known(kind),
            Err(UnknownRequirementKind(tag)) => Self::Unrecognized(tag),
        }
    }

    /// The policy used to score this requirement.
    #[must_use]
    pub fn policy(&self) -> ProgressPolicy {
        match self {
            Self::Known(kind) => kind.policy(),
            Self::Unrecognized(_) => ProgressPolicy::Increment,
        }
    }

    /// The tag as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(kind) => kind.as_str(),
            Self::Unrecognized(tag) => tag,
        }
    }
}

/// How an event moves progress toward the requirement value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPolicy {
    /// Add one per event.
    Increment,
    /// Complete on the first event.
    Instant,
    /// Set to `payload.days_active`, keeping the current value when absent.
    SetDaysActive,
    /// Set to `payload.level`, keeping the current value when absent.
    SetLevel,
    /// Add `payload.points`, or one when absent.
    AddPoints,
}

impl ProgressPolicy {
    /// Computes the next progress value, clamped to `[0, requirement_value]`.
    #[must_use]
    pub fn next_progress(
        self,
        current: i32,
        requirement_value: i32,
        payload: &EventPayload,
    ) -> i32 {
        let raw = match self {
            Self::Increment => current.saturating_add(1),
            Self::Instant => requirement_value,
            Self::SetDaysActive => payload.days_active.unwrap_or(current),
            Self::SetLevel => payload.level.unwrap_or(current),
            Self::AddPoints => current.saturating_add(payload.points.unwrap_or(1)),
        };
        raw.clamp(0, requirement_value.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INCREMENTAL: [&str; 4] = [
        "lobby_joined",
        "friend_count",
        "game_wins",
        "tournament_participation",
    ];

    fn next(tag: &str, current: i32, value: i32, payload: EventPayload) -> i32 {
        Requirement::parse(tag)
            .policy()
            .next_progress(current, value, &payload)
    }

    #[test]
    fn test_incremental_kinds_add_one_up_to_requirement() {
        for tag in INCREMENTAL {
            for current in 0..=5 {
                assert_eq!(
                    next(tag, current, 5, EventPayload::default()),
                    (current + 1).min(5),
                    "{tag} at {current}"
                );
            }
        }
    }

    #[test]
    fn test_instant_kinds_jump_to_requirement_value() {
        for tag in ["profile_complete", "early_adopter", "beta_participation"] {
            assert_eq!(next(tag, 0, 1, EventPayload::default()), 1);
            assert_eq!(next(tag, 3, 7, EventPayload::default()), 7);
        }
    }

    #[test]
    fn test_days_active_sets_absolute_value() {
        let payload = EventPayload {
            days_active: Some(4),
            ..EventPayload::default()
        };

        let first = next("days_active", 0, 7, payload);
        let second = next("days_active", first, 7, payload);

        assert_eq!(first, 4);
        assert_eq!(second, 4, "same payload must not increment further");
    }

    #[test]
    fn test_days_active_clamps_to_requirement_and_keeps_current_without_payload() {
        let payload = EventPayload {
            days_active: Some(40),
            ..EventPayload::default()
        };

        assert_eq!(next("days_active", 2, 30, payload), 30);
        assert_eq!(next("days_active", 2, 30, EventPayload::default()), 2);
    }

    #[test]
    fn test_level_reached_sets_absolute_value() {
        let payload = EventPayload {
            level: Some(12),
            ..EventPayload::default()
        };

        assert_eq!(next("level_reached", 5, 20, payload), 12);
        assert_eq!(next("level_reached", 12, 20, payload), 12);
        assert_eq!(next("level_reached", 5, 10, payload), 10);
    }

    #[test]
    fn test_points_earned_adds_payload_points_or_one() {
        let payload = EventPayload {
            points: Some(25),
            ..EventPayload::default()
        };

        assert_eq!(next("points_earned", 10, 100, payload), 35);
        assert_eq!(next("points_earned", 90, 100, payload), 100);
        assert_eq!(next("points_earned", 10, 100, EventPayload::default()), 11);
    }

    #[test]
    fn test_negative_payload_is_clamped_to_zero() {
        let payload = EventPayload {
            level: Some(-3),
            ..EventPayload::default()
        };

        assert_eq!(next("level_reached", 2, 10, payload), 0);
    }

    #[test]
    fn test_unrecognized_kind_defaults_to_increment() {
        let requirement = Requirement::parse("speedrun_record");

        assert_eq!(
            requirement,
            Requirement::Unrecognized("speedrun_record".to_owned())
        );
        assert_eq!(requirement.policy(), ProgressPolicy::Increment);
        assert_eq!(next("speedrun_record", 1, 3, EventPayload::default()), 2);
    }

    #[test]
    fn test_every_kind_round_trips_through_its_tag() {
        for kind in RequirementKind::ALL {
            assert_eq!(kind.as_str().parse::<RequirementKind>(), Ok(kind));
            assert_eq!(Requirement::parse(kind.as_str()).as_str(), kind.as_str());
        }
    }

    #[test]
    fn test_payload_deserializes_from_partial_json() {
        let payload: EventPayload = serde_json::from_str(r#"{"days_active": 3}"#).unwrap();

        assert_eq!(payload.days_active, Some(3));
        assert_eq!(payload.level, None);
        assert_eq!(payload.points, None);
    }
}
