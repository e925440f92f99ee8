//! Commands for the Achievements & Progress context.

use uuid::Uuid;

use super::requirement::{EventPayload, RequirementKind};

/// A single event notification fed into the progress evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user the event happened to.
    pub user_id: i64,
    /// Requirement tag the event matches against.
    pub event_type: String,
    /// Game the event happened in, if any.
    pub game_id: Option<i64>,
    /// Event-specific data.
    pub payload: EventPayload,
}

impl Trigger {
    /// Creates a trigger for a known requirement kind.
    #[must_use]
    pub fn new(user_id: i64, kind: RequirementKind) -> Self {
        Self::for_event_type(user_id, kind.as_str())
    }

    /// Creates a trigger for an arbitrary requirement tag.
    #[must_use]
    pub fn for_event_type(user_id: i64, event_type: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            user_id,
            event_type: event_type.into(),
            game_id: None,
            payload: EventPayload::default(),
        }
    }

    /// Scopes the trigger to a game.
    #[must_use]
    pub fn with_game(mut self, game_id: Option<i64>) -> Self {
        self.game_id = game_id;
        self
    }

    /// Attaches an event payload.
    #[must_use]
    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }
}

/// Command to directly set a user's progress on an achievement.
#[derive(Debug, Clone)]
pub struct AwardAchievement {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The receiving user.
    pub user_id: i64,
    /// The achievement to award.
    pub achievement_id: i64,
    /// Progress to write; the requirement value when absent.
    pub current_progress: Option<i32>,
}

/// Command to mark completed progress rows as notified.
#[derive(Debug, Clone)]
pub struct MarkNotified {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Progress rows to mark.
    pub progress_ids: Vec<i64>,
}
