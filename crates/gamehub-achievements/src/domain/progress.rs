//! Per-user progress rules.
//!
//! Functions here decide what should be written for a (user, achievement)
//! pair; they never touch storage. The application layer executes the
//! returned [`ProgressWrite`].

use chrono::{DateTime, Utc};
use gamehub_core::repository::{NewProgress, ProgressUpdate, StoredProgress};

use super::definition::AchievementDefinition;
use super::requirement::EventPayload;

/// The write a progress rule asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressWrite {
    /// The row is completed and frozen.
    Unchanged,
    /// No row exists yet.
    Insert(NewProgress),
    /// Overwrite an existing row.
    Update {
        /// Row to overwrite.
        id: i64,
        /// Version the decision was based on; `None` for last-write-wins.
        expected_version: Option<i64>,
        /// Values to write.
        update: ProgressUpdate,
    },
}

impl ProgressWrite {
    /// Whether executing this write leaves the row completed.
    #[must_use]
    pub fn completes(&self) -> bool {
        match self {
            Self::Unchanged => false,
            Self::Insert(new) => new.is_completed,
            Self::Update { update, .. } => update.is_completed,
        }
    }
}

/// Applies one matching event to the current row.
///
/// Completed rows are never recomputed. An update sets `earned_at` to `now`
/// only on the transition to completed and resets `is_notified` on that same
/// write; otherwise both are preserved.
#[must_use]
pub fn apply_event(
    existing: Option<&StoredProgress>,
    user_id: i64,
    definition: &AchievementDefinition,
    payload: &EventPayload,
    now: DateTime<Utc>,
) -> ProgressWrite {
    if existing.is_some_and(|row| row.is_completed) {
        return ProgressWrite::Unchanged;
    }

    let current = existing.map_or(0, |row| row.current_progress);
    let next = definition.requirement.policy().next_progress(
        current,
        definition.requirement_value,
        payload,
    );
    let is_completed = definition.is_satisfied_by(next);

    match existing {
        None => ProgressWrite::Insert(NewProgress {
            user_id,
            achievement_id: definition.id,
            current_progress: next,
            is_completed,
            now,
        }),
        Some(row) => ProgressWrite::Update {
            id: row.id,
            expected_version: Some(row.version),
            update: ProgressUpdate {
                current_progress: next,
                is_completed,
                earned_at: if is_completed { now } else { row.earned_at },
                is_notified: is_completed.then_some(false),
            },
        },
    }
}

/// Administrative direct set of a user's progress.
///
/// Bypasses the requirement policy: `requested` (or the requirement value
/// when absent or zero) is written as-is after clamping, even over a
/// completed row. The notification flag of an existing row is left alone.
#[must_use]
pub fn apply_award(
    existing: Option<&StoredProgress>,
    user_id: i64,
    definition: &AchievementDefinition,
    requested: Option<i32>,
    now: DateTime<Utc>,
) -> ProgressWrite {
    let progress = requested
        .filter(|p| *p != 0)
        .unwrap_or(definition.requirement_value)
        .clamp(0, definition.requirement_value.max(0));
    let is_completed = definition.is_satisfied_by(progress);

    match existing {
        None => ProgressWrite::Insert(NewProgress {
            user_id,
            achievement_id: definition.id,
            current_progress: progress,
            is_completed,
            now,
        }),
        Some(row) => ProgressWrite::Update {
            id: row.id,
            expected_version: None,
            update: ProgressUpdate {
                current_progress: progress,
                is_completed,
                earned_at: if is_completed { now } else { row.earned_at },
                is_notified: None,
            },
        },
    }
}

/// Completion percentage rounded to two decimals and capped at 100.
///
/// A missing or non-positive requirement value counts as 1.
#[must_use]
pub fn progress_percentage(current_progress: i32, requirement_value: Option<i32>) -> f64 {
    let value = requirement_value.filter(|v| *v > 0).unwrap_or(1);
    let percentage = (f64::from(current_progress) * 100.0 / f64::from(value)).min(100.0);
    (percentage * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use gamehub_test_support::stored_achievement;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn definition(requirement_type: &str, value: i32) -> AchievementDefinition {
        AchievementDefinition::try_from(stored_achievement(9, requirement_type, value)).unwrap()
    }

    fn row(progress: i32, completed: bool, earned_at: DateTime<Utc>) -> StoredProgress {
        StoredProgress {
            id: 41,
            created_at: earned_at,
            user_id: 5,
            achievement_id: 9,
            earned_at,
            current_progress: progress,
            is_completed: completed,
            is_notified: true,
            version: 3,
        }
    }

    #[test]
    fn test_first_event_inserts_row() {
        let write = apply_event(
            None,
            5,
            &definition("lobby_joined", 3),
            &EventPayload::default(),
            fixed_now(),
        );

        assert_eq!(
            write,
            ProgressWrite::Insert(NewProgress {
                user_id: 5,
                achievement_id: 9,
                current_progress: 1,
                is_completed: false,
                now: fixed_now(),
            })
        );
    }

    #[test]
    fn test_completed_row_is_frozen() {
        let existing = row(3, true, fixed_now() - Duration::days(2));

        let write = apply_event(
            Some(&existing),
            5,
            &definition("lobby_joined", 3),
            &EventPayload::default(),
            fixed_now(),
        );

        assert_eq!(write, ProgressWrite::Unchanged);
        assert!(!write.completes());
    }

    #[test]
    fn test_partial_update_preserves_earned_at_and_notification() {
        let created = fixed_now() - Duration::days(2);
        let existing = row(1, false, created);

        let write = apply_event(
            Some(&existing),
            5,
            &definition("game_wins", 10),
            &EventPayload::default(),
            fixed_now(),
        );

        assert_eq!(
            write,
            ProgressWrite::Update {
                id: 41,
                expected_version: Some(3),
                update: ProgressUpdate {
                    current_progress: 2,
                    is_completed: false,
                    earned_at: created,
                    is_notified: None,
                },
            }
        );
    }

    #[test]
    fn test_completing_update_sets_earned_at_and_resets_notification() {
        let existing = row(1, false, fixed_now() - Duration::days(2));

        let write = apply_event(
            Some(&existing),
            5,
            &definition("game_wins", 2),
            &EventPayload::default(),
            fixed_now(),
        );

        assert!(write.completes());
        match write {
            ProgressWrite::Update { update, .. } => {
                assert_eq!(update.current_progress, 2);
                assert_eq!(update.earned_at, fixed_now());
                assert_eq!(update.is_notified, Some(false));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_award_defaults_to_requirement_value_and_ignores_version() {
        let existing = row(1, false, fixed_now() - Duration::days(2));

        let write = apply_award(
            Some(&existing),
            5,
            &definition("friend_count", 10),
            Some(0),
            fixed_now(),
        );

        match write {
            ProgressWrite::Update {
                expected_version,
                update,
                ..
            } => {
                assert_eq!(expected_version, None);
                assert_eq!(update.current_progress, 10);
                assert!(update.is_completed);
                assert_eq!(update.earned_at, fixed_now());
                assert_eq!(update.is_notified, None);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_award_can_lower_completed_row() {
        let earned = fixed_now() - Duration::days(2);
        let existing = row(10, true, earned);

        let write = apply_award(
            Some(&existing),
            5,
            &definition("friend_count", 10),
            Some(4),
            fixed_now(),
        );

        match write {
            ProgressWrite::Update { update, .. } => {
                assert_eq!(update.current_progress, 4);
                assert!(!update.is_completed);
                assert_eq!(update.earned_at, earned);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn test_award_clamps_to_requirement_value() {
        let write = apply_award(
            None,
            5,
            &definition("friend_count", 10),
            Some(25),
            fixed_now(),
        );

        match write {
            ProgressWrite::Insert(new) => {
                assert_eq!(new.current_progress, 10);
                assert!(new.is_completed);
            }
            other => panic!("expected Insert, got {other:?}"),
        }
    }

    #[test]
    fn test_progress_percentage() {
        assert!((progress_percentage(7, Some(10)) - 70.0).abs() < f64::EPSILON);
        assert!((progress_percentage(1, Some(3)) - 33.33).abs() < f64::EPSILON);
        assert!((progress_percentage(12, Some(10)) - 100.0).abs() < f64::EPSILON);
        assert!((progress_percentage(0, Some(10))).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_percentage_treats_missing_requirement_as_one() {
        assert!((progress_percentage(1, None) - 100.0).abs() < f64::EPSILON);
        assert!((progress_percentage(0, Some(0))).abs() < f64::EPSILON);
    }
}
