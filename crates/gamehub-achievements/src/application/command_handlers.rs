//! Command handlers for the Achievements & Progress context.
//!
//! `track_event` is the progress evaluator: it loads the definitions a
//! trigger matches, applies the progress rules to each, and persists the
//! result. It reports failures through its `Result`; the `on_*` wrappers are
//! the best-effort entry points other features call after their own action
//! has succeeded, and they only log failures.

use gamehub_core::clock::Clock;
use gamehub_core::error::DomainError;
use gamehub_core::repository::{AchievementRepository, StoredProgress};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::domain::commands::{AwardAchievement, MarkNotified, Trigger};
use crate::domain::definition::AchievementDefinition;
use crate::domain::progress::{self, ProgressWrite};
use crate::domain::requirement::{EventPayload, Requirement, RequirementKind};

/// Attempts per definition before a version conflict is given up on.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// What a single trigger did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackOutcome {
    /// Definitions that survived kind and game filtering.
    pub matched: usize,
    /// Definitions whose progress row was written.
    pub advanced: Vec<i64>,
    /// Definitions that became completed with this trigger.
    pub completed: Vec<i64>,
    /// Definitions skipped because the user had already completed them.
    pub already_completed: Vec<i64>,
}

/// Result of a successful award.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardResult {
    /// The row as written.
    pub progress: StoredProgress,
    /// Whether the row was created by this award.
    pub created: bool,
}

enum Applied {
    Skipped,
    Written { completed: bool },
}

/// Evaluates one trigger against the active catalog.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails, or
/// `DomainError::ConcurrencyConflict` if a row kept changing underneath us
/// for `MAX_WRITE_ATTEMPTS` attempts. Definitions processed before the
/// failure stay written.
#[instrument(
    skip(trigger, clock, repo),
    fields(
        correlation_id = %trigger.correlation_id,
        user_id = trigger.user_id,
        event_type = %trigger.event_type,
    )
)]
pub async fn track_event(
    trigger: &Trigger,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) -> Result<TrackOutcome, DomainError> {
    if let Requirement::Unrecognized(tag) = Requirement::parse(&trigger.event_type) {
        warn!(
            event_type = %tag,
            "unrecognized event type; matching definitions use the increment policy"
        );
    }

    let definitions = repo
        .active_achievements_for_requirement(&trigger.event_type)
        .await?
        .into_iter()
        .map(AchievementDefinition::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let mut outcome = TrackOutcome::default();
    for definition in definitions
        .iter()
        .filter(|d| d.applies_to_game(trigger.game_id))
    {
        outcome.matched += 1;
        match advance(trigger.user_id, definition, &trigger.payload, clock, repo).await? {
            Applied::Skipped => outcome.already_completed.push(definition.id),
            Applied::Written { completed } => {
                outcome.advanced.push(definition.id);
                if completed {
                    info!(
                        achievement_id = definition.id,
                        achievement = %definition.name,
                        user_id = trigger.user_id,
                        "achievement unlocked"
                    );
                    outcome.completed.push(definition.id);
                }
            }
        }
    }

    Ok(outcome)
}

/// Read-decide-write for one definition, retried on version conflicts.
async fn advance(
    user_id: i64,
    definition: &AchievementDefinition,
    payload: &EventPayload,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) -> Result<Applied, DomainError> {
    let mut attempt = 1;
    loop {
        let existing = repo.find_progress(user_id, definition.id).await?;
        let write =
            progress::apply_event(existing.as_ref(), user_id, definition, payload, clock.now());
        let completed = write.completes();

        let conflict = match write {
            ProgressWrite::Unchanged => return Ok(Applied::Skipped),
            ProgressWrite::Insert(new) => match repo.insert_progress_if_absent(&new).await? {
                Some(_) => return Ok(Applied::Written { completed }),
                None => {
                    // Another writer created the row after our read.
                    let row = repo.find_progress(user_id, definition.id).await?;
                    DomainError::ConcurrencyConflict {
                        id: row.as_ref().map_or(0, |r| r.id),
                        expected: 0,
                        actual: row.map_or(0, |r| r.version),
                    }
                }
            },
            ProgressWrite::Update {
                id,
                expected_version,
                update,
            } => match repo.update_progress(id, expected_version, &update).await {
                Ok(_) => return Ok(Applied::Written { completed }),
                Err(err @ DomainError::ConcurrencyConflict { .. }) => err,
                Err(err) => return Err(err),
            },
        };

        if attempt >= MAX_WRITE_ATTEMPTS {
            return Err(conflict);
        }
        warn!(
            achievement_id = definition.id,
            user_id,
            attempt,
            error = %conflict,
            "progress row changed concurrently; retrying"
        );
        attempt += 1;
    }
}

/// Runs `track_event` and swallows any failure after logging it.
///
/// Achievement tracking must never fail the action that caused it.
pub async fn track_event_best_effort(
    trigger: &Trigger,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    if let Err(err) = track_event(trigger, clock, repo).await {
        error!(
            correlation_id = %trigger.correlation_id,
            user_id = trigger.user_id,
            event_type = %trigger.event_type,
            error = %err,
            "error tracking achievement event"
        );
    }
}

/// The user finished setting up their profile.
pub async fn on_profile_complete(
    user_id: i64,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::ProfileComplete);
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user joined a lobby, optionally for a specific game.
pub async fn on_lobby_joined(
    user_id: i64,
    game_id: Option<i64>,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::LobbyJoined).with_game(game_id);
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user added a friend.
pub async fn on_friend_added(
    user_id: i64,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::FriendCount);
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user won a game.
pub async fn on_game_win(
    user_id: i64,
    game_id: Option<i64>,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::GameWins).with_game(game_id);
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user logged in; `days_active` is their total count of active days.
pub async fn on_daily_login(
    user_id: i64,
    days_active: i32,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::DaysActive).with_payload(EventPayload {
        days_active: Some(days_active),
        ..EventPayload::default()
    });
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user joined a tournament.
pub async fn on_tournament_join(
    user_id: i64,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::TournamentParticipation);
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user reached `level`.
pub async fn on_level_reached(
    user_id: i64,
    level: i32,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::LevelReached).with_payload(EventPayload {
        level: Some(level),
        ..EventPayload::default()
    });
    track_event_best_effort(&trigger, clock, repo).await;
}

/// The user earned `points`.
pub async fn on_points_earned(
    user_id: i64,
    points: i32,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) {
    let trigger = Trigger::new(user_id, RequirementKind::PointsEarned).with_payload(EventPayload {
        points: Some(points),
        ..EventPayload::default()
    });
    track_event_best_effort(&trigger, clock, repo).await;
}

/// Handles the `AwardAchievement` command: directly sets the user's progress,
/// last write wins.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the achievement does not exist or is
/// inactive, and `DomainError::Infrastructure` if the repository fails.
#[instrument(skip(command, clock, repo), fields(correlation_id = %command.correlation_id))]
pub async fn handle_award(
    command: &AwardAchievement,
    clock: &dyn Clock,
    repo: &dyn AchievementRepository,
) -> Result<AwardResult, DomainError> {
    let definition: AchievementDefinition = repo
        .find_achievement(command.achievement_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or_else(|| DomainError::achievement_not_found(command.achievement_id))?
        .try_into()?;

    let existing = repo
        .find_progress(command.user_id, command.achievement_id)
        .await?;
    let write = progress::apply_award(
        existing.as_ref(),
        command.user_id,
        &definition,
        command.current_progress,
        clock.now(),
    );

    let result = match write {
        ProgressWrite::Insert(new) => match repo.insert_progress_if_absent(&new).await? {
            Some(progress) => AwardResult {
                progress,
                created: true,
            },
            // Lost the insert race; the award still wins.
            None => {
                let row = repo
                    .find_progress(command.user_id, command.achievement_id)
                    .await?
                    .ok_or(DomainError::Infrastructure(
                        "progress row vanished after insert conflict".into(),
                    ))?;
                let write = progress::apply_award(
                    Some(&row),
                    command.user_id,
                    &definition,
                    command.current_progress,
                    clock.now(),
                );
                overwrite(write, repo).await?
            }
        },
        write => overwrite(write, repo).await?,
    };

    info!(
        user_id = command.user_id,
        achievement_id = command.achievement_id,
        current_progress = result.progress.current_progress,
        is_completed = result.progress.is_completed,
        "achievement awarded"
    );
    Ok(result)
}

async fn overwrite(
    write: ProgressWrite,
    repo: &dyn AchievementRepository,
) -> Result<AwardResult, DomainError> {
    match write {
        ProgressWrite::Update {
            id,
            expected_version,
            update,
        } => Ok(AwardResult {
            progress: repo.update_progress(id, expected_version, &update).await?,
            created: false,
        }),
        other => Err(DomainError::Infrastructure(format!(
            "award produced unexpected write: {other:?}"
        ))),
    }
}

/// Handles the `MarkNotified` command.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the repository fails.
#[instrument(skip(command, repo), fields(correlation_id = %command.correlation_id))]
pub async fn handle_mark_notified(
    command: &MarkNotified,
    repo: &dyn AchievementRepository,
) -> Result<u64, DomainError> {
    if command.progress_ids.is_empty() {
        return Ok(0);
    }
    repo.mark_notified(&command.progress_ids).await
}
