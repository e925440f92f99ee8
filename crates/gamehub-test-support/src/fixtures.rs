//! Builders for stored rows with sensible defaults.

use chrono::{DateTime, TimeZone, Utc};
use gamehub_core::repository::StoredAchievement;

/// The instant shared by fixtures and most clock-driven tests.
///
/// # Panics
///
/// Panics if chrono rejects the constant date.
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// An active, global, common `participation` achievement worth 10 points.
#[must_use]
pub fn stored_achievement(
    id: i64,
    requirement_type: &str,
    requirement_value: i32,
) -> StoredAchievement {
    StoredAchievement {
        id,
        created_at: fixed_time(),
        updated_at: None,
        name: format!("Achievement {id}"),
        description: format!("Reach {requirement_value} on {requirement_type}"),
        icon_url: None,
        category: "participation".to_owned(),
        rarity: "common".to_owned(),
        requirement_type: requirement_type.to_owned(),
        requirement_value,
        points: 10,
        is_active: true,
        game_id: None,
        display_order: 0,
    }
}
