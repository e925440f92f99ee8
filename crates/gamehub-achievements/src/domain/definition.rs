//! Achievement definitions: the admin-managed catalog.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gamehub_core::error::DomainError;
use gamehub_core::repository::StoredAchievement;
use serde::{Deserialize, Serialize};

use super::requirement::Requirement;

/// Catalog grouping of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Friend-related achievements.
    Social,
    /// Game performance achievements.
    Gaming,
    /// Event and lobby participation.
    Participation,
    /// Profile and platform milestones.
    Milestone,
    /// Limited-time or special achievements.
    Special,
}

impl Category {
    /// All categories.
    pub const ALL: [Self; 5] = [
        Self::Social,
        Self::Gaming,
        Self::Participation,
        Self::Milestone,
        Self::Special,
    ];

    /// The stored tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Gaming => "gaming",
            Self::Participation => "participation",
            Self::Milestone => "milestone",
            Self::Special => "special",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown achievement category: {s}")))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How rare an achievement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Most players earn it.
    Common,
    /// A step above common.
    Uncommon,
    /// Takes real effort.
    Rare,
    /// Few players earn it.
    Epic,
    /// Almost nobody earns it.
    Legendary,
}

impl Rarity {
    /// All rarities, least rare first.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Uncommon,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
    ];

    /// The stored tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl FromStr for Rarity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown achievement rarity: {s}")))
    }
}

/// A catalog entry describing an unlockable goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementDefinition {
    /// Primary key.
    pub id: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last administrative edit.
    pub updated_at: Option<DateTime<Utc>>,
    /// Display name.
    pub name: String,
    /// Display description.
    pub description: String,
    /// Optional icon location.
    pub icon_url: Option<String>,
    /// Catalog grouping.
    pub category: Category,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Requirement kind selecting the progress policy.
    pub requirement: Requirement,
    /// Completion threshold.
    pub requirement_value: i32,
    /// Points awarded on completion.
    pub points: i32,
    /// Inactive definitions are invisible.
    pub is_active: bool,
    /// Restricts the definition to one game.
    pub game_id: Option<i64>,
    /// Listing tie-break.
    pub display_order: i32,
}

impl AchievementDefinition {
    /// Whether an event for `trigger_game` may advance this definition.
    ///
    /// A game-scoped event never advances a global definition, but an event
    /// without a game advances game-scoped definitions as well.
    #[must_use]
    pub fn applies_to_game(&self, trigger_game: Option<i64>) -> bool {
        match (trigger_game, self.game_id) {
            (Some(trigger), Some(own)) => trigger == own,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Whether `progress` satisfies the requirement.
    #[must_use]
    pub fn is_satisfied_by(&self, progress: i32) -> bool {
        progress >= self.requirement_value
    }
}

impl TryFrom<StoredAchievement> for AchievementDefinition {
    type Error = DomainError;

    fn try_from(stored: StoredAchievement) -> Result<Self, Self::Error> {
        let category = stored.category.parse::<Category>().map_err(|_| {
            DomainError::Infrastructure(format!(
                "achievement {} has invalid category {:?}",
                stored.id, stored.category
            ))
        })?;
        let rarity = stored.rarity.parse::<Rarity>().map_err(|_| {
            DomainError::Infrastructure(format!(
                "achievement {} has invalid rarity {:?}",
                stored.id, stored.rarity
            ))
        })?;

        Ok(Self {
            id: stored.id,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            name: stored.name,
            description: stored.description,
            icon_url: stored.icon_url,
            category,
            rarity,
            requirement: Requirement::parse(&stored.requirement_type),
            requirement_value: stored.requirement_value,
            points: stored.points,
            is_active: stored.is_active,
            game_id: stored.game_id,
            display_order: stored.display_order,
        })
    }
}
