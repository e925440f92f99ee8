//! Default achievement catalog seeding.

use sqlx::PgPool;
use tracing::info;

struct CatalogEntry {
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: &'static str,
    rarity: &'static str,
    requirement_type: &'static str,
    requirement_value: i32,
    points: i32,
    display_order: i32,
}

#[allow(clippy::too_many_arguments)]
const fn entry(
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    category: &'static str,
    rarity: &'static str,
    requirement: (&'static str, i32),
    points: i32,
    display_order: i32,
) -> CatalogEntry {
    CatalogEntry {
        name,
        description,
        icon,
        category,
        rarity,
        requirement_type: requirement.0,
        requirement_value: requirement.1,
        points,
        display_order,
    }
}

#[rustfmt::skip]
const DEFAULT_CATALOG: [CatalogEntry; 16] = [
    entry("First Friend", "Add your first friend to your gaming network", "first-friend", "social", "common", ("friend_count", 1), 10, 1),
    entry("Social Butterfly", "Build a network of 10 gaming friends", "social-butterfly", "social", "uncommon", ("friend_count", 10), 50, 2),
    entry("Community Leader", "Reach 50 friends in your gaming network", "community-leader", "social", "rare", ("friend_count", 50), 150, 3),
    entry("First Steps", "Join your first gaming lobby", "first-steps", "participation", "common", ("lobby_joined", 1), 10, 10),
    entry("Active Gamer", "Join 25 gaming lobbies", "active-gamer", "participation", "uncommon", ("lobby_joined", 25), 75, 11),
    entry("Lobby Legend", "Join 100 gaming lobbies", "lobby-legend", "participation", "rare", ("lobby_joined", 100), 200, 12),
    entry("Victory Royale", "Win your first game", "victory-royale", "gaming", "common", ("game_wins", 1), 25, 20),
    entry("Winning Streak", "Achieve 10 game victories", "winning-streak", "gaming", "uncommon", ("game_wins", 10), 100, 21),
    entry("Champion", "Dominate with 50 game victories", "champion", "gaming", "epic", ("game_wins", 50), 300, 22),
    entry("Welcome to Gamehub", "Complete your profile setup", "welcome", "milestone", "common", ("profile_complete", 1), 15, 30),
    entry("One Week Strong", "Stay active for 7 days", "one-week", "milestone", "uncommon", ("days_active", 7), 50, 31),
    entry("Veteran", "One month of gaming excellence", "veteran", "milestone", "rare", ("days_active", 30), 150, 32),
    entry("Noob No More", "Six months of gaming mastery", "noob-no-more", "milestone", "epic", ("days_active", 180), 500, 33),
    entry("Early Adopter", "Join Gamehub in its first month", "early-adopter", "special", "legendary", ("early_adopter", 1), 1000, 40),
    entry("Beta Tester", "Help test new features", "beta-tester", "special", "epic", ("beta_participation", 1), 250, 41),
    entry("Tournament Warrior", "Participate in a tournament", "tournament-warrior", "special", "rare", ("tournament_participation", 1), 200, 42),
];

/// Inserts the default catalog when the `achievements` table is empty.
///
/// Returns the number of definitions inserted (zero when the table already
/// had rows).
///
/// # Errors
///
/// Returns `sqlx::Error` if any statement fails; the inserts run in one
/// transaction.
pub async fn seed_default_catalog(pool: &PgPool) -> Result<usize, sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!(existing, "achievement catalog already present, skipping seed");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for entry in &DEFAULT_CATALOG {
        sqlx::query(
            "INSERT INTO achievements \
                 (name, description, icon_url, category, rarity, requirement_type, \
                  requirement_value, points, display_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(entry.name)
        .bind(entry.description)
        .bind(format!("/icons/achievements/{}.svg", entry.icon))
        .bind(entry.category)
        .bind(entry.rarity)
        .bind(entry.requirement_type)
        .bind(entry.requirement_value)
        .bind(entry.points)
        .bind(entry.display_order)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(count = DEFAULT_CATALOG.len(), "seeded default achievement catalog");
    Ok(DEFAULT_CATALOG.len())
}
