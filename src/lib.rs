//! Space Battle - A wave-based arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, waves)
//! - `session`: Screen flow, user commands, run lifecycle
//! - `platform`: Input snapshot provider
//! - `persistence`: Key-value storage and save records
//! - `highscores`: Local and remote leaderboards
//! - `settings`: Player preferences
//! - `ui`: Presentation gateway (HUD, screens)

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod ui;

pub use highscores::{HighScores, LeaderboardEntry, LeaderboardError, ScoreBoard};
pub use session::{PurchaseError, Session};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
///
/// Distances are in field units (canvas pixels), times in milliseconds.
pub mod consts {
    /// Largest frame delta fed to the simulation (tab switches, hitches)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Default play field size, used until the canvas reports its own
    pub const DEFAULT_FIELD_WIDTH: f32 = 800.0;
    pub const DEFAULT_FIELD_HEIGHT: f32 = 600.0;

    /// Player ship
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 40.0;
    pub const PLAYER_BASE_HP: f32 = 100.0;
    pub const PLAYER_BASE_SHIELD: f32 = 100.0;
    pub const PLAYER_BASE_SPEED: f32 = 300.0;
    pub const PLAYER_BASE_DAMAGE: f32 = 25.0;
    pub const PLAYER_BASE_FIRE_RATE_MS: f32 = 300.0;
    /// Fire rate never drops below this, whatever the weapon level
    pub const PLAYER_MIN_FIRE_RATE_MS: f32 = 50.0;
    /// Counter-hit dealt to an enemy that rams the player
    pub const PLAYER_RAM_DAMAGE: f32 = 50.0;
    /// Distance from the bottom edge where the player spawns
    pub const PLAYER_SPAWN_OFFSET: f32 = 100.0;
    /// Pointer seek dead zone
    pub const POINTER_DEAD_ZONE: f32 = 5.0;
    /// Diagonal movement factor for keys and pointer seek (≈ 1/√2)
    pub const DIAGONAL_FACTOR: f32 = 0.707;

    /// Shield regeneration
    pub const SHIELD_REGEN_DELAY_MS: f32 = 3000.0;
    pub const SHIELD_REGEN_PER_SEC: f32 = 20.0;

    /// Timed power-up buffs
    pub const WEAPON_BUFF_MS: f32 = 10_000.0;
    pub const SPEED_BUFF_MS: f32 = 8_000.0;
    pub const HEALTH_PICKUP_HP: f32 = 30.0;
    pub const SHIELD_PICKUP_AMOUNT: f32 = 50.0;

    /// Off-field margins before entities are culled
    pub const PROJECTILE_CULL_MARGIN: f32 = 50.0;
    pub const ENEMY_ESCAPE_MARGIN: f32 = 100.0;
    pub const POWER_UP_CULL_MARGIN: f32 = 50.0;

    /// Wave flow
    pub const WAVE_DELAY_MS: f32 = 3000.0;
    pub const FIRST_WAVE_QUOTA: u32 = 5;
    pub const MAX_WAVE_QUOTA: u32 = 15;
    pub const MAX_CONCURRENT_ENEMIES: usize = 3;
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
    pub const DIFFICULTY_STEP: f32 = 0.2;

    /// Power-ups
    pub const POWER_UP_SPAWN_INTERVAL_MS: f32 = 15_000.0;
    pub const POWER_UP_LIFETIME_MS: f32 = 15_000.0;
    pub const ENEMY_DROP_CHANCE: f64 = 0.15;
    pub const BOSS_POWER_UP_DROPS: u32 = 3;
}

/// Top-left corner that centers a box of `size` on `center`
#[inline]
pub fn centered(center: Vec2, size: Vec2) -> Vec2 {
    center - size * 0.5
}

/// Unit vector for a shot angle measured from straight down (+y), positive toward +x
#[inline]
pub fn downward_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), angle.cos())
}
