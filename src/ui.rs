//! Presentation gateway
//!
//! Plain records the session hands to whatever draws the game, and the
//! commands the UI sends back. The presenter is a sink; it never touches
//! simulation state directly.

use serde::{Deserialize, Serialize};

use crate::highscores::{LeaderboardEntry, format_date};
use crate::sim::{
    BossKind, GameEvent, GameState, GameStats, PowerUpKind, UpgradeKind, Upgrades,
};

/// Overlay / screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Menu,
    Playing,
    Paused,
    Shop,
    Leaderboard,
    Controls,
    GameOver,
}

impl Screen {
    /// Element id of the overlay for this screen (None while playing)
    pub fn overlay_id(&self) -> Option<&'static str> {
        match self {
            Screen::Menu => Some("menu-overlay"),
            Screen::Playing => None,
            Screen::Paused => Some("pause-overlay"),
            Screen::Shop => Some("shop-overlay"),
            Screen::Leaderboard => Some("leaderboard-overlay"),
            Screen::Controls => Some("controls-overlay"),
            Screen::GameOver => Some("game-over-overlay"),
        }
    }

    pub const OVERLAYS: [Screen; 6] = [
        Screen::Menu,
        Screen::Paused,
        Screen::Shop,
        Screen::Leaderboard,
        Screen::Controls,
        Screen::GameOver,
    ];
}

/// User actions the presentation layer forwards to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    StartGame,
    Restart,
    Pause,
    Resume,
    OpenShop,
    OpenLeaderboard,
    OpenControls,
    /// Close the shop, leaderboard or controls overlay
    Close,
    MainMenu,
    Purchase(UpgradeKind),
    SubmitScore(String),
    /// Escape key
    Back,
    /// Window blurred or tab hidden
    FocusLost,
}

/// HUD values reported every frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub score: u64,
    pub wave: u32,
    pub coins: u64,
    pub boss: Option<BossHud>,
    /// Active timed buffs with remaining ms
    pub buffs: Vec<(PowerUpKind, f32)>,
}

/// Boss health bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossHud {
    pub kind: BossKind,
    pub hp: f32,
    pub max_hp: f32,
    pub phase: u8,
}

impl Hud {
    pub fn from_state(state: &GameState) -> Self {
        let player = &state.player;
        Self {
            hp: player.hp,
            max_hp: player.max_hp(),
            shield: player.shield,
            max_shield: player.max_shield(),
            score: state.stats.score,
            wave: state.stats.wave,
            coins: state.stats.coins,
            boss: state.boss.as_ref().map(|b| BossHud {
                kind: b.kind,
                hp: b.hp,
                max_hp: b.max_hp,
                phase: b.phase,
            }),
            buffs: player.buffs.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    /// Active buffs as short labels, e.g. "weapon 7s"
    pub fn buff_labels(&self) -> Vec<String> {
        self.buffs
            .iter()
            .map(|(kind, ms)| format!("{} {}s", kind.as_str(), (ms / 1000.0).ceil()))
            .collect()
    }

    /// Percentage (0-100) for a bar width
    pub fn percent(value: f32, max: f32) -> f32 {
        if max > 0.0 {
            (value / max * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// Final stats shown on the game-over screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub score: u64,
    pub waves_cleared: u32,
    pub coins: u64,
    pub kills: u32,
    pub play_time_ms: f64,
    /// Place the score would take on the local table, if it makes it
    pub local_rank: Option<usize>,
}

impl RunSummary {
    pub fn from_stats(stats: &GameStats) -> Self {
        Self {
            score: stats.score,
            waves_cleared: stats.wave.saturating_sub(1),
            coins: stats.coins,
            kills: stats.kills,
            play_time_ms: stats.play_time,
            local_rank: None,
        }
    }
}

/// One upgrade row in the shop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShopItem {
    pub kind: UpgradeKind,
    pub level: u32,
    pub cost: u64,
    pub affordable: bool,
}

/// Shop contents
#[derive(Debug, Clone, PartialEq)]
pub struct ShopView {
    pub coins: u64,
    pub items: Vec<ShopItem>,
}

impl ShopView {
    pub fn new(coins: u64, upgrades: &Upgrades) -> Self {
        let items = UpgradeKind::ALL
            .iter()
            .map(|&kind| {
                let cost = upgrades.cost(kind);
                ShopItem {
                    kind,
                    level: upgrades.level(kind),
                    cost,
                    affordable: coins >= cost,
                }
            })
            .collect();
        Self { coins, items }
    }
}

/// Leaderboard panel state
#[derive(Debug, Clone, PartialEq)]
pub enum LeaderboardView {
    Loading,
    /// Entries, best first (may be empty: "no scores yet")
    Entries(Vec<LeaderboardEntry>),
    /// The board could not be reached; the local table is offered instead
    Unavailable {
        reason: String,
        local: Vec<LeaderboardEntry>,
    },
}

impl LeaderboardView {
    /// Markup for the leaderboard list element
    pub fn to_html(&self) -> String {
        match self {
            LeaderboardView::Loading => "<div class=\"loading\">Loading...</div>".to_string(),
            LeaderboardView::Entries(entries) => entries_html(entries),
            LeaderboardView::Unavailable { reason, local } => format!(
                "<div class=\"error\">Leaderboard unavailable: {}</div>{}",
                escape_html(reason),
                entries_html(local)
            ),
        }
    }
}

fn entries_html(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "<div class=\"empty\">No scores yet!</div>".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            format!(
                "<div class=\"leaderboard-entry\"><span class=\"rank\">#{}</span>\
                 <span class=\"name\">{}</span><span class=\"score\">{}</span>\
                 <span class=\"wave\">Wave {}</span><span class=\"date\">{}</span></div>",
                i + 1,
                escape_html(&e.name),
                e.score,
                e.wave,
                format_date(e.timestamp)
            )
        })
        .collect()
}

/// Escape text for insertion into markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// CSS color string for a 0xRRGGBB tint
pub fn css_color(rgb: u32) -> String {
    format!("#{:06x}", rgb & 0xff_ffff)
}

/// Sink for everything the player sees
pub trait Presenter {
    fn update_hud(&mut self, hud: &Hud);
    fn show_screen(&mut self, screen: Screen);
    fn show_game_over(&mut self, summary: &RunSummary);
    fn show_leaderboard(&mut self, view: &LeaderboardView);
    fn update_shop(&mut self, shop: &ShopView);
    /// Draw one frame of the world
    fn render(&mut self, state: &GameState);
    /// Things that happened during the last frame step, in order
    fn on_events(&mut self, events: &[GameEvent]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Field, Upgrades};

    #[test]
    fn test_shop_affordability() {
        let mut upgrades = Upgrades::default();
        upgrades.raise(UpgradeKind::Weapon);
        let shop = ShopView::new(140, &upgrades);
        let weapon = shop.items.iter().find(|i| i.kind == UpgradeKind::Weapon);
        assert_eq!(weapon.map(|i| (i.level, i.cost, i.affordable)), Some((2, 150, false)));
        let speed = shop.items.iter().find(|i| i.kind == UpgradeKind::Speed);
        assert_eq!(speed.map(|i| i.affordable), Some(true));
    }

    #[test]
    fn test_summary_counts_cleared_waves() {
        let mut stats = GameStats::new(30);
        stats.wave = 4;
        stats.score = 1234;
        let summary = RunSummary::from_stats(&stats);
        assert_eq!(summary.waves_cleared, 3);
        assert_eq!(summary.coins, 30);

        assert_eq!(RunSummary::from_stats(&GameStats::new(0)).waves_cleared, 0);
    }

    #[test]
    fn test_leaderboard_markup_escapes_names() {
        let entry = LeaderboardEntry::new("<b>x</b>", 900, 3, 0.0);
        let html = LeaderboardView::Entries(vec![entry]).to_html();
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("#1"));
        assert!(html.contains("Wave 3"));
        assert!(!html.contains("<b>"));

        let empty = LeaderboardView::Entries(Vec::new()).to_html();
        assert!(empty.contains("No scores yet!"));

        let down = LeaderboardView::Unavailable {
            reason: "offline".to_string(),
            local: Vec::new(),
        };
        assert!(down.to_html().contains("unavailable: offline"));
    }

    #[test]
    fn test_css_color() {
        assert_eq!(css_color(0xff4400), "#ff4400");
        assert_eq!(css_color(0x00ff), "#0000ff");
    }

    #[test]
    fn test_overlay_ids() {
        assert_eq!(Screen::Playing.overlay_id(), None);
        for screen in Screen::OVERLAYS {
            assert!(screen.overlay_id().is_some_and(|id| id.ends_with("-overlay")));
        }
    }

    #[test]
    fn test_hud_from_state() {
        let mut state = GameState::new(1, Field::default(), Upgrades::default(), 75);
        state.player.take_damage(120.0);
        let hud = Hud::from_state(&state);
        assert_eq!(hud.shield, 0.0);
        assert_eq!(hud.hp, 80.0);
        assert_eq!(hud.coins, 75);
        assert!(hud.boss.is_none());
        assert_eq!(Hud::percent(hud.hp, hud.max_hp), 80.0);
        assert!(hud.buff_labels().is_empty());

        state.player.apply_power_up(PowerUpKind::Weapon);
        let labels = Hud::from_state(&state).buff_labels();
        assert_eq!(labels, vec!["weapon 10s".to_string()]);
    }
}
