//! Game session
//!
//! Owns the simulation, the screen state machine and the local stores.
//! The presentation layer drives it through `handle` (user commands) and
//! `frame` (once per animation frame). Leaderboard I/O is async and runs
//! outside the session: `handle` hands back a `Followup` and the caller
//! feeds the finished `LeaderboardView` in through `show_leaderboard`.

use thiserror::Error;

use crate::highscores::{
    HighScores, LeaderboardEntry, LocalScoreBoard, RemoteScoreBoard, fetch_view, submit_then_fetch,
};
use crate::persistence::{KeyValueStore, SAVE_KEY, SaveData, SaveStore};
use crate::platform::now_ms;
use crate::settings::Settings;
use crate::sim::{Field, GameState, TickInput, UpgradeKind, tick};
use crate::ui::{Hud, LeaderboardView, Presenter, RunSummary, Screen, ShopView, UiCommand};

/// Upgrade purchase rejection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("upgrade costs {cost} coins, only {coins} available")]
    InsufficientCoins { cost: u64, coins: u64 },
}

/// Async work a command leaves for the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Followup {
    FetchLeaderboard,
    SubmitScore(LeaderboardEntry),
}

impl Followup {
    /// Run the leaderboard I/O; the entry was already recorded locally
    pub async fn run(self, remote: Option<RemoteScoreBoard>, local: HighScores) -> LeaderboardView {
        match (self, remote) {
            (Followup::FetchLeaderboard, Some(remote)) => fetch_view(&remote, local).await,
            (Followup::SubmitScore(entry), Some(remote)) => {
                submit_then_fetch(&remote, entry, local).await
            }
            (_, None) => LeaderboardView::Entries(local.entries),
        }
    }
}

/// One player's game: simulation, screens and persistence
pub struct Session<P, S> {
    state: GameState,
    presenter: P,
    store: S,
    settings: Settings,
    screen: Screen,
    /// Where Shop/Leaderboard/Controls return to
    previous: Screen,
    /// Score already submitted for the finished run
    submitted: bool,
}

impl<P: Presenter, S: KeyValueStore> Session<P, S> {
    /// Load settings and progress, then show the main menu
    pub fn new(presenter: P, store: S, field: Field, seed: u64) -> Self {
        let settings = Settings::load(&store);
        let save = SaveStore::new(&store).load();
        let mut state = GameState::new(seed, field, save.upgrades, save.coins);
        state.particles.set_max_particles(settings.max_particles());

        let mut session = Self {
            state,
            presenter,
            store,
            settings,
            screen: Screen::Menu,
            previous: Screen::Menu,
            submitted: false,
        };
        session.show(Screen::Menu);
        session.refresh_shop();
        session.refresh_hud();
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the frame step should run
    pub fn is_running(&self) -> bool {
        self.screen == Screen::Playing
    }

    /// Handle a user command
    pub fn handle(&mut self, cmd: UiCommand) -> Option<Followup> {
        log::debug!("Command {:?} on {:?}", cmd, self.screen);
        match cmd {
            UiCommand::StartGame | UiCommand::Restart => self.start_run(),
            UiCommand::Pause => self.pause(),
            UiCommand::Resume => self.resume(),
            UiCommand::OpenShop => {
                if matches!(self.screen, Screen::Playing | Screen::Paused | Screen::Menu) {
                    self.open_overlay(Screen::Shop);
                    self.refresh_shop();
                }
            }
            UiCommand::OpenLeaderboard => {
                self.open_overlay(Screen::Leaderboard);
                self.presenter.show_leaderboard(&LeaderboardView::Loading);
                return Some(Followup::FetchLeaderboard);
            }
            UiCommand::OpenControls => self.open_overlay(Screen::Controls),
            UiCommand::Close => self.close_overlay(),
            UiCommand::MainMenu => {
                self.save_progress();
                self.previous = Screen::Menu;
                self.show(Screen::Menu);
            }
            UiCommand::Purchase(kind) => {
                if let Err(e) = self.purchase_upgrade(kind) {
                    log::info!("Purchase of {} rejected: {}", kind.as_str(), e);
                }
            }
            UiCommand::SubmitScore(name) => return self.submit_score(&name),
            UiCommand::Back => match self.screen {
                Screen::Playing => self.pause(),
                Screen::Paused => self.resume(),
                Screen::Shop | Screen::Leaderboard | Screen::Controls
                    if matches!(self.previous, Screen::Playing | Screen::Paused) =>
                {
                    self.close_overlay()
                }
                _ => {}
            },
            UiCommand::FocusLost => self.pause(),
        }
        None
    }

    /// Advance one animation frame of `dt` ms
    pub fn frame(&mut self, dt: f32, input: &TickInput) {
        if !self.is_running() {
            return;
        }
        tick(&mut self.state, input, dt);
        self.refresh_hud();

        let events = self.state.drain_events();
        if !events.is_empty() {
            self.presenter.on_events(&events);
        }
        if self.state.is_over() {
            self.game_over();
        }
    }

    /// Draw the current world
    pub fn render(&mut self) {
        self.presenter.render(&self.state);
    }

    /// Spend coins on an upgrade; returns the new level
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> Result<u32, PurchaseError> {
        let cost = self.state.player.upgrade_cost(kind);
        let coins = self.state.stats.coins;
        if coins < cost {
            return Err(PurchaseError::InsufficientCoins { cost, coins });
        }

        self.state.stats.coins -= cost;
        self.state.player.upgrade(kind);
        let level = self.state.player.upgrades.level(kind);
        log::info!(
            "Bought {} level {} for {} coins ({} left)",
            kind.as_str(),
            level,
            cost,
            self.state.stats.coins
        );
        self.save_progress();
        self.refresh_shop();
        self.refresh_hud();
        Ok(level)
    }

    /// Leaderboard entry for the finished run
    pub fn score_entry(&self, name: &str, timestamp: f64) -> LeaderboardEntry {
        let summary = RunSummary::from_stats(&self.state.stats);
        LeaderboardEntry::new(name, summary.score, summary.waves_cleared, timestamp)
    }

    /// Inputs for running a `Followup`
    pub fn followup_context(&self) -> (Option<RemoteScoreBoard>, HighScores) {
        let remote = self
            .settings
            .remote_leaderboard
            .as_ref()
            .map(|r| RemoteScoreBoard::new(&r.endpoint, &r.api_key));
        (remote, LocalScoreBoard::new(&self.store).table())
    }

    /// Deliver a finished leaderboard load; dropped if the player moved on
    pub fn show_leaderboard(&mut self, view: LeaderboardView) {
        if self.screen == Screen::Leaderboard {
            self.presenter.show_leaderboard(&view);
        }
    }

    /// Resize the play field
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.resize(width, height);
    }

    /// Replace and persist settings
    pub fn apply_settings(&mut self, settings: Settings) {
        self.state
            .particles
            .set_max_particles(settings.max_particles());
        settings.save(&self.store);
        self.settings = settings;
    }

    /// Wipe coins, upgrades and the local leaderboard
    pub fn reset_progress(&mut self) {
        if let Err(e) = self.store.remove(SAVE_KEY) {
            log::warn!("Failed to clear save: {}", e);
        }
        LocalScoreBoard::new(&self.store).clear();
        self.state.stats.coins = 0;
        self.state
            .player
            .apply_upgrades(crate::sim::Upgrades::default());
        log::info!("Progress reset");
        self.refresh_shop();
        self.refresh_hud();
    }

    fn start_run(&mut self) {
        let seed = next_seed(self.state.seed);
        self.state.start_run(seed);
        self.submitted = false;
        self.previous = Screen::Menu;
        log::info!("New run (seed {:#x})", seed);
        self.show(Screen::Playing);
        self.refresh_hud();
    }

    fn pause(&mut self) {
        if self.screen == Screen::Playing {
            self.previous = Screen::Playing;
            self.show(Screen::Paused);
        }
    }

    fn resume(&mut self) {
        if self.screen == Screen::Paused {
            self.show(Screen::Playing);
        }
    }

    fn open_overlay(&mut self, screen: Screen) {
        self.previous = match self.screen {
            Screen::Playing | Screen::Paused => self.screen,
            _ => Screen::Menu,
        };
        self.show(screen);
    }

    fn close_overlay(&mut self) {
        if !matches!(
            self.screen,
            Screen::Shop | Screen::Leaderboard | Screen::Controls
        ) {
            return;
        }
        if matches!(self.previous, Screen::Playing | Screen::Paused) {
            self.show(self.previous);
        } else {
            self.previous = Screen::Menu;
            self.show(Screen::Menu);
        }
    }

    fn submit_score(&mut self, name: &str) -> Option<Followup> {
        if self.screen != Screen::GameOver || self.submitted {
            return None;
        }
        self.submitted = true;
        let entry = self.score_entry(name, now_ms());
        if let Err(e) = LocalScoreBoard::new(&self.store).record(entry.clone()) {
            log::warn!("Failed to record score locally: {}", e);
        }
        self.previous = Screen::Menu;
        self.show(Screen::Leaderboard);
        self.presenter.show_leaderboard(&LeaderboardView::Loading);
        Some(Followup::SubmitScore(entry))
    }

    fn game_over(&mut self) {
        self.previous = Screen::GameOver;
        self.save_progress();
        let mut summary = RunSummary::from_stats(&self.state.stats);
        summary.local_rank = LocalScoreBoard::new(&self.store)
            .table()
            .potential_rank(summary.score);
        self.screen = Screen::GameOver;
        self.presenter.show_screen(Screen::GameOver);
        self.presenter.show_game_over(&summary);
    }

    fn save_progress(&self) {
        SaveStore::new(&self.store).save(&SaveData {
            coins: self.state.stats.coins,
            upgrades: self.state.player.upgrades,
        });
    }

    fn show(&mut self, screen: Screen) {
        self.screen = screen;
        self.presenter.show_screen(screen);
    }

    fn refresh_hud(&mut self) {
        self.presenter.update_hud(&Hud::from_state(&self.state));
    }

    fn refresh_shop(&mut self) {
        let shop = ShopView::new(self.state.stats.coins, &self.state.player.upgrades);
        self.presenter.update_shop(&shop);
    }
}

/// Seed for the next run
fn next_seed(seed: u64) -> u64 {
    seed.wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}
