//! Space Battle entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlInputElement,
        MouseEvent, TouchEvent,
    };

    use space_battle::consts::*;
    use space_battle::persistence::{BrowserStorage, KeyValueStore, MemoryStore};
    use space_battle::platform::{InputSource, KeyState, Shortcut, now_ms};
    use space_battle::sim::{Field, GameEvent, GameState, Player, PowerUp, UpgradeKind};
    use space_battle::ui::{
        Hud, LeaderboardView, Presenter, RunSummary, Screen, ShopView, UiCommand, css_color,
    };
    use space_battle::{Session, Settings};

    type Store = Box<dyn KeyValueStore>;

    /// Keys the page must not scroll on
    const GAME_KEYS: [&str; 9] = [
        "Space",
        "ArrowUp",
        "ArrowDown",
        "ArrowLeft",
        "ArrowRight",
        "KeyW",
        "KeyA",
        "KeyS",
        "KeyD",
    ];

    const STAR_COUNT: u32 = 80;
    const BANNER_MS: f64 = 2000.0;
    const HIT_FLASH_MS: f64 = 120.0;

    /// Centered message shown for a while after an event
    struct Banner {
        text: String,
        color: &'static str,
        size: u32,
        until: f64,
    }

    /// Rolling FPS over the last 60 frames
    struct FpsCounter {
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl FpsCounter {
        fn new() -> Self {
            Self {
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        fn record(&mut self, time: f64) {
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;

            // Oldest sample sits at the next write slot
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 && time > oldest {
                self.fps = (60000.0 / (time - oldest)).round() as u32;
            }
        }
    }

    /// DOM overlays plus a 2D canvas
    struct DomPresenter {
        document: Document,
        ctx: CanvasRenderingContext2d,
        starfield: bool,
        reduced_motion: bool,
        announcement: Option<Banner>,
        hit_flash_until: f64,
    }

    impl DomPresenter {
        fn new(document: Document, ctx: CanvasRenderingContext2d, settings: &Settings) -> Self {
            Self {
                document,
                ctx,
                starfield: settings.effective_starfield(),
                reduced_motion: settings.reduced_motion,
                announcement: None,
                hit_flash_until: 0.0,
            }
        }

        fn announce(&mut self, text: String, color: &'static str, size: u32) {
            self.announcement = Some(Banner {
                text,
                color,
                size,
                until: now_ms() + BANNER_MS,
            });
        }

        fn element(&self, id: &str) -> Option<Element> {
            self.document.get_element_by_id(id)
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.element(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_hidden(&self, id: &str, hidden: bool) {
            if let Some(el) = self.element(id) {
                let classes = el.class_list();
                let _ = if hidden {
                    classes.add_1("hidden")
                } else {
                    classes.remove_1("hidden")
                };
            }
        }

        fn set_bar(&self, id: &str, percent: f32) {
            if let Some(el) = self.element(id) {
                let _ = el.set_attribute("style", &format!("width: {:.1}%", percent));
            }
        }

        fn fill_box(&self, pos: Vec2, size: Vec2, color: &str) {
            self.ctx.set_fill_style_str(color);
            self.ctx
                .fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
        }

        fn health_bar(&self, pos: Vec2, width: f32, fraction: f32) {
            self.fill_box(pos, Vec2::new(width, 4.0), "#330000");
            self.fill_box(pos, Vec2::new(width * fraction.clamp(0.0, 1.0), 4.0), "#ff3333");
        }

        fn banner(&self, text: &str, y: f64, width: f64, color: &str, size: u32) {
            self.ctx.set_fill_style_str(color);
            self.ctx.set_font(&format!("bold {}px monospace", size));
            self.ctx.set_text_align("center");
            let _ = self.ctx.fill_text(text, width / 2.0, y);
        }

        fn draw_stars(&self, state: &GameState) {
            let field = state.field;
            let t = state.stats.play_time as f32;
            self.ctx.set_fill_style_str("#ffffff");
            for i in 0..STAR_COUNT {
                // Fixed pseudo-random layout, three parallax layers
                let layer = (i % 3 + 1) as f32;
                let x = (i.wrapping_mul(7919) % 1000) as f32 / 1000.0 * field.width;
                let y0 = (i.wrapping_mul(104_729) % 1000) as f32 / 1000.0 * field.height;
                let y = (y0 + t * 0.02 * layer).rem_euclid(field.height.max(1.0));
                self.ctx.set_global_alpha(0.25 * layer as f64);
                self.ctx.fill_rect(x as f64, y as f64, layer as f64, layer as f64);
            }
            self.ctx.set_global_alpha(1.0);
        }
    }

    impl Presenter for DomPresenter {
        fn update_hud(&mut self, hud: &Hud) {
            self.set_bar("hp-fill", Hud::percent(hud.hp, hud.max_hp));
            self.set_text("hp-text", &format!("{}/{}", hud.hp.ceil(), hud.max_hp));
            self.set_bar("shield-fill", Hud::percent(hud.shield, hud.max_shield));
            self.set_text(
                "shield-text",
                &format!("{}/{}", hud.shield.ceil(), hud.max_shield),
            );
            self.set_text("score-text", &hud.score.to_string());
            self.set_text("wave-text", &hud.wave.to_string());
            self.set_text("coins-text", &hud.coins.to_string());
            self.set_text("buffs-text", &hud.buff_labels().join("  "));
        }

        fn show_screen(&mut self, screen: Screen) {
            for overlay in Screen::OVERLAYS {
                if let Some(id) = overlay.overlay_id() {
                    self.set_hidden(id, overlay != screen);
                }
            }
            let in_run = matches!(screen, Screen::Playing | Screen::Paused);
            self.set_hidden("hud", !in_run);
            self.set_hidden("mobile-menu-btn", screen != Screen::Menu);
            self.set_hidden("mobile-pause-btn", screen != Screen::Playing);
            log::debug!("Screen: {:?}", screen);
        }

        fn show_game_over(&mut self, summary: &RunSummary) {
            self.set_text("final-score", &summary.score.to_string());
            self.set_text("final-wave", &summary.waves_cleared.to_string());
            self.set_text("final-coins", &summary.coins.to_string());
            let rank = summary
                .local_rank
                .map(|r| format!("New high score: #{}", r))
                .unwrap_or_default();
            self.set_text("final-rank", &rank);
            if let Some(input) = self
                .element("player-name")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            {
                input.set_value("");
            }
        }

        fn show_leaderboard(&mut self, view: &LeaderboardView) {
            if let Some(list) = self.element("leaderboard-list") {
                list.set_inner_html(&view.to_html());
            }
        }

        fn update_shop(&mut self, shop: &ShopView) {
            self.set_text("coins-text-shop", &shop.coins.to_string());
            for item in &shop.items {
                let name = item.kind.as_str();
                self.set_text(&format!("{}-cost", name), &item.cost.to_string());
                self.set_text(&format!("{}-level", name), &item.level.to_string());
                let selector = format!(".shop-buy-btn[data-upgrade=\"{}\"]", name);
                if let Ok(Some(btn)) = self.document.query_selector(&selector) {
                    let _ = if item.affordable {
                        btn.remove_attribute("disabled")
                    } else {
                        btn.set_attribute("disabled", "")
                    };
                }
            }
        }

        fn render(&mut self, state: &GameState) {
            let (w, h) = (state.field.width as f64, state.field.height as f64);
            self.ctx.set_global_alpha(1.0);
            self.ctx.set_fill_style_str("#000011");
            self.ctx.fill_rect(0.0, 0.0, w, h);

            if self.starfield {
                self.draw_stars(state);
            }

            for power_up in &state.power_ups {
                // Blink out over the last fifth of the lifetime
                let fading = power_up.remaining_fraction() < 0.2;
                let blink = fading && (power_up.age / 150.0) as u32 % 2 == 0;
                self.ctx.set_global_alpha(if blink { 0.3 } else { 1.0 });
                self.fill_box(power_up.pos, PowerUp::SIZE, &css_color(power_up.kind.color()));
            }
            self.ctx.set_global_alpha(1.0);

            for enemy in &state.enemies {
                self.fill_box(enemy.pos, enemy.size, &css_color(enemy.kind.color()));
                if enemy.hp < enemy.max_hp {
                    self.health_bar(
                        enemy.pos - Vec2::new(0.0, 8.0),
                        enemy.size.x,
                        enemy.hp / enemy.max_hp,
                    );
                }
            }

            if let Some(boss) = &state.boss {
                self.fill_box(boss.pos, boss.size, &css_color(boss.kind.color()));
                let bar = Vec2::new(state.field.width * 0.1, 20.0);
                self.health_bar(bar, state.field.width * 0.8, boss.hp / boss.max_hp);
                self.banner(
                    &format!("{} - PHASE {}", boss.kind.as_str().to_uppercase(), boss.phase),
                    44.0,
                    w,
                    "#ff6666",
                    14,
                );
                if boss.pattern_time < 3000.0 {
                    let flash = self.reduced_motion || (boss.pattern_time / 250.0) as u32 % 2 == 0;
                    if flash {
                        self.banner("WARNING: BOSS APPROACHING", h / 3.0, w, "#ff0000", 32);
                    }
                }
            }

            for shot in &state.projectiles {
                let color = if shot.is_player() { "#00ffff" } else { "#ff4444" };
                self.fill_box(shot.pos, shot.size, color);
            }

            let player = &state.player;
            if player.is_alive() {
                self.fill_box(player.pos, Player::SIZE, "#00aaff");
                if player.shield > 0.0 {
                    let alpha = (player.shield / player.max_shield().max(1.0)) as f64;
                    self.ctx.set_global_alpha(0.6 * alpha);
                    self.ctx.set_stroke_style_str("#4488ff");
                    self.ctx.set_line_width(2.0);
                    self.ctx.stroke_rect(
                        player.pos.x as f64 - 4.0,
                        player.pos.y as f64 - 4.0,
                        Player::SIZE.x as f64 + 8.0,
                        Player::SIZE.y as f64 + 8.0,
                    );
                    self.ctx.set_global_alpha(1.0);
                }
            }

            for particle in &state.particles.particles {
                self.ctx.set_global_alpha(particle.alpha() as f64);
                let half = particle.size / 2.0;
                self.fill_box(
                    particle.pos - Vec2::splat(half),
                    Vec2::splat(particle.size),
                    &css_color(particle.color),
                );
            }
            self.ctx.set_global_alpha(1.0);

            let now = now_ms();
            if now < self.hit_flash_until {
                self.ctx.set_global_alpha(0.25);
                self.ctx.set_fill_style_str("#ff0000");
                self.ctx.fill_rect(0.0, 0.0, w, h);
                self.ctx.set_global_alpha(1.0);
            }
            if self.announcement.as_ref().is_some_and(|b| now >= b.until) {
                self.announcement = None;
            }
            if let Some(b) = &self.announcement {
                self.banner(&b.text, h / 2.0, w, b.color, b.size);
            }
        }

        fn on_events(&mut self, events: &[GameEvent]) {
            for event in events {
                match event {
                    GameEvent::WaveStarted { wave, boss: false } => {
                        self.announce(format!("WAVE {}", wave), "#ffffff", 36)
                    }
                    GameEvent::WaveCleared {
                        wave, bonus_coins, ..
                    } => self.announce(
                        format!("WAVE {} COMPLETE! +{} coins", wave, bonus_coins),
                        "#00ff88",
                        36,
                    ),
                    GameEvent::BossDefeated { kind } => self.announce(
                        format!("{} DESTROYED", kind.as_str().to_uppercase()),
                        "#ffaa00",
                        36,
                    ),
                    GameEvent::PowerUpCollected { kind } => self.announce(
                        format!("{} POWER-UP", kind.as_str().to_uppercase()),
                        "#88ffff",
                        20,
                    ),
                    GameEvent::PlayerHit { .. } if !self.reduced_motion => {
                        self.hit_flash_until = now_ms() + HIT_FLASH_MS;
                    }
                    GameEvent::RunOver => self.announcement = None,
                    _ => {}
                }
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session<DomPresenter, Store>,
        keys: KeyState,
        last_time: f64,
        fps: FpsCounter,
        show_fps: bool,
    }

    impl Game {
        /// One animation frame
        fn update(&mut self, time: f64) {
            // Paused time never reaches the simulation
            let dt = if self.session.is_running() && self.last_time > 0.0 {
                ((time - self.last_time) as f32).min(MAX_FRAME_MS)
            } else {
                0.0
            };
            self.last_time = time;

            if dt > 0.0 {
                let input = self.keys.snapshot();
                self.session.frame(dt, &input);
            }
            self.session.render();

            self.fps.record(time);
            if self.show_fps {
                let fps = self.fps.fps.to_string();
                self.session.presenter().set_text("fps-counter", &fps);
            }
        }
    }

    fn open_store() -> Store {
        match BrowserStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("LocalStorage unavailable ({}), progress will not persist", e);
                Box::new(MemoryStore::new())
            }
        }
    }

    fn canvas_field(canvas: &HtmlCanvasElement) -> Field {
        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        Field::new(width as f32, height as f32)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Space Battle starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; cannot start");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("game-canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("Canvas #game-canvas not found");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2D canvas context unavailable");
            return;
        };

        let field = canvas_field(&canvas);
        let store = open_store();
        let settings = Settings::load(&store);
        let presenter = DomPresenter::new(document.clone(), ctx, &settings);

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(presenter, store, field, seed);
        let game = Rc::new(RefCell::new(Game {
            session,
            keys: KeyState::new(),
            last_time: 0.0,
            fps: FpsCounter::new(),
            show_fps: settings.show_fps,
        }));
        log::info!(
            "Game initialized with seed: {} ({}x{})",
            seed,
            field.width,
            field.height
        );

        setup_keyboard(game.clone());
        setup_pointer(&canvas, game.clone());
        setup_buttons(&document, game.clone());
        setup_auto_pause(game.clone());
        setup_resize(canvas, game.clone());

        request_animation_frame(game);

        log::info!("Space Battle running!");
    }

    /// Forward a command; leaderboard I/O runs in the background
    fn dispatch(game: &Rc<RefCell<Game>>, cmd: UiCommand) {
        let pending = {
            let mut g = game.borrow_mut();
            if cmd == UiCommand::FocusLost {
                g.keys.release_all();
            }
            g.session
                .handle(cmd)
                .map(|followup| (followup, g.session.followup_context()))
        };

        if let Some((followup, (remote, local))) = pending {
            let game = game.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let view = followup.run(remote, local).await;
                game.borrow_mut().session.show_leaderboard(view);
            });
        }
    }

    fn player_name(document: &Document) -> String {
        document
            .get_element_by_id("player-name")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let code = event.code();

                // Typing a name must not steer the ship
                let typing = event
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok());
                if let Some(input) = typing {
                    if code == "Enter" {
                        dispatch(&game, UiCommand::SubmitScore(input.value()));
                    }
                    return;
                }

                match Shortcut::from_code(&code) {
                    Some(Shortcut::Back) => dispatch(&game, UiCommand::Back),
                    Some(Shortcut::Pause) => dispatch(&game, UiCommand::Pause),
                    None => {
                        if GAME_KEYS.contains(&code.as_str()) {
                            event.prevent_default();
                        }
                        game.borrow_mut().keys.key_down(&code);
                    }
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                game.borrow_mut().keys.key_up(&event.code());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn touch_point(canvas: &HtmlCanvasElement, event: &TouchEvent) -> Option<Vec2> {
        let touch = event.touches().get(0)?;
        let rect = canvas.get_bounding_client_rect();
        Some(Vec2::new(
            (touch.client_x() as f64 - rect.left()) as f32,
            (touch.client_y() as f64 - rect.top()) as f32,
        ))
    }

    fn setup_pointer(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Touch start / move: steer toward the finger and auto-fire
        for name in ["touchstart", "touchmove"] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(pos) = touch_point(&canvas_clone, &event) {
                    game.borrow_mut().keys.touch_at(pos);
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().keys.touch_end();
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse drag behaves like a touch
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                game.borrow_mut().keys.touch_at(pos);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.keys.is_touching() {
                    g.keys
                        .touch_at(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        for name in ["mouseup", "mouseleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().keys.touch_end();
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Button #{} not found", id);
            return;
        };
        let mut handler = handler;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        let buttons = [
            ("start-btn", UiCommand::StartGame),
            ("shop-btn", UiCommand::OpenShop),
            ("leaderboard-btn", UiCommand::OpenLeaderboard),
            ("controls-btn", UiCommand::OpenControls),
            ("shop-close-btn", UiCommand::Close),
            ("leaderboard-close-btn", UiCommand::Close),
            ("controls-close-btn", UiCommand::Close),
            ("restart-btn", UiCommand::Restart),
            ("main-menu-btn", UiCommand::MainMenu),
            ("resume-btn", UiCommand::Resume),
            ("pause-shop-btn", UiCommand::OpenShop),
            ("pause-menu-btn", UiCommand::MainMenu),
            ("mobile-menu-btn", UiCommand::OpenControls),
            ("mobile-pause-btn", UiCommand::Pause),
        ];
        for (id, cmd) in buttons {
            let game = game.clone();
            on_click(document, id, move || dispatch(&game, cmd.clone()));
        }

        {
            let game = game.clone();
            let doc = document.clone();
            on_click(document, "submit-score-btn", move || {
                dispatch(&game, UiCommand::SubmitScore(player_name(&doc)));
            });
        }

        // Shop buttons carry their track in data-upgrade
        let Ok(list) = document.query_selector_all(".shop-buy-btn") else {
            return;
        };
        for i in 0..list.length() {
            let Some(btn) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(kind) = btn
                .get_attribute("data-upgrade")
                .and_then(|s| UpgradeKind::from_str(&s))
            else {
                log::warn!("Shop button without a known data-upgrade");
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                dispatch(&game, UiCommand::Purchase(kind));
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    log::info!("Auto-pause (tab hidden)");
                    dispatch(&game, UiCommand::FocusLost);
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                log::info!("Auto-pause (window blur)");
                dispatch(&game, UiCommand::FocusLost);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let field = canvas_field(&canvas);
            game.borrow_mut().session.resize(field.width, field.height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().update(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless autopilot: plays a few runs in memory and logs the outcome
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use space_battle::consts::*;
    use space_battle::settings::QualityPreset;
    use space_battle::{Session, Settings};
    use space_battle::persistence::MemoryStore;
    use space_battle::platform::now_ms;
    use space_battle::sim::{
        Bounded, Field, GameEvent, GameState, Player, TickInput, UpgradeKind,
    };
    use space_battle::ui::{
        Hud, LeaderboardView, Presenter, RunSummary, Screen, ShopView, UiCommand,
    };

    const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Stop a run that refuses to end (simulated ms)
    const RUN_LIMIT_MS: f64 = 20.0 * 60.0 * 1000.0;
    const RUNS: u32 = 3;

    /// Per-run event counts
    #[derive(Debug, Default)]
    struct RunTally {
        shots: u32,
        spawned: u32,
        shot_down: u32,
        rammed: u32,
        escaped: u32,
        hits: u32,
        damage_taken: f32,
        power_ups_dropped: u32,
        power_ups_taken: u32,
    }

    #[derive(Default)]
    struct LogPresenter {
        frames: u64,
        tally: RunTally,
    }

    impl Presenter for LogPresenter {
        fn update_hud(&mut self, _hud: &Hud) {}

        fn show_screen(&mut self, screen: Screen) {
            log::debug!("Screen: {:?}", screen);
        }

        fn show_game_over(&mut self, summary: &RunSummary) {
            log::info!(
                "Game over: score {}, {} waves cleared, {} kills, {:.1}s, {} coins banked",
                summary.score,
                summary.waves_cleared,
                summary.kills,
                summary.play_time_ms / 1000.0,
                summary.coins
            );
            if let Some(rank) = summary.local_rank {
                log::info!("  local rank #{}", rank);
            }
            let t = std::mem::take(&mut self.tally);
            log::info!(
                "  {} shots, {}/{} enemies shot down, {} rammed, {} escaped",
                t.shots,
                t.shot_down,
                t.spawned,
                t.rammed,
                t.escaped
            );
            log::info!(
                "  {} hits for {:.0} damage, {}/{} power-ups collected",
                t.hits,
                t.damage_taken,
                t.power_ups_taken,
                t.power_ups_dropped
            );
        }

        fn show_leaderboard(&mut self, view: &LeaderboardView) {
            if let LeaderboardView::Entries(entries) = view {
                for (i, e) in entries.iter().enumerate() {
                    log::info!("#{} {} {} (wave {})", i + 1, e.name, e.score, e.wave);
                }
            }
        }

        fn update_shop(&mut self, shop: &ShopView) {
            log::debug!("Shop: {} coins", shop.coins);
        }

        fn render(&mut self, _state: &GameState) {
            self.frames += 1;
        }

        fn on_events(&mut self, events: &[GameEvent]) {
            let t = &mut self.tally;
            for event in events {
                match event {
                    GameEvent::PlayerFired => t.shots += 1,
                    GameEvent::EnemySpawned { .. } => t.spawned += 1,
                    GameEvent::EnemyDestroyed { rammed: false, .. } => t.shot_down += 1,
                    GameEvent::EnemyDestroyed { rammed: true, .. } => t.rammed += 1,
                    GameEvent::EnemyEscaped { .. } => t.escaped += 1,
                    GameEvent::PlayerHit { damage } => {
                        t.hits += 1;
                        t.damage_taken += damage;
                    }
                    GameEvent::PowerUpSpawned { .. } => t.power_ups_dropped += 1,
                    GameEvent::PowerUpCollected { .. } => t.power_ups_taken += 1,
                    GameEvent::WaveStarted { wave, boss } => {
                        log::debug!("Wave {} started{}", wave, if *boss { " (boss)" } else { "" })
                    }
                    GameEvent::BossSpawned { kind } => log::info!("{} incoming", kind.as_str()),
                    GameEvent::BossDefeated { kind } => log::info!("{} destroyed", kind.as_str()),
                    GameEvent::WaveCleared {
                        wave,
                        bonus_score,
                        bonus_coins,
                    } => log::info!(
                        "Wave {} cleared (+{} score, +{} coins)",
                        wave,
                        bonus_score,
                        bonus_coins
                    ),
                    GameEvent::RunOver => log::debug!("Run over"),
                }
            }
        }
    }

    /// Track the lowest enemy (or the boss) and hold the trigger
    fn autopilot(state: &GameState) -> TickInput {
        let target_x = state
            .enemies
            .iter()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|e| e.pos.x + e.size.x / 2.0)
            .or_else(|| state.boss.as_ref().map(|b| b.bounds().center().x))
            .unwrap_or(state.field.width / 2.0);
        let home_y = state.field.height - PLAYER_SPAWN_OFFSET + Player::SIZE.y / 2.0;
        TickInput {
            firing: true,
            pointer: Some(Vec2::new(target_x, home_y)),
            ..TickInput::idle()
        }
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| now_ms() as u64);
        log::info!("Space Battle headless autopilot, seed {}", seed);

        let store = MemoryStore::new();
        let field = Field::new(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT);
        let mut session = Session::new(LogPresenter::default(), &store, field, seed);

        // Optional second argument: low / medium / high
        if let Some(quality) = args.next().and_then(|q| QualityPreset::from_str(&q)) {
            let settings = Settings {
                quality,
                ..session.settings().clone()
            };
            session.apply_settings(settings);
            log::info!("Quality {}", quality.as_str());
        }

        for run in 1..=RUNS {
            session.handle(UiCommand::StartGame);
            while session.is_running() && session.state().stats.play_time < RUN_LIMIT_MS {
                let input = autopilot(session.state());
                session.frame(FRAME_MS, &input);
                session.render();
            }
            if session.is_running() {
                log::warn!("Run {} hit the time limit at wave {}", run, session.state().stats.wave);
                session.handle(UiCommand::MainMenu);
                continue;
            }

            session.handle(UiCommand::SubmitScore(format!("autopilot-{}", run)));
            session.handle(UiCommand::Close);

            // Spend the bank, cheapest track first
            loop {
                let cheapest = UpgradeKind::ALL
                    .into_iter()
                    .min_by_key(|&k| session.state().player.upgrade_cost(k));
                match cheapest.map(|k| session.purchase_upgrade(k)) {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }

        let (_, table) = session.followup_context();
        session
            .presenter_mut()
            .show_leaderboard(&LeaderboardView::Entries(table.entries));
        log::info!("Rendered {} frames", session.presenter().frames);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Entry point is wasm_main
}
