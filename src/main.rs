//! Sky Hop entry point
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
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use sky_hop::consts::*;
    use sky_hop::platform::{InputState, query_param};
    use sky_hop::renderer::{RenderInitError, RenderState, ScoreReadout, build_scene};
    use sky_hop::sim::{GameEvent, GameState, tick};
    use sky_hop::{Tuning, TuningPreset};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<RenderState>,
        accumulator: f32,
        last_time: f64,
        input: InputState,
        /// Last readout written to the DOM (skip redundant writes)
        hud: Option<ScoreReadout>,
    }

    impl Game {
        fn new(seed: u64, world: Vec2, tuning: Tuning) -> Self {
            Self {
                state: GameState::new(seed, world.x, world.y, tuning),
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: InputState::new(),
                hud: None,
            }
        }

        /// Run fixed simulation steps for the elapsed frame time
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.tick_input();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.consume_one_shots();
            }

            for event in self.state.drain_events() {
                log_event(&event);
            }
        }

        /// Render the current frame
        fn render(&mut self) {
            if let Some(ref mut render_state) = self.render_state {
                let vertices = build_scene(&self.state);
                match render_state.render(&vertices) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        let world = render_state.world;
                        render_state.resize(render_state.size.0, render_state.size.1, world);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let readout = ScoreReadout::from_state(&self.state);
            if self.hud.as_ref() == Some(&readout) {
                return;
            }

            let document = web_sys::window().unwrap().document().unwrap();
            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&readout.text));
                let _ = el.set_attribute("style", &format!("color: {}", readout.color));
            }
            self.hud = Some(readout);
        }

        /// Follow a viewport change (window resize or fullscreen)
        fn resize(&mut self, canvas: &HtmlCanvasElement) {
            let (world, width, height) = viewport_size(canvas);
            canvas.set_width(width);
            canvas.set_height(height);
            self.state.resize(world.x, world.y);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height, self.state.world);
            }
        }
    }

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::ScoreReset { lost } => log::info!("Fell! Score {} lost", lost),
            GameEvent::Scored { platform, score } => {
                log::debug!("Platform {} touched, score {}", platform, score)
            }
            other => log::debug!("{:?}", other),
        }
    }

    /// World size in CSS pixels plus the backing size in device pixels
    fn viewport_size(canvas: &HtmlCanvasElement) -> (Vec2, u32, u32) {
        let window = web_sys::window().unwrap();
        let dpr = window.device_pixel_ratio();
        let css_w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(canvas.client_width() as f64);
        let css_h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(canvas.client_height() as f64);
        (
            Vec2::new(css_w as f32, css_h as f32),
            (css_w * dpr).max(1.0) as u32,
            (css_h * dpr).max(1.0) as u32,
        )
    }

    /// Pick the balance preset from `?variant=`, then apply any `?tuning=` overlay
    fn tuning_from_url() -> Tuning {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();

        let preset = query_param(&search, "variant")
            .and_then(|value| {
                let preset = TuningPreset::from_str(value);
                if preset.is_none() {
                    log::warn!("Unknown variant '{}', using classic", value);
                }
                preset
            })
            .unwrap_or_default();
        log::info!("Using {} tuning", preset.as_str());
        let tuning = preset.tuning();

        let Some(raw) = query_param(&search, "tuning") else {
            return tuning;
        };
        let json: String = match js_sys::decode_uri_component(&raw.replace('+', " ")) {
            Ok(decoded) => decoded.into(),
            Err(_) => {
                log::warn!("Tuning overlay is not valid URI encoding, ignoring it");
                return tuning;
            }
        };
        match tuning.with_json_overlay(&json) {
            Ok(overlaid) => {
                log::info!("Applied tuning overlay");
                overlaid
            }
            Err(e) => {
                log::warn!("Rejected tuning overlay: {}", e);
                tuning
            }
        }
    }

    async fn init_renderer(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
        world: Vec2,
    ) -> Result<RenderState, RenderInitError> {
        let navigator = web_sys::window().unwrap().navigator();
        let has_webgpu =
            js_sys::Reflect::has(navigator.as_ref(), &JsValue::from_str("gpu")).unwrap_or(false);
        let backends = if has_webgpu {
            wgpu::Backends::BROWSER_WEBGPU
        } else {
            wgpu::Backends::GL
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, width, height, world).await
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Sky Hop starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (world, width, height) = viewport_size(&canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, world, tuning_from_url())));

        log::info!("Game initialized with seed: {}", seed);

        match init_renderer(&canvas, width, height, world).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Graphics unavailable: {}", e);
                return;
            }
        }

        setup_input_handlers(game.clone());
        setup_viewport_handlers(&canvas, game.clone());
        setup_instructions_overlay(&document);

        // Start game loop
        request_animation_frame(game);

        log::info!("Sky Hop running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Key presses
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().input.key_down(&event.key(), event.repeat()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key releases
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: keyup events will not arrive
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input.release_all();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_viewport_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Resize (also fires when entering or leaving fullscreen)
        {
            let game = game.clone();
            let canvas = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().resize(&canvas);
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click toggles fullscreen
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                if document.fullscreen_element().is_some() {
                    document.exit_fullscreen();
                } else if let Some(root) = document.document_element() {
                    if let Err(e) = root.request_fullscreen() {
                        log::warn!("Fullscreen request refused: {:?}", e);
                    }
                }
            });
            let _ = canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Hide the how-to-play panel when its close button is clicked
    fn setup_instructions_overlay(document: &web_sys::Document) {
        let Some(button) = document.get_element_by_id("closeInstructions") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let document = web_sys::window().unwrap().document().unwrap();
            if let Some(panel) = document.get_element_by_id("instructions") {
                let _ = panel.set_attribute("style", "display: none");
            }
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sky Hop (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    run_headless(2024, 30);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Simulate a scripted player for `seconds` and report how far it got
#[cfg(not(target_arch = "wasm32"))]
fn run_headless(seed: u64, seconds: u32) {
    use sky_hop::Tuning;
    use sky_hop::consts::{REFERENCE_HZ, SIM_DT};
    use sky_hop::sim::{GameEvent, GameState, TickInput, tick};

    let mut state = GameState::new(seed, 1280.0, 800.0, Tuning::classic());
    let ticks = seconds * REFERENCE_HZ as u32;
    let mut best = 0;
    let mut falls = 0;

    for t in 0..ticks {
        // Steer toward the lowest platform not yet scored
        let target = state
            .platforms
            .iter()
            .filter(|p| !p.touched)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|p| p.pos.x + p.width / 2.0);
        let (left, right) = match target {
            Some(x) if x < state.avatar.pos.x - 5.0 => (true, false),
            Some(x) if x > state.avatar.pos.x + 5.0 => (false, true),
            _ => (false, false),
        };
        let input = TickInput {
            left,
            right,
            jump: t % 45 == 0 || t % 45 == 20,
        };

        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match event {
                GameEvent::ScoreReset { .. } => falls += 1,
                GameEvent::Scored { score, .. } => best = best.max(score),
                _ => {}
            }
        }
    }

    log::info!(
        "Headless run finished: {} ticks, score {}, best {}, falls {}, {} platforms live",
        state.time_ticks,
        state.score,
        best,
        falls,
        state.platforms.len()
    );
}
