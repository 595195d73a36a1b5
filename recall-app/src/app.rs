use std::sync::Arc;
use std::time::{Duration, Instant};

use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use recall_core::TrialPhase;
use recall_render::{SkiaRenderer, load_font};
use recall_timing::{HighPrecisionTimer, Timer};
use recall_trial::{SpeechEngine, TrialCommand, TrialController, TrialEvent};
use tracing::{debug, error, info, trace};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

use crate::config::{AppConfig, DisplaySettings};
use crate::input::{self, Action};
use crate::speech::speech_engine;

/// How often a running speech process is polled.
const SPEECH_POLL: Duration = Duration::from_millis(50);

type Controller = TrialController<HighPrecisionTimer, ThreadRng, Box<dyn SpeechEngine>>;

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    controller: Controller,
    renderer: Option<SkiaRenderer>,
    font: Option<FontVec>,
    timer: HighPrecisionTimer,
    display: DisplaySettings,
    focus: usize,
    should_exit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let font = load_font(config.display.font.as_deref()).context("loading display font")?;
        let timer = HighPrecisionTimer::new();
        let speech = speech_engine(&config.speech);
        let controller = TrialController::new(config.trial, timer.clone(), rand::rng(), speech);

        Ok(Self {
            window: None,
            pixels: None,
            controller,
            renderer: None,
            font: Some(font),
            timer,
            display: config.display,
            focus: 0,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "starting; press G to generate a sequence, Esc to quit"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut window_attributes = Window::default_attributes().with_title("Recall");
        if self.display.windowed {
            window_attributes = window_attributes
                .with_inner_size(LogicalSize::new(1024.0, 640.0))
                .with_resizable(true);
        } else {
            let monitor = event_loop
                .primary_monitor()
                .or_else(|| event_loop.available_monitors().next())
                .ok_or_else(|| anyhow!("no monitor available"))?;
            window_attributes = window_attributes
                .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
                .with_resizable(false);
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("creating window")?,
        );
        let size = window.inner_size();
        info!(
            width = size.width,
            height = size.height,
            scale = window.scale_factor(),
            "window created"
        );

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(
            Pixels::new(size.width, size.height, surface_texture).context("creating pixel surface")?,
        );

        let font = self
            .font
            .take()
            .ok_or_else(|| anyhow!("renderer already created"))?;
        self.renderer = Some(SkiaRenderer::new(size.width, size.height, font)?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let view = self.controller.view();
        let stats = renderer.render_frame(
            view.as_ref(),
            Some(self.focus),
            pixels.frame_mut(),
            &self.timer,
        )?;
        let now = self.timer.now();
        pixels.render()?;
        let present = self.timer.elapsed(now);

        trace!(
            clear_ms = stats.clear.as_secs_f64() * 1e3,
            draw_ms = stats.draw.as_secs_f64() * 1e3,
            copy_ms = stats.copy.as_secs_f64() * 1e3,
            total_ms = stats.total.as_secs_f64() * 1e3,
            present_ms = present.as_secs_f64() * 1e3,
            "frame"
        );
        Ok(())
    }

    /// Drives the controller and reports whether anything visible changed.
    fn update(&mut self) -> bool {
        let events = self.controller.update();
        for event in &events {
            match event {
                TrialEvent::Generated { .. } | TrialEvent::Concealed { .. } => self.focus = 0,
                TrialEvent::Revealed(outcome) => info!(
                    generation = %outcome.generation,
                    correct = outcome.correct,
                    total = outcome.total(),
                    manual = outcome.manual_reveal,
                    "trial scored"
                ),
                _ => {}
            }
        }
        !events.is_empty()
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = input::action_for(code) else {
            return;
        };
        let action = match action {
            Action::Submit => match input::submit_action(self.controller.phase()) {
                Some(action) => action,
                None => return,
            },
            other => other,
        };

        match action {
            Action::Exit => self.cleanup_and_exit(event_loop),
            Action::Generate => {
                self.controller.handle_command(TrialCommand::Generate);
            }
            Action::Reveal => {
                if !self.controller.handle_command(TrialCommand::Reveal) {
                    debug!("reveal ignored outside the answer window");
                }
            }
            Action::Digit(d) => {
                let entry = self.current_entry();
                if let Some(raw) = input::push_digit(&entry, d) {
                    self.answer(raw);
                }
            }
            Action::Backspace => {
                let mut entry = self.current_entry();
                if entry.pop().is_some() {
                    self.answer(entry);
                }
            }
            Action::Clear => self.answer(String::new()),
            Action::Focus(step) => {
                let slots = self.controller.trial().map_or(0, |t| t.len());
                self.focus = input::move_focus(self.focus, step, slots);
            }
            other => {
                if let Some(next) = input::adjust(*self.controller.config(), other) {
                    self.controller.handle_command(TrialCommand::Configure(next));
                }
            }
        }
        self.update();
        self.request_redraw();
    }

    fn current_entry(&self) -> String {
        self.controller
            .trial()
            .and_then(|t| t.entries().get(self.focus).cloned())
            .unwrap_or_default()
    }

    fn answer(&mut self, raw: String) {
        if self.controller.phase() != Some(TrialPhase::Hidden) {
            return;
        }
        self.controller.handle_command(TrialCommand::Answer {
            index: self.focus,
            raw,
        });
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                error!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                error!("failed to resize canvas: {e:#}");
            }
        }
        debug!(width = new_size.width, height = new_size.height, "display resized");
        self.request_redraw();
    }

    /// When the event loop should next wake without input.
    fn wake_at(&self) -> Option<Instant> {
        let deadline = self
            .controller
            .next_deadline()
            .map(|ts| self.timer.instant_at(ts));
        if self.controller.is_speaking() {
            let poll = Instant::now() + SPEECH_POLL;
            return Some(deadline.map_or(poll, |d| d.min(poll)));
        }
        deadline
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(outcome) = self.controller.outcome() {
            info!(correct = outcome.correct, total = outcome.total(), "last trial");
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.render() {
                    error!("render failed: {e:#}");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
            return;
        }
        if self.update() {
            self.request_redraw();
        }
        match self.wake_at() {
            Some(at) => event_loop.set_control_flow(ControlFlow::WaitUntil(at)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
