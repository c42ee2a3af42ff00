use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::panel::{ControlPanel, PanelKey, PanelUpdate};
use crate::runtime::{time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy, TimeSample};
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Aggregates GPU state and the control panel for the preview window.
pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    panel: ControlPanel,
    modifiers: ModifiersState,
    config: RendererConfig,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, config)?;
        let panel = ControlPanel::new(config.settings, config.presets.clone());
        let state = Self {
            window,
            gpu,
            panel,
            modifiers: ModifiersState::empty(),
            config: config.clone(),
        };
        state.refresh_title();
        Ok(state)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    pub(crate) fn render_frame(&mut self, time_sample: TimeSample) -> Result<(), wgpu::SurfaceError> {
        self.gpu.render(time_sample)
    }

    pub(crate) fn is_fading(&self) -> bool {
        self.gpu.is_fading()
    }

    /// Routes a key press to the panel; returns true when a redraw is needed.
    fn handle_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed {
            return false;
        }
        let Some(key) = panel_key(&event.logical_key) else {
            return false;
        };
        // Holding an arrow key keeps nudging; the other bindings fire once.
        if event.repeat && !matches!(key, PanelKey::Left | PanelKey::Right) {
            return false;
        }

        let update = self.panel.handle(key, self.modifiers.shift_key());
        let changed = match update {
            PanelUpdate::Unchanged => false,
            PanelUpdate::Immediate(settings) => {
                self.gpu.apply_settings(settings);
                true
            }
            PanelUpdate::Preset { name, settings } => {
                info!(preset = %name, "switching preset");
                self.gpu.fade_to(
                    settings,
                    self.config.crossfade,
                    self.config.crossfade_curve,
                    Instant::now(),
                );
                true
            }
        };

        if self.panel.readout_visible() {
            info!(field = %self.panel.selected(), "{}", self.panel.readout());
        }
        self.refresh_title();
        changed
    }

    fn refresh_title(&self) {
        self.window.set_title(&self.panel.window_title());
    }

    fn log_settings(&self) {
        let settings = self.gpu.settings();
        for (field, value) in settings.values() {
            info!(uniform = field.uniform_name(), value, "{}", field.label());
        }
    }
}

fn panel_key(key: &Key) -> Option<PanelKey> {
    match key {
        Key::Named(NamedKey::ArrowUp) => Some(PanelKey::Up),
        Key::Named(NamedKey::ArrowDown) => Some(PanelKey::Down),
        Key::Named(NamedKey::ArrowLeft) => Some(PanelKey::Left),
        Key::Named(NamedKey::ArrowRight) => Some(PanelKey::Right),
        Key::Named(NamedKey::Tab) => Some(PanelKey::NextPreset),
        Key::Character(value) => match value.as_str() {
            "r" | "R" => Some(PanelKey::Reset),
            "h" | "H" => Some(PanelKey::ToggleReadout),
            _ => None,
        },
        _ => None,
    }
}

/// Pairs the frame scheduler with the time source chosen for the policy.
pub(crate) struct RenderPolicyDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl RenderPolicyDriver {
    pub(crate) fn new(policy: RenderPolicy) -> Self {
        Self {
            time_source: time_source_for_policy(&policy),
            scheduler: FrameScheduler::new(policy),
        }
    }

    pub(crate) fn sample(&mut self) -> TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        self.scheduler.mark_rendered(now);
    }

    pub(crate) fn invalidate(&mut self) {
        self.scheduler.invalidate();
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }
}

/// Software rasterizers get a gentle FPS cap unless the caller chose one.
fn effective_policy(policy: &RenderPolicy, software: bool) -> RenderPolicy {
    match policy {
        RenderPolicy::Animate { target_fps: None } if software => RenderPolicy::Animate {
            target_fps: Some(SOFTWARE_FPS_CAP),
        },
        other => other.clone(),
    }
}

/// Opens the preview window and drives the `winit` event loop until it closes.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("cathode")
        .with_inner_size(window_size)
        .build(&event_loop)
        .context("failed to create preview window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), config)
        .context("failed to initialise window renderer")?;

    let profile = state.gpu.adapter_profile().clone();
    let policy = effective_policy(&config.policy, profile.is_software());
    if policy != config.policy {
        warn!(
            adapter = %profile.name,
            backend = ?profile.backend,
            cap = SOFTWARE_FPS_CAP,
            "software rasterizer detected; capping preview FPS (override with --fps)"
        );
    }
    info!(
        adapter = %profile.name,
        backend = ?profile.backend,
        ?policy,
        "preview window ready"
    );
    state.log_settings();

    let mut policy_driver = RenderPolicyDriver::new(policy);
    state.window().request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    state.modifiers = modifiers.state();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if matches!(event.logical_key, Key::Named(NamedKey::Escape))
                        && event.state == ElementState::Pressed
                    {
                        elwt.exit();
                        return;
                    }
                    if state.handle_key(&event) {
                        policy_driver.invalidate();
                        state.window().request_redraw();
                    }
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                    policy_driver.invalidate();
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.size());
                }
                WindowEvent::RedrawRequested => match state.render_frame(policy_driver.sample()) {
                    Ok(()) => {
                        policy_driver.mark_rendered(Instant::now());
                        if state.is_fading() {
                            policy_driver.invalidate();
                        }
                    }
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize(state.size());
                        policy_driver.invalidate();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; exiting preview");
                        elwt.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("surface timeout; retrying next frame");
                    }
                    Err(other) => {
                        warn!("surface error: {other:?}; retrying next frame");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if policy_driver.ready_for_frame(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else if let Some(deadline) = policy_driver.next_deadline() {
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            } else {
                elwt.set_control_flow(ControlFlow::Wait);
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
