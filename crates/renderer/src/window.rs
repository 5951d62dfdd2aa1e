//! Window runtime: owns the winit event loop on a dedicated thread and
//! exposes a handle the show engine uses to swap scenes and observe advance
//! requests (spacebar). Frames are paced by the policy's frame scheduler;
//! between deadlines the loop sleeps in `ControlFlow::WaitUntil`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{error, info};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::runtime::{time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy};
use crate::types::{RenderMode, RendererConfig, SwapRequest};

/// Couples the frame scheduler with its time source so scene swaps can reset
/// both together.
pub(crate) struct RenderPolicyDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl RenderPolicyDriver {
    pub(crate) fn new(policy: &RenderPolicy) -> Result<Self> {
        Ok(Self {
            scheduler: FrameScheduler::new(policy),
            time_source: time_source_for_policy(policy)?,
        })
    }

    pub(crate) fn sample(&mut self) -> crate::runtime::TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        self.scheduler.mark_rendered(now);
    }
}

#[derive(Debug, Clone)]
enum WindowCommand {
    Swap { request: SwapRequest },
    Shutdown,
}

#[derive(Debug, Clone)]
enum WindowSignal {
    AdvanceShow,
}

/// Handle to the renderer thread.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    events: Receiver<WindowSignal>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (signal_tx, signal_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("vitrine-window".into())
            .spawn(move || run_window_thread(config, ready_tx, signal_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            events: signal_rx,
            join_handle: Some(handle),
        })
    }

    pub fn swap_scene(&self, request: SwapRequest) -> Result<()> {
        self.proxy
            .send_event(WindowCommand::Swap { request })
            .map_err(|err| anyhow!(err))
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }

    /// Blocks until the window closes on its own (single-scene mode).
    pub fn wait(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }

    /// Number of advance requests (spacebar presses) since the last call.
    pub fn take_advance_requests(&self) -> usize {
        self.events
            .try_iter()
            .filter(|signal| matches!(signal, WindowSignal::AdvanceShow))
            .count()
    }

    /// Whether the renderer thread is still alive.
    pub fn is_running(&self) -> bool {
        self.join_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
    signal_tx: Sender<WindowSignal>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }
    let event_loop = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let mut window_builder = WindowBuilder::new()
        .with_title(format!("Vitrine: {}", config.scene.name))
        .with_inner_size(window_size);
    if config.mode == RenderMode::Kiosk {
        window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = window_builder
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create scene window: {err}"))?;
    let window = Arc::new(window);

    let initial_state = match GpuState::new(
        window.clone(),
        window.inner_size(),
        config.scene.clone(),
        config.antialiasing,
        config.seed,
    ) {
        Ok(state) => state,
        Err(err) => {
            let wrapped = anyhow!("failed to initialise scene renderer: {err}");
            let _ = ready_tx.send(Err(anyhow!(wrapped.to_string())));
            return Err(wrapped);
        }
    };
    // Option so an antialias change can drop the old surface before a new
    // one is bound to the same window.
    let mut state: Option<GpuState> = Some(initial_state);
    let mut current_antialiasing = config.antialiasing;

    let mut policy_driver = RenderPolicyDriver::new(&config.policy)?;
    if policy_driver.ready_for_frame(Instant::now()) {
        window.request_redraw();
    }

    let _ = ready_tx.send(Ok(proxy.clone()));

    let mut result = Ok(());
    let run_result = event_loop.run(move |event, elwt| {
        match event {
            Event::UserEvent(command) => match command {
                WindowCommand::Swap { request } => {
                    let SwapRequest {
                        scene,
                        crossfade,
                        antialiasing,
                        policy,
                    } = request;
                    if antialiasing != current_antialiasing {
                        info!(?antialiasing, "antialias changed; rebuilding GPU state");
                        drop(state.take());
                        match GpuState::new(
                            window.clone(),
                            window.inner_size(),
                            scene,
                            antialiasing,
                            config.seed,
                        ) {
                            Ok(new_state) => {
                                state = Some(new_state);
                                current_antialiasing = antialiasing;
                            }
                            Err(err) => {
                                error!("failed to rebuild scene renderer: {err:?}");
                                elwt.exit();
                                return;
                            }
                        }
                    } else if let Some(state) = state.as_mut() {
                        state.set_scene(scene, crossfade, Instant::now());
                    }
                    match RenderPolicyDriver::new(&policy) {
                        Ok(driver) => policy_driver = driver,
                        Err(err) => {
                            error!("failed to update render policy: {err:?}");
                        }
                    }
                    if policy_driver.ready_for_frame(Instant::now()) {
                        window.request_redraw();
                    }
                }
                WindowCommand::Shutdown => {
                    elwt.exit();
                }
            },
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state == ElementState::Pressed && !event.repeat {
                        let is_space = matches!(event.logical_key, Key::Named(NamedKey::Space))
                            || matches!(event.logical_key, Key::Character(ref value) if value.as_str() == " ");
                        if is_space {
                            let _ = signal_tx.send(WindowSignal::AdvanceShow);
                        }
                        if matches!(event.logical_key, Key::Named(NamedKey::Escape)) {
                            info!("escape pressed; closing scene window");
                            elwt.exit();
                        }
                    }
                }
                WindowEvent::Resized(new_size) => {
                    if let Some(state) = state.as_mut() {
                        state.resize(new_size);
                    }
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    if let Some(state) = state.as_ref() {
                        let _ = inner_size_writer.request_inner_size(state.size());
                    }
                }
                WindowEvent::RedrawRequested => {
                    let Some(gpu) = state.as_mut() else { return };
                    let now = Instant::now();
                    match gpu.render(policy_driver.sample(), now) {
                        Ok(()) => {
                            policy_driver.mark_rendered(now);
                        }
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            let size = gpu.size();
                            gpu.resize(size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting scene window");
                            elwt.exit();
                        }
                        Err(err) => {
                            tracing::warn!(error = ?err, "surface error; retrying next frame");
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if policy_driver.ready_for_frame(now) {
                    window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = policy_driver.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        }
    });

    if let Err(err) = run_result {
        result = Err(anyhow!("window event loop error: {err}"));
    }

    result
}
