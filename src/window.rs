//! Demo host: a winit window running one portal against a simulated request.
//!
//! The window plays the part the embedding application normally plays. It
//! mounts the portal when the window becomes available, feeds it progress
//! from a [`ProgressScript`], unmounts on suspend or close, and starts a new
//! cycle once each simulated request finishes. `R` restarts the cycle early.
//! Text is left to the host, so the readout and headline go in the title.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::camera::Viewport;
use crate::config::PortalConfig;
use crate::constellation::Readout;
use crate::error::{ConfigError, RunError};
use crate::gpu::Renderer;
use crate::portal::{Portal, RenderState};
use crate::script::{ProgressScript, ScriptPhase};
use crate::time::FrameClock;

/// Seconds the simulated request stays pending.
pub const DEFAULT_REQUEST_SECONDS: f32 = 8.0;

/// Open a window and run `config` until it is closed.
pub fn run(config: PortalConfig, request_seconds: f32) -> Result<(), RunError> {
    let mut app = App::new(config, request_seconds)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// winit application driving one [`Portal`].
pub struct App {
    portal: Portal,
    clock: FrameClock,
    script: ProgressScript,
    request_seconds: f32,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    title: String,
    error: Option<RunError>,
}

impl App {
    pub fn new(config: PortalConfig, request_seconds: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            portal: Portal::new(config)?,
            clock: FrameClock::new(),
            script: ProgressScript::new(0.0).with_complete_after(request_seconds),
            request_seconds,
            window: None,
            renderer: None,
            title: String::new(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.shutdown();
        self.error = Some(error);
        event_loop.exit();
    }

    fn shutdown(&mut self) {
        self.portal.unmount();
        if let Some(renderer) = &mut self.renderer {
            renderer.destroy();
        }
        self.renderer = None;
    }

    /// Unmount, remount and start a fresh simulated request.
    fn restart_cycle(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let viewport = viewport_of(window);
        self.portal.unmount();
        self.portal.mount(viewport);
        self.clock.restart();
        self.script = ProgressScript::new(0.0).with_complete_after(self.request_seconds);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.tick();
        let percent = match self.script.sample(now) {
            ScriptPhase::Loading(p) | ScriptPhase::Completing(p) => p,
            ScriptPhase::Finished => {
                log::info!("simulated request finished; starting over");
                self.restart_cycle();
                0.0
            }
        };
        let now = self.clock.elapsed();

        if self.portal.step(now, percent).is_none() {
            return;
        }
        let Some(state) = self.portal.state() else {
            return;
        };

        let title = title_for(state);
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        match renderer.render(state, self.portal.config()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost; reconfiguring");
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                self.shutdown();
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window = match &self.window {
            Some(window) => window.clone(),
            None => {
                let attrs = Window::default_attributes()
                    .with_title("portalfx")
                    .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
                match event_loop.create_window(attrs) {
                    Ok(window) => {
                        let window = Arc::new(window);
                        self.window = Some(window.clone());
                        window
                    }
                    Err(e) => return self.fail(event_loop, e.into()),
                }
            }
        };

        if self.renderer.is_none() {
            let background = self.portal.config().background;
            match pollster::block_on(Renderer::new(window.clone(), background)) {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(e) => return self.fail(event_loop, e.into()),
            }
        }

        self.restart_cycle();
        window.request_redraw();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("suspended");
        self.shutdown();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                if let Some(window) = &self.window {
                    self.portal.resize(viewport_of(window));
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::KeyR),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.restart_cycle(),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn viewport_of(window: &Window) -> Viewport {
    let scale = window.scale_factor() as f32;
    let size = window.inner_size();
    Viewport::new(
        (size.width as f32 / scale).round() as u32,
        (size.height as f32 / scale).round() as u32,
        scale,
    )
}

fn title_for(state: &RenderState) -> String {
    let readout = state
        .core
        .map(|c| c.readout)
        .unwrap_or_else(|| Readout::from_progress(state.progress));
    format!("portalfx  {}  {}", readout, state.headline)
}
