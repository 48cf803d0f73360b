//! This module contains [Display], the window a stream is played in.
//!
//! The event loop isn't handed control of the thread. Instead, whoever owns the
//! [Display] pumps it with [Display::pump_events] whenever it's convenient
//! (the player does it once per tick), which keeps the window responsive
//! without a second thread.

use std::sync::Arc;
use std::time::Duration;

use media::frame::{Dimensions, YuvPlanes};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::engine_errors::EngineError;
use crate::renderer::Renderer;
use crate::video_texture::VideoTexture;

/// Whether the user still wants the window around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    Open,
    /// The close button or Escape was pressed (or the event loop exited).
    CloseRequested,
}

/// A window with a GPU renderer attached.
pub struct Display {
    // Dropped in this order: the renderer's surface must go before the window,
    // and the window before its event loop.
    renderer: Renderer,
    handler: WindowHandler,
    event_loop: EventLoop<()>,
}

impl Display {
    /// Create the window (with `title` and a fixed inner size) and its
    /// renderer.
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, EngineError> {
        let mut event_loop = EventLoop::new()?;

        let attributes = Window::default_attributes()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height));
        let mut handler = WindowHandler::new(attributes);

        // The window can only be created once the event loop says the app has
        // resumed, which happens during the first pump on desktop platforms.
        let renderer = loop {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut handler);

            if let Some(renderer) = handler.renderer.take() {
                break renderer?;
            }
            if let PumpStatus::Exit(_) = status {
                return Err(EngineError::WindowNeverCreated);
            }
        };

        log::debug!("Opened a {width}x{height} window titled {title:?}.");

        Ok(Self {
            renderer,
            handler,
            event_loop,
        })
    }

    /// Handle every pending window event without blocking.
    pub fn pump_events(&mut self) -> DisplayStatus {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler);

        if let Some(size) = self.handler.pending_resize.take() {
            self.renderer.resize(size.width, size.height);
        }

        if self.handler.close_requested || matches!(status, PumpStatus::Exit(_)) {
            DisplayStatus::CloseRequested
        } else {
            DisplayStatus::Open
        }
    }

    /// Create a render target for pictures with `dimensions`.
    pub fn create_video_texture(&self, dimensions: Dimensions) -> VideoTexture {
        self.renderer.create_video_texture(dimensions)
    }

    /// Upload `picture` to `texture`, then clear the window, draw the texture
    /// stretched over all of it and present.
    pub fn present(
        &mut self,
        texture: &mut VideoTexture,
        picture: &YuvPlanes,
    ) -> Result<(), EngineError> {
        texture.upload(self.renderer.queue(), picture)?;
        self.renderer.render(texture)
    }
}

/// Receives the event loop's callbacks while it's being pumped.
struct WindowHandler {
    attributes: WindowAttributes,
    window: Option<Arc<Window>>,
    /// Filled in once, when the window is created.
    renderer: Option<Result<Renderer, EngineError>>,
    pending_resize: Option<PhysicalSize<u32>>,
    close_requested: bool,
}

impl WindowHandler {
    fn new(attributes: WindowAttributes) -> Self {
        Self {
            attributes,
            window: None,
            renderer: None,
            pending_resize: None,
            close_requested: false,
        }
    }
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Only initialize once; guard against spurious resume events
        if self.window.is_some() {
            return;
        }

        let result = event_loop
            .create_window(self.attributes.clone())
            .map_err(EngineError::from)
            .and_then(|window| {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Renderer::new(window)
            });

        self.renderer = Some(result);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.close_requested = true,

            WindowEvent::Resized(size) => self.pending_resize = Some(size),

            _ => {}
        }
    }
}
