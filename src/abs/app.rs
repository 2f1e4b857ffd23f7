//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which drives the frame loop, and
//! [`SdlSurface`] which encapsulates the SDL2 window and OpenGL context the loop
//! renders into. The loop only talks to the window through the [`Surface`] trait.

use std::sync::Arc;

use glow::HasContext;
use sdl2::{
    keyboard::{Keycode, Mod, Scancode},
    mouse::MouseButton,
};

/// Whether a key or button went down, came up or is auto-repeating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Press,
    Release,
    Repeat,
}

/// Input observed since the previous frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Key {
        key: Option<Keycode>,
        scancode: Option<Scancode>,
        action: Action,
        modifiers: Mod,
    },
    MouseButton {
        button: MouseButton,
        action: Action,
        modifiers: Mod,
    },
    CursorMoved {
        x: f64,
        y: f64,
    },
    /// The window manager asked the window to close.
    Quit,
}

/// An error reported by the graphics driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceError {
    pub code: u32,
}

impl DeviceError {
    /// Returns the driver's name for the error code.
    pub fn description(&self) -> &'static str {
        match self.code {
            glow::INVALID_ENUM => "invalid enum",
            glow::INVALID_VALUE => "invalid value",
            glow::INVALID_OPERATION => "invalid operation",
            glow::INVALID_FRAMEBUFFER_OPERATION => "invalid framebuffer operation",
            glow::OUT_OF_MEMORY => "out of memory",
            glow::STACK_UNDERFLOW => "stack underflow",
            glow::STACK_OVERFLOW => "stack overflow",
            _ => "unknown error",
        }
    }
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}: {}", self.code, self.description())
    }
}

/// The window and rendering context the frame loop draws into.
pub trait Surface {
    /// Current drawable size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);
    fn set_viewport(&mut self, width: u32, height: u32);
    /// Clears color and depth.
    fn clear(&mut self, color: [f32; 4]);
    fn present(&mut self);
    fn poll_events(&mut self) -> Vec<InputEvent>;
    /// Takes every error the device queued since the last call.
    fn drain_errors(&mut self) -> Vec<DeviceError>;
}

/// Cached framebuffer geometry, refreshed by the viewport callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub ratio: f32,
}

impl Viewport {
    /// Caches a size, treating a zero height as one pixel for the ratio.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ratio: width as f32 / height.max(1) as f32,
        }
    }
}

/// The callbacks the frame loop invokes. `S` is the user's per-run context.
pub struct Callbacks<H: Surface, S> {
    pub viewport: fn(&mut App<H, S>),
    pub draw: fn(&mut App<H, S>, &mut S),
    pub key: fn(&mut App<H, S>, Option<Keycode>, Option<Scancode>, Action, Mod),
    pub mouse_button: fn(&mut App<H, S>, MouseButton, Action, Mod),
    pub cursor: fn(&mut App<H, S>, f64, f64),
    pub error: fn(&DeviceError),
}

impl<H: Surface, S> Callbacks<H, S> {
    /// Default callbacks around a user supplied draw function.
    pub fn simple(draw: fn(&mut App<H, S>, &mut S)) -> Self {
        Self {
            viewport: update_viewport,
            draw,
            key: on_key,
            mouse_button: on_mouse_button,
            cursor: on_cursor_move,
            error: on_error,
        }
    }
}

impl<H: Surface, S> Clone for Callbacks<H, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: Surface, S> Copy for Callbacks<H, S> {}

/// Resizes the viewport to the framebuffer and refreshes the cached size.
pub fn update_viewport<H: Surface, S>(app: &mut App<H, S>) {
    let (width, height) = app.surface.framebuffer_size();
    app.surface.set_viewport(width, height);
    app.viewport = Viewport::new(width, height);
}

/// Logs the key and closes the app when Escape is pressed.
pub fn on_key<H: Surface, S>(
    app: &mut App<H, S>,
    key: Option<Keycode>,
    scancode: Option<Scancode>,
    action: Action,
    modifiers: Mod,
) {
    log::info!("Key [{key:?}], Scancode [{scancode:?}], Action [{action:?}], Modifier [{modifiers:?}]");

    if key == Some(Keycode::Escape) && action == Action::Press {
        app.close();
    }
}

/// Logs mouse button presses and releases.
pub fn on_mouse_button<H: Surface, S>(
    _app: &mut App<H, S>,
    button: MouseButton,
    action: Action,
    modifiers: Mod,
) {
    log::info!("Mouse Button [{button:?}], Action [{action:?}], Modifier [{modifiers:?}]");
}

/// Traces the cursor position.
pub fn on_cursor_move<H: Surface, S>(_app: &mut App<H, S>, x: f64, y: f64) {
    log::trace!("Mouse Position [{x:.0}, {y:.0}]");
}

/// Logs an error reported by the driver.
pub fn on_error(error: &DeviceError) {
    log::error!("OpenGL error {error}");
}

/// Owns the surface and runs the frame loop.
pub struct App<H: Surface, S> {
    surface: H,
    title: String,
    viewport: Viewport,
    clear_color: [f32; 4],
    close_requested: bool,
    frame: u64,
    callbacks: Callbacks<H, S>,
}

impl<H: Surface, S> App<H, S> {
    /// Wraps `surface`, caching its current framebuffer size.
    pub fn new(surface: H, title: &str, clear_color: [f32; 4], callbacks: Callbacks<H, S>) -> Self {
        let (width, height) = surface.framebuffer_size();
        Self {
            surface,
            title: title.to_string(),
            viewport: Viewport::new(width, height),
            clear_color,
            close_requested: false,
            frame: 0,
            callbacks,
        }
    }

    /// Runs frames until [`App::close`] is called, then hands `state` back.
    pub fn start(&mut self, mut state: S) -> S {
        log::info!("starting frame loop for \"{}\"", self.title);
        let callbacks = self.callbacks;

        while !self.close_requested {
            (callbacks.viewport)(self);

            self.surface.clear(self.clear_color);

            (callbacks.draw)(self, &mut state);
            for error in self.surface.drain_errors() {
                (callbacks.error)(&error);
            }

            self.surface.present();

            for event in self.surface.poll_events() {
                self.dispatch(event);
            }

            self.frame += 1;
        }

        log::info!("frame loop finished after {} frames", self.frame);
        state
    }

    fn dispatch(&mut self, event: InputEvent) {
        let callbacks = self.callbacks;
        match event {
            InputEvent::Key {
                key,
                scancode,
                action,
                modifiers,
            } => (callbacks.key)(self, key, scancode, action, modifiers),
            InputEvent::MouseButton {
                button,
                action,
                modifiers,
            } => (callbacks.mouse_button)(self, button, action, modifiers),
            InputEvent::CursorMoved { x, y } => (callbacks.cursor)(self, x, y),
            InputEvent::Quit => self.close(),
        }
    }

    /// Asks the loop to stop. Takes effect before the next frame begins.
    pub fn close(&mut self) {
        if !self.close_requested {
            log::debug!("close requested");
        }
        self.close_requested = true;
    }

    /// Returns whether [`App::close`] has been called.
    pub fn is_closing(&self) -> bool {
        self.close_requested
    }

    /// Returns the framebuffer geometry cached by the last viewport update.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Width over height of the framebuffer.
    pub fn ratio(&self) -> f32 {
        self.viewport.ratio
    }

    /// Number of completed frames.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the surface the loop renders into.
    pub fn surface(&self) -> &H {
        &self.surface
    }

    /// Releases the window and context. Every device object must be dropped first.
    pub fn destroy(self) {
        log::info!("destroying \"{}\"", self.title);
        drop(self.surface);
    }
}

/// The SDL2 window together with its OpenGL context.
pub struct SdlSurface {
    pub gl: Arc<glow::Context>,
    // Field order is drop order: the context goes before the window.
    _gl_context: sdl2::video::GLContext,
    window: sdl2::video::Window,
    event_pump: sdl2::EventPump,
    _video_subsystem: sdl2::VideoSubsystem,
    sdl: sdl2::Sdl,
}

impl SdlSurface {
    /// Creates the window and a GL 3.0 compatibility context, and loads GL functions.
    pub fn new(title: &str, width: u32, height: u32, vsync: bool) -> crate::Result<Self> {
        use crate::Error;

        let sdl = sdl2::init().map_err(Error::Platform)?;
        let video_subsystem = sdl.video().map_err(Error::Platform)?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Compatibility);
        gl_attr.set_context_version(3, 0);
        gl_attr.set_depth_size(24);
        gl_attr.set_double_buffer(true);

        let window = video_subsystem
            .window(title, width, height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| Error::Window(e.to_string()))?;
        let gl_context = window.gl_create_context().map_err(Error::Context)?;
        window.gl_make_current(&gl_context).map_err(Error::Context)?;

        let interval = if vsync {
            sdl2::video::SwapInterval::VSync
        } else {
            sdl2::video::SwapInterval::Immediate
        };
        if let Err(e) = video_subsystem.gl_set_swap_interval(interval) {
            log::warn!("could not set swap interval: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| video_subsystem.gl_get_proc_address(s) as *const _)
        };
        let event_pump = sdl.event_pump().map_err(Error::Platform)?;

        unsafe {
            log::info!(
                "OpenGL {} on {}",
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER)
            );
            // Discard anything the loader left in the error queue.
            for _ in 0..MAX_DEVICE_ERRORS {
                if gl.get_error() == glow::NO_ERROR {
                    break;
                }
            }

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            gl.line_width(3.0);
        }

        Ok(Self {
            gl: Arc::new(gl),
            _gl_context: gl_context,
            window,
            event_pump,
            _video_subsystem: video_subsystem,
            sdl,
        })
    }

    fn modifiers(&self) -> Mod {
        self.sdl.keyboard().mod_state()
    }
}

/// Upper bound on queued GL errors read per frame.
const MAX_DEVICE_ERRORS: usize = 16;

impl Surface for SdlSurface {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe {
            self.gl.clear_color(r, g, b, a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn present(&mut self) {
        self.window.gl_swap_window();
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        use sdl2::event::Event;

        let modifiers = self.modifiers();
        self.event_pump
            .poll_iter()
            .filter_map(|event| match event {
                Event::Quit { .. } => Some(InputEvent::Quit),
                Event::KeyDown {
                    keycode,
                    scancode,
                    keymod,
                    repeat,
                    ..
                } => Some(InputEvent::Key {
                    key: keycode,
                    scancode,
                    action: if repeat { Action::Repeat } else { Action::Press },
                    modifiers: keymod,
                }),
                Event::KeyUp {
                    keycode,
                    scancode,
                    keymod,
                    ..
                } => Some(InputEvent::Key {
                    key: keycode,
                    scancode,
                    action: Action::Release,
                    modifiers: keymod,
                }),
                Event::MouseButtonDown { mouse_btn, .. } => Some(InputEvent::MouseButton {
                    button: mouse_btn,
                    action: Action::Press,
                    modifiers,
                }),
                Event::MouseButtonUp { mouse_btn, .. } => Some(InputEvent::MouseButton {
                    button: mouse_btn,
                    action: Action::Release,
                    modifiers,
                }),
                Event::MouseMotion { x, y, .. } => Some(InputEvent::CursorMoved {
                    x: x as f64,
                    y: y as f64,
                }),
                _ => None,
            })
            .collect()
    }

    fn drain_errors(&mut self) -> Vec<DeviceError> {
        let mut errors = Vec::new();
        while errors.len() < MAX_DEVICE_ERRORS {
            let code = unsafe { self.gl.get_error() };
            if code == glow::NO_ERROR {
                break;
            }
            errors.push(DeviceError { code });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    struct ScriptedSurface {
        size: (u32, u32),
        calls: Vec<&'static str>,
        events: VecDeque<Vec<InputEvent>>,
        errors: Vec<DeviceError>,
    }

    impl Surface for ScriptedSurface {
        fn framebuffer_size(&self) -> (u32, u32) {
            self.size
        }

        fn set_viewport(&mut self, _width: u32, _height: u32) {
            self.calls.push("viewport");
        }

        fn clear(&mut self, _color: [f32; 4]) {
            self.calls.push("clear");
        }

        fn present(&mut self) {
            self.calls.push("present");
        }

        fn poll_events(&mut self) -> Vec<InputEvent> {
            self.calls.push("poll");
            self.events.pop_front().unwrap_or_default()
        }

        fn drain_errors(&mut self) -> Vec<DeviceError> {
            std::mem::take(&mut self.errors)
        }
    }

    #[derive(Default)]
    struct Counter {
        draws: u32,
        close_on: u32,
    }

    fn counting_draw(app: &mut App<ScriptedSurface, Counter>, counter: &mut Counter) {
        counter.draws += 1;
        if counter.draws == counter.close_on {
            app.close();
            app.close();
        }
    }

    fn app(surface: ScriptedSurface) -> App<ScriptedSurface, Counter> {
        App::new(surface, "test", [0.1, 0.1, 0.1, 1.0], Callbacks::simple(counting_draw))
    }

    fn key(keycode: Keycode, action: Action) -> InputEvent {
        InputEvent::Key {
            key: Some(keycode),
            scancode: None,
            action,
            modifiers: Mod::NOMOD,
        }
    }

    #[test]
    fn close_finishes_the_current_frame() {
        let mut app = app(ScriptedSurface {
            size: (640, 480),
            ..Default::default()
        });
        let counter = app.start(Counter {
            draws: 0,
            close_on: 2,
        });

        assert_eq!(counter.draws, 2);
        assert_eq!(app.frame(), 2);
        let frame = ["viewport", "clear", "present", "poll"];
        assert_eq!(app.surface().calls, [frame, frame].concat());
    }

    #[test]
    fn close_is_idempotent() {
        let mut app = app(ScriptedSurface::default());
        app.close();
        app.close();
        assert!(app.is_closing());
        let counter = app.start(Counter::default());
        assert_eq!(counter.draws, 0);
        assert_eq!(app.frame(), 0);
    }

    #[test]
    fn escape_press_closes() {
        let mut app = app(ScriptedSurface {
            size: (800, 600),
            events: VecDeque::from([
                vec![key(Keycode::A, Action::Press), key(Keycode::Escape, Action::Release)],
                vec![InputEvent::CursorMoved { x: 3.0, y: 4.0 }, key(Keycode::Escape, Action::Press)],
            ]),
            ..Default::default()
        });
        let counter = app.start(Counter::default());
        assert_eq!(counter.draws, 2);
    }

    #[test]
    fn quit_event_closes() {
        let mut app = app(ScriptedSurface {
            events: VecDeque::from([vec![InputEvent::Quit]]),
            ..Default::default()
        });
        assert_eq!(app.start(Counter::default()).draws, 1);
    }

    #[test]
    fn viewport_tracks_framebuffer() {
        let mut app = app(ScriptedSurface {
            size: (1280, 720),
            ..Default::default()
        });
        app.start(Counter {
            draws: 0,
            close_on: 1,
        });
        let viewport = app.viewport();
        assert_eq!((viewport.width, viewport.height), (1280, 720));
        assert!((app.ratio() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        assert_eq!(Viewport::new(300, 0).ratio, 300.0);
    }

    #[test]
    fn device_errors_are_drained() {
        let mut app = app(ScriptedSurface {
            errors: vec![DeviceError {
                code: glow::INVALID_ENUM,
            }],
            ..Default::default()
        });
        app.start(Counter {
            draws: 0,
            close_on: 1,
        });
        assert!(app.surface().errors.is_empty());
        assert_eq!(
            DeviceError {
                code: glow::INVALID_OPERATION
            }
            .to_string(),
            "0x0502: invalid operation"
        );
    }
}
