//! A lit, textured, spinning cube rendered with OpenGL through `glow` on an SDL2 window.
//!
//! [`abs`] wraps the device objects (program, mesh, texture) and the frame loop,
//! [`scene`] holds the per-frame orchestration.

pub mod abs;
pub mod config;
pub mod cube;
pub mod error;
pub mod logging;
pub mod scene;

pub use error::{Error, Result};
