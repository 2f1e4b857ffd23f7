//! Crate-wide error type.
//!
//! Every fallible construction or load operation returns [`Result`]. The
//! binary decides what to do with a failure; by default it logs and exits.

use std::path::PathBuf;

use crate::abs::Primitive;

/// Errors raised while setting up or driving the renderer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to initialize SDL: {0}")]
    Platform(String),

    #[error("failed to create window: {0}")]
    Window(String),

    #[error("failed to create OpenGL context: {0}")]
    Context(String),

    #[error("failed to allocate {what}: {reason}")]
    Allocation { what: &'static str, reason: String },

    #[error("shader compilation failed:\n{0}")]
    ShaderCompile(String),

    #[error("shader program link failed:\n{0}")]
    ShaderLink(String),

    #[error("vertex attribute `{0}` is not an active input of the shader program")]
    MissingAttribute(&'static str),

    #[error("layout check failed: {0}")]
    Layout(String),

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    #[error("{count} elements do not form whole {mode:?} primitives")]
    PrimitiveCount { mode: Primitive, count: usize },

    #[error("texture is {expected_width}x{expected_height} but image is {width}x{height}")]
    TextureSize {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("texture data is {actual} bytes, expected {expected}")]
    TextureData { expected: usize, actual: usize },

    #[error("texture has no image data to upload")]
    MissingImage,

    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
