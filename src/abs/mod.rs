//! This module contains the core components for the cube renderer,
//! including application setup, shader management, mesh handling and textures.

pub mod app;
pub mod bind;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vertex;

pub use app::*;
pub use bind::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
pub use vertex::*;
