//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders.
//! A program resolves the fixed set of matrix uniforms in [`UniformSlot`] once when it is
//! linked. The [`Uniform`] trait uploads values to a resolved location.

use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3};
use glow::HasContext;

use super::{Bindable, Bound};
use crate::{Error, Result};

/// Represents an individual OpenGL shader stage.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: glow::Shader,
}

impl Shader {
    /// Compiles a new shader from the given source code.
    pub fn new(gl: &Arc<glow::Context>, shader_type: u32, source: &str) -> Result<Self> {
        unsafe {
            let shader = gl.create_shader(shader_type).map_err(|reason| Error::Allocation {
                what: "shader",
                reason,
            })?;
            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                return Err(Error::ShaderCompile(log));
            }

            Ok(Self {
                gl: Arc::clone(gl),
                id: shader,
            })
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_shader(self.id);
        }
    }
}

/// The matrix uniforms every program is expected to declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    Ortho,
    Model,
    View,
    Projection,
    NormalMatrix,
}

impl UniformSlot {
    pub const ALL: [UniformSlot; 5] = [
        UniformSlot::Ortho,
        UniformSlot::Model,
        UniformSlot::View,
        UniformSlot::Projection,
        UniformSlot::NormalMatrix,
    ];

    /// The uniform's name in GLSL source.
    pub fn name(self) -> &'static str {
        match self {
            UniformSlot::Ortho => "ortho",
            UniformSlot::Model => "model",
            UniformSlot::View => "view",
            UniformSlot::Projection => "projection",
            UniformSlot::NormalMatrix => "normalMatrix",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A value that can be written to a uniform location.
pub trait Uniform {
    /// Uploads the value to `location` of the currently bound program.
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for i32 {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self) }
    }
}

impl Uniform for f32 {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_f32(Some(location), *self) }
    }
}

impl Uniform for Vec3 {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_3_f32(Some(location), self.x, self.y, self.z) }
    }
}

impl Uniform for Mat3 {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_3_f32_slice(Some(location), false, &self.to_cols_array()) }
    }
}

impl Uniform for Mat4 {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_4_f32_slice(Some(location), false, &self.to_cols_array()) }
    }
}

impl<T: Uniform> Uniform for &T {
    fn upload(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        (*self).upload(gl, location);
    }
}

/// Represents a linked vertex + fragment program and its resolved matrix uniforms.
pub struct ShaderProgram {
    gl: Arc<glow::Context>,
    id: glow::Program,
    locations: [Option<glow::UniformLocation>; 5],
}

impl ShaderProgram {
    /// Compiles both stages, links them and resolves the [`UniformSlot`] locations.
    pub fn new(gl: &Arc<glow::Context>, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let vertex = Shader::new(gl, glow::VERTEX_SHADER, vertex_source)?;
        let fragment = Shader::new(gl, glow::FRAGMENT_SHADER, fragment_source)?;
        let shaders = [&vertex, &fragment];

        unsafe {
            let program = gl.create_program().map_err(|reason| Error::Allocation {
                what: "shader program",
                reason,
            })?;

            for shader in shaders {
                gl.attach_shader(program, shader.id);
            }

            gl.link_program(program);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(Error::ShaderLink(log));
            }

            for shader in shaders {
                gl.detach_shader(program, shader.id);
            }

            let locations = UniformSlot::ALL.map(|slot| {
                let location = gl.get_uniform_location(program, slot.name());
                if location.is_none() {
                    log::debug!("uniform `{}` is not active in program", slot.name());
                }
                location
            });

            Ok(Self {
                gl: Arc::clone(gl),
                id: program,
                locations,
            })
        }
    }

    /// Looks up the location of a vertex input by name.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        unsafe { self.gl.get_attrib_location(self.id, name) }
    }

    /// Whether the driver kept the given matrix uniform.
    pub fn has_uniform(&self, slot: UniformSlot) -> bool {
        self.locations[slot.index()].is_some()
    }
}

impl Bindable for ShaderProgram {
    fn bind_raw(&self) {
        unsafe {
            self.gl.use_program(Some(self.id));
        }
    }

    fn unbind_raw(&self) {
        unsafe {
            self.gl.use_program(None);
        }
    }
}

impl Bound<'_, ShaderProgram> {
    /// Writes one of the fixed matrix uniforms. Inactive uniforms are skipped.
    pub fn set<T: Uniform>(&self, slot: UniformSlot, value: T) {
        if let Some(location) = &self.locations[slot.index()] {
            value.upload(&self.gl, location);
        }
    }

    /// Writes a uniform that is not one of the fixed slots, resolving it by name.
    pub fn set_by_name<T: Uniform>(&self, name: &str, value: T) {
        let location = unsafe { self.gl.get_uniform_location(self.id, name) };
        if let Some(location) = &location {
            value.upload(&self.gl, location);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_program(self.id);
        }
    }
}
