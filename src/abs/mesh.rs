//! Mesh management module.
//!
//! This module defines the [`Mesh`] struct for managing mesh data on the GPU side.
//! CPU-side data lives in [`Geometry`], placement in [`Transform`]. Draw calls are
//! issued through a bound mesh, see [`Bound<Mesh>`](Bound).

use std::{rc::Rc, sync::Arc};

use glam::{Mat4, Quat, Vec3};
use glow::HasContext;

use super::{Bindable, Bound, ShaderProgram, Vertex};
use crate::{Error, Result};

/// `GL_QUADS`, only available on compatibility contexts.
const QUADS: u32 = 0x0007;

/// Primitive assembly mode for a draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    Triangles,
    Quads,
}

impl Primitive {
    /// Returns the GL enum for this mode.
    pub fn gl_mode(self) -> u32 {
        match self {
            Primitive::Points => glow::POINTS,
            Primitive::Lines => glow::LINES,
            Primitive::LineLoop => glow::LINE_LOOP,
            Primitive::Triangles => glow::TRIANGLES,
            Primitive::Quads => QUADS,
        }
    }

    /// Number of elements one primitive consumes. Loops take any count.
    fn elements_per_primitive(self) -> usize {
        match self {
            Primitive::Points | Primitive::LineLoop => 1,
            Primitive::Lines => 2,
            Primitive::Triangles => 3,
            Primitive::Quads => 4,
        }
    }

    fn check(self, count: usize) -> Result<()> {
        if count % self.elements_per_primitive() != 0 {
            return Err(Error::PrimitiveCount { mode: self, count });
        }
        Ok(())
    }
}

fn allocation(what: &'static str) -> impl Fn(String) -> Error {
    move |reason| Error::Allocation { what, reason }
}

/// What a draw call submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mode: Primitive,
    pub count: usize,
    pub indexed: bool,
}

/// Vertex and index arrays. Every index is checked against the vertex count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Geometry {
    /// Fails if any index points past the end of `vertices`.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertices.len())
        {
            return Err(Error::IndexOutOfRange {
                index,
                position,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Returns the vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertices for in-place edits. The length is fixed so indices stay valid.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Returns the indices.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Describes a non-indexed draw over every vertex.
    pub fn array_draw(&self, mode: Primitive) -> Result<DrawCall> {
        mode.check(self.vertex_count())?;
        Ok(DrawCall {
            mode,
            count: self.vertex_count(),
            indexed: false,
        })
    }

    /// Describes an indexed draw over every index.
    pub fn element_draw(&self, mode: Primitive) -> Result<DrawCall> {
        mode.check(self.index_count())?;
        Ok(DrawCall {
            mode,
            count: self.index_count(),
            indexed: true,
        })
    }
}

/// Position, rotation and uniform scale of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Model matrix: scale first, then rotate, then translate.
    pub fn model(&self) -> Mat4 {
        let scale = Mat4::from_scale(Vec3::splat(self.scale));
        let rotate = Mat4::from_quat(self.rotation);
        let translate = Mat4::from_translation(self.position);

        translate * rotate * scale
    }
}

/// Represents a mesh stored on the GPU side.
pub struct Mesh {
    gl: Arc<glow::Context>,
    shader: Rc<ShaderProgram>,
    geometry: Geometry,
    pub transform: Transform,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
}

impl Mesh {
    /// Uploads `geometry` and binds its attributes against `shader`'s inputs.
    pub fn new(gl: &Arc<glow::Context>, shader: &Rc<ShaderProgram>, geometry: Geometry) -> Result<Self> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(allocation("vertex array"))?;
            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(reason) => {
                    gl.delete_vertex_array(vao);
                    return Err(allocation("vertex buffer")(reason));
                }
            };
            let ebo = match gl.create_buffer() {
                Ok(ebo) => ebo,
                Err(reason) => {
                    gl.delete_buffer(vbo);
                    gl.delete_vertex_array(vao);
                    return Err(allocation("index buffer")(reason));
                }
            };

            let mesh = Self {
                gl: Arc::clone(gl),
                shader: Rc::clone(shader),
                geometry,
                transform: Transform::default(),
                vao,
                vbo,
                ebo,
            };
            mesh.buffer()?;

            log::debug!(
                "mesh uploaded: {} vertices, {} indices",
                mesh.vertex_count(),
                mesh.index_count()
            );
            Ok(mesh)
        }
    }

    /// Fills both buffers and records the attribute layout in the vertex array.
    fn buffer(&self) -> Result<()> {
        let _vao = self.bind();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(self.geometry.vertices()),
                glow::DYNAMIC_DRAW,
            );

            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ebo));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(self.geometry.indices()),
                glow::STATIC_DRAW,
            );

            let result = self.enable_vertex_attributes();

            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            result
        }
    }

    fn enable_vertex_attributes(&self) -> Result<()> {
        for attribute in Vertex::ATTRIBUTES {
            let location = self
                .shader
                .attribute_location(attribute.name)
                .ok_or(Error::MissingAttribute(attribute.name))?;
            unsafe {
                self.gl.enable_vertex_attrib_array(location);
                self.gl.vertex_attrib_pointer_f32(
                    location,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    Vertex::SIZE as i32,
                    attribute.offset as i32,
                );
            }
        }
        Ok(())
    }

    /// Replaces vertices and indices and re-allocates both buffers.
    pub fn set_geometry(&mut self, geometry: Geometry) -> Result<()> {
        self.geometry = geometry;
        self.buffer()
    }

    /// Re-uploads the vertex buffer in place after edits through [`Mesh::vertices_mut`].
    pub fn sub_buffer(&self) {
        let _vao = self.bind();
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
            self.gl.buffer_sub_data_u8_slice(
                glow::ARRAY_BUFFER,
                0,
                bytemuck::cast_slice(self.geometry.vertices()),
            );
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
        }
    }

    /// Returns the CPU copy of the uploaded geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// CPU vertices. Call [`Mesh::sub_buffer`] afterwards or the GPU copy goes stale.
    pub fn vertices_mut(&mut self) -> &mut [Vertex] {
        self.geometry.vertices_mut()
    }

    /// Returns the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.geometry.vertex_count()
    }

    /// Returns the number of indices in the mesh.
    pub fn index_count(&self) -> usize {
        self.geometry.index_count()
    }

    /// Returns the program the attributes were bound against.
    pub fn shader(&self) -> &Rc<ShaderProgram> {
        &self.shader
    }

    /// Returns the model matrix of the current transform.
    pub fn model(&self) -> Mat4 {
        self.transform.model()
    }
}

impl Bindable for Mesh {
    fn bind_raw(&self) {
        unsafe {
            self.gl.bind_vertex_array(Some(self.vao));
        }
    }

    fn unbind_raw(&self) {
        unsafe {
            self.gl.bind_vertex_array(None);
        }
    }
}

impl Bound<'_, Mesh> {
    /// Draws every vertex in order. The shader must be bound.
    pub fn draw_arrays(&self, mode: Primitive) -> Result<DrawCall> {
        let call = self.geometry.array_draw(mode)?;
        unsafe {
            self.gl.draw_arrays(mode.gl_mode(), 0, call.count as i32);
        }
        Ok(call)
    }

    /// Draws every index. The shader must be bound.
    pub fn draw_elements(&self, mode: Primitive) -> Result<DrawCall> {
        let call = self.geometry.element_draw(mode)?;
        unsafe {
            self.gl
                .draw_elements(mode.gl_mode(), call.count as i32, glow::UNSIGNED_INT, 0);
        }
        Ok(call)
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ebo);
            self.gl.delete_vertex_array(self.vao);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec4, vec3};

    use super::*;

    fn vertices(n: usize) -> Vec<Vertex> {
        (0..n)
            .map(|i| Vertex::new(Vec3::splat(i as f32), Vec4::ONE, Vec3::Y, glam::Vec2::ZERO))
            .collect()
    }

    #[test]
    fn counts_round_trip() {
        let geometry = Geometry::new(vertices(6), vec![0, 1, 2, 3, 2, 1, 4, 5]).unwrap();
        assert_eq!(geometry.vertex_count(), 6);
        assert_eq!(geometry.index_count(), 8);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = Geometry::new(vertices(3), vec![0, 1, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                index: 3,
                position: 2,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn element_draw_requires_whole_primitives() {
        let geometry = Geometry::new(vertices(4), vec![0, 1, 2, 3, 0, 1]).unwrap();
        assert!(geometry.element_draw(Primitive::Triangles).is_ok());
        assert!(matches!(
            geometry.element_draw(Primitive::Quads),
            Err(Error::PrimitiveCount {
                mode: Primitive::Quads,
                count: 6
            })
        ));
        assert_eq!(geometry.array_draw(Primitive::Quads).unwrap().count, 4);
    }

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(Transform::default().model(), Mat4::IDENTITY);
    }

    #[test]
    fn model_scales_then_rotates_then_translates() {
        let transform = Transform {
            position: vec3(10.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: 2.0,
        };
        let point = transform.model().transform_point3(Vec3::X);
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        assert!(point.abs_diff_eq(vec3(10.0, 2.0, 0.0), 1e-5));

        let composed = Mat4::from_translation(transform.position)
            * (Mat4::from_quat(transform.rotation) * Mat4::from_scale(Vec3::splat(2.0)));
        assert!(transform.model().abs_diff_eq(composed, 1e-6));
    }

    #[test]
    fn vertices_mut_keeps_length() {
        let mut geometry = Geometry::new(vertices(2), vec![0, 1]).unwrap();
        geometry.vertices_mut()[1].color = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(geometry.vertex_count(), 2);
        assert_eq!(geometry.vertices()[1].color, [0.0, 0.0, 0.0, 1.0]);
    }
}
