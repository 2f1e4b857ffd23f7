//! The interleaved vertex record shared by every mesh.
//!
//! The byte offsets declared here are what [`Mesh`](super::Mesh) hands to
//! `glVertexAttribPointer`, so they must match the in-memory layout exactly.
//! [`Vertex::verify_layout`] checks that once at startup.

use std::mem::{offset_of, size_of};

use glam::{Vec2, Vec3, Vec4};

/// Position, color, normal and texture coordinate, tightly packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub normal: [f32; 3],
    pub texture_coordinate: [f32; 2],
}

/// A float vertex input bound by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub components: i32,
    pub offset: usize,
}

impl Vertex {
    pub const SIZE: usize = size_of::<Self>();
    pub const OFFSET_POSITION: usize = 0;
    pub const OFFSET_COLOR: usize = Self::OFFSET_POSITION + size_of::<[f32; 3]>();
    pub const OFFSET_NORMAL: usize = Self::OFFSET_COLOR + size_of::<[f32; 4]>();
    pub const OFFSET_TEXTURE_COORDINATE: usize = Self::OFFSET_NORMAL + size_of::<[f32; 3]>();

    /// Vertex inputs in record order. The names must match the shader source.
    pub const ATTRIBUTES: [Attribute; 4] = [
        Attribute {
            name: "position",
            components: 3,
            offset: Self::OFFSET_POSITION,
        },
        Attribute {
            name: "color",
            components: 4,
            offset: Self::OFFSET_COLOR,
        },
        Attribute {
            name: "normal",
            components: 3,
            offset: Self::OFFSET_NORMAL,
        },
        Attribute {
            name: "textureCoordinate",
            components: 2,
            offset: Self::OFFSET_TEXTURE_COORDINATE,
        },
    ];

    /// Packs glam vectors into the flat GPU layout.
    pub fn new(position: Vec3, color: Vec4, normal: Vec3, texture_coordinate: Vec2) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            normal: normal.to_array(),
            texture_coordinate: texture_coordinate.to_array(),
        }
    }

    /// Checks the declared offsets against the compiler's layout and the
    /// total record size against twelve GL floats.
    pub fn verify_layout() -> crate::Result<()> {
        let actual = [
            ("position", offset_of!(Vertex, position)),
            ("color", offset_of!(Vertex, color)),
            ("normal", offset_of!(Vertex, normal)),
            ("textureCoordinate", offset_of!(Vertex, texture_coordinate)),
        ];
        for (attribute, (name, offset)) in Self::ATTRIBUTES.iter().zip(actual) {
            if attribute.name != name || attribute.offset != offset {
                return Err(crate::Error::Layout(format!(
                    "`{}` declared at byte {} but laid out at byte {offset}",
                    attribute.name, attribute.offset
                )));
            }
        }

        let last = Self::ATTRIBUTES[Self::ATTRIBUTES.len() - 1];
        let declared = last.offset + last.components as usize * gl_type_size(glow::FLOAT);
        if declared != Self::SIZE || Self::SIZE != 12 * gl_type_size(glow::FLOAT) {
            return Err(crate::Error::Layout(format!(
                "vertex record is {} bytes, attributes describe {declared}",
                Self::SIZE
            )));
        }

        Ok(())
    }
}

/// Size in bytes of a GL scalar type.
pub fn gl_type_size(ty: u32) -> usize {
    match ty {
        glow::BYTE | glow::UNSIGNED_BYTE => 1,
        glow::SHORT | glow::UNSIGNED_SHORT | glow::HALF_FLOAT => 2,
        glow::INT | glow::UNSIGNED_INT | glow::FLOAT => 4,
        glow::DOUBLE => 8,
        _ => 0,
    }
}

/// Checks that the host types used for uploads have the sizes GL expects.
pub fn verify_primitive_sizes() -> crate::Result<()> {
    let checks = [
        ("float", glow::FLOAT, size_of::<f32>()),
        ("unsigned byte", glow::UNSIGNED_BYTE, size_of::<u8>()),
        ("unsigned int", glow::UNSIGNED_INT, size_of::<u32>()),
    ];
    for (name, ty, host) in checks {
        if gl_type_size(ty) != host {
            return Err(crate::Error::Layout(format!(
                "GL {name} is {} bytes but host type is {host}",
                gl_type_size(ty)
            )));
        }
    }
    if size_of::<Vec4>() != 4 * gl_type_size(glow::FLOAT) {
        return Err(crate::Error::Layout("vec4 is not four GL floats".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_declared_offsets() {
        Vertex::verify_layout().unwrap();
        verify_primitive_sizes().unwrap();
    }

    #[test]
    fn offsets_and_sizes_cover_the_record() {
        let mut expected = 0;
        for attribute in Vertex::ATTRIBUTES {
            assert_eq!(attribute.offset, expected, "{}", attribute.name);
            expected += attribute.components as usize * size_of::<f32>();
        }
        assert_eq!(expected, Vertex::SIZE);
        assert_eq!(Vertex::SIZE, 48);
    }

    #[test]
    fn new_packs_fields_in_order() {
        let vertex = Vertex::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec4::new(0.1, 0.2, 0.3, 0.4),
            Vec3::Z,
            Vec2::new(0.5, 0.75),
        );
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&vertex));
        assert_eq!(
            floats,
            [1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 0.4, 0.0, 0.0, 1.0, 0.5, 0.75]
        );
    }
}
