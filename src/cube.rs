//! The unit cube: eight shared corners and six quads.
//!
//! ```text
//!      6-------------5
//!     /.            /|
//!    2-------------1 |
//!    | .           | |
//!    | 7 . . . . . | 4
//!    |             |/
//!    3-------------0
//! ```

use glam::{Vec2, Vec3, Vec4, vec3, vec4};

use crate::{
    Result,
    abs::{Geometry, Vertex},
};

/// Corner positions. Normals point away from the centre along the same diagonal.
const CORNERS: [Vec3; 8] = [
    vec3(1.0, -1.0, 1.0),
    vec3(1.0, 1.0, 1.0),
    vec3(-1.0, 1.0, 1.0),
    vec3(-1.0, -1.0, 1.0),
    vec3(1.0, -1.0, -1.0),
    vec3(1.0, 1.0, -1.0),
    vec3(-1.0, 1.0, -1.0),
    vec3(-1.0, -1.0, -1.0),
];

const TEXTURE_COORDINATES: [Vec2; 8] = [
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
];

const CORNER_COLORS: [Vec4; 8] = [
    vec4(1.0, 1.0, 0.0, 1.0),
    vec4(0.0, 1.0, 0.0, 1.0),
    vec4(1.0, 1.0, 0.0, 1.0),
    vec4(1.0, 0.0, 0.0, 1.0),
    vec4(0.0, 1.0, 0.0, 1.0),
    vec4(0.0, 0.0, 1.0, 1.0),
    vec4(1.0, 0.0, 0.0, 1.0),
    vec4(0.0, 0.0, 1.0, 1.0),
];

#[rustfmt::skip]
const QUADS: [u32; 24] = [
    0, 1, 2, 3, // front
    7, 6, 5, 4, // back
    3, 2, 6, 7, // left
    4, 5, 1, 0, // right
    1, 5, 6, 2, // top
    4, 0, 3, 7, // bottom
];

pub struct Cube;

impl Cube {
    /// A cube with every corner in `base_color`.
    pub fn new(base_color: Vec4) -> Result<Geometry> {
        Self::build(|_| base_color)
    }

    /// A cube with a distinct color per corner.
    pub fn colored() -> Result<Geometry> {
        Self::build(|i| CORNER_COLORS[i])
    }

    fn build(color: impl Fn(usize) -> Vec4) -> Result<Geometry> {
        let vertices = (0..CORNERS.len())
            .map(|i| Vertex::new(CORNERS[i], color(i), CORNERS[i], TEXTURE_COORDINATES[i]))
            .collect();
        Geometry::new(vertices, QUADS.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::Primitive;

    #[test]
    fn cube_is_eight_corners_and_six_quads() {
        let cube = Cube::colored().unwrap();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.index_count(), 24);
        assert_eq!(cube.index_count() / 4, 6);
    }

    #[test]
    fn indexed_draw_covers_every_index_in_range() {
        let cube = Cube::new(Vec4::ONE).unwrap();
        let call = cube.element_draw(Primitive::Quads).unwrap();
        assert_eq!(call.count, 24);
        assert!(call.indexed);
        assert!(cube.indices().iter().all(|&i| i < 8));

        let mut seen = [0; 8];
        for &i in cube.indices() {
            seen[i as usize] += 1;
        }
        // every corner is shared by three faces
        assert_eq!(seen, [3; 8]);
    }

    #[test]
    fn base_color_applies_to_every_corner() {
        let red = vec4(1.0, 0.0, 0.0, 1.0);
        let cube = Cube::new(red).unwrap();
        assert!(cube.vertices().iter().all(|v| v.color == red.to_array()));
    }

    #[test]
    fn faces_wind_consistently() {
        let cube = Cube::colored().unwrap();
        for face in cube.indices().chunks(4) {
            let [a, b, c, _] = [0, 1, 2, 3].map(|k| Vec3::from(cube.vertices()[face[k] as usize].position));
            let normal = (b - a).cross(c - a);
            let centre = face
                .iter()
                .map(|&i| Vec3::from(cube.vertices()[i as usize].position))
                .sum::<Vec3>()
                / 4.0;
            // counter-clockwise seen from outside
            assert!(normal.dot(centre) > 0.0, "face {face:?}");
        }
    }
}
