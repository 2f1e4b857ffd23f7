//! The demo scene: a grid of lit, textured cubes each spinning about +Y.

use std::{f32::consts::PI, rc::Rc, sync::Arc};

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::{
    Result,
    abs::{App, Bindable, Mesh, Primitive, ShaderProgram, Surface, Texture, Transform, UniformSlot},
    config::{Config, MAX_GRID},
    cube::Cube,
};

const VERTEX_SHADER: &str = include_str!("shaders/cube/vert.glsl");
const FRAGMENT_SHADER: &str = include_str!("shaders/cube/frag.glsl");

/// Time added per frame.
const TIME_STEP: f32 = 0.01;
const EYE: Vec3 = Vec3::new(0.0, 0.0, 5.0);
const FIELD_OF_VIEW: f32 = PI / 3.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;
/// Width of the area the tiled cubes are spread over, in world units.
const GRID_EXTENT: f32 = 4.0;

/// Per-frame camera matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub ortho: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Camera {
    /// Builds the camera for a framebuffer of the given width over height.
    pub fn new(ratio: f32) -> Self {
        Self {
            ortho: Mat4::orthographic_rh_gl(-ratio, ratio, -1.0, 1.0, -1.0, 1.0),
            view: Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh_gl(FIELD_OF_VIEW, ratio, NEAR, FAR),
        }
    }
}

/// Transforms normals the same way `view * model` transforms positions.
pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat3 {
    Mat3::from_mat4(view * model).inverse().transpose()
}

/// Lays out `grid * grid` cubes centred on the origin, each turned by `time`
/// plus a phase that depends on its tile. `grid` is clamped to `1..=MAX_GRID`.
pub fn tiles(grid: u32, time: f32) -> impl Iterator<Item = Transform> {
    let grid = grid.clamp(1, MAX_GRID) as usize;
    let (spacing, scale) = if grid == 1 {
        (0.0, 1.0)
    } else {
        let spacing = GRID_EXTENT / (grid - 1) as f32;
        // the unit cube spans two units; leave half a cube of space between tiles
        (spacing, spacing / 3.0)
    };
    let half = spacing * (grid - 1) as f32 / 2.0;

    (0..grid * grid).map(move |index| {
        let (row, column) = (index / grid, index % grid);
        let phase = index as f32 * 0.25;
        Transform {
            position: Vec3::new(column as f32 * spacing - half, row as f32 * spacing - half, 0.0),
            rotation: Quat::from_rotation_y(time + phase),
            scale,
        }
    })
}

/// Everything the draw callback needs, created once before the loop starts.
pub struct Scene {
    shader: Rc<ShaderProgram>,
    mesh: Mesh,
    texture: Texture,
    grid: u32,
    time: f32,
}

impl Scene {
    /// Compiles the program, uploads the cube and loads the configured texture.
    pub fn new(gl: &Arc<glow::Context>, config: &Config) -> Result<Self> {
        let shader = Rc::new(ShaderProgram::new(gl, VERTEX_SHADER, FRAGMENT_SHADER)?);
        {
            let bound = shader.bind();
            bound.set_by_name("tex", 0_i32);
        }

        let geometry = match config.base_color {
            Some(color) => Cube::new(Vec4::from_array(color))?,
            None => Cube::colored()?,
        };
        let mesh = Mesh::new(gl, &shader, geometry)?;
        let texture = Texture::from_file(gl, &config.texture_path, config.filter)?;

        log::info!("scene ready: {0}x{0} cubes", config.grid);
        Ok(Self {
            shader,
            mesh,
            texture,
            grid: config.grid,
            time: 0.0,
        })
    }

    /// Returns the accumulated animation time.
    pub fn time(&self) -> f32 {
        self.time
    }

    fn render(&mut self, ratio: f32) -> Result<()> {
        self.time += TIME_STEP;

        let camera = Camera::new(ratio);
        let shader = self.shader.bind();
        shader.set(UniformSlot::Ortho, camera.ortho);
        shader.set(UniformSlot::View, camera.view);
        shader.set(UniformSlot::Projection, camera.projection);

        let _texture = self.texture.bind();
        for transform in tiles(self.grid, self.time) {
            self.mesh.transform = transform;
            let model = self.mesh.model();
            shader.set(UniformSlot::Model, model);
            shader.set(UniformSlot::NormalMatrix, normal_matrix(camera.view, model));

            self.mesh.bind().draw_elements(Primitive::Quads)?;
        }
        Ok(())
    }
}

/// Draw callback for [`App::start`].
pub fn draw<H: Surface>(app: &mut App<H, Scene>, scene: &mut Scene) {
    if let Err(e) = scene.render(app.ratio()) {
        log::error!("frame {} failed: {e}", app.frame());
        app.close();
    }
}
