//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture,
//! optionally keeping the RGBA image it was filled from so it can be re-uploaded.

use std::{path::Path, sync::Arc};

use glow::HasContext;
use image::RgbaImage;
use serde::Deserialize;

use super::{Bindable, Bound};
use crate::{Error, Result};

/// Minification and magnification filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

impl TextureFilter {
    fn gl_filter(self) -> i32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST as i32,
            TextureFilter::Linear => glow::LINEAR as i32,
        }
    }
}

/// Checks that an upload of `actual` size fits a texture declared as `expected`.
pub fn check_upload_size(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(Error::TextureSize {
            expected_width: expected.0,
            expected_height: expected.1,
            width: actual.0,
            height: actual.1,
        });
    }
    Ok(())
}

/// Checks that `len` bytes hold exactly `width * height` RGBA8 pixels.
pub fn check_data_len(width: u32, height: u32, len: usize) -> Result<()> {
    let expected = width as usize * height as usize * 4;
    if len != expected {
        return Err(Error::TextureData { expected, actual: len });
    }
    Ok(())
}

/// Represents a texture stored on the GPU side, sampled through texture unit 0.
pub struct Texture {
    gl: Arc<glow::Context>,
    id: glow::Texture,
    width: u32,
    height: u32,
    image: Option<RgbaImage>,
}

impl Texture {
    /// Allocates a texture with undefined contents, to be filled by [`Texture::update_with`].
    pub fn empty(gl: &Arc<glow::Context>, width: u32, height: u32, filter: TextureFilter) -> Result<Self> {
        let texture = Self::allocate(gl, width, height, filter, None)?;
        log::debug!("allocated empty {width}x{height} texture");
        Ok(texture)
    }

    /// Decodes an image file and uploads it.
    pub fn from_file(gl: &Arc<glow::Context>, path: impl AsRef<Path>, filter: TextureFilter) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| Error::Image {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let mut texture = Self::allocate(gl, width, height, filter, Some(image.as_raw().as_slice()))?;
        texture.image = Some(image);
        log::info!("loaded {width}x{height} texture from {}", path.display());
        Ok(texture)
    }

    /// Uploads raw RGBA8 bytes without decoding.
    pub fn from_bytes(
        gl: &Arc<glow::Context>,
        width: u32,
        height: u32,
        data: &[u8],
        filter: TextureFilter,
    ) -> Result<Self> {
        check_data_len(width, height, data.len())?;
        Self::allocate(gl, width, height, filter, Some(data))
    }

    fn allocate(
        gl: &Arc<glow::Context>,
        width: u32,
        height: u32,
        filter: TextureFilter,
        data: Option<&[u8]>,
    ) -> Result<Self> {
        unsafe {
            let id = gl.create_texture().map_err(|reason| Error::Allocation {
                what: "texture",
                reason,
            })?;
            let texture = Self {
                gl: Arc::clone(gl),
                id,
                width,
                height,
                image: None,
            };

            let bound = texture.bind();
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(data),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, filter.gl_filter());
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, filter.gl_filter());
            if data.is_some() {
                gl.generate_mipmap(glow::TEXTURE_2D);
            }
            drop(bound);

            Ok(texture)
        }
    }

    /// Re-uploads the stored image, leaving the texture unbound.
    ///
    /// Takes `&mut self` so it cannot run while a bind guard is alive:
    ///
    /// ```compile_fail
    /// use voxel::abs::{Bindable, Texture};
    ///
    /// fn refresh(texture: &mut Texture) -> voxel::Result<()> {
    ///     let _bound = texture.bind();
    ///     texture.update()
    /// }
    /// ```
    pub fn update(&mut self) -> Result<()> {
        let image = self.image.as_ref().ok_or(Error::MissingImage)?;
        self.bind().upload(image)
    }

    /// Replaces the stored image and uploads it. The size must match the texture.
    pub fn update_with(&mut self, image: RgbaImage) -> Result<()> {
        self.bind().upload(&image)?;
        self.image = Some(image);
        Ok(())
    }

    /// Returns the width of the texture.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the image the texture was last filled from, if it was kept.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }
}

impl Bindable for Texture {
    fn bind_raw(&self) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, Some(self.id));
        }
    }

    fn unbind_raw(&self) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }
}

impl Bound<'_, Texture> {
    /// Uploads `image` over the whole texture and regenerates mipmaps.
    pub fn upload(&self, image: &RgbaImage) -> Result<()> {
        check_upload_size((self.width, self.height), image.dimensions())?;
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                self.width as i32,
                self.height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.as_raw().as_slice())),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
        }
        Ok(())
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_size_is_accepted() {
        let image = RgbaImage::new(24, 24);
        assert!(check_upload_size((24, 24), image.dimensions()).is_ok());
    }

    #[test]
    fn mismatched_size_is_rejected() {
        let err = check_upload_size((24, 24), (32, 24)).unwrap_err();
        assert!(matches!(
            err,
            Error::TextureSize {
                expected_width: 24,
                width: 32,
                ..
            }
        ));
    }

    #[test]
    fn exact_data_length_is_accepted() {
        assert!(check_data_len(24, 24, 24 * 24 * 4).is_ok());
        assert!(check_data_len(0, 0, 0).is_ok());
    }

    #[test]
    fn off_by_one_data_length_is_rejected() {
        for len in [24 * 24 * 4 - 1, 24 * 24 * 4 + 1] {
            let err = check_data_len(24, 24, len).unwrap_err();
            assert!(matches!(
                err,
                Error::TextureData {
                    expected: 2304,
                    actual,
                } if actual == len
            ));
        }
    }

    #[test]
    fn filter_parses_lowercase() {
        let filter: TextureFilter = serde_json::from_str("\"linear\"").unwrap();
        assert_eq!(filter, TextureFilter::Linear);
        assert_eq!(TextureFilter::default().gl_filter(), glow::NEAREST as i32);
    }
}
