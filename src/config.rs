//! Demo settings.
//!
//! Everything has a compiled-in default. An optional `voxel.json` next to the
//! working directory may override any subset of the fields.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, de::Error as _};

use crate::{Error, Result, abs::TextureFilter};

pub const CONFIG_PATH: &str = "voxel.json";

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
pub const TITLE: &str = "Voxel";
pub const TEXTURE_PATH: &str = "assets/texture.png";
pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.1, 1.0];
pub const GRID: u32 = 5;
/// Largest accepted `grid`. Larger layouts shrink each cube below a pixel anyway.
pub const MAX_GRID: u32 = 64;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
    pub texture_path: PathBuf,
    pub filter: TextureFilter,
    /// Cubes per side of the tiled layout.
    pub grid: u32,
    pub clear_color: [f32; 4],
    /// Single color for every corner instead of the per-corner palette.
    pub base_color: Option<[f32; 4]>,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            title: TITLE.to_string(),
            vsync: true,
            texture_path: PathBuf::from(TEXTURE_PATH),
            filter: TextureFilter::Nearest,
            grid: GRID,
            clear_color: CLEAR_COLOR,
            base_color: None,
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(Error::ConfigIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse(&contents).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(contents: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(contents)?;
        if config.grid > MAX_GRID {
            return Err(serde_json::Error::custom(format_args!(
                "grid {} exceeds the maximum of {MAX_GRID}",
                config.grid
            )));
        }
        config.grid = config.grid.max(1);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(Config::parse("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::parse(
            r#"{ "width": 1024, "filter": "linear", "base_color": [1, 0, 0, 1], "log_level": "debug" }"#,
        )
        .unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, HEIGHT);
        assert_eq!(config.filter, TextureFilter::Linear);
        assert_eq!(config.base_color, Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn grid_is_at_least_one() {
        assert_eq!(Config::parse(r#"{ "grid": 0 }"#).unwrap().grid, 1);
    }

    #[test]
    fn grid_upper_bound() {
        let largest = format!(r#"{{ "grid": {MAX_GRID} }}"#);
        assert_eq!(Config::parse(&largest).unwrap().grid, MAX_GRID);

        let err = Config::parse(r#"{ "grid": 70000 }"#).unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn oversized_grid_file_is_a_config_error() {
        let path = std::env::temp_dir().join(format!("voxel-grid-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "grid": 70000 }"#).unwrap();
        let result = Config::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse(r#"{ "widht": 10 }"#).is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load("does/not/exist/voxel.json").unwrap();
        assert_eq!(config, Config::default());
    }
}
