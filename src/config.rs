use std::fs;
use std::path::Path;

use serde::Deserialize;
use voxdae_collada::GeometryLayout;
use voxdae_geom::Vec3;
use voxdae_mesh::MeshParams;

use crate::error::ConvertError;

/// Converter settings, loaded from an optional TOML file. Missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    pub input_extension: String,
    pub output_extension: String,
    pub meta_extension: String,
    pub scale: f32,
    pub origin: [f32; 3],
    pub layout: GeometryLayout,
    /// Worker threads for directory inputs; 0 or 1 converts sequentially.
    pub jobs: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input_extension: "vxi".to_string(),
            output_extension: "dae".to_string(),
            meta_extension: "bytes".to_string(),
            scale: 1.0,
            origin: [0.0; 3],
            layout: GeometryLayout::Merged,
            jobs: 1,
        }
    }
}

impl ConvertConfig {
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path).map_err(|e| ConvertError::read(path, e))?;
        let cfg = toml::from_str(&text).map_err(|source| ConvertError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Rejects settings that would produce inside-out or non-finite geometry.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConvertError::InvalidScale(self.scale));
        }
        Ok(())
    }

    pub fn mesh_params(&self) -> MeshParams {
        MeshParams {
            scale: self.scale,
            origin: Vec3::from_array(self.origin),
        }
    }
}
