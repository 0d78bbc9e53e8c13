//! Run configuration shared by every stage.

use serde::{Deserialize, Serialize};

use crate::wrap::WrapMode;

/// Where UV coordinate `v = 0` sits in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvOrigin {
    /// `v = 0` is the bottom row (COLLADA, OpenGL).
    #[default]
    BottomLeft,
    /// `v = 0` is the top row (glTF).
    TopLeft,
}

/// Knobs for one fixup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixupConfig {
    /// Wrap mode assumed when a usage carries no wrap data.
    pub base_wrap: WrapMode,
    /// Multiplier applied by scale normalization.
    pub scale_factor: f64,
    /// V origin of texture coordinates in the source document.
    pub uv_origin: UvOrigin,
    /// Suffix appended to the image stem when naming condensed atlases.
    pub atlas_suffix: String,
}

impl FixupConfig {
    /// Default scale normalization factor.
    pub const DEFAULT_SCALE_FACTOR: f64 = 100.0;

    /// Default atlas file name suffix.
    pub const DEFAULT_ATLAS_SUFFIX: &'static str = "_condensed";

    /// Sets the base wrap mode.
    pub fn with_base_wrap(mut self, base_wrap: WrapMode) -> Self {
        self.base_wrap = base_wrap;
        self
    }

    /// Sets the scale normalization factor.
    pub fn with_scale_factor(mut self, factor: f64) -> Self {
        self.scale_factor = factor;
        self
    }

    /// Sets the UV origin.
    pub fn with_uv_origin(mut self, origin: UvOrigin) -> Self {
        self.uv_origin = origin;
        self
    }

    /// Atlas file name for an image stem.
    pub fn atlas_file_name(&self, stem: &str) -> String {
        format!("{}{}.png", stem, self.atlas_suffix)
    }
}

impl Default for FixupConfig {
    fn default() -> Self {
        Self {
            base_wrap: WrapMode::Repeat,
            scale_factor: Self::DEFAULT_SCALE_FACTOR,
            uv_origin: UvOrigin::BottomLeft,
            atlas_suffix: Self::DEFAULT_ATLAS_SUFFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FixupConfig::default();
        assert_eq!(config.base_wrap, WrapMode::Repeat);
        assert_eq!(config.scale_factor, 100.0);
        assert_eq!(config.uv_origin, UvOrigin::BottomLeft);
        assert_eq!(config.atlas_file_name("stone"), "stone_condensed.png");
    }

    #[test]
    fn test_builders() {
        let config = FixupConfig::default()
            .with_base_wrap(WrapMode::Clamp)
            .with_scale_factor(0.01)
            .with_uv_origin(UvOrigin::TopLeft);
        assert_eq!(config.base_wrap, WrapMode::Clamp);
        assert_eq!(config.scale_factor, 0.01);
        assert_eq!(config.uv_origin, UvOrigin::TopLeft);
    }
}
