//! Texture usage sites recovered from the source document.

use serde::{Deserialize, Serialize};

use crate::wrap::WrapPair;

/// Identity of a referenced image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageRef {
    /// Image element id in the source document.
    pub id: String,
    /// File path as written in the source document.
    pub path: String,
}

impl ImageRef {
    /// Creates an image reference.
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }

    /// Key under which usages of pixel-identical data are grouped.
    ///
    /// Two image elements pointing at the same file share pixel data, so the
    /// normalized path wins over the element id when one is present.
    pub fn identity(&self) -> String {
        let path = normalize_path(&self.path);
        if path.is_empty() {
            self.id.clone()
        } else {
            path
        }
    }

    /// Path with `file://`, backslashes and leading `./` normalized away.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// File name without directories or extension, used to match images by name.
    pub fn stem(&self) -> String {
        let path = normalize_path(&self.path);
        let file = path.rsplit('/').next().unwrap_or_default();
        let stem = match file.rfind('.') {
            Some(dot) if dot > 0 => &file[..dot],
            _ => file,
        };
        if stem.is_empty() {
            self.id.clone()
        } else {
            stem.to_string()
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.path)
        }
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    let replaced = trimmed.replace('\\', "/");
    let mut normalized = replaced.as_str();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }
    normalized.to_string()
}

/// Where a sampler's wrap pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapSource {
    /// Explicit `wrap_s`/`wrap_t` elements.
    #[default]
    Declared,
    /// Vendor `extra/technique` wrap or mirror flags.
    Extra,
    /// No extension data; the configured base wrap mode.
    Defaulted,
}

/// One texture usage site: a material sampling an image with a wrap pair.
///
/// Built by the extractor and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSamplerRef {
    /// Material element id.
    pub material_id: String,
    /// Material display name (what downstream tools key materials by).
    pub material_name: String,
    /// Effect element id.
    pub effect_id: String,
    /// `sampler2D` parameter sid, when the texture went through one.
    pub sampler_sid: Option<String>,
    /// Texcoord binding semantic from the `<texture>` reference.
    pub texcoord: String,
    /// Referenced image.
    pub image: ImageRef,
    /// Resolved wrap pair.
    pub wrap: WrapPair,
    /// Origin of the wrap pair.
    pub source: WrapSource,
}

impl TextureSamplerRef {
    /// Creates a sampler reference whose material id, name and effect id coincide.
    pub fn new(material: impl Into<String>, image: ImageRef, wrap: WrapPair) -> Self {
        let material = material.into();
        Self {
            material_id: material.clone(),
            material_name: material.clone(),
            effect_id: material,
            sampler_sid: None,
            texcoord: String::new(),
            image,
            wrap,
            source: WrapSource::Declared,
        }
    }

    /// Sets the material display name.
    pub fn with_material_name(mut self, name: impl Into<String>) -> Self {
        self.material_name = name.into();
        self
    }

    /// Sets the effect id.
    pub fn with_effect(mut self, effect_id: impl Into<String>) -> Self {
        self.effect_id = effect_id.into();
        self
    }

    /// Sets the sampler parameter sid.
    pub fn with_sampler_sid(mut self, sid: impl Into<String>) -> Self {
        self.sampler_sid = Some(sid.into());
        self
    }

    /// Sets the texcoord binding semantic.
    pub fn with_texcoord(mut self, texcoord: impl Into<String>) -> Self {
        self.texcoord = texcoord.into();
        self
    }

    /// Sets the wrap source.
    pub fn with_source(mut self, source: WrapSource) -> Self {
        self.source = source;
        self
    }

    /// Key identifying the faces this usage samples: material plus texcoord binding.
    pub fn site_key(&self) -> (String, String) {
        (self.material_id.clone(), self.texcoord.clone())
    }

    /// Short label for reports and logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.material_name, self.image.stem())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrap::WrapMode;

    #[test]
    fn test_image_stem() {
        assert_eq!(ImageRef::new("a", "textures/stone.png").stem(), "stone");
        assert_eq!(ImageRef::new("a", "file://C:\\tex\\wood.tga").stem(), "wood");
        assert_eq!(ImageRef::new("a", "./grass").stem(), "grass");
        assert_eq!(ImageRef::new("img0", "").stem(), "img0");
        assert_eq!(ImageRef::new("a", ".hidden").stem(), ".hidden");
    }

    #[test]
    fn test_image_identity_prefers_path() {
        let a = ImageRef::new("img0", "./tex/stone.png");
        let b = ImageRef::new("img1", "tex/stone.png");
        assert_eq!(a.identity(), b.identity());
        assert_eq!(ImageRef::new("img2", "").identity(), "img2");
    }

    #[test]
    fn test_sampler_builder() {
        let sampler = TextureSamplerRef::new(
            "mat0",
            ImageRef::new("img0", "stone.png"),
            WrapPair::uniform(WrapMode::Mirror),
        )
        .with_material_name("Stone")
        .with_effect("Effect_Stone")
        .with_sampler_sid("sampler0")
        .with_texcoord("CHANNEL0");

        assert_eq!(sampler.site_key(), ("mat0".to_string(), "CHANNEL0".to_string()));
        assert_eq!(sampler.label(), "Stone/stone");
        assert_eq!(sampler.sampler_sid.as_deref(), Some("sampler0"));
        assert_eq!(sampler.source, WrapSource::Declared);
    }
}
