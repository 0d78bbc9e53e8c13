//! Texture wrap (addressing) modes.

use serde::{Deserialize, Serialize};

use crate::footprint::Axis;

/// Addressing behavior for UV coordinates outside [0, 1] on one texture axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Tile the image identically.
    #[default]
    Repeat,
    /// Tile the image, flipping every other copy.
    Mirror,
    /// Extend the edge texels.
    Clamp,
}

impl WrapMode {
    /// Container sampler constant for REPEAT.
    pub const GL_REPEAT: u64 = 10497;
    /// Container sampler constant for MIRRORED_REPEAT.
    pub const GL_MIRRORED_REPEAT: u64 = 33648;
    /// Container sampler constant for CLAMP_TO_EDGE.
    pub const GL_CLAMP_TO_EDGE: u64 = 33071;

    /// Returns the lowercase identifier for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            WrapMode::Repeat => "repeat",
            WrapMode::Mirror => "mirror",
            WrapMode::Clamp => "clamp",
        }
    }

    /// Returns the token written into COLLADA `wrap_s`/`wrap_t` elements.
    pub fn collada_token(&self) -> &'static str {
        match self {
            WrapMode::Repeat => "WRAP",
            WrapMode::Mirror => "MIRROR",
            WrapMode::Clamp => "CLAMP",
        }
    }

    /// Returns the binary container's numeric sampler constant.
    pub fn gl_code(&self) -> u64 {
        match self {
            WrapMode::Repeat => Self::GL_REPEAT,
            WrapMode::Mirror => Self::GL_MIRRORED_REPEAT,
            WrapMode::Clamp => Self::GL_CLAMP_TO_EDGE,
        }
    }

    /// Maps a numeric sampler constant back to a wrap mode.
    pub fn from_gl_code(code: u64) -> Option<Self> {
        match code {
            Self::GL_REPEAT => Some(WrapMode::Repeat),
            Self::GL_MIRRORED_REPEAT => Some(WrapMode::Mirror),
            Self::GL_CLAMP_TO_EDGE => Some(WrapMode::Clamp),
            _ => None,
        }
    }

    /// Parses a vendor wrap token as written by the exporting tool.
    ///
    /// `NONE` resolves to `base`. `BORDER` has no equivalent in the target
    /// container and resolves to edge clamping. Unknown tokens yield `None`.
    pub fn from_vendor_token(token: &str, base: WrapMode) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "WRAP" | "REPEAT" => Some(WrapMode::Repeat),
            "MIRROR" | "MIRRORED_REPEAT" | "MIRROR_REPEAT" => Some(WrapMode::Mirror),
            "CLAMP" | "CLAMP_TO_EDGE" | "BORDER" | "CLAMP_TO_BORDER" => Some(WrapMode::Clamp),
            "NONE" => Some(base),
            _ => None,
        }
    }
}

impl std::fmt::Display for WrapMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WrapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "repeat" | "wrap" => Ok(WrapMode::Repeat),
            "mirror" => Ok(WrapMode::Mirror),
            "clamp" => Ok(WrapMode::Clamp),
            other => Err(format!(
                "unknown wrap mode '{}' (expected repeat, mirror or clamp)",
                other
            )),
        }
    }
}

/// Wrap modes for both texture axes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct WrapPair {
    /// Horizontal (U) axis.
    pub s: WrapMode,
    /// Vertical (V) axis.
    pub t: WrapMode,
}

impl WrapPair {
    /// Creates a wrap pair.
    pub fn new(s: WrapMode, t: WrapMode) -> Self {
        Self { s, t }
    }

    /// Same mode on both axes.
    pub fn uniform(mode: WrapMode) -> Self {
        Self { s: mode, t: mode }
    }

    /// Mode on the given axis.
    pub fn get(&self, axis: Axis) -> WrapMode {
        match axis {
            Axis::S => self.s,
            Axis::T => self.t,
        }
    }

    /// Returns true if either axis mirrors.
    pub fn has_mirror(&self) -> bool {
        self.s == WrapMode::Mirror || self.t == WrapMode::Mirror
    }
}

impl std::fmt::Display for WrapPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.s, self.t)
    }
}
