//! Affine UV transforms (offset + scale, no rotation).

use serde::{Deserialize, Serialize};

/// Maps `uv` to `uv * scale + offset` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvTransform {
    pub offset: [f64; 2],
    pub scale: [f64; 2],
}

impl UvTransform {
    /// The identity transform.
    pub const IDENTITY: UvTransform = UvTransform {
        offset: [0.0, 0.0],
        scale: [1.0, 1.0],
    };

    /// Creates a transform.
    pub fn new(offset: [f64; 2], scale: [f64; 2]) -> Self {
        Self { offset, scale }
    }

    /// Returns true for the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Applies the transform to one coordinate pair.
    pub fn apply(&self, uv: [f64; 2]) -> [f64; 2] {
        [
            uv[0] * self.scale[0] + self.offset[0],
            uv[1] * self.scale[1] + self.offset[1],
        ]
    }

    /// Returns the transform equivalent to applying `self` then `next`.
    pub fn then(&self, next: &UvTransform) -> UvTransform {
        UvTransform {
            offset: [
                self.offset[0] * next.scale[0] + next.offset[0],
                self.offset[1] * next.scale[1] + next.offset[1],
            ],
            scale: [
                self.scale[0] * next.scale[0],
                self.scale[1] * next.scale[1],
            ],
        }
    }
}

impl Default for UvTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
