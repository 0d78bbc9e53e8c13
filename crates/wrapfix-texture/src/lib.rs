//! wrapfix texture condenser
//!
//! Reproduces repeat and mirror wrap behavior without any wrap parameter by
//! compositing flipped and tiled copies of a source image into an atlas that
//! is sampled with clamp addressing.
//!
//! # Guarantees
//!
//! - Composited regions are byte-identical to source pixels: no resampling,
//!   no blending, only flips and copies at pixel boundaries
//! - Sampling the atlas at a member's remapped UV returns the same texel as
//!   sampling the source at the original UV under its declared wrap mode
//! - Condensing a group that needs no correction returns the source image and
//!   identity transforms
//! - PNG encoding uses fixed settings, so atlases are reproducible
//!
//! # Example
//!
//! ```
//! use wrapfix_spec::{GroupMember, ImageRef, Layout, TextureSamplerRef, UvFootprint, UvOrigin, WrapGroup, WrapMode, WrapPair};
//! use wrapfix_texture::{PixelBuffer, PixelFormat, TextureCondenser};
//!
//! let image = ImageRef::new("tile", "tile.png");
//! let sampler = TextureSamplerRef::new("wall", image.clone(), WrapPair::new(WrapMode::Mirror, WrapMode::Repeat));
//! let group = WrapGroup {
//!     image,
//!     members: vec![GroupMember { sampler, footprint: Some(UvFootprint::new(0.0, 2.0, 0.0, 1.0)) }],
//! };
//!
//! let source = PixelBuffer::new(2, 1, PixelFormat::Gray8, vec![10, 20]).unwrap();
//! let atlas = TextureCondenser::new(UvOrigin::BottomLeft)
//!     .condense(&group, Layout::MirrorS, &source)
//!     .unwrap();
//! assert_eq!(atlas.image.as_bytes(), &[10, 20, 20, 10]);
//! ```

pub mod buffer;
pub mod condense;
pub mod error;
pub mod png;

pub use buffer::{wrap_texel, PixelBuffer, PixelFormat};
pub use condense::{atlas_transform, CondensedAtlas, MemberTransform, TextureCondenser};
pub use error::{TextureError, TextureResult};
pub use crate::png::{decode_png, encode_png, hash_png, read_png, PngConfig};
