//! wrapfix core library
//!
//! Shared types and decisions for repairing texture wrap behavior in assets
//! exported as COLLADA documents and re-exported as GLB containers.
//!
//! # Overview
//!
//! - **Wrap modes**: [`WrapMode`] per texture axis, parsed from vendor tokens
//! - **Sampler references**: [`TextureSamplerRef`], one per texture usage site
//! - **Footprints**: [`UvFootprint`], the UV range a mesh actually samples
//! - **Groups**: [`WrapGroup`] and the [`resolve`] module, which decides per
//!   image whether the wrap variants can be condensed into one atlas or must be
//!   patched into the exported container
//! - **Material graphs**: [`MaterialGraph`], a closed set of node kinds the
//!   condensation path rewrites
//!
//! # Example
//!
//! ```
//! use wrapfix_spec::{FootprintTable, ImageRef, Layout, Strategy, TextureSamplerRef, UvFootprint, WrapMode, WrapPair};
//! use wrapfix_spec::resolve::resolve_groups;
//!
//! let image = ImageRef::new("tile_png", "tile.png");
//! let plain = TextureSamplerRef::new("floor", image.clone(), WrapPair::new(WrapMode::Repeat, WrapMode::Repeat));
//! let mirrored = TextureSamplerRef::new("wall", image, WrapPair::new(WrapMode::Mirror, WrapMode::Repeat));
//!
//! let mut footprints = FootprintTable::new();
//! footprints.insert(&mirrored, UvFootprint::new(0.0, 2.0, 0.0, 1.0));
//!
//! let plans = resolve_groups(&[plain, mirrored], &footprints);
//! assert_eq!(plans[0].strategy, Strategy::Condense(Layout::MirrorS));
//! ```

pub mod config;
pub mod error;
pub mod footprint;
pub mod group;
pub mod material;
pub mod resolve;
pub mod sampler;
pub mod transform;
pub mod wrap;

pub use config::{FixupConfig, UvOrigin};
pub use error::{ErrorKind, FixupError, StageError, UnsupportedFootprintError};
pub use footprint::{Axis, AxisRange, CellWindow, UvFootprint};
pub use group::{GroupMember, GroupPlan, Layout, PatchReason, Strategy, WrapGroup};
pub use material::{
    Addressing, HasUvInput, HasWrapMode, ImageTextureNode, MaterialGraph, MaterialNode, NodeId,
    UvMapNode, UvTransformNode, WrapModeNode,
};
pub use resolve::{FootprintSource, FootprintTable};
pub use sampler::{ImageRef, TextureSamplerRef, WrapSource};
pub use transform::UvTransform;
pub use wrap::{WrapMode, WrapPair};
