//! wrapfix binary container patcher
//!
//! Writes texture wrap modes recovered from the source document into an
//! already exported GLB container. The container is parsed into a full
//! structural representation, edited, and re-serialized; raw bytes are never
//! spliced.
//!
//! - Header and chunk structure are validated on parse
//! - The JSON chunk is re-serialized and space padded to 4 bytes
//! - The BIN chunk is copied through unchanged, so every buffer view range
//!   stays valid
//! - Files are written through a sibling temp file and renamed into place
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wrapfix_glb::GlbWrapPatcher;
//! use wrapfix_spec::{ImageRef, TextureSamplerRef, WrapMode, WrapPair};
//!
//! let samplers = vec![TextureSamplerRef::new(
//!     "Stone",
//!     ImageRef::new("stone_png", "stone.png"),
//!     WrapPair::new(WrapMode::Mirror, WrapMode::Repeat),
//! )];
//! let report = GlbWrapPatcher::new(&samplers)
//!     .patch_file(Path::new("scene.glb"), Path::new("scene_fixed.glb"))
//!     .unwrap();
//! println!("{} sampler edit(s)", report.changed());
//! ```

pub mod container;
pub mod error;
pub mod patch;

pub use container::{
    padded_len, GlbDocument, CHUNK_BIN, CHUNK_HEADER_SIZE, CHUNK_JSON, GLB_MAGIC, GLB_VERSION,
    HEADER_SIZE,
};
pub use error::{GlbError, GlbResult};
pub use patch::{EditAction, GlbWrapPatcher, PatchReport, SamplerEdit};
