//! wrapfix COLLADA stage
//!
//! Reads and rewrites the source document:
//!
//! - [`DaeWrapExtractor`] recovers one [`wrapfix_spec::TextureSamplerRef`] per texture usage,
//!   with the wrap pair declared in `sampler2D` or its vendor extension block
//! - [`MeshScan`] binds mesh primitives to materials and measures the UV
//!   footprint each texcoord binding samples
//! - [`MaterialGraphSet`] and [`write_back`] apply condensed material graphs
//!   back onto the document
//! - [`normalize_scale`] multiplies geometry and skeleton lengths by one factor
//!
//! # Example
//!
//! ```
//! use wrapfix_dae::{DaeDocument, DaeWrapExtractor, MeshScan};
//! use wrapfix_spec::resolve::resolve_groups;
//!
//! let xml = r##"<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">
//!   <library_images><image id="img"><init_from>tile.png</init_from></image></library_images>
//!   <library_materials><material id="Tile"><instance_effect url="#Effect_Tile"/></material></library_materials>
//!   <library_effects><effect id="Effect_Tile"><profile_COMMON>
//!     <newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
//!     <newparam sid="samp"><sampler2D><source>surf</source><wrap_s>MIRROR</wrap_s></sampler2D></newparam>
//!     <technique sid="t"><lambert><diffuse><texture texture="samp" texcoord="UV0"/></diffuse></lambert></technique>
//!   </profile_COMMON></effect></library_effects>
//! </COLLADA>"##;
//!
//! let doc = DaeDocument::parse(xml.as_bytes()).unwrap();
//! let samplers = DaeWrapExtractor::default().extract(&doc).unwrap();
//! assert_eq!(samplers[0].wrap.to_string(), "(mirror, repeat)");
//!
//! let footprints = MeshScan::scan(&doc).unwrap().footprints();
//! let plans = resolve_groups(&samplers, &footprints);
//! assert_eq!(plans.len(), 1);
//! ```

pub mod document;
pub mod error;
pub mod extract;
pub mod graph;
pub mod mesh;
pub mod scale;
pub mod writeback;

#[cfg(test)]
mod fixtures;

pub use document::DaeDocument;
pub use error::{DaeError, DaeResult};
pub use extract::{DaeWrapExtractor, EFFECT_PREFIX};
pub use graph::MaterialGraphSet;
pub use mesh::{MeshScan, TexcoordBinding, PRIMITIVES};
pub use scale::{normalize_scale, ScaleReport};
pub use writeback::{texcoord_conflicts, write_back, TexcoordConflict, WriteBackReport};
