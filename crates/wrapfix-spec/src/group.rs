//! Wrap groups: every usage of one image, and the plan chosen for them.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::footprint::{Axis, CellWindow, UvFootprint};
use crate::sampler::{ImageRef, TextureSamplerRef};
use crate::wrap::{WrapMode, WrapPair};

/// One usage of a group's image together with the UV range it samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMember {
    pub sampler: TextureSamplerRef,
    /// `None` when no faces sample this usage.
    pub footprint: Option<UvFootprint>,
}

impl GroupMember {
    /// Returns true if the member samples outside [0,1]x[0,1].
    ///
    /// Members that stay inside the unit square look the same under every
    /// wrap mode and are treated as clamp-equivalent.
    pub fn needs_correction(&self) -> bool {
        self.footprint.is_some_and(|f| !f.within_unit())
    }

    /// Returns true if the member samples outside [0,1] on `axis`.
    pub fn leaves_unit_on(&self, axis: Axis) -> bool {
        self.footprint
            .is_some_and(|f| !f.axis(axis).within_unit())
    }

    /// Cells the member samples on `axis`.
    pub fn cell_window(&self, axis: Axis) -> CellWindow {
        self.footprint
            .map(|f| f.axis(axis).cell_window())
            .unwrap_or(CellWindow::UNIT)
    }
}

/// All usages of pixel-identical image data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrapGroup {
    /// First image reference seen for this data.
    pub image: ImageRef,
    /// Members in document discovery order.
    pub members: Vec<GroupMember>,
}

impl WrapGroup {
    /// Group name used in reports.
    pub fn name(&self) -> String {
        self.image.stem()
    }

    /// Members whose footprint leaves the unit square.
    pub fn corrected_members(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| m.needs_correction())
    }

    /// Distinct wrap pairs among members that need correction.
    pub fn wrap_combinations(&self) -> BTreeSet<WrapPair> {
        self.corrected_members().map(|m| m.sampler.wrap).collect()
    }

    /// Union footprint of members that need correction.
    pub fn corrected_footprint(&self) -> Option<UvFootprint> {
        self.corrected_members()
            .filter_map(|m| m.footprint)
            .reduce(|a, b| a.union(&b))
    }

    /// Cells an atlas must cover on `axis`.
    ///
    /// Only tiling members (repeat or mirror) that leave [0,1] on the axis
    /// widen the window; clamping members rely on the atlas edge instead.
    pub fn cell_window(&self, axis: Axis) -> CellWindow {
        self.members
            .iter()
            .filter(|m| m.leaves_unit_on(axis) && m.sampler.wrap.get(axis) != WrapMode::Clamp)
            .map(|m| m.cell_window(axis))
            .fold(CellWindow::UNIT, |acc, w| acc.union(&w))
    }
}

/// Mirror pattern of a condensed atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// 1x1: no correction needed.
    Single,
    /// 2x1: mirror on S only.
    MirrorS,
    /// 1x2: mirror on T only.
    MirrorT,
    /// 2x2: mirror on both axes.
    MirrorBoth,
}

impl Layout {
    /// Layout for the given per-axis mirror flags.
    pub fn from_mirrors(mirror_s: bool, mirror_t: bool) -> Self {
        match (mirror_s, mirror_t) {
            (false, false) => Layout::Single,
            (true, false) => Layout::MirrorS,
            (false, true) => Layout::MirrorT,
            (true, true) => Layout::MirrorBoth,
        }
    }

    /// Returns true if tiles flip on `axis`.
    pub fn mirrors(&self, axis: Axis) -> bool {
        match axis {
            Axis::S => matches!(self, Layout::MirrorS | Layout::MirrorBoth),
            Axis::T => matches!(self, Layout::MirrorT | Layout::MirrorBoth),
        }
    }

    /// Mirror period in tiles per axis, `(columns, rows)`.
    pub fn period(&self) -> (u32, u32) {
        (
            if self.mirrors(Axis::S) { 2 } else { 1 },
            if self.mirrors(Axis::T) { 2 } else { 1 },
        )
    }

    /// Returns true if the layout changes nothing.
    pub fn is_noop(&self) -> bool {
        *self == Layout::Single
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (cols, rows) = self.period();
        write!(f, "{}x{}", cols, rows)
    }
}

/// Why a group was routed to the patch path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PatchReason {
    /// Members need tile contents on `axis` that one atlas cannot provide.
    InconsistentWraps { axis: Axis, detail: String },
    /// The condenser rejected the group's footprint.
    UnsupportedFootprint { detail: String },
    /// A texcoord source the group would remap is also read by another lookup.
    SharedTexcoords { source_id: String, detail: String },
}

impl std::fmt::Display for PatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchReason::InconsistentWraps { axis, detail } => {
                write!(f, "inconsistent wraps on {}: {}", axis, detail)
            }
            PatchReason::UnsupportedFootprint { detail } => {
                write!(f, "unsupported footprint: {}", detail)
            }
            PatchReason::SharedTexcoords { source_id, detail } => {
                write!(f, "shared texcoords '{}': {}", source_id, detail)
            }
        }
    }
}

/// How a group gets corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "detail", rename_all = "snake_case")]
pub enum Strategy {
    /// Bake the wrap variants into one atlas.
    Condense(Layout),
    /// Write the wrap modes into the exported container's samplers.
    Patch(PatchReason),
}

impl Strategy {
    /// Returns true for the patch path.
    pub fn is_patch(&self) -> bool {
        matches!(self, Strategy::Patch(_))
    }
}

/// A group with its chosen strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPlan {
    pub group: WrapGroup,
    pub strategy: Strategy,
}
