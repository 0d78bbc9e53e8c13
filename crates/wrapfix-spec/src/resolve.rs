//! Wrap group resolution.
//!
//! Groups sampler references by image identity, attaches the UV footprint of
//! each usage, and picks a strategy per group:
//!
//! | Footprints needing correction | Strategy |
//! |-------------------------------|----------|
//! | none, or no mirroring outside [0,1] | `Condense(Single)` (native wrap suffices) |
//! | mirroring that one atlas can reproduce | `Condense(MirrorS / MirrorT / MirrorBoth)` |
//! | members needing contradicting tiles | `Patch(InconsistentWraps)` |

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::footprint::{Axis, CellWindow, UvFootprint};
use crate::group::{GroupMember, GroupPlan, Layout, PatchReason, Strategy, WrapGroup};
use crate::sampler::TextureSamplerRef;
use crate::wrap::WrapMode;

/// Provides the UV range sampled by each texture usage.
///
/// Implemented by whatever owns the mesh data (the COLLADA scene in practice).
pub trait FootprintSource {
    /// Footprint of the faces that sample `sampler`, or `None` if none do.
    fn footprint(&self, sampler: &TextureSamplerRef) -> Option<UvFootprint>;
}

/// Footprints keyed by material id and texcoord binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootprintTable {
    entries: BTreeMap<(String, String), UvFootprint>,
}

impl FootprintTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the footprint for a sampler's usage site, merging with any existing entry.
    pub fn insert(&mut self, sampler: &TextureSamplerRef, footprint: UvFootprint) {
        self.insert_site(&sampler.material_id, &sampler.texcoord, footprint);
    }

    /// Records a footprint for a material and texcoord binding.
    ///
    /// An empty `texcoord` acts as the material-wide fallback.
    pub fn insert_site(&mut self, material_id: &str, texcoord: &str, footprint: UvFootprint) {
        self.entries
            .entry((material_id.to_string(), texcoord.to_string()))
            .and_modify(|existing| *existing = existing.union(&footprint))
            .or_insert(footprint);
    }

    /// Number of recorded sites.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FootprintSource for FootprintTable {
    fn footprint(&self, sampler: &TextureSamplerRef) -> Option<UvFootprint> {
        self.entries
            .get(&sampler.site_key())
            .or_else(|| {
                self.entries
                    .get(&(sampler.material_id.clone(), String::new()))
            })
            .copied()
    }
}

/// Groups samplers by image identity, keeping first-appearance order.
pub fn group_samplers<S: FootprintSource + ?Sized>(
    samplers: &[TextureSamplerRef],
    source: &S,
) -> Vec<WrapGroup> {
    let mut groups: Vec<WrapGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for sampler in samplers {
        let member = GroupMember {
            sampler: sampler.clone(),
            footprint: source.footprint(sampler),
        };
        let key = sampler.image.identity();
        match index.get(&key) {
            Some(&i) => groups[i].members.push(member),
            None => {
                index.insert(key, groups.len());
                groups.push(WrapGroup {
                    image: sampler.image.clone(),
                    members: vec![member],
                });
            }
        }
    }

    groups
}

/// Picks the strategy for one group.
pub fn resolve_group(group: &WrapGroup) -> Strategy {
    if group.corrected_members().next().is_none() {
        return Strategy::Condense(Layout::Single);
    }

    let mirrors = |axis: Axis| {
        group
            .members
            .iter()
            .any(|m| m.leaves_unit_on(axis) && m.sampler.wrap.get(axis) == WrapMode::Mirror)
    };
    let layout = Layout::from_mirrors(mirrors(Axis::S), mirrors(Axis::T));
    if layout.is_noop() {
        // Repeat and clamp survive export natively.
        return Strategy::Condense(Layout::Single);
    }

    for axis in Axis::ALL {
        let window = group.cell_window(axis);
        for member in group.members.iter().filter(|m| m.leaves_unit_on(axis)) {
            let cells = member.cell_window(axis);
            match member.sampler.wrap.get(axis) {
                WrapMode::Repeat if layout.mirrors(axis) && cells.touches_odd_cell() => {
                    return Strategy::Patch(PatchReason::InconsistentWraps {
                        axis,
                        detail: format!(
                            "repeating usage '{}' samples cells {}..{} that a mirrored atlas flips",
                            member.sampler.label(),
                            cells.start,
                            cells.end
                        ),
                    });
                }
                WrapMode::Clamp if window != CellWindow::UNIT => {
                    return Strategy::Patch(PatchReason::InconsistentWraps {
                        axis,
                        detail: format!(
                            "clamping usage '{}' would sample neighbouring atlas tiles",
                            member.sampler.label()
                        ),
                    });
                }
                _ => {}
            }
        }
    }

    Strategy::Condense(layout)
}

/// Groups samplers and picks a strategy for each group.
pub fn resolve_groups<S: FootprintSource + ?Sized>(
    samplers: &[TextureSamplerRef],
    source: &S,
) -> Vec<GroupPlan> {
    group_samplers(samplers, source)
        .into_iter()
        .map(|group| {
            let strategy = resolve_group(&group);
            debug!(
                "group '{}' ({} member(s), {} combination(s)) -> {:?}",
                group.name(),
                group.members.len(),
                group.wrap_combinations().len(),
                strategy
            );
            GroupPlan { group, strategy }
        })
        .collect()
}
