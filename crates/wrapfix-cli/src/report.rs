//! Serializable outcome of one invocation.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use wrapfix_dae::ScaleReport;
use wrapfix_glb::{EditAction, PatchReport};
use wrapfix_spec::{GroupPlan, Layout, StageError, TextureSamplerRef, WrapGroup, WrapPair};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ParseDae,
    NormalizeScale,
    ResolveGroups,
    Condense,
    Patch,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ParseDae => "PARSE_DAE",
            Stage::NormalizeScale => "NORMALIZE_SCALE",
            Stage::ResolveGroups => "RESOLVE_GROUPS",
            Stage::Condense => "CONDENSE",
            Stage::Patch => "PATCH",
            Stage::Done => "DONE",
            Stage::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An aborted invocation: the stage that failed and why.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: StageError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: StageError) -> Self {
        Self { stage, error }
    }
}

/// What happened to one wrap group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Baked into an atlas.
    Condensed {
        layout: Layout,
        atlas: PathBuf,
        /// BLAKE3 of the encoded atlas.
        hash: String,
        members: usize,
    },
    /// Wrap modes written into the container's samplers.
    Patched {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Container textures matched to the group's usages.
        matched: usize,
        /// Matched textures whose sampler changed.
        changed: usize,
    },
    /// Needs the patch path but no container was given.
    Deferred { reason: String },
    /// Already samples correctly.
    Untouched,
}

impl GroupOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            GroupOutcome::Condensed { .. } => "condensed",
            GroupOutcome::Patched { .. } => "patched",
            GroupOutcome::Deferred { .. } => "deferred",
            GroupOutcome::Untouched => "untouched",
        }
    }
}

/// One group line of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub image: String,
    pub members: usize,
    /// Distinct wrap pairs requested by the members.
    pub wraps: BTreeSet<WrapPair>,
    #[serde(flatten)]
    pub outcome: GroupOutcome,
}

impl GroupReport {
    pub fn new(group: &WrapGroup, outcome: GroupOutcome) -> Self {
        Self {
            name: group.name(),
            image: group.image.path.clone(),
            members: group.members.len(),
            wraps: group.wrap_combinations(),
            outcome,
        }
    }

    /// Patched outcome for `group`, counting the edits made for its members.
    pub fn patched(group: &WrapGroup, reason: Option<String>, patch: &PatchReport) -> Self {
        let labels: BTreeSet<String> = group.members.iter().map(|m| m.sampler.label()).collect();
        let edits: Vec<_> = patch
            .edits
            .iter()
            .filter(|e| labels.contains(&e.label))
            .collect();
        let changed = edits
            .iter()
            .filter(|e| e.action != EditAction::Unchanged)
            .count();
        Self::new(
            group,
            GroupOutcome::Patched {
                reason,
                matched: edits.len(),
                changed,
            },
        )
    }
}

/// Result of `normalize-scale`, `condense` or `export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixupReport {
    pub operation: &'static str,
    pub stage: Stage,
    /// Texture usages extracted from the document.
    pub samplers: usize,
    pub groups: Vec<GroupReport>,
    /// Files written, in commit order.
    pub outputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<PatchReport>,
}

impl FixupReport {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            stage: Stage::ParseDae,
            samplers: 0,
            groups: Vec::new(),
            outputs: Vec::new(),
            scale: None,
            patch: None,
        }
    }

    /// Number of groups with the given outcome label.
    pub fn count(&self, label: &str) -> usize {
        self.groups
            .iter()
            .filter(|g| g.outcome.label() == label)
            .count()
    }
}

/// Result of `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub document: PathBuf,
    /// COLLADA schema version.
    pub version: String,
    pub samplers: Vec<TextureSamplerRef>,
    pub plans: Vec<GroupPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapfix_glb::SamplerEdit;
    use wrapfix_spec::{GroupMember, ImageRef, WrapMode};

    fn group() -> WrapGroup {
        let image = ImageRef::new("tile_png", "textures/tile.png");
        let member = |material: &str, wrap| GroupMember {
            sampler: TextureSamplerRef::new(material, image.clone(), wrap),
            footprint: None,
        };
        WrapGroup {
            image: image.clone(),
            members: vec![
                member("Floor", WrapPair::uniform(WrapMode::Mirror)),
                member("Wall", WrapPair::uniform(WrapMode::Repeat)),
            ],
        }
    }

    fn edit(label: &str, action: EditAction) -> SamplerEdit {
        SamplerEdit {
            texture: 0,
            sampler: Some(0),
            label: label.to_string(),
            wrap: WrapPair::uniform(WrapMode::Mirror),
            action,
        }
    }

    #[test]
    fn test_group_report_fields() {
        let report = GroupReport::new(&group(), GroupOutcome::Untouched);
        assert_eq!(report.name, "tile");
        assert_eq!(report.image, "textures/tile.png");
        assert_eq!(report.members, 2);
        assert_eq!(report.wraps.len(), 2);
    }

    #[test]
    fn test_patched_counts_only_group_edits() {
        let patch = PatchReport {
            edits: vec![
                edit("Floor/tile", EditAction::Created),
                edit("Wall/tile", EditAction::Unchanged),
                edit("Roof/slate", EditAction::UpdatedInPlace),
            ],
            unmatched: Vec::new(),
        };
        let report = GroupReport::patched(&group(), None, &patch);
        assert_eq!(
            report.outcome,
            GroupOutcome::Patched {
                reason: None,
                matched: 2,
                changed: 1,
            }
        );
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let report = GroupReport::new(
            &group(),
            GroupOutcome::Deferred {
                reason: "unsupported footprint".to_string(),
            },
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["outcome"], "deferred");
        assert_eq!(value["reason"], "unsupported footprint");
        assert_eq!(value["name"], "tile");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ParseDae.to_string(), "PARSE_DAE");
        assert_eq!(serde_json::to_value(Stage::ResolveGroups).unwrap(), "resolve_groups");
    }

    #[test]
    fn test_failure_message_names_stage() {
        let failure = StageFailure::new(
            Stage::Patch,
            StageError::new(wrapfix_spec::ErrorKind::MalformedGlb, "GLB_001", "bad magic")
                .with_subject("scene.glb"),
        );
        assert_eq!(
            failure.to_string(),
            "PATCH failed: MalformedGlbError [GLB_001] in 'scene.glb': bad magic"
        );
    }
}
