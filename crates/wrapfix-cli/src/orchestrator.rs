//! Sequencing of one invocation.
//!
//! `PARSE_DAE -> RESOLVE_GROUPS -> {CONDENSE | PATCH} -> DONE`. Any stage
//! failure moves to `FAILED` and abandons the remaining groups; there are no
//! retries. The only recovery is per group: a condensation rejected for its
//! footprint, or whose texcoords another lookup also reads, falls back to the
//! patch path.
//!
//! Outputs are staged as temp files and renamed into place only after every
//! stage succeeded, so a failed run leaves inputs and earlier outputs intact.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use wrapfix_dae::{
    normalize_scale, texcoord_conflicts, write_back, DaeDocument, DaeWrapExtractor,
    MaterialGraphSet, MeshScan,
};
use wrapfix_glb::{GlbDocument, GlbWrapPatcher};
use wrapfix_spec::resolve::resolve_groups;
use wrapfix_spec::{
    FixupConfig, FixupError, GroupPlan, ImageRef, Layout, PatchReason, StageError, Strategy,
    TextureSamplerRef, UnsupportedFootprintError, UvTransform, WrapGroup,
};
use wrapfix_texture::{encode_png, hash_png, read_png, PngConfig, TextureCondenser, TextureError};

use crate::report::{FixupReport, GroupOutcome, GroupReport, Inspection, Stage, StageFailure};
use crate::staging::{parent_dir, StagedOutputs};

/// A container to patch and where the patched copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlbTarget {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl GlbTarget {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Runs the pipeline stages with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: FixupConfig,
}

/// Current state of a run.
struct Run {
    stage: Stage,
}

impl Run {
    fn start() -> Self {
        Self {
            stage: Stage::ParseDae,
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!("{} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn fail<E: FixupError + Send + Sync + 'static>(&self, err: E) -> StageFailure {
        self.abort(StageError::from_fixup(err))
    }

    fn abort(&self, error: StageError) -> StageFailure {
        warn!("{} -> {}: {}", self.stage, Stage::Failed, error);
        StageFailure::new(self.stage, error)
    }
}

/// Source document plus what every later stage reads from it.
struct Parsed {
    doc: DaeDocument,
    samplers: Vec<TextureSamplerRef>,
    scan: MeshScan,
}

impl Orchestrator {
    pub fn new(config: FixupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixupConfig {
        &self.config
    }

    /// Extracts samplers and plans groups without writing anything.
    pub fn inspect(&self, dae: &Path) -> Result<Inspection, StageFailure> {
        let mut run = Run::start();
        let parsed = self.parse(&mut run, dae)?;
        let plans = self.resolve(&mut run, &parsed);
        run.enter(Stage::Done);

        Ok(Inspection {
            document: dae.to_path_buf(),
            version: parsed.doc.version().to_string(),
            samplers: parsed.samplers,
            plans,
        })
    }

    /// Scales `dae` by the configured factor and writes it to `output`.
    pub fn normalize_scale(&self, dae: &Path, output: &Path) -> Result<FixupReport, StageFailure> {
        let mut run = Run::start();
        let mut report = FixupReport::new("normalize-scale");

        let mut doc = DaeDocument::read(dae).map_err(|e| run.fail(e))?;
        run.enter(Stage::NormalizeScale);
        let scale = normalize_scale(&mut doc, self.config.scale_factor).map_err(|e| run.fail(e))?;
        doc.write_atomic(output).map_err(|e| run.fail(e))?;
        run.enter(Stage::Done);

        report.stage = run.stage;
        report.scale = Some(scale);
        report.outputs.push(output.to_path_buf());
        Ok(report)
    }

    /// Condenses every group that can be condensed and writes the rewritten
    /// document to `output`, with atlases beside it.
    ///
    /// Groups routed to the patch path are patched into `glb` when one is
    /// given and reported as deferred otherwise.
    pub fn condense(
        &self,
        dae: &Path,
        output: &Path,
        glb: Option<&GlbTarget>,
    ) -> Result<FixupReport, StageFailure> {
        let mut run = Run::start();
        let mut report = FixupReport::new("condense");
        let mut parsed = self.parse(&mut run, dae)?;
        report.samplers = parsed.samplers.len();
        let plans = self.resolve(&mut run, &parsed);

        run.enter(Stage::Condense);
        let baker = AtlasBaker {
            condenser: TextureCondenser::new(self.config.uv_origin),
            config: &self.config,
            source_dir: parent_dir(dae),
            output_dir: parent_dir(output),
        };
        let mut outcomes = Vec::with_capacity(plans.len());
        let mut baked = Vec::new();
        for (index, plan) in plans.iter().enumerate() {
            let outcome = match plan.strategy {
                Strategy::Condense(layout) => {
                    match baker
                        .bake(&plan.group, layout, &parsed.samplers)
                        .map_err(|e| run.abort(e))?
                    {
                        Bake::Atlas(atlas) => {
                            let outcome = atlas.outcome(layout);
                            baked.push((index, atlas));
                            outcome
                        }
                        Bake::Skipped(outcome) => outcome,
                    }
                }
                Strategy::Patch(ref reason) => GroupOutcome::Deferred {
                    reason: reason.to_string(),
                },
            };
            outcomes.push(outcome);
        }

        let graphs = settle_texcoords(&parsed, &plans, &mut baked, &mut outcomes);
        let mut staged = StagedOutputs::new();
        for (_, atlas) in &baked {
            staged
                .stage(&atlas.path, &atlas.bytes)
                .map_err(|e| run.abort(e))?;
        }

        let mut deferred: Vec<(&WrapGroup, String)> = Vec::new();
        for (plan, outcome) in plans.iter().zip(outcomes) {
            if let GroupOutcome::Deferred { ref reason } = outcome {
                deferred.push((&plan.group, reason.clone()));
            }
            debug!("group '{}': {}", plan.group.name(), outcome.label());
            report.groups.push(GroupReport::new(&plan.group, outcome));
        }

        let condensed = graphs.condensed_count() > 0;
        if condensed {
            let written = write_back(&mut parsed.doc, &parsed.scan, &parsed.samplers, &graphs)
                .map_err(|e| run.fail(e))?;
            info!(
                "redirected {} lookup(s), remapped {} texcoord source(s)",
                written.samplers_redirected,
                written.sources_transformed.len()
            );
        }
        // An unchanged document is only copied when it goes somewhere new.
        if condensed || output != dae {
            let bytes = parsed.doc.to_bytes().map_err(|e| run.fail(e))?;
            staged.stage(output, &bytes).map_err(|e| run.abort(e))?;
        }

        if let Some(target) = glb {
            run.enter(Stage::Patch);
            let samplers: Vec<TextureSamplerRef> = deferred
                .iter()
                .flat_map(|(group, _)| group.members.iter().map(|m| m.sampler.clone()))
                .collect();
            let mut container = GlbDocument::read(&target.input).map_err(|e| run.fail(e))?;
            let patch = GlbWrapPatcher::new(&samplers)
                .patch(&mut container)
                .map_err(|e| run.fail(e))?;
            let bytes = container.to_bytes().map_err(|e| run.fail(e))?;
            staged.stage(&target.output, &bytes).map_err(|e| run.abort(e))?;

            for (group, reason) in &deferred {
                let patched = GroupReport::patched(group, Some(reason.clone()), &patch);
                let slot = report
                    .groups
                    .iter_mut()
                    .find(|g| g.name == patched.name && g.image == patched.image);
                if let Some(slot) = slot {
                    *slot = patched;
                }
            }
            report.patch = Some(patch);
        }

        report.outputs = staged.commit().map_err(|e| run.abort(e))?;
        run.enter(Stage::Done);
        report.stage = run.stage;
        Ok(report)
    }

    /// Writes the document's wrap modes for every texture into `target`.
    pub fn export(&self, dae: &Path, target: &GlbTarget) -> Result<FixupReport, StageFailure> {
        let mut run = Run::start();
        let mut report = FixupReport::new("export");
        let parsed = self.parse(&mut run, dae)?;
        report.samplers = parsed.samplers.len();
        let plans = self.resolve(&mut run, &parsed);

        run.enter(Stage::Patch);
        let patch = GlbWrapPatcher::new(&parsed.samplers)
            .patch_file(&target.input, &target.output)
            .map_err(|e| run.fail(e))?;
        for unmatched in &patch.unmatched {
            warn!("no texture in {} uses '{}'", target.input.display(), unmatched);
        }

        report.groups = plans
            .iter()
            .map(|plan| {
                let reason = match plan.strategy {
                    Strategy::Patch(ref reason) => Some(reason.to_string()),
                    Strategy::Condense(_) => None,
                };
                GroupReport::patched(&plan.group, reason, &patch)
            })
            .collect();
        report.outputs.push(target.output.clone());
        report.patch = Some(patch);
        run.enter(Stage::Done);
        report.stage = run.stage;
        Ok(report)
    }

    fn parse(&self, run: &mut Run, dae: &Path) -> Result<Parsed, StageFailure> {
        let doc = DaeDocument::read(dae).map_err(|e| run.fail(e))?;
        let samplers = DaeWrapExtractor::from_config(&self.config)
            .extract(&doc)
            .map_err(|e| run.fail(e))?;
        let scan = MeshScan::scan(&doc).map_err(|e| run.fail(e))?;
        info!(
            "{}: {} texture usage(s), {} texcoord binding(s)",
            dae.display(),
            samplers.len(),
            scan.bindings().len()
        );
        Ok(Parsed {
            doc,
            samplers,
            scan,
        })
    }

    fn resolve(&self, run: &mut Run, parsed: &Parsed) -> Vec<GroupPlan> {
        run.enter(Stage::ResolveGroups);
        resolve_groups(&parsed.samplers, &parsed.scan.footprints())
    }
}

/// An encoded atlas and the lookups it replaces, not yet written.
struct BakedAtlas {
    image: ImageRef,
    path: PathBuf,
    bytes: Vec<u8>,
    /// Sampler index and UV transform per redirected lookup.
    sites: Vec<(usize, UvTransform)>,
    members: usize,
}

impl BakedAtlas {
    fn outcome(&self, layout: Layout) -> GroupOutcome {
        GroupOutcome::Condensed {
            layout,
            atlas: self.path.clone(),
            hash: hash_png(&self.bytes),
            members: self.members,
        }
    }
}

enum Bake {
    Atlas(BakedAtlas),
    Skipped(GroupOutcome),
}

/// Turns condensable groups into encoded atlases.
struct AtlasBaker<'a> {
    condenser: TextureCondenser,
    config: &'a FixupConfig,
    source_dir: &'a Path,
    output_dir: &'a Path,
}

impl AtlasBaker<'_> {
    fn bake(
        &self,
        group: &WrapGroup,
        layout: Layout,
        samplers: &[TextureSamplerRef],
    ) -> Result<Bake, StageError> {
        if layout.is_noop() {
            return Ok(Bake::Skipped(GroupOutcome::Untouched));
        }
        // Checked before the image is read so a missing file cannot mask the fallback.
        if let Some(footprint) = group.corrected_footprint() {
            if let Err(err) = footprint.ensure_condensable(group.name()) {
                return Ok(Bake::Skipped(fallback(err)));
            }
        }

        let path = self.source_dir.join(group.image.normalized_path());
        let source = read_png(&path)
            .map_err(|e| StageError::from_fixup(e).with_subject(path.display().to_string()))?;
        let atlas = match self.condenser.condense(group, layout, &source) {
            Ok(atlas) => atlas,
            Err(TextureError::Footprint(err)) => return Ok(Bake::Skipped(fallback(err))),
            Err(err) => return Err(StageError::from_fixup(err)),
        };

        let stem = group.image.stem();
        let file_name = self.config.atlas_file_name(&stem);
        let image = ImageRef::new(
            format!("{}{}", stem, self.config.atlas_suffix),
            file_name.clone(),
        );
        let bytes =
            encode_png(&atlas.image, &PngConfig::default()).map_err(StageError::from_fixup)?;

        let mut sites = Vec::new();
        for member in &atlas.members {
            sites.extend(
                samplers
                    .iter()
                    .enumerate()
                    .filter(|(_, sampler)| **sampler == member.sampler)
                    .map(|(index, _)| (index, member.transform)),
            );
        }

        let path = self.output_dir.join(&file_name);
        debug!(
            "'{}' -> {} ({} usage(s))",
            group.name(),
            path.display(),
            atlas.members.len()
        );
        Ok(Bake::Atlas(BakedAtlas {
            image,
            path,
            bytes,
            sites,
            members: atlas.members.len(),
        }))
    }
}

/// Builds the condensed material graphs, sending every baked group whose
/// texcoords another lookup also reads back to the patch path.
///
/// Reverting a group can expose a new conflict for a group sharing its
/// coordinates, so this repeats until the remaining atlases agree.
fn settle_texcoords(
    parsed: &Parsed,
    plans: &[GroupPlan],
    baked: &mut Vec<(usize, BakedAtlas)>,
    outcomes: &mut [GroupOutcome],
) -> MaterialGraphSet {
    loop {
        let mut graphs = MaterialGraphSet::build(&parsed.samplers);
        for (_, atlas) in baked.iter() {
            for &(index, transform) in &atlas.sites {
                graphs.condense(index, atlas.image.clone(), transform);
            }
        }

        let conflicts = texcoord_conflicts(&parsed.scan, &parsed.samplers, &graphs);
        if conflicts.is_empty() {
            return graphs;
        }

        let mut evicted = BTreeSet::new();
        for conflict in conflicts {
            for (plan, atlas) in baked.iter() {
                let reads = atlas
                    .sites
                    .iter()
                    .any(|(index, _)| conflict.condensed.contains(index));
                if !reads || !evicted.insert(*plan) {
                    continue;
                }
                let reason = PatchReason::SharedTexcoords {
                    source_id: conflict.source_id.clone(),
                    detail: conflict.detail.clone(),
                };
                warn!(
                    "'{}': {}; falling back to the patch path",
                    plans[*plan].group.name(),
                    reason
                );
                outcomes[*plan] = GroupOutcome::Deferred {
                    reason: reason.to_string(),
                };
            }
        }
        baked.retain(|(plan, _)| !evicted.contains(plan));
    }
}
fn fallback(err: UnsupportedFootprintError) -> GroupOutcome {
    warn!("{}; falling back to the patch path", err);
    GroupOutcome::Deferred {
        reason: PatchReason::UnsupportedFootprint {
            detail: err.to_string(),
        }
        .to_string(),
    }
}
