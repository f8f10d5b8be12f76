//! The combine run: detect, plan, composite, remap, rebind, report.
//!
//! Stages fail per unit. A broken object, material or channel becomes an
//! error in the report and the run carries on with the rest. Only a run with
//! nothing usable at all stops early with [`NothingToProcess`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};
use udimpack_backend_texture::{
    extension_for, write_destinations, ChannelSources, CompositeOptions, CompositeStrategy,
    DestinationImage, RasterCompositor,
};
use udimpack_layout::{locate_objects, plan_grid, remap_objects, LocateOutcome};
use udimpack_material::{
    build_shared_material, detect_material, rebind_materials, BindingMap, ChannelBinding,
    DetectedChannels, MaterialError, ObjectMerger, RewriteOutcome,
};
use udimpack_spec::error::codes;
use udimpack_spec::naming::{image_file_pattern, run_stem, set_name};
use udimpack_spec::{
    BackendError, GridPlan, IssueUnit, ObjectSummary, OutputRecord, ReportIssue, RunConfig,
    RunReport, Scene,
};

use crate::input::write_scene;

/// The run found no object or no texture it could work with.
#[derive(Debug, Error)]
#[error("Nothing to process: {reason}")]
pub struct NothingToProcess {
    pub code: &'static str,
    pub reason: String,
}

/// A file or directory of the run could not be written.
#[derive(Debug, Error)]
#[error("Failed to write run output: {}", path.display())]
pub struct OutputWriteFailed {
    pub path: PathBuf,
}

/// Inputs of one combine run besides the scene.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: RunConfig,
    /// Directory that receives the run directory.
    pub out_root: PathBuf,
    /// Object names to process; every object when empty.
    pub selection: Vec<String>,
    /// Fixed run timestamp; the current time when `None`.
    pub timestamp_ms: Option<i64>,
}

impl RunOptions {
    pub fn new(config: RunConfig, out_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            out_root: out_root.into(),
            selection: Vec::new(),
            timestamp_ms: None,
        }
    }
}

/// Where a finished run put its files.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub run_dir: PathBuf,
    pub scene_path: PathBuf,
    pub report_path: PathBuf,
}

impl RunOutcome {
    /// True when at least one unit failed.
    pub fn has_failures(&self) -> bool {
        !self.report.ok
    }
}

/// What the scene offers before anything is written.
#[derive(Debug)]
pub struct Analysis {
    /// Selected objects, in scene order.
    pub objects: Vec<String>,
    /// Detection results per material, in first-use order.
    pub detected: Vec<DetectedChannels>,
    pub located: LocateOutcome,
    pub errors: Vec<ReportIssue>,
    pub warnings: Vec<ReportIssue>,
}

impl Analysis {
    pub fn detected_for(&self, material: &str) -> Option<&DetectedChannels> {
        self.detected.iter().find(|d| d.material == material)
    }

    /// Distinct channels across all detected materials.
    pub fn channel_count(&self) -> usize {
        let mut channels: Vec<_> = self
            .detected
            .iter()
            .flat_map(|d| d.records.iter().map(|r| &r.channel))
            .collect();
        channels.sort();
        channels.dedup();
        channels.len()
    }

    /// Fails when no selected object has a usable tile.
    pub fn require_objects(&self) -> Result<(), NothingToProcess> {
        if self.located.assignments.is_empty() {
            return Err(NothingToProcess {
                code: codes::RUN_NO_OBJECTS,
                reason: "no selected object has usable UV data".to_string(),
            });
        }
        Ok(())
    }

    /// Fails when there is no object or no texture to work with.
    pub fn require_inputs(&self) -> Result<(), NothingToProcess> {
        if self.detected.iter().all(|d| d.is_empty()) {
            return Err(NothingToProcess {
                code: codes::RUN_NO_TEXTURES,
                reason: "no texture channels found in the selected materials".to_string(),
            });
        }
        self.require_objects()
    }
}

/// Resolves the object selection against the scene.
///
/// An empty selection means every object. Unknown names are an input error.
pub fn select_objects(scene: &Scene, selection: &[String]) -> Result<Vec<String>> {
    if let Some(unknown) = selection.iter().find(|name| scene.object(name).is_none()) {
        anyhow::bail!("Object '{}' is not in the scene", unknown);
    }
    Ok(scene
        .objects
        .iter()
        .filter(|o| selection.is_empty() || selection.contains(&o.name))
        .map(|o| o.name.clone())
        .collect())
}

/// Detects channels and locates objects for a selection.
pub fn analyze(scene: &Scene, selection: &[String]) -> Result<Analysis> {
    let objects = select_objects(scene, selection)?;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut material_names: Vec<&str> = Vec::new();
    for name in &objects {
        if let Some(object) = scene.object(name) {
            for material in &object.materials {
                if !material_names.contains(&material.as_str()) {
                    material_names.push(material);
                }
            }
        }
    }

    let mut detected = Vec::new();
    for name in material_names {
        let unit = IssueUnit::Material(name.to_string());
        let Some(material) = scene.material(name) else {
            errors.push(
                MaterialError::UnknownMaterial {
                    material: name.to_string(),
                }
                .to_issue(unit),
            );
            continue;
        };
        match detect_material(material, &scene.images) {
            Ok(channels) => {
                for issue in &channels.issues {
                    errors.push(issue.to_issue(unit.clone()));
                }
                for record in channels.colorspace_mismatches() {
                    warnings.push(ReportIssue::new(
                        codes::RUN_COLORSPACE_MISMATCH,
                        unit.clone(),
                        format!(
                            "image '{}' on {} is tagged {}",
                            record.image,
                            record.channel,
                            record.colorspace.as_str()
                        ),
                    ));
                }
                debug!(material = %name, channels = channels.records.len(), "Detected channels");
                detected.push(channels);
            }
            Err(err) => errors.push(err.to_issue(unit)),
        }
    }

    let located = locate_objects(objects.iter().filter_map(|name| scene.object(name)));
    for failure in &located.failures {
        let unit = failure
            .object()
            .map(|o| IssueUnit::Object(o.to_string()))
            .unwrap_or(IssueUnit::Run);
        errors.push(failure.to_issue(unit));
    }

    Ok(Analysis {
        objects,
        detected,
        located,
        errors,
        warnings,
    })
}

/// Source images per channel, taken from the objects located on each tile.
///
/// Each object contributes the image of the first of its materials that
/// has the channel. When objects on one tile disagree the first object in
/// scene order wins and a warning is returned.
pub fn channel_sources(scene: &Scene, analysis: &Analysis) -> (Vec<ChannelSources>, Vec<ReportIssue>) {
    let mut by_channel = BTreeMap::new();
    for channels in &analysis.detected {
        for record in &channels.records {
            by_channel
                .entry(record.channel.clone())
                .or_insert_with(|| ChannelSources {
                    channel: record.channel.clone(),
                    colorspace: record.colorspace,
                    tiles: BTreeMap::new(),
                });
        }
    }

    let mut warnings = Vec::new();
    for assignment in &analysis.located.assignments {
        let Some(object) = scene.object(&assignment.object) else {
            continue;
        };
        for sources in by_channel.values_mut() {
            let record = object
                .materials
                .iter()
                .filter_map(|m| analysis.detected_for(m))
                .find_map(|d| d.record(&sources.channel));
            let Some(image) = record.and_then(|r| scene.image(&r.image)) else {
                continue;
            };
            let path = PathBuf::from(image.tile_path(assignment.tile));
            match sources.tiles.get(&assignment.tile) {
                None => {
                    sources.tiles.insert(assignment.tile, path);
                }
                Some(kept) if *kept != path => {
                    warn!(
                        channel = %sources.channel,
                        tile = assignment.tile.udim(),
                        object = %assignment.object,
                        "Conflicting source image for tile; keeping the first"
                    );
                    warnings.push(ReportIssue::new(
                        codes::RUN_TILE_CONFLICT,
                        IssueUnit::Object(assignment.object.clone()),
                        format!(
                            "tile {} {} uses {} but {} was kept",
                            assignment.tile.udim(),
                            sources.channel,
                            path.display(),
                            kept.display()
                        ),
                    ));
                }
                Some(_) => {}
            }
        }
    }
    (by_channel.into_values().collect(), warnings)
}

/// Tries each strategy in order until one produces the channel.
///
/// Failures of earlier strategies are returned alongside a later success.
fn composite_channel(
    strategies: &mut [Box<dyn CompositeStrategy>],
    plan: &GridPlan,
    sources: &ChannelSources,
    options: &CompositeOptions,
) -> Result<(Vec<DestinationImage>, Vec<ReportIssue>), Vec<ReportIssue>> {
    let unit = IssueUnit::Channel(sources.channel.name().to_string());
    let mut issues = Vec::new();
    for strategy in strategies.iter_mut() {
        match strategy.composite(plan, sources, options) {
            Ok(images) => return Ok((images, issues)),
            Err(err) => {
                warn!(
                    channel = %sources.channel,
                    strategy = strategy.name(),
                    error = %err,
                    "Compositing failed"
                );
                issues.push(err.to_issue(unit.clone()));
            }
        }
    }
    Err(issues)
}

fn channel_failed(unit: IssueUnit, channel: &str) -> ReportIssue {
    ReportIssue::new(
        codes::RUN_CHANNEL_FAILED,
        unit,
        format!("{} was not composited; original bindings kept", channel),
    )
}

fn tool_version() -> String {
    format!("udimpack-cli v{}", env!("CARGO_PKG_VERSION"))
}

/// Runs a combine over `scene`, writing into a new run directory.
///
/// `scene_stem` names the written scene copy. Image paths in `scene` should
/// be absolute. `fallback` is tried for a channel when raster compositing
/// fails. The scene is modified in place and a copy is written next to the
/// destination images.
pub fn run_combine(
    scene: &mut Scene,
    scene_stem: &str,
    options: &RunOptions,
    fallback: Option<Box<dyn CompositeStrategy>>,
    merger: &mut dyn ObjectMerger,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let config = &options.config;
    config.validate().context("Invalid run configuration")?;

    let analysis = analyze(scene, &options.selection)?;
    analysis.require_inputs()?;
    let mut errors = analysis.errors.clone();
    let mut warnings = analysis.warnings.clone();

    let plan = plan_grid(analysis.located.source_tiles(), config.target_tiles)
        .context("Failed to plan destination grid")?;
    info!(
        sources = plan.source_tiles().count(),
        destinations = plan.destinations.len(),
        "Planned grid"
    );

    let first_object = analysis.located.assignments.first().map(|a| a.object.as_str());
    let set = set_name(config.set_name.as_deref(), config.combine_objects, first_object);
    let timestamp_ms = options
        .timestamp_ms
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let stem = run_stem(&set, timestamp_ms);
    let run_dir = options.out_root.join(&stem);
    std::fs::create_dir_all(&run_dir).with_context(|| OutputWriteFailed {
        path: run_dir.clone(),
    })?;

    let (channel_sources, conflicts) = channel_sources(scene, &analysis);
    warnings.extend(conflicts);

    let composite_options = CompositeOptions {
        resolution: config.resolution,
        fill_unassigned_cells: config.fill_unassigned_cells,
    };
    let mut strategies: Vec<Box<dyn CompositeStrategy>> = vec![Box::new(RasterCompositor::new())];
    strategies.extend(fallback);

    let mut bindings = BindingMap::new();
    let mut outputs: Vec<OutputRecord> = Vec::new();
    for sources in &channel_sources {
        let unit = IssueUnit::Channel(sources.channel.name().to_string());
        let images = match composite_channel(&mut strategies, &plan, sources, &composite_options) {
            Ok((images, recovered)) => {
                warnings.extend(recovered);
                images
            }
            Err(issues) => {
                errors.extend(issues);
                errors.push(channel_failed(unit, sources.channel.name()));
                continue;
            }
        };
        let Some(depth) = images.first().map(|i| i.raster.bit_depth()) else {
            continue;
        };
        match write_destinations(&images, &run_dir, &stem, config.output_format) {
            Ok(records) => {
                let ext = extension_for(config.output_format, depth);
                let pattern = run_dir.join(image_file_pattern(&stem, &sources.channel, ext));
                bindings.insert(
                    sources.channel.clone(),
                    ChannelBinding {
                        channel: sources.channel.clone(),
                        path: pattern.to_string_lossy().into_owned(),
                        colorspace: sources.colorspace,
                        tiles: records.iter().map(|r| r.tile).collect(),
                    },
                );
                info!(channel = %sources.channel, images = records.len(), "Wrote channel");
                outputs.extend(records);
            }
            Err(err) => {
                errors.push(err.to_issue(unit.clone()));
                errors.push(channel_failed(unit, sources.channel.name()));
            }
        }
    }

    for failure in remap_objects(&mut scene.objects, &analysis.located.assignments, &plan) {
        let unit = failure
            .object()
            .map(|o| IssueUnit::Object(o.to_string()))
            .unwrap_or(IssueUnit::Run);
        errors.push(failure.to_issue(unit));
    }

    let outcome = if config.combine_objects {
        let objects: Vec<String> = analysis
            .located
            .assignments
            .iter()
            .map(|a| a.object.clone())
            .collect();
        match build_shared_material(scene, &analysis.detected, &set, &bindings, &objects, merger) {
            Ok(shared) => {
                info!(material = %shared.material, object = %shared.object, "Built shared material");
                shared.outcome
            }
            Err(err) => {
                errors.push(err.to_issue(IssueUnit::Run));
                RewriteOutcome::default()
            }
        }
    } else {
        rebind_materials(scene, &analysis.detected, &set, &bindings)
    };
    for issue in &outcome.issues {
        let unit = issue
            .material()
            .map(|m| IssueUnit::Material(m.to_string()))
            .unwrap_or(IssueUnit::Run);
        match issue {
            MaterialError::MissingDestination { .. } | MaterialError::UnwiredChannel { .. } => {
                warnings.push(issue.to_issue(unit))
            }
            _ => errors.push(issue.to_issue(unit)),
        }
    }

    let scene_path = run_dir.join(format!("{}.scene.json", scene_stem));
    write_scene(scene, &scene_path).with_context(|| OutputWriteFailed {
        path: scene_path.clone(),
    })?;

    let report = RunReport::builder(set, timestamp_ms, tool_version())
        .objects(
            analysis
                .located
                .assignments
                .iter()
                .map(|a| ObjectSummary {
                    object: a.object.clone(),
                    tile: a.tile,
                })
                .collect(),
        )
        .plan(plan)
        .outputs(outputs)
        .errors(errors)
        .warnings(warnings)
        .duration_ms(start.elapsed().as_millis() as u64)
        .build();
    let report_path = run_dir.join(RunReport::filename(&stem));
    write_report(&report, &report_path).with_context(|| OutputWriteFailed {
        path: report_path.clone(),
    })?;

    Ok(RunOutcome {
        report,
        run_dir,
        scene_path,
        report_path,
    })
}

/// Writes a report as pretty JSON.
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = report.to_json_pretty().context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
