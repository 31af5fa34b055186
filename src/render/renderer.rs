//! Diagram rendering for small instances

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::benchmark::process::{CommandRunner, CommandSpec};
use crate::benchmark::registry::InstanceRegistry;
use crate::benchmark::report::ConsoleReport;
use crate::config::{RenderConfig, StorageConfig};
use crate::constants::extensions;
use crate::error::{AppError, AppResult};
use crate::models::{Instance, InstanceId, Point, Side, Solution, SolverRoster};

use super::document::{MatchingDiagram, PointTable, SegmentTable};
use super::voronoi::{SideBoundaries, VoronoiEngine};

/// Counters of a render sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub rendered: usize,
    pub failed: usize,
    /// Pairs without a captured output to draw
    pub skipped: usize,
}

/// A solver's matching resolved to coordinates
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub instance: InstanceId,
    pub solver: String,
    pub edges: Vec<(Point, Point)>,
}

impl RenderRequest {
    /// Map the solver's index pairs onto the instance's points
    pub fn resolve(instance: &Instance, solver: &str, solution: &Solution) -> AppResult<Self> {
        let edges = solution
            .edges
            .iter()
            .map(|edge| match (instance.point(edge.0), instance.point(edge.1)) {
                (Some(p), Some(q)) => Ok((p, q)),
                _ => Err(AppError::MalformedOutput(format!(
                    "edge {} {} is outside the {} points of {}",
                    edge.0,
                    edge.1,
                    instance.len(),
                    instance.id
                ))),
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            instance: instance.id.clone(),
            solver: solver.to_string(),
            edges,
        })
    }
}

pub struct Renderer {
    runner: Arc<dyn CommandRunner>,
    config: RenderConfig,
    storage: StorageConfig,
    voronoi: VoronoiEngine,
}

impl Renderer {
    pub fn new(runner: Arc<dyn CommandRunner>, config: RenderConfig, storage: StorageConfig) -> AppResult<Self> {
        let voronoi = VoronoiEngine::new(runner.clone(), &config.voronoi_command, &storage.work_dir)?;
        Ok(Self {
            runner,
            config,
            storage,
            voronoi,
        })
    }

    /// Both sides must be within the point threshold
    pub fn should_render(&self, id: &InstanceId) -> bool {
        id.max_side() <= self.config.max_side_points
    }

    fn diagram(&self, instance: &Instance, boundaries: &SideBoundaries, request: &RenderRequest) -> MatchingDiagram {
        MatchingDiagram {
            side_a: PointTable::from(instance.side(Side::A)),
            side_b: PointTable::from(instance.side(Side::B)),
            background: boundaries.side(self.config.voronoi_side).clone(),
            background_side: self.config.voronoi_side,
            edges: SegmentTable::from_segments(request.edges.iter().copied()),
            caption: MatchingDiagram::caption_for(&request.instance.to_string(), &request.solver),
        }
    }

    /// Render one solver's matching on one instance into `<pdf>`
    ///
    /// Returns `Ok(None)` when the solver left no captured output.
    pub async fn render(
        &self,
        instance: &Instance,
        boundaries: &SideBoundaries,
        solver: &str,
    ) -> AppResult<Option<PathBuf>> {
        let output = match fs::read_to_string(self.storage.output_path(&instance.id, solver)).await {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let request = RenderRequest::resolve(instance, solver, &Solution::parse(&output)?)?;

        let tex = self.storage.tex_file(&instance.id, solver);
        fs::create_dir_all(&self.storage.tex_path).await?;
        fs::create_dir_all(&self.storage.pdf_path).await?;
        fs::write(&tex, self.diagram(instance, boundaries, &request).to_string()).await?;

        let command = CommandSpec::from_words(&self.config.latex_command)?
            .arg("-output-directory")
            .arg(self.storage.pdf_path.to_string_lossy())
            .arg(tex.to_string_lossy())
            .current_dir(&self.storage.work_dir);
        let invocation = self.runner.invoke(&command, Vec::new(), None).await?;
        if !invocation.success {
            return Err(AppError::Render(format!(
                "{} exited with {:?}",
                command, invocation.exit_code
            )));
        }

        for extension in [extensions::AUX, extensions::LOG] {
            let path = self.storage.rendered_path(&instance.id, solver, extension);
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(file = %path.display(), error = %e, "Could not remove LaTeX byproduct");
                }
            }
        }

        Ok(Some(self.storage.rendered_path(&instance.id, solver, extensions::PDF)))
    }

    /// Draw every small instance with every solver's matching
    pub async fn render_all<W: Write>(
        &self,
        registry: &InstanceRegistry,
        roster: &SolverRoster,
        report: &mut ConsoleReport<W>,
    ) -> AppResult<RenderSummary> {
        let mut summary = RenderSummary::default();

        for id in registry.list_instances().await? {
            if !self.should_render(&id) {
                tracing::debug!(instance = %id, "Instance too large to draw");
                continue;
            }
            report.drawing(&id)?;

            let prepared = match registry.load(&id).await {
                Ok(instance) => self
                    .voronoi
                    .sides(&instance)
                    .await
                    .map(|boundaries| (instance, boundaries)),
                Err(e) => Err(e),
            };
            let (instance, boundaries) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::error!(instance = %id, code = e.error_code(), "Cannot draw instance: {}", e);
                    summary.failed += roster.len();
                    continue;
                }
            };

            for solver in roster.names() {
                report.drawing_solver(solver)?;
                match self.render(&instance, &boundaries, solver).await {
                    Ok(Some(pdf)) => {
                        tracing::debug!(instance = %id, solver = %solver, pdf = %pdf.display(), "Rendered");
                        summary.rendered += 1;
                    }
                    Ok(None) => {
                        tracing::debug!(instance = %id, solver = %solver, "No captured output to draw");
                        summary.skipped += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            instance = %id,
                            solver = %solver,
                            code = e.error_code(),
                            "Render failed: {}",
                            e
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        Ok(summary)
    }
}
