//! Voronoi boundaries from the external geometry engine

use std::path::Path;
use std::sync::Arc;

use crate::benchmark::process::{CommandRunner, CommandSpec};
use crate::error::{AppError, AppResult};
use crate::models::{Instance, Point, Side};

use super::document::SegmentTable;

/// Voronoi boundaries of both sides of one instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideBoundaries {
    pub side_a: SegmentTable,
    pub side_b: SegmentTable,
}

impl SideBoundaries {
    pub fn side(&self, side: Side) -> &SegmentTable {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

pub struct VoronoiEngine {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl VoronoiEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, words: &[String], work_dir: &Path) -> AppResult<Self> {
        Ok(Self {
            runner,
            command: CommandSpec::from_words(words)?.current_dir(work_dir),
        })
    }

    /// Boundaries of each side, computed independently
    pub async fn sides(&self, instance: &Instance) -> AppResult<SideBoundaries> {
        Ok(SideBoundaries {
            side_a: self.boundaries(instance.side(Side::A)).await?,
            side_b: self.boundaries(instance.side(Side::B)).await?,
        })
    }

    /// Boundary polylines of the Voronoi diagram of `points`
    pub async fn boundaries(&self, points: &[Point]) -> AppResult<SegmentTable> {
        let invocation = self.runner.invoke(&self.command, request(points), None).await?;
        if !invocation.success {
            return Err(AppError::Render(format!(
                "{} exited with {:?}: {}",
                self.command,
                invocation.exit_code,
                invocation.stderr_excerpt()
            )));
        }
        parse_boundaries(&invocation.stdout_lossy())
    }
}

/// `n` followed by one `x y` line per point
fn request(points: &[Point]) -> Vec<u8> {
    let mut input = format!("{}\n", points.len());
    for point in points {
        input.push_str(&format!("{} {}\n", point.x, point.y));
    }
    input.into_bytes()
}

/// Polylines of `x y` rows, separated by blank lines
pub fn parse_boundaries(text: &str) -> AppResult<SegmentTable> {
    let mut polylines = Vec::new();
    let mut current = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                polylines.push(std::mem::take(&mut current));
            }
            continue;
        }

        let mut fields = line.split_whitespace();
        let coordinates = (
            fields.next().map(str::parse::<f64>),
            fields.next().map(str::parse::<f64>),
            fields.next(),
        );
        match coordinates {
            (Some(Ok(x)), Some(Ok(y)), None) => current.push(Point::new(x, y)),
            _ => {
                return Err(AppError::MalformedGeometry(format!(
                    "line {}: {:?}",
                    number + 1,
                    line
                )));
            }
        }
    }
    if !current.is_empty() {
        polylines.push(current);
    }

    Ok(SegmentTable(polylines))
}
