//! Matching diagrams for small instances
//!
//! Each diagram shows both point sets, the Voronoi cells of one side as a
//! faint background, and the matching a solver produced. Diagrams are written
//! as standalone pgfplots documents and compiled with pdflatex.

pub mod document;
pub mod renderer;
pub mod voronoi;

pub use document::{MatchingDiagram, PointTable, SegmentTable};
pub use renderer::{RenderRequest, RenderSummary, Renderer};
pub use voronoi::{SideBoundaries, VoronoiEngine};
