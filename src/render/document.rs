//! pgfplots document model
//!
//! A diagram is assembled from structured tables and serialized exactly once
//! through [`fmt::Display`].

use std::fmt;

use crate::models::{Point, Side};

/// Scatter table: one `x y` row per point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTable(pub Vec<Point>);

impl PointTable {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[Point]> for PointTable {
    fn from(points: &[Point]) -> Self {
        Self(points.to_vec())
    }
}

impl fmt::Display for PointTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_rows(f, &self.0)
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, points: &[Point]) -> fmt::Result {
    for (i, point) in points.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        write!(f, "{} {}", point.x, point.y)?;
    }
    Ok(())
}

/// Line table: polylines separated by blank rows, which pgfplots draws as
/// disconnected pieces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTable(pub Vec<Vec<Point>>);

impl SegmentTable {
    /// Table of straight two-point segments
    pub fn from_segments<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = (Point, Point)>,
    {
        Self(segments.into_iter().map(|(p, q)| vec![p, q]).collect())
    }

    pub fn polylines(&self) -> &[Vec<Point>] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SegmentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, polyline) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "\n\n")?;
            }
            write_rows(f, polyline)?;
        }
        Ok(())
    }
}

/// One instance with one solver's matching, ready to serialize
#[derive(Debug, Clone)]
pub struct MatchingDiagram {
    pub side_a: PointTable,
    pub side_b: PointTable,
    /// Voronoi boundaries of one side, drawn faintly
    pub background: SegmentTable,
    pub background_side: Side,
    pub edges: SegmentTable,
    pub caption: String,
}

impl MatchingDiagram {
    /// `Instance {id} - {solver}`
    pub fn caption_for(instance: &str, solver: &str) -> String {
        format!("Instance {} - {}", instance, solver)
    }

    fn background_color(&self) -> &'static str {
        match self.background_side {
            Side::A => "blue!25",
            Side::B => "red!25",
        }
    }
}

impl fmt::Display for MatchingDiagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, r"\documentclass[pdftex]{{article}}")?;
        writeln!(f, r"\usepackage[utf8]{{inputenc}}")?;
        writeln!(f, r"\usepackage{{adjustbox}}")?;
        writeln!(f, r"\usepackage{{caption}}")?;
        writeln!(f, r"\usepackage[margin=0cm]{{geometry}}")?;
        writeln!(f, r"\usepackage{{pgfplots}}")?;
        writeln!(f, r"\pgfplotsset{{compat=1.17}}")?;
        writeln!(f, r"\begin{{document}}")?;
        writeln!(f, r"   \begin{{figure}}")?;
        writeln!(f, r"   \centering")?;
        writeln!(f, r"   \begin{{tikzpicture}}")?;
        writeln!(f, r"      \begin{{axis}}[")?;
        writeln!(f, r"          axis equal, width=18cm, height=18cm")?;
        writeln!(f, r"      ]")?;
        writeln!(f, "      \\addplot [only marks, blue] table {{\n{}\n}};", self.side_a)?;
        writeln!(f, "      \\addplot [only marks,  red] table {{\n{}\n}};", self.side_b)?;
        writeln!(
            f,
            "      \\addplot [no markers, update limits=false, {}] table {{\n{}\n}};",
            self.background_color(),
            self.background
        )?;
        writeln!(f, "      \\addplot [no markers, thick] table {{\n{}\n}};", self.edges)?;
        writeln!(f, r"      \end{{axis}}")?;
        writeln!(f, r"   \end{{tikzpicture}}")?;
        writeln!(f, r"   \caption*{{{}}}", escape_latex(&self.caption))?;
        writeln!(f, r"   \end{{figure}}")?;
        writeln!(f, r"\end{{document}}")
    }
}

/// Escape the characters LaTeX treats specially in running text
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '&' | '%' | '#' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
