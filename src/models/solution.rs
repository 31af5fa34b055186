//! Solver output models

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Edge between two points, as indices into the combined point array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge(pub usize, pub usize);

/// Solution structure reported by a solver
///
/// The stdout format is the edge count `n`, then `n` lines `p1 p2`, then the
/// objective value. Only the structural part is read here; the objective is
/// extracted separately from the last line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub edges: Vec<Edge>,
}

impl Solution {
    /// Parse the edge list from captured solver output
    pub fn parse(output: &str) -> AppResult<Self> {
        let mut tokens = output.split_whitespace();

        let count: usize = tokens
            .next()
            .ok_or_else(|| AppError::MalformedOutput("empty output".to_string()))?
            .parse()
            .map_err(|_| AppError::MalformedOutput("edge count is not an integer".to_string()))?;

        let mut edges = Vec::with_capacity(count);
        for i in 0..count {
            let mut index = || -> AppResult<usize> {
                tokens
                    .next()
                    .ok_or_else(|| {
                        AppError::MalformedOutput(format!("expected {} edges, found {}", count, i))
                    })?
                    .parse()
                    .map_err(|_| AppError::MalformedOutput(format!("edge {} has a bad index", i)))
            };
            let p1 = index()?;
            let p2 = index()?;
            edges.push(Edge(p1, p2));
        }

        Ok(Self { edges })
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
