//! Instance models

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

static INSTANCE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<a>\d+)_(?P<b>\d+)_(?P<class>[A-Za-z]+)_(?P<seed>\d+)$")
        .expect("instance id pattern is valid")
});

/// Identifier of a generated instance: `{a}_{b}_{cost_class}_{seed}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId {
    side_a: usize,
    side_b: usize,
    cost_class: String,
    seed: u64,
}

impl InstanceId {
    /// Create an identifier from its parts
    pub fn new(side_a: usize, side_b: usize, cost_class: impl Into<String>, seed: u64) -> Self {
        Self {
            side_a,
            side_b,
            cost_class: cost_class.into(),
            seed,
        }
    }

    /// Number of points on side A
    pub fn side_a(&self) -> usize {
        self.side_a
    }

    /// Number of points on side B
    pub fn side_b(&self) -> usize {
        self.side_b
    }

    pub fn cost_class(&self) -> &str {
        &self.cost_class
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Size of the larger side
    pub fn max_side(&self) -> usize {
        self.side_a.max(self.side_b)
    }

    /// Line the generator reads on stdin to produce this instance
    pub fn generator_request(&self) -> String {
        format!("{} {} {} {}\n", self.side_a, self.side_b, self.cost_class, self.seed)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}_{}", self.side_a, self.side_b, self.cost_class, self.seed)
    }
}

impl FromStr for InstanceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidInstanceId(s.to_string());
        let caps = INSTANCE_ID_PATTERN.captures(s).ok_or_else(invalid)?;

        Ok(Self {
            side_a: caps["a"].parse().map_err(|_| invalid())?,
            side_b: caps["b"].parse().map_err(|_| invalid())?,
            cost_class: caps["class"].to_string(),
            seed: caps["seed"].parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for InstanceId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceId> for String {
    fn from(id: InstanceId) -> Self {
        id.to_string()
    }
}

/// Partition side of a bipartite instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Side::A),
            "B" | "b" => Ok(Side::B),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// A point in the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A loaded instance: side A points followed by side B points
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    side_a: usize,
    points: Vec<Point>,
}

impl Instance {
    /// Parse the stored text representation: `a b` then `a+b` lines of `x y`
    pub fn parse(id: InstanceId, text: &str) -> AppResult<Self> {
        let malformed = |reason: String| AppError::MalformedInstance {
            id: id.to_string(),
            reason,
        };

        let mut tokens = text.split_whitespace();
        let mut next_number = |what: &'static str| {
            tokens
                .next()
                .ok_or_else(|| malformed(format!("unexpected end of file reading {}", what)))
        };

        let side_a: usize = next_number("side A size")?
            .parse()
            .map_err(|_| malformed("side A size is not an integer".to_string()))?;
        let side_b: usize = next_number("side B size")?
            .parse()
            .map_err(|_| malformed("side B size is not an integer".to_string()))?;

        let mut points = Vec::with_capacity(side_a + side_b);
        for i in 0..side_a + side_b {
            let x = next_number("x coordinate")?;
            let y = next_number("y coordinate")?;
            let (Ok(x), Ok(y)) = (x.parse(), y.parse()) else {
                return Err(malformed(format!("point {} has non-numeric coordinates", i)));
            };
            points.push(Point::new(x, y));
        }

        Ok(Self { id, side_a, points })
    }

    /// Points of one side
    pub fn side(&self, side: Side) -> &[Point] {
        match side {
            Side::A => &self.points[..self.side_a],
            Side::B => &self.points[self.side_a..],
        }
    }

    /// Point by index into the combined array
    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Combined point count
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
