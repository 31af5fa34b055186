//! Application-wide constants
//!
//! This module contains all constant values used throughout the harness.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SOLVER DEFAULTS
// =============================================================================

/// Solver programs evaluated by default, in evaluation order.
///
/// The first entry is the exact baseline every ratio is computed against.
pub const DEFAULT_SOLVERS: &[&str] = &[
    "exact_gurobi",
    "exact_hungarian_1bad",
    "exact_hungarian_allbads",
    "exact_nodualupdate_1bad",
    "exact_nodualupdate_allbads",
    "exact_subcubic_1bad_double",
    "exact_subcubic_1bad_mpfloat",
    "exact_subcubic_1bad_novoronoi",
    "exact_subcubic_allbads_double",
    "exact_subcubic_allbads_mpfloat",
    "exact_subcubic_allbads_novoronoi",
    "heuristic_nearestneighbor",
    "heuristic_bestoftwo",
    "heuristic_greedystar",
    "heuristic_greedystar_improved",
];

/// Default exact baseline solver
pub const DEFAULT_BASELINE_SOLVER: &str = "exact_gurobi";

/// Name prefix of exact solvers
pub const EXACT_PREFIX: &str = "exact_";

/// Name prefix of heuristic solvers
pub const HEURISTIC_PREFIX: &str = "heuristic_";

/// Default wall-clock limit per solver run in seconds
pub const DEFAULT_TIME_LIMIT_SECONDS: f64 = 1800.0;

// =============================================================================
// TOOLCHAIN DEFAULTS
// =============================================================================

/// Default C++ compiler
pub const DEFAULT_CXX: &str = "g++";

/// Default compiler flags
pub const DEFAULT_CXXFLAGS: &str = "-std=c++2b -O3 -Wno-return-type";

/// Default linker flags (the ILP baseline links against Gurobi)
pub const DEFAULT_LDFLAGS: &str = "-lgurobi_c++ -lgurobi90";

/// Instance generator program name
pub const GENERATOR_PROGRAM: &str = "_instance_generator";

/// Verifier program name
pub const VERIFIER_PROGRAM: &str = "_verifier";

/// Default generator time limit in seconds
pub const DEFAULT_GENERATOR_TIME_LIMIT_SECONDS: f64 = 600.0;

/// Default verifier time limit in seconds
pub const DEFAULT_VERIFIER_TIME_LIMIT_SECONDS: f64 = 600.0;

/// Verifier stdout that marks a correct solution
pub const DEFAULT_VERIFIER_SUCCESS_TOKEN: &str = "1";

// =============================================================================
// GENERATION DEFAULTS
// =============================================================================

/// Total point counts of generated instances (split evenly between sides)
pub const DEFAULT_INSTANCE_SIZES: &[u32] = &[50, 100, 500, 1000, 2500, 5000];

/// Cost classes understood by the generator
pub const DEFAULT_COST_CLASSES: &[&str] = &["R", "P", "E"];

/// Generator seeds
pub const DEFAULT_SEEDS: &[u64] = &[0];

// =============================================================================
// RENDER DEFAULTS
// =============================================================================

/// Largest side size that still gets drawn
pub const DEFAULT_RENDER_MAX_SIDE_POINTS: usize = 50;

/// Geometry engine producing Voronoi cell boundaries
pub const DEFAULT_VORONOI_COMMAND: &str = "octave -q compute_voronoi.m";

/// LaTeX engine producing the rendered page
pub const DEFAULT_LATEX_COMMAND: &str = "pdflatex -interaction=nonstopmode";

// =============================================================================
// STORAGE LAYOUT
// =============================================================================

/// Storage file extensions
pub mod extensions {
    pub const SOURCE: &str = "cpp";
    pub const INSTANCE: &str = "in";
    pub const OUTPUT: &str = "out";
    pub const TEX: &str = "tex";
    pub const PDF: &str = "pdf";
    pub const AUX: &str = "aux";
    pub const LOG: &str = "log";
}

/// Instance manifest written by the generation stage
pub const MANIFEST_FILE: &str = "manifest.json";

/// Run summary written after the evaluation stage
pub const SUMMARY_FILE: &str = "summary.json";

// =============================================================================
// LOGGING
// =============================================================================

/// Default tracing filter
pub const DEFAULT_RUST_LOG: &str = "matchjudge=info";
