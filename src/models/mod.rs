//! Domain models
//!
//! This module contains all domain models used throughout the harness.

pub mod instance;
pub mod solution;
pub mod solver;

pub use instance::*;
pub use solution::*;
pub use solver::*;
