//! Utility functions

pub mod natural;
pub mod time;

pub use natural::{natural_cmp, natural_sort, natural_sort_by_key};
pub use time::{format_elapsed, now_utc};
