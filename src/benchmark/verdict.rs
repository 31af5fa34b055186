//! Verdict types and determination logic

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classification of one (instance, solver) attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Finished in time, exited cleanly and passed verification
    Accepted,
    /// Wall time reached the limit
    TimeLimitExceeded,
    /// Nonzero exit (or failure to start) within the limit
    RuntimeError,
    /// The verifier rejected the output
    WrongAnswer,
}

impl Verdict {
    /// Classify a finished run; verification happens afterwards
    pub fn classify(elapsed: Duration, limit: Duration, success: bool) -> Self {
        if elapsed >= limit {
            Verdict::TimeLimitExceeded
        } else if !success {
            Verdict::RuntimeError
        } else {
            Verdict::Accepted
        }
    }

    /// Get short code for verdict
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "OK",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::RuntimeError => "RTE",
            Verdict::WrongAnswer => "WA",
        }
    }

    /// Check if verdict is a failure (not accepted)
    pub fn is_failure(&self) -> bool {
        !matches!(self, Verdict::Accepted)
    }

    /// Whether the captured output is kept on disk
    ///
    /// Rejected outputs stay around for inspection; outputs of runs that
    /// never finished cleanly are discarded.
    pub fn keeps_output(&self) -> bool {
        matches!(self, Verdict::Accepted | Verdict::WrongAnswer)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
