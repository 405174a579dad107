use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that reject a whole tessellation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TessellationError {
    #[error("input contains no balls")]
    EmptyInput,

    #[error("ball {index} is invalid: {reason}")]
    InvalidBall { index: usize, reason: String },

    #[error("probe radius must be finite and non-negative, got {0}")]
    InvalidProbe(f64),

    #[error("invalid periodic box: {reason}")]
    InvalidPeriodicBox { reason: String },

    #[error("grouping has {found} entries but there are {expected} balls")]
    GroupingMismatch { expected: usize, found: usize },
}

/// Problems confined to a single cell. These never abort a run; the cell
/// carries the issue and the rest of the result stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellIssue {
    #[error("duplicate of ball {of}")]
    Duplicate { of: usize },

    #[error("inconsistent face geometry: {reason}")]
    Inconsistent {
        neighbor: Option<usize>,
        reason: String,
    },
}

/// Internal check that failed while building or measuring one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryDefect {
    #[error("intersection circle is not finite")]
    NonFiniteCircle,

    #[error("contour vertex is not finite")]
    NonFiniteContour,

    #[error("boundary arcs are not finite")]
    NonFiniteArcs,

    #[error("face area exceeds its intersection disc")]
    AreaExceedsDisc,

    #[error("face measures are not finite")]
    NonFiniteMeasure,
}

impl CellIssue {
    pub fn inconsistent(neighbor: usize, defect: GeometryDefect) -> Self {
        Self::Inconsistent {
            neighbor: Some(neighbor),
            reason: defect.to_string(),
        }
    }
}

/// Convenience type alias for results using [`TessellationError`].
pub type Result<T> = std::result::Result<T, TessellationError>;
