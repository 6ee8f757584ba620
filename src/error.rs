// Error taxonomy shared by every point array representation

use thiserror::Error;

/// Errors raised by point array construction, access and edits.
///
/// None of these are retried internally. The caller decides whether to
/// fall back to an editable array or abandon the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointArrayError {
    /// Malformed coordinate range: odd length, fewer than one point, or
    /// bounds outside the source buffer.
    #[error("invalid coordinate range [{lower}, {upper}): {reason}")]
    InvalidRange {
        lower: usize,
        upper: usize,
        reason: &'static str,
    },

    /// The scale search exhausted its attempt budget, or the coordinate
    /// span is too wide for `f32` arithmetic (`attempts == 0`).
    #[error("no scale pair fits 8-bit deltas after {attempts} attempts")]
    ArithmeticOverflow { attempts: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Point or sub-range outside `[0, count]`.
    #[error("index {index} out of range for {count} points")]
    IndexOutOfRange { index: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, PointArrayError>;

impl PointArrayError {
    pub(crate) fn invalid_range(lower: usize, upper: usize, reason: &'static str) -> Self {
        Self::InvalidRange { lower, upper, reason }
    }

    pub(crate) fn out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }
}
