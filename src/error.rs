//! Error taxonomy for the placement core.
//!
//! Bitmaps and Placers never produce recoverable errors: every invariant is
//! enforced at construction time, so a `Part` is either valid or the request
//! fails before search starts.

use std::fmt;

/// Errors the core can report back to a caller.
#[derive(Debug)]
pub enum PlaterError {
    /// A part admits zero feasible rotations on the configured plate.
    PartInfeasible { filename: String, reason: String },
    /// A collaborator I/O operation failed (loading a request, a mesh, ...).
    Io(std::io::Error),
    /// Search completed with no solution (only possible under cancellation).
    NoSolution,
    /// An invariant was violated; this indicates a bug, not bad input.
    Internal(String),
}

impl fmt::Display for PlaterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaterError::PartInfeasible { filename, reason } => {
                write!(f, "part {filename} is too big for the plate ({reason})")
            }
            PlaterError::Io(err) => write!(f, "I/O error: {err}"),
            PlaterError::NoSolution => write!(f, "no solution found"),
            PlaterError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PlaterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlaterError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlaterError {
    fn from(err: std::io::Error) -> Self {
        PlaterError::Io(err)
    }
}
