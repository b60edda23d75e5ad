//! Error types for Picky views.

use alloc::string::String;
use core::fmt;

/// Result type alias for Picky operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for view, ledger and source operations.
///
/// Source exhaustion is not an error: pulls report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A user predicate failed while examining an element.
    Predicate {
        message: String,
    },
    /// A user source failed while producing the next element.
    Source {
        message: String,
    },
    /// A paged source hit its page limit before running dry.
    RunawaySource {
        pages: usize,
    },
    /// Invalid window arguments for a derived view.
    InvalidWindow {
        message: String,
    },
    /// A view was pulled while its family's ledger was already borrowed,
    /// i.e. from inside a predicate of the same family.
    Reentrant,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Predicate { message } => {
                write!(f, "Predicate failed: {}", message)
            }
            Error::Source { message } => {
                write!(f, "Source failed: {}", message)
            }
            Error::RunawaySource { pages } => {
                write!(f, "Runaway source: page limit of {} reached", pages)
            }
            Error::InvalidWindow { message } => {
                write!(f, "Invalid window: {}", message)
            }
            Error::Reentrant => {
                write!(f, "Re-entrant pull on a view family that is already being advanced")
            }
        }
    }
}

impl Error {
    /// Creates a predicate error.
    pub fn predicate(message: impl Into<String>) -> Self {
        Error::Predicate {
            message: message.into(),
        }
    }

    /// Creates a source error.
    pub fn source(message: impl Into<String>) -> Self {
        Error::Source {
            message: message.into(),
        }
    }

    /// Creates a runaway source error.
    pub fn runaway_source(pages: usize) -> Self {
        Error::RunawaySource { pages }
    }

    /// Creates an invalid window error.
    pub fn invalid_window(message: impl Into<String>) -> Self {
        Error::InvalidWindow {
            message: message.into(),
        }
    }

    /// Returns true if retrying the failed pull may succeed.
    ///
    /// Predicate and source failures leave the cursor and the ledger untouched,
    /// so the same position is examined again on the next pull.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Predicate { .. } | Error::Source { .. } | Error::Reentrant
        )
    }
}
