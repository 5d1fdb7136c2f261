use std::fmt::{self, Display};

use crate::host::HostError;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input provided to the tool was invalid.
    InvalidInput,
    /// Error occurred while executing the tool.
    ExecutionError,
    /// No tool is registered under the requested name.
    UnknownTool,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
            ErrorKind::UnknownTool => write!(f, "Unknown tool"),
        }
    }
}

/// Describes a tool call error.
///
/// The model sees the error through its `Display` text, which becomes the
/// content of the tool message: the reason if one was attached, or the
/// kind otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self {
            kind: ErrorKind::ExecutionError,
            reason: None,
        }
    }

    /// Creates the error returned for a call to an unregistered tool.
    #[inline]
    pub fn unknown_tool(name: &str) -> Self {
        Self {
            kind: ErrorKind::UnknownTool,
            reason: Some(format!("Unknown tool: {name}")),
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => f.write_str(reason),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

impl From<HostError> for Error {
    #[inline]
    fn from(err: HostError) -> Self {
        let kind = match err {
            HostError::InvalidTrackIndex(_) | HostError::NotInstrumentTrack => {
                ErrorKind::InvalidInput
            }
            HostError::Failed(_) => ErrorKind::ExecutionError,
        };
        Self {
            kind,
            reason: Some(err.to_string()),
        }
    }
}
