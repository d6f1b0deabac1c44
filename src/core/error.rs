//! Error types of the console engine.
//!
//! None of these are fatal: each one aborts a single sub-command at most and
//! is reported through the console's print sinks.

use thiserror::Error;

/// Errors raised while splitting a line into sub-commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A quoted region was never closed before the end of the input.
    #[error("unterminated quote at position {position}")]
    UnterminatedQuote { position: usize },
}

/// Errors raised while extracting arguments with a format spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required directive found no remaining text.
    #[error("missing required argument #{index}")]
    MissingArgument { index: usize },
    /// A quoted argument was never closed.
    #[error("unterminated quoted argument")]
    UnterminatedQuote,
}

/// Errors raised by the dispatch engine for a single sub-command.
///
/// The display strings are the messages printed to the console.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("No such command: {0}.")]
    UnknownCommand(String),

    #[error("Command '{0}' cannot be executed from a map.")]
    NotMapInvocable(String),

    #[error("Command '{0}' cannot be executed from a non-map config file.")]
    MapOnly(String),

    #[error("Access for command {0} denied.")]
    AccessDenied(String),

    #[error("Invalid arguments... Usage: {name} {params}")]
    Usage {
        name: String,
        params: String,
        #[source]
        source: ValidationError,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] TokenizeError),
}

impl DispatchError {
    /// Whether this error is only reported on the press stroke.
    ///
    /// Lookup, context and access failures would otherwise be printed twice
    /// for every line, once per stroke.
    pub fn press_only(&self) -> bool {
        !matches!(self, DispatchError::Usage { .. })
    }

    /// Get a static error code string for logging.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::NotMapInvocable(_) => "not_map_invocable",
            Self::MapOnly(_) => "map_only",
            Self::AccessDenied(_) => "access_denied",
            Self::Usage { .. } => "usage",
            Self::Parse(_) => "parse_error",
        }
    }
}

/// Errors raised by script storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' was not found in any search path")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_messages() {
        assert_eq!(
            DispatchError::UnknownCommand("foo".into()).to_string(),
            "No such command: foo."
        );
        assert_eq!(
            DispatchError::AccessDenied("kick".into()).to_string(),
            "Access for command kick denied."
        );
        let usage = DispatchError::Usage {
            name: "kick".into(),
            params: "v[id] ?r[reason]".into(),
            source: ValidationError::MissingArgument { index: 0 },
        };
        assert_eq!(usage.to_string(), "Invalid arguments... Usage: kick v[id] ?r[reason]");
    }

    #[test]
    fn test_press_only() {
        assert!(DispatchError::UnknownCommand("x".into()).press_only());
        assert!(DispatchError::MapOnly("x".into()).press_only());
        assert!(
            !DispatchError::Usage {
                name: "x".into(),
                params: "i".into(),
                source: ValidationError::UnterminatedQuote,
            }
            .press_only()
        );
    }
}
