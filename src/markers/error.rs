//! Marker error taxonomy
//!
//! Every failure the engine can report lives in [`MarkerError`]. Messages
//! always carry enough location context (file, line, marker method) to find
//! the offending annotation.

use thiserror::Error;

use crate::markers::position::Position;

/// Result alias used throughout the marker engine
pub type Result<T, E = MarkerError> = std::result::Result<T, E>;

/// Errors produced while extracting, resolving or dispatching markers
#[derive(Debug, Error)]
pub enum MarkerError {
    /// The source file could not be read
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The marker body is not an identifier or call expression
    #[error("{file}:{line}: invalid marker `{body}`: {reason}")]
    Syntax {
        file: String,
        line: usize,
        body: String,
        reason: String,
    },

    /// An anchor name was declared more than once (non-fatal)
    #[error("anchor {name} already exists at {existing}, found {duplicate}")]
    DuplicateAnchor {
        name: String,
        existing: Position,
        duplicate: Position,
    },

    /// An identifier used as a position is not a declared anchor
    #[error("cannot find anchor {name} for {marker}")]
    UnknownAnchor { name: String, marker: String },

    /// A literal or regex pattern does not occur on the marker's line
    #[error("pattern {pattern} was not present in line {location}")]
    PatternNotFound { pattern: String, location: String },

    /// A backtick pattern failed to compile
    #[error("{location}: invalid pattern {pattern}: {source}")]
    InvalidPattern {
        pattern: String,
        location: String,
        #[source]
        source: regex::Error,
    },

    /// The argument shape cannot be turned into a position
    #[error("cannot convert {arg} to position for {marker}")]
    NotAPosition { arg: String, marker: String },

    /// The argument shape does not match the declared parameter kind
    #[error("cannot convert {arg} to {expected} for {marker}")]
    TypeMismatch {
        arg: String,
        expected: &'static str,
        marker: String,
    },

    /// An integer literal does not fit the parameter type
    #[error("cannot convert {arg} to int for {marker}: {source}")]
    InvalidInt {
        arg: String,
        marker: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// A converter ran out of argument expressions
    #[error("missing argument for {marker}")]
    MissingArgument { marker: String },

    /// Arguments remained after every converter ran
    #[error("unwanted args got {args} extra to {marker}")]
    UnwantedArguments { args: String, marker: String },

    /// A handler declared a parameter kind no converter exists for
    #[error("handler param has invalid type {0}")]
    UnsupportedParam(String),

    /// The anchor pass failed on an earlier request and is not rerun
    #[error("anchor table incomplete: {message}")]
    IncompleteAnchors { code: &'static str, message: String },

    /// A handler returned its own failure
    #[error("{marker}: {message}")]
    Handler { marker: String, message: String },
}

impl MarkerError {
    /// Stable code used when rendering the error as a result item
    pub fn code(&self) -> &'static str {
        match self {
            MarkerError::Read { .. } => "READ_ERROR",
            MarkerError::Syntax { .. } => "SYNTAX_ERROR",
            MarkerError::DuplicateAnchor { .. } => "DUPLICATE_ANCHOR",
            MarkerError::UnknownAnchor { .. }
            | MarkerError::PatternNotFound { .. }
            | MarkerError::InvalidPattern { .. } => "UNRESOLVED",
            MarkerError::NotAPosition { .. }
            | MarkerError::TypeMismatch { .. }
            | MarkerError::InvalidInt { .. }
            | MarkerError::MissingArgument { .. }
            | MarkerError::UnwantedArguments { .. } => "BAD_ARGUMENTS",
            MarkerError::UnsupportedParam(_) => "UNSUPPORTED_PARAM",
            MarkerError::Handler { .. } => "HANDLER_ERROR",
            MarkerError::IncompleteAnchors { code, .. } => *code,
        }
    }

    /// File and line the error points at, where it carries one
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            MarkerError::Syntax { file, line, .. } => Some((file.as_str(), *line)),
            MarkerError::DuplicateAnchor { duplicate, .. } => {
                Some((duplicate.filename.as_str(), duplicate.line))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_group_resolution_errors() {
        let err = MarkerError::UnknownAnchor {
            name: "Missing".to_string(),
            marker: "check@a.go:3".to_string(),
        };
        assert_eq!(err.code(), "UNRESOLVED");
        assert_eq!(err.to_string(), "cannot find anchor Missing for check@a.go:3");
    }

    #[test]
    fn test_syntax_location() {
        let err = MarkerError::Syntax {
            file: "a.go".to_string(),
            line: 4,
            body: "1".to_string(),
            reason: "expected identifier or call".to_string(),
        };
        assert_eq!(err.location(), Some(("a.go", 4)));
        assert!(err.to_string().starts_with("a.go:4: invalid marker `1`"));
    }

    #[test]
    fn test_incomplete_anchors_keeps_original_code() {
        let err = MarkerError::IncompleteAnchors {
            code: "UNRESOLVED",
            message: "pattern absent was not present in line a.go:3".to_string(),
        };
        assert_eq!(err.code(), "UNRESOLVED");
        assert!(err.to_string().starts_with("anchor table incomplete: pattern absent"));
    }

    #[test]
    fn test_unsupported_param_message() {
        let err = MarkerError::UnsupportedParam("float".to_string());
        assert_eq!(err.code(), "UNSUPPORTED_PARAM");
        assert!(err.to_string().contains("float"));
    }
}
