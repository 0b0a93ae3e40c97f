//! General error types for the decoder

use std::fmt::{Display, Formatter};
use std::ops::Deref;

use crate::coords::Coords;

/// Result type used by the individual lexer and parser stages
pub type ParserResult<T> = Result<T, Error>;

/// Result type returned by every decode operation
pub type DecodeResult<T> = Result<T, Errors>;

/// Enumeration of the various different decoder stages that can produce an error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Reading the raw input
    Input,
    /// The lexer stage
    Lexer,
    /// The parsing/value tree construction stage
    Parser,
    /// Decoding of the canonical bytes into the caller's target type
    Bridge,
    /// A broken internal invariant or misuse of the decoder, never caused by malformed input
    Internal,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Input => write!(f, "input"),
            Stage::Lexer => write!(f, "lexer"),
            Stage::Parser => write!(f, "parser"),
            Stage::Bridge => write!(f, "bridge"),
            Stage::Internal => write!(f, "internal"),
        }
    }
}

/// A global enumeration of error details
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Details {
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated raw string literal")]
    UnterminatedRawString,
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscapeSequence(char),
    #[error("invalid unicode escape sequence '\\u{0}'")]
    InvalidUnicodeEscapeSequence(String),
    #[error("invalid numeric literal '{0}'")]
    InvalidNumericRepresentation(String),
    #[error("input is not valid utf-8")]
    NonUtf8InputDetected,
    #[error("input is not valid ascii")]
    NonAsciiInputDetected,
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEndOfInput(&'static str),
    #[error("arrays and objects nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("expected end of input, found {0}")]
    TrailingContent(String),
    #[error("{0}")]
    Bridge(String),
    #[error("token scan started on whitespace {0:?}")]
    WhitespaceAtTokenStart(char),
    #[error("no value could be parsed")]
    MissingValue,
    #[error("decoder has already failed and cannot continue")]
    DecoderErrored,
    #[error("unable to read input file: {0}")]
    InvalidFile(String),
    #[error("unable to read input: {0}")]
    ReadFailure(String),
    #[error("unable to render canonical json: {0}")]
    CanonicalRender(String),
}

/// The general error structure
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// The originating stage for the error
    pub stage: Stage,
    /// The details of the error
    pub details: Details,
    /// Optional input coordinates
    pub coords: Option<Coords>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.coords {
            Some(coords) => write!(f, "{} error at {}: {}", self.stage, coords, self.details),
            None => write!(f, "{} error: {}", self.stage, self.details),
        }
    }
}

impl std::error::Error for Error {}

/// A non-empty, ordered list of [Error]s produced by a single decode call
#[derive(Debug, Clone, PartialEq)]
pub struct Errors(Vec<Error>);

impl Errors {
    /// Wrap a list of errors. Returns [None] if the list is empty
    pub fn new(errors: Vec<Error>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Errors(errors))
        }
    }

    /// The first (earliest) error in the list
    pub fn first(&self) -> &Error {
        &self.0[0]
    }
}

impl From<Error> for Errors {
    fn from(value: Error) -> Self {
        Errors(vec![value])
    }
}

impl Deref for Errors {
    type Target = [Error];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Errors {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, err) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

#[macro_export]
macro_rules! lexer_error {
    ($details: expr, $coords: expr) => {
        $crate::errors::Error {
            stage: $crate::errors::Stage::Lexer,
            details: $details,
            coords: Some($coords),
        }
    };
}

#[macro_export]
macro_rules! parser_error {
    ($details: expr, $coords: expr) => {
        $crate::errors::Error {
            stage: $crate::errors::Stage::Parser,
            details: $details,
            coords: Some($coords),
        }
    };
}

#[macro_export]
macro_rules! internal_error {
    ($details: expr, $coords: expr) => {
        $crate::errors::Error {
            stage: $crate::errors::Stage::Internal,
            details: $details,
            coords: Some($coords),
        }
    };
    ($details: expr) => {
        $crate::errors::Error {
            stage: $crate::errors::Stage::Internal,
            details: $details,
            coords: None,
        }
    };
}
