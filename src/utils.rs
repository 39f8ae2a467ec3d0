use std::fmt;
use std::io;
use thiserror::Error;

use crate::token::Position;

/// Custom error types for grammar parsing and string generation
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Undefined rule '{name}' referenced at {position}")]
    UndefinedRule { name: String, position: Position },

    #[error("No special sequence provider accepts ?{text}? at {position}")]
    UnresolvedSpecialSequence { text: String, position: Position },

    #[error("Expansion of rule '{rule}' exceeded the maximum depth of {depth}")]
    RecursionLimit { rule: String, depth: usize },

    #[error("Expansion produced more than {limit} strings")]
    OutputLimit { limit: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// A grammar-syntax violation found while tokenizing or parsing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{position}: {kind}")]
pub struct SyntaxError {
    pub position: Position,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(position: Position, kind: SyntaxErrorKind) -> Self {
        SyntaxError { position, kind }
    }

    /// Shorthand for an expected-symbol mismatch.
    pub fn expected(position: Position, what: impl Into<String>) -> Self {
        SyntaxError::new(position, SyntaxErrorKind::Expected(what.into()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxErrorKind {
    /// An expected symbol or symbol class is absent
    Expected(String),
    /// A rule name is defined a second time
    Redefined(String),
    /// A meta identifier appears inside an exception operand
    ReferenceInException(String),
    /// A bracketed sequence has nothing inside it
    EmptySequence,
    /// A string, special sequence or comment is never closed
    Unterminated(&'static str),
    UnexpectedCharacter(char),
    /// A repetition count that does not fit a `u32`
    InvalidInteger(String),
    /// Brackets nested deeper than the parser accepts
    NestingTooDeep(usize),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::Expected(what) => write!(f, "Expected {}.", what),
            SyntaxErrorKind::Redefined(name) => write!(f, "Rule '{}' is redefined.", name),
            SyntaxErrorKind::ReferenceInException(name) => {
                write!(f, "Rule '{}' referenced in exception.", name)
            }
            SyntaxErrorKind::EmptySequence => {
                write!(f, "The sequence must contain at least 1 syntactic primary.")
            }
            SyntaxErrorKind::Unterminated(what) => write!(f, "Unterminated {}.", what),
            SyntaxErrorKind::UnexpectedCharacter(c) => write!(f, "Unexpected character {:?}.", c),
            SyntaxErrorKind::InvalidInteger(text) => {
                write!(f, "Invalid repetition count '{}'.", text)
            }
            SyntaxErrorKind::NestingTooDeep(limit) => {
                write!(f, "Brackets are nested deeper than {} levels.", limit)
            }
        }
    }
}
