//! EBNF-Fuzz parses grammars written in ISO/IEC 14977 EBNF and enumerates
//! the strings they accept.
//!
//! The generated strings are meant as test input for a parser of the language
//! the grammar describes: every string must be accepted by a conforming parser.
//! Open-ended `{ ... }` repetition is explored only up to a configurable bound,
//! so the enumeration is exhaustive for everything except repetition.
//!
//! # Example
//!
//! ```rust
//! use ebnf_fuzz::{FuzzyGenerator, Syntax};
//!
//! let syntax: Syntax = "syntax = 'a', ['b' | 'c'], 'd' ;".parse().unwrap();
//!
//! let mut strings = FuzzyGenerator::new().generate(&syntax).unwrap();
//! strings.sort();
//! assert_eq!(strings, vec!["abd", "acd", "ad"]);
//! ```

pub mod generator;
pub mod lexer;
pub mod parser;
pub mod special;
pub mod syntax;
pub mod token;
pub mod utils;

pub use generator::{FuzzyGenerator, FuzzyGeneratorBuilder, GeneratorConfig};
pub use special::{ProviderRegistry, SpecialSequenceProvider};
pub use syntax::{Definition, Rule, Syntax};
pub use token::{Position, Token, TokenKind, TokenStream};
pub use utils::{GrammarError, Result, SyntaxError, SyntaxErrorKind};

/// Parse a grammar from an already tokenized stream
pub fn parse(tokens: &mut dyn TokenStream) -> Result<Syntax> {
    Ok(parser::Parser::new(tokens).parse()?)
}

/// Parse a grammar from EBNF text
pub fn parse_str(source: &str) -> Result<Syntax> {
    source.parse()
}
