//! The parsed form of an EBNF grammar.
//!
//! A [`Syntax`] is built once by the parser and never mutated afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::token::{Position, TokenBuffer};
use crate::utils::{GrammarError, Result};

/// Index of a rule within its [`Syntax`], assigned in definition order
pub type RuleId = usize;

/// A complete grammar: an ordered collection of uniquely named rules
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
}

impl Syntax {
    /// Build a syntax from rules whose names are already known to be unique.
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        let index = rules
            .iter()
            .enumerate()
            .map(|(id, rule)| (rule.name.clone(), id))
            .collect();
        Syntax { rules, index }
    }

    /// Parse a grammar from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        source.parse()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rule_index(name).map(|id| &self.rules[id])
    }

    pub fn rule_index(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for Syntax {
    type Err = GrammarError;

    /// Parse a grammar from EBNF text
    fn from_str(source: &str) -> Result<Self> {
        let tokens = Lexer::tokenize(source)?;
        let mut stream = TokenBuffer::new(tokens);
        Ok(Parser::new(&mut stream).parse()?)
    }
}

/// A named production
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub defined_at: Position,
    pub branches: DefinitionList,
}

/// Alternatives; each branch contributes its strings to the union.
pub type DefinitionList = Vec<SingleDefinition>;

/// Terms that are concatenated in order
#[derive(Debug, Clone, PartialEq)]
pub struct SingleDefinition {
    pub terms: Vec<SyntacticTerm>,
}

/// A factor, optionally narrowed by an exception (`factor - exception`)
#[derive(Debug, Clone, PartialEq)]
pub struct SyntacticTerm {
    pub factor: SyntacticFactor,
    pub exception: Option<SyntacticFactor>,
}

/// A primary repeated a fixed number of times (`3 * primary`)
#[derive(Debug, Clone, PartialEq)]
pub struct SyntacticFactor {
    pub primary: Definition,
    /// `None` when no repetition prefix was written
    pub repeat_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// A reference to another rule
    MetaIdentifier { name: String, position: Position },
    TerminalString(String),
    /// The text between the `?` marks, whitespace included
    SpecialSequence { text: String, position: Position },
    EmptySequence,
    GroupedSequence(DefinitionList),
    OptionalSequence(DefinitionList),
    RepeatedSequence(DefinitionList),
}

impl SyntacticFactor {
    pub fn new(primary: Definition, repeat_count: Option<u32>) -> Self {
        SyntacticFactor {
            primary,
            repeat_count,
        }
    }

    /// First rule reference anywhere below this factor, as `(name, position)`
    pub fn find_reference(&self) -> Option<(&str, Position)> {
        match &self.primary {
            Definition::MetaIdentifier { name, position } => Some((name.as_str(), *position)),
            Definition::GroupedSequence(branches)
            | Definition::OptionalSequence(branches)
            | Definition::RepeatedSequence(branches) => {
                branches.iter().flat_map(|b| &b.terms).find_map(|term| {
                    term.factor
                        .find_reference()
                        .or_else(|| term.exception.as_ref()?.find_reference())
                })
            }
            Definition::TerminalString(_)
            | Definition::SpecialSequence { .. }
            | Definition::EmptySequence => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(text: &str) -> SyntacticFactor {
        SyntacticFactor::new(Definition::TerminalString(text.to_string()), None)
    }

    fn single(factor: SyntacticFactor) -> SingleDefinition {
        SingleDefinition {
            terms: vec![SyntacticTerm {
                factor,
                exception: None,
            }],
        }
    }

    #[test]
    fn test_find_reference_in_nested_group() {
        let reference = SyntacticFactor::new(
            Definition::MetaIdentifier {
                name: "digit".to_string(),
                position: Position::new(1, 12, 11),
            },
            None,
        );
        let factor = SyntacticFactor::new(
            Definition::GroupedSequence(vec![
                single(terminal("a")),
                single(SyntacticFactor::new(
                    Definition::OptionalSequence(vec![single(reference)]),
                    None,
                )),
            ]),
            Some(2),
        );

        assert_eq!(factor.find_reference(), Some(("digit", Position::new(1, 12, 11))));
    }

    #[test]
    fn test_find_reference_in_nested_exception() {
        let reference = SyntacticFactor::new(
            Definition::MetaIdentifier {
                name: "other".to_string(),
                position: Position::new(1, 18, 17),
            },
            None,
        );
        let factor = SyntacticFactor::new(
            Definition::GroupedSequence(vec![SingleDefinition {
                terms: vec![SyntacticTerm {
                    factor: terminal("y"),
                    exception: Some(reference),
                }],
            }]),
            None,
        );

        assert_eq!(factor.find_reference(), Some(("other", Position::new(1, 18, 17))));
    }

    #[test]
    fn test_find_reference_literal_only() {
        let factor = SyntacticFactor::new(
            Definition::RepeatedSequence(vec![single(terminal("a")), single(terminal("b"))]),
            None,
        );
        assert_eq!(factor.find_reference(), None);
    }

    #[test]
    fn test_rule_lookup() {
        let syntax = Syntax::new(vec![
            Rule {
                name: "syntax".to_string(),
                defined_at: Position::default(),
                branches: vec![single(terminal("x"))],
            },
            Rule {
                name: "other".to_string(),
                defined_at: Position::new(2, 1, 14),
                branches: vec![],
            },
        ]);

        assert_eq!(syntax.len(), 2);
        assert!(!syntax.is_empty());
        assert!(Syntax::new(Vec::new()).is_empty());
        assert_eq!(syntax.rule_index("other"), Some(1));
        assert_eq!(syntax.rule("other").map(|r| r.defined_at), Some(Position::new(2, 1, 14)));
        assert!(syntax.rule("missing").is_none());
    }
}
