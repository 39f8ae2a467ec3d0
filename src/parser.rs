//! Recursive descent parser for ISO/IEC 14977 EBNF (sections 4.3 to 4.13).
//!
//! Every production point either finds what it expects or aborts the
//! whole parse with a [`SyntaxError`]. There is no error recovery.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::syntax::{
    Definition, DefinitionList, Rule, SingleDefinition, Syntax, SyntacticFactor, SyntacticTerm,
};
use crate::token::{TokenKind, TokenStream};
use crate::utils::{SyntaxError, SyntaxErrorKind};

type ParseResult<T> = std::result::Result<T, SyntaxError>;

const TERMINATORS: [&str; 2] = [";", "."];
const DEFINITION_SEPARATORS: [&str; 3] = ["|", "/", "!"];

const OPTIONAL_START: [&str; 2] = ["[", "(/"];
const OPTIONAL_END: [&str; 2] = ["]", "/)"];
const REPEATED_START: [&str; 2] = ["{", "(:"];
const REPEATED_END: [&str; 2] = ["}", ":)"];
const GROUP_START: [&str; 1] = ["("];
const GROUP_END: [&str; 1] = [")"];

/// Deepest bracket nesting accepted before the parse is abandoned
pub const MAX_NESTING: usize = 128;

pub struct Parser<'a> {
    source: &'a mut dyn TokenStream,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a mut dyn TokenStream) -> Self {
        Parser { source, nesting: 0 }
    }

    /// Parse rules until the end of input.
    ///
    /// Fails at the second occurrence of a rule name that is defined twice.
    pub fn parse(&mut self) -> ParseResult<Syntax> {
        let mut rules = Vec::new();
        let mut names = HashSet::new();

        while !self.source.end_of_input() {
            let rule = self.rule()?;
            if !names.insert(rule.name.clone()) {
                return Err(SyntaxError::new(
                    rule.defined_at,
                    SyntaxErrorKind::Redefined(rule.name),
                ));
            }

            debug!(rule = %rule.name, branches = rule.branches.len(), "parsed rule");
            rules.push(rule);
        }

        Ok(Syntax::new(rules))
    }

    /// Consume the next token, requiring its text to be one of `symbols`
    fn expect(&mut self, symbols: &[&str], what: &str) -> ParseResult<()> {
        let token = self.source.next();
        if token.kind == TokenKind::Symbol && token.is_one_of(symbols) {
            Ok(())
        } else {
            Err(SyntaxError::expected(token.position, what))
        }
    }

    fn look_ahead_is(&self, symbols: &[&str]) -> bool {
        let token = self.source.look_ahead();
        token.kind == TokenKind::Symbol && token.is_one_of(symbols)
    }

    // rule = meta identifier, '=', definition list, (';' | '.') ;
    fn rule(&mut self) -> ParseResult<Rule> {
        let identifier = self.source.next();
        if identifier.kind != TokenKind::MetaIdentifier {
            return Err(SyntaxError::expected(identifier.position, "a meta identifier"));
        }

        self.expect(&["="], "'='")?;
        let branches = self.definition_list()?;
        self.expect(&TERMINATORS, "';' or '.'")?;

        Ok(Rule {
            name: identifier.text,
            defined_at: identifier.position,
            branches,
        })
    }

    // definition list = single definition, { ('|' | '/' | '!'), single definition } ;
    fn definition_list(&mut self) -> ParseResult<DefinitionList> {
        let mut list = vec![self.single_definition()?];

        while self.look_ahead_is(&DEFINITION_SEPARATORS) {
            self.source.next();
            list.push(self.single_definition()?);
        }

        Ok(list)
    }

    // single definition = syntactic term, { ',', syntactic term } ;
    fn single_definition(&mut self) -> ParseResult<SingleDefinition> {
        let mut terms = vec![self.syntactic_term()?];

        while self.look_ahead_is(&[","]) {
            self.source.next();
            terms.push(self.syntactic_term()?);
        }

        Ok(SingleDefinition { terms })
    }

    // syntactic term = syntactic factor, [ '-', syntactic exception ] ;
    fn syntactic_term(&mut self) -> ParseResult<SyntacticTerm> {
        let factor = self.syntactic_factor()?;

        let exception = if self.look_ahead_is(&["-"]) {
            self.source.next();
            Some(self.syntactic_exception()?)
        } else {
            None
        };

        Ok(SyntacticTerm { factor, exception })
    }

    /// An exception operand may only hold literal material, never a rule reference.
    fn syntactic_exception(&mut self) -> ParseResult<SyntacticFactor> {
        let factor = self.syntactic_factor()?;

        if let Some((name, position)) = factor.find_reference() {
            return Err(SyntaxError::new(
                position,
                SyntaxErrorKind::ReferenceInException(name.to_string()),
            ));
        }

        Ok(factor)
    }

    // syntactic factor = [ integer, '*' ], syntactic primary ;
    fn syntactic_factor(&mut self) -> ParseResult<SyntacticFactor> {
        if self.source.look_ahead().kind != TokenKind::Integer {
            return Ok(SyntacticFactor::new(self.syntactic_primary()?, None));
        }

        let token = self.source.next();
        let repetitions = token.text.parse::<u32>().map_err(|_| {
            SyntaxError::new(token.position, SyntaxErrorKind::InvalidInteger(token.text.clone()))
        })?;
        self.expect(&["*"], "repetition symbol (*)")?;

        Ok(SyntacticFactor::new(
            self.syntactic_primary()?,
            Some(repetitions),
        ))
    }

    fn syntactic_primary(&mut self) -> ParseResult<Definition> {
        let token = self.source.look_ahead().clone();

        let definition = match token.kind {
            TokenKind::MetaIdentifier => Definition::MetaIdentifier {
                name: token.text,
                position: token.position,
            },
            TokenKind::TerminalString => Definition::TerminalString(token.text),
            TokenKind::SpecialSequence => Definition::SpecialSequence {
                text: token.text,
                position: token.position,
            },
            TokenKind::Symbol if token.is_one_of(&OPTIONAL_START) => {
                let branches =
                    self.sequence(&OPTIONAL_START, &OPTIONAL_END, "optional sequence")?;
                return Ok(Definition::OptionalSequence(branches));
            }
            TokenKind::Symbol if token.is_one_of(&REPEATED_START) => {
                let branches =
                    self.sequence(&REPEATED_START, &REPEATED_END, "repeat sequence")?;
                return Ok(Definition::RepeatedSequence(branches));
            }
            TokenKind::Symbol if token.is_one_of(&GROUP_START) => {
                let branches = self.sequence(&GROUP_START, &GROUP_END, "group sequence")?;
                return Ok(Definition::GroupedSequence(branches));
            }
            // The terminator belongs to the rule, so it is left in the stream
            TokenKind::Symbol if token.is_one_of(&TERMINATORS) => {
                trace!(position = %token.position, "empty sequence");
                return Ok(Definition::EmptySequence);
            }
            _ => {
                return Err(SyntaxError::expected(
                    token.position,
                    "a syntactic primary",
                ));
            }
        };

        self.source.next();
        Ok(definition)
    }

    /// A bracketed definition list holding at least one primary
    fn sequence(
        &mut self,
        start: &[&str],
        end: &[&str],
        what: &str,
    ) -> ParseResult<DefinitionList> {
        let token = self.source.next();
        if !token.is_one_of(start) {
            return Err(SyntaxError::expected(
                token.position,
                format!("{} start symbol", what),
            ));
        }

        if self.nesting >= MAX_NESTING {
            return Err(SyntaxError::new(
                token.position,
                SyntaxErrorKind::NestingTooDeep(MAX_NESTING),
            ));
        }

        self.nesting += 1;
        let branches = self.bracketed(end, what);
        self.nesting -= 1;
        branches
    }

    fn bracketed(&mut self, end: &[&str], what: &str) -> ParseResult<DefinitionList> {
        if self.look_ahead_is(end) {
            return Err(SyntaxError::new(
                self.source.look_ahead().position,
                SyntaxErrorKind::EmptySequence,
            ));
        }

        let branches = self.definition_list()?;

        let token = self.source.next();
        if !token.is_one_of(end) {
            return Err(SyntaxError::expected(
                token.position,
                format!("{} end symbol", what),
            ));
        }

        Ok(branches)
    }
}
