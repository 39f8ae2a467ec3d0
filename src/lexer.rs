//! Character-level scanning of ISO/IEC 14977 EBNF source into tokens.

use crate::token::{Position, Token, TokenKind};
use crate::utils::{SyntaxError, SyntaxErrorKind};

/// Symbols made of two characters. Checked before the single-character ones.
const DOUBLE_SYMBOLS: [&str; 4] = ["(/", "/)", "(:", ":)"];

const SINGLE_SYMBOLS: [char; 15] = [
    '=', ';', '.', '|', '/', '!', ',', '-', '*', '(', ')', '[', ']', '{', '}',
];

/// Tokenizer for EBNF grammars.
///
/// Comments `(* ... *)` may nest and are skipped along with whitespace.
/// Meta identifiers may contain single inner spaces (`meta identifier`),
/// which are normalised to one space between words.
pub struct Lexer {
    chars: Vec<char>,
    current_pos: usize,
    position: Position,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            current_pos: 0,
            position: Position::default(),
        }
    }

    /// Tokenize the whole input. The last token is always `EndOfInput`.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::EndOfInput;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current_pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.current_pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.current_pos += 1;
        self.position.advance(c);
        Some(c)
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_trivia()?;

        let start = self.position;
        let Some(c) = self.peek() else {
            return Ok(Token::end_of_input(start));
        };

        if c.is_ascii_alphabetic() {
            return Ok(self.meta_identifier(start));
        }
        if c.is_ascii_digit() {
            let mut text = String::new();
            while let Some(d) = self.peek().filter(|d| d.is_ascii_digit()) {
                text.push(d);
                self.bump();
            }
            return Ok(Token::new(text, TokenKind::Integer, start));
        }
        if c == '\'' || c == '"' {
            let text = self.quoted(c, "terminal string")?;
            return Ok(Token::new(text, TokenKind::TerminalString, start));
        }
        if c == '?' {
            let text = self.quoted('?', "special sequence")?;
            return Ok(Token::new(text, TokenKind::SpecialSequence, start));
        }

        if let Some(symbol) = DOUBLE_SYMBOLS.iter().find(|s| self.starts_with(s)) {
            self.bump();
            self.bump();
            return Ok(Token::new(*symbol, TokenKind::Symbol, start));
        }
        if SINGLE_SYMBOLS.contains(&c) {
            self.bump();
            return Ok(Token::new(c.to_string(), TokenKind::Symbol, start));
        }

        Err(SyntaxError::new(
            start,
            SyntaxErrorKind::UnexpectedCharacter(c),
        ))
    }

    /// Skip whitespace and (nested) comments
    fn skip_trivia(&mut self) -> Result<(), SyntaxError> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }

            if !self.starts_with("(*") {
                return Ok(());
            }

            let start = self.position;
            let mut depth = 0usize;
            loop {
                if self.starts_with("(*") {
                    self.bump();
                    self.bump();
                    depth += 1;
                } else if self.starts_with("*)") {
                    self.bump();
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else if self.bump().is_none() {
                    return Err(SyntaxError::new(
                        start,
                        SyntaxErrorKind::Unterminated("comment"),
                    ));
                }
            }
        }
    }

    fn meta_identifier(&mut self, start: Position) -> Token {
        let mut name = String::new();

        loop {
            while let Some(c) = self
                .peek()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            {
                name.push(c);
                self.bump();
            }

            // Words separated by spaces or tabs (never newlines) form one identifier
            let mut gap = 0;
            while matches!(self.peek_at(gap), Some(' ') | Some('\t')) {
                gap += 1;
            }
            let continues = gap > 0
                && self
                    .peek_at(gap)
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
            if !continues {
                break;
            }

            for _ in 0..gap {
                self.bump();
            }
            name.push(' ');
        }

        Token::new(name, TokenKind::MetaIdentifier, start)
    }

    /// Read text up to the matching `delimiter`, returning it without the delimiters
    fn quoted(&mut self, delimiter: char, what: &'static str) -> Result<String, SyntaxError> {
        let start = self.position;
        self.bump();

        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == delimiter => return Ok(text),
                Some(c) => text.push(c),
                None => {
                    return Err(SyntaxError::new(
                        start,
                        SyntaxErrorKind::Unterminated(what),
                    ));
                }
            }
        }
    }
}
