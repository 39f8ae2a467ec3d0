use std::fmt;

/// Location of a token in the grammar source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub column: usize,
    /// Character offset from the start of the input, starting at 0
    pub index: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, index: usize) -> Self {
        Position {
            line,
            column,
            index,
        }
    }

    /// Move past `c`, wrapping to the next line on '\n'
    pub fn advance(&mut self, c: char) {
        self.index += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Classes of tokens the parser distinguishes.
///
/// Punctuation such as `=` or `(/` is not split into separate kinds; the
/// parser compares the token text directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    MetaIdentifier,
    TerminalString,
    SpecialSequence,
    Integer,
    Symbol,
    EndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, position: Position) -> Self {
        Token {
            text: text.into(),
            kind,
            position,
        }
    }

    pub fn end_of_input(position: Position) -> Self {
        Token::new("", TokenKind::EndOfInput, position)
    }

    /// Whether this token's text equals any of `symbols`
    pub fn is_one_of(&self, symbols: &[&str]) -> bool {
        symbols.iter().any(|s| self.text == *s)
    }
}

/// A lookahead(1) stream of tokens.
///
/// Once the real tokens are exhausted the stream keeps returning an
/// `EndOfInput` token.
pub trait TokenStream {
    /// The next token, without consuming it
    fn look_ahead(&self) -> &Token;

    /// Consume and return the next token
    fn next(&mut self) -> Token;

    fn end_of_input(&self) -> bool {
        self.look_ahead().kind == TokenKind::EndOfInput
    }

    /// Test the token `offset` places ahead of the current one
    fn peek_is(&self, offset: usize, predicate: &dyn Fn(&Token) -> bool) -> bool;
}

/// A `TokenStream` over an already tokenized input.
#[derive(Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    cursor: usize,
    end: Token,
}

impl TokenBuffer {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let end = match tokens.last() {
            Some(last) if last.kind == TokenKind::EndOfInput => last.clone(),
            Some(last) => Token::end_of_input(last.position),
            None => Token::end_of_input(Position::default()),
        };
        tokens.retain(|t| t.kind != TokenKind::EndOfInput);

        TokenBuffer {
            tokens,
            cursor: 0,
            end,
        }
    }

    /// Number of tokens not yet consumed
    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.cursor
    }
}

impl TokenStream for TokenBuffer {
    fn look_ahead(&self) -> &Token {
        self.tokens.get(self.cursor).unwrap_or(&self.end)
    }

    fn next(&mut self) -> Token {
        let token = self.look_ahead().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn peek_is(&self, offset: usize, predicate: &dyn Fn(&Token) -> bool) -> bool {
        predicate(self.tokens.get(self.cursor + offset).unwrap_or(&self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(text: &str, index: usize) -> Token {
        Token::new(text, TokenKind::Symbol, Position::new(1, index + 1, index))
    }

    #[test]
    fn test_position_advance() {
        let mut position = Position::default();
        for c in "ab\nc".chars() {
            position.advance(c);
        }
        assert_eq!(position, Position::new(2, 2, 4));
        assert_eq!(position.to_string(), "2:2");
    }

    #[test]
    fn test_buffer_yields_end_of_input_forever() {
        let mut stream = TokenBuffer::new(vec![symbol("=", 0), symbol(";", 2)]);

        assert!(!stream.end_of_input());
        assert_eq!(stream.next().text, "=");
        assert_eq!(stream.look_ahead().text, ";");
        assert_eq!(stream.next().text, ";");
        assert!(stream.end_of_input());
        assert_eq!(stream.next().kind, TokenKind::EndOfInput);
        assert_eq!(stream.next().kind, TokenKind::EndOfInput);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_peek_is() {
        let stream = TokenBuffer::new(vec![symbol("(", 0), symbol(")", 1)]);

        assert!(stream.peek_is(0, &|t| t.text == "("));
        assert!(stream.peek_is(1, &|t| t.text == ")"));
        assert!(stream.peek_is(5, &|t| t.kind == TokenKind::EndOfInput));
    }

    #[test]
    fn test_is_one_of() {
        let token = symbol(".", 0);
        assert!(token.is_one_of(&[";", "."]));
        assert!(!token.is_one_of(&["|", "/", "!"]));
    }
}
