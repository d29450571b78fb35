use cursor::{Cursor, Line};
use errors::{Location, SyntaxError};

pub mod token;
pub use token::{Literal, Token, TokenData, TokenType};
use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
    #[error("Unterminated block comment.")]
    UnterminatedBlockComment,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
}

impl From<ScanError> for SyntaxError {
    fn from(e: ScanError) -> Self {
        SyntaxError::new(e.line, Location::Nowhere, e.error)
    }
}

/// Turns source text into tokens, one at a time.
///
/// Errors don't stop the scanner: the offending input is skipped, the error is yielded in place
/// of a token, and scanning resumes right after it. The last item is always an [`Eof`] token.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), finished: false }
    }

    fn make_token(&self, data: TokenData<'a>, start: usize) -> Token<'a> {
        Token::new(data, self.cursor.slice_from(start), self.cursor.line())
    }

    fn error(&self, error: ScanErrorType) -> ScanError {
        ScanError { error, line: self.cursor.line() }
    }

    fn either(&mut self, expected: char, matched: TokenData<'a>, otherwise: TokenData<'a>) -> TokenData<'a> {
        if self.cursor.eat(expected) {
            matched
        } else {
            otherwise
        }
    }

    /// Scans the token starting with `c`. `None` means the input was skipped (whitespace or a comment).
    fn scan_token(&mut self, c: char, start: usize) -> Option<Result<Token<'a>, ScanError>> {
        let data = match c {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            ',' => Comma,
            '.' => Dot,
            '-' => Minus,
            '+' => Plus,
            ';' => Semicolon,
            '*' => Star,

            '!' => self.either('=', BangEqual, Bang),
            '=' => self.either('=', EqualEqual, Equal),
            '<' => self.either('=', LessEqual, Less),
            '>' => self.either('=', GreaterEqual, Greater),

            '/' if self.cursor.eat('/') => {
                self.cursor.eat_while(|c| c != '\n');
                return None;
            }
            '/' if self.cursor.eat('*') => return self.block_comment().err().map(Err),
            '/' => Slash,

            ' ' | '\r' | '\t' | '\n' => return None,

            '"' => return Some(self.string(start)),
            d if d.is_ascii_digit() => self.number(start),
            a if is_alpha(a) => self.identifier(start),

            c => return Some(Err(self.error(ScanErrorType::UnexpectedCharacter(c)))),
        };
        Some(Ok(self.make_token(data, start)))
    }

    fn block_comment(&mut self) -> Result<(), ScanError> {
        loop {
            match self.cursor.next() {
                Some('*') if self.cursor.eat('/') => return Ok(()),
                Some(_) => (),
                None => return Err(self.error(ScanErrorType::UnterminatedBlockComment)),
            }
        }
    }

    fn string(&mut self, start: usize) -> Result<Token<'a>, ScanError> {
        self.cursor.eat_while(|c| c != '"');
        if !self.cursor.eat('"') {
            return Err(self.error(ScanErrorType::UnterminatedString));
        }

        let lexeme = self.cursor.slice_from(start);
        Ok(self.make_token(Str(&lexeme[1..lexeme.len() - 1]), start))
    }

    fn number(&mut self, start: usize) -> TokenData<'a> {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        // A trailing '.' without digits after it is not part of the number
        if self.cursor.peek() == Some('.') && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.next();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        Number(self.cursor.slice_from(start).parse().expect("digits with an optional fraction are valid f64"))
    }

    fn identifier(&mut self, start: usize) -> TokenData<'a> {
        self.cursor.eat_while(is_alphanumeric);
        token::keyword(self.cursor.slice_from(start)).unwrap_or(Identifier)
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let start = self.cursor.offset();
            let Some(c) = self.cursor.next() else {
                self.finished = true;
                return Some(Ok(self.make_token(Eof, start)));
            };

            if let Some(item) = self.scan_token(c, start) {
                return Some(item);
            }
        }
        None
    }
}

/// Scans all of `source`, separating the tokens from the errors encountered on the way.
pub fn scan_tokens(source: &str) -> (Vec<Token<'_>>, Vec<ScanError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => {
                log::trace!("Scan error: {e}");
                errors.push(e)
            }
        }
    }
    (tokens, errors)
}
