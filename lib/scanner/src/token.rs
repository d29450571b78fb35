use std::fmt::{self, Display, Formatter};

use cursor::Line;
use strum::EnumDiscriminants;

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub data: TokenData<'a>,
    pub lexeme: &'a str,
    pub line: Line,
}

impl<'a> Token<'a> {
    pub fn new(data: TokenData<'a>, lexeme: &'a str, line: Line) -> Token<'a> {
        Self { data, lexeme, line }
    }

    pub fn token_type(&self) -> TokenType {
        TokenType::from(&self.data)
    }

    pub fn lexeme(&self) -> &'a str {
        self.lexeme
    }

    pub fn line(&self) -> Line {
        self.line
    }

    /// The value this token denotes when used as a literal.
    pub fn literal(&self) -> Option<Literal<'a>> {
        match self.data {
            TokenData::Number(n) => Some(Literal::Number(n)),
            TokenData::Str(s) => Some(Literal::Str(s)),
            TokenData::True => Some(Literal::Boolean(true)),
            TokenData::False => Some(Literal::Boolean(false)),
            TokenData::Nil => Some(Literal::Nil),
            _ => None,
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    Number(f64),
    Str(&'a str),
    Boolean(bool),
    Nil,
}

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Str(s) => write!(f, "{s}"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(TokenType))]
#[strum_discriminants(derive(Hash))]
pub enum TokenData<'a> {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    Str(&'a str),
    Number(f64),

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
    Eof,
}

/// Reserved words, looked up after a whole identifier has been scanned.
pub fn keyword(text: &str) -> Option<TokenData<'static>> {
    use TokenData::*;
    Some(match text {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    })
}
