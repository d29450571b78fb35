use std::fmt::{self, Display, Formatter};

use cursor::Line;
use derive_more::{Deref, DerefMut};
use itertools::Itertools;

/// Where on its line a syntax error was detected.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    /// The offending token is the end-of-input marker.
    AtEnd,
    /// The offending token's lexeme.
    At(String),
    /// Scanner errors have no token to point at.
    Nowhere,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Location::AtEnd => write!(f, " at end"),
            Location::At(lexeme) => write!(f, " at '{lexeme}'"),
            Location::Nowhere => Ok(()),
        }
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: Line,
    pub location: Location,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: Line, location: Location, message: impl ToString) -> Self {
        Self { line, location, message: message.to_string() }
    }
}

/// All syntax errors found in one unit of source, in the order they were reported.
#[derive(thiserror::Error, Clone, Debug, Default, PartialEq, Deref, DerefMut)]
pub struct SyntaxErrors(pub Vec<SyntaxError>);

impl From<SyntaxError> for SyntaxErrors {
    fn from(e: SyntaxError) -> Self {
        Self(vec![e])
    }
}

impl Extend<SyntaxError> for SyntaxErrors {
    fn extend<T: IntoIterator<Item = SyntaxError>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl Display for SyntaxErrors {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, SyntaxError>;
