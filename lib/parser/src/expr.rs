use std::fmt::{self, Display, Formatter};

use scanner::{Literal, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Literal(Literal<'a>),
    Grouping(Box<Expr<'a>>),
    Unary { operator: Token<'a>, right: Box<Expr<'a>> },
    /// Also covers the comma operator, with a [`scanner::TokenData::Comma`] operator.
    Binary { left: Box<Expr<'a>>, operator: Token<'a>, right: Box<Expr<'a>> },
    Variable(Token<'a>),
    Assign { name: Token<'a>, value: Box<Expr<'a>> },
}

/// Prefix form: `(* (- 123) (group 45.67))`
impl Display for Expr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Grouping(expression) => write!(f, "(group {})", expression),
            Expr::Unary { operator, right } => write!(f, "({} {})", operator, right),
            Expr::Binary { left, operator, right } => {
                write!(f, "({} {} {})", operator, left, right)
            }
            Expr::Variable(token) => write!(f, "{}", token.lexeme()),
            Expr::Assign { name, value } => write!(f, "(assign {} {})", name.lexeme(), value),
        }
    }
}
