//! Alternative renderings of expressions.
//!
//! The prefix form used for debugging is the [`std::fmt::Display`] impl of [`Expr`] itself.

use std::fmt::{self, Display, Formatter};

use scanner::{Literal, TokenData};

use crate::Expr;

/// Fully parenthesized infix form, which parses back into an equivalent expression.
pub struct Infix<'e, 'a>(pub &'e Expr<'a>);

impl Display for Infix<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Literal(Literal::Str(s)) => write!(f, "\"{s}\""),
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Grouping(inner) => write!(f, "({})", Infix(inner)),
            Expr::Unary { operator, right } => write!(f, "({}{})", operator, Infix(right)),
            Expr::Binary { left, operator, right } => {
                write!(f, "({} {} {})", Infix(left), operator, Infix(right))
            }
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Assign { name, value } => write!(f, "({} = {})", name, Infix(value)),
        }
    }
}

/// Reverse polish notation: `(1 + 2) * (4 - 3)` becomes `1 2 + 4 3 - *`.
pub struct Rpn<'e, 'a>(pub &'e Expr<'a>);

impl Display for Rpn<'_, '_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Expr::Literal(literal) => write!(f, "{literal}"),
            // Grouping is implied by the order of operands
            Expr::Grouping(inner) => write!(f, "{}", Rpn(inner)),
            Expr::Unary { operator, right } => match operator.data {
                TokenData::Minus => write!(f, "{} negate", Rpn(right)),
                _ => write!(f, "{} {}", Rpn(right), operator),
            },
            Expr::Binary { left, operator, right } => {
                write!(f, "{} {} {}", Rpn(left), Rpn(right), operator)
            }
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Assign { name, value } => write!(f, "{} {} =", Rpn(value), name),
        }
    }
}
