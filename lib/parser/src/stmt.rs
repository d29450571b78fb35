use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use scanner::Token;

use crate::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression(Expr<'a>),
    Print { keyword: Token<'a>, value: Expr<'a> },
    Var { name: Token<'a>, initializer: Option<Expr<'a>> },
    Block(Vec<Stmt<'a>>),
}

impl Display for Stmt<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "(; {})", expr),
            Stmt::Print { value, .. } => write!(f, "(print {})", value),
            Stmt::Var { name, initializer: Some(init) } => write!(f, "(var {} {})", name, init),
            Stmt::Var { name, initializer: None } => write!(f, "(var {})", name),
            Stmt::Block(stmts) => write!(f, "(block {})", stmts.iter().join(" ")),
        }
    }
}
