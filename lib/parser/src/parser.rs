mod expr;
pub mod printer;
mod stmt;

use errors::{Location, Result, SyntaxError, SyntaxErrors};
pub use expr::Expr;
pub use scanner::Literal;
use scanner::{Token, TokenData, TokenType};
pub use stmt::Stmt;

use TokenType::*;

#[derive(Debug)]
pub struct ParserError<'a> {
    error: ParserErrorType,
    token: Token<'a>,
}

impl<'a> ParserError<'a> {
    fn new(error: ParserErrorType, token: Token<'a>) -> Self {
        Self { error, token }
    }
}

impl<'a> From<ParserError<'a>> for SyntaxError {
    fn from(error: ParserError<'a>) -> Self {
        let location = match error.token.data {
            TokenData::Eof => Location::AtEnd,
            _ => Location::At(error.token.lexeme().to_string()),
        };
        SyntaxError::new(error.token.line(), location, error.error)
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect ';' after value.")]
    ExpectedSemicolonAfterValue,
    #[error("Expect ';' after variable declaration.")]
    ExpectedSemicolonAfterDeclaration,
    #[error("Expect ';' after expression.")]
    ExpectedSemicolonAfterExpression,
    #[error("Expect variable name.")]
    ExpectedVariableName,
    #[error("Expect '}}' after block.")]
    ExpectedRightBrace,
    #[error("Expect ')' after expression.")]
    ExpectedRightParen,
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Expect end of expression.")]
    ExpectedEnd,
}

/// Recursive descent parser, one method per precedence level.
///
/// From loosest to tightest binding:
/// comma, assignment, equality, comparison, term, factor, unary, primary.
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    errors: SyntaxErrors,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(Token::token_type) != Some(Eof) {
            let line = tokens.last().map(Token::line).unwrap_or_default();
            tokens.push(Token::new(TokenData::Eof, "", line));
        }
        Self { tokens, current: 0, errors: SyntaxErrors::default() }
    }

    /// Parses a whole program.
    ///
    /// Malformed statements are reported and left out of the returned list, parsing resumes at
    /// the next statement boundary.
    pub fn parse(mut self) -> (Vec<Stmt<'a>>, SyntaxErrors) {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.extend(self.declaration());
        }
        (stmts, self.errors)
    }

    /// Parses a single expression that has to span all of the input.
    pub fn parse_expression(mut self) -> std::result::Result<Expr<'a>, SyntaxErrors> {
        let result = self.expression().and_then(|expr| {
            if self.is_at_end() {
                Ok(expr)
            } else {
                Err(self.error_at_current(ParserErrorType::ExpectedEnd))
            }
        });

        match result {
            Ok(expr) if self.errors.is_empty() => Ok(expr),
            Ok(_) => Err(self.errors),
            Err(e) => {
                self.errors.push(e);
                Err(self.errors)
            }
        }
    }

    fn declaration(&mut self) -> Option<Stmt<'a>> {
        let result =
            if self.consume(Var).is_some() { self.var_declaration() } else { self.statement() };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                log::trace!("Hit error: {:?}, syncing...", e);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.consume(Equal) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterDeclaration)?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt<'a>> {
        if let Some(keyword) = self.consume(Print) {
            return self.print_statement(keyword);
        }

        if self.consume(LeftBrace).is_some() {
            return Ok(Stmt::Block(self.block()?));
        }

        self.expression_statement()
    }

    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut stmts = Vec::new();

        while !self.check(RightBrace) && !self.is_at_end() {
            stmts.extend(self.declaration());
        }

        self.consume_or_error(RightBrace, ParserErrorType::ExpectedRightBrace)?;
        Ok(stmts)
    }

    fn print_statement(&mut self, keyword: Token<'a>) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterValue)?;
        Ok(Stmt::Print { keyword, value })
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfterExpression)?;
        Ok(Stmt::Expression(value))
    }

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.comma()
    }

    // NOTE: This takes every ',' it sees, so it will clash with argument lists once calls exist.
    fn comma(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.assignment()?;

        while let Some(operator) = self.consume(Comma) {
            let right = Box::new(self.assignment()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr<'a>> {
        let expr = self.equality()?;

        let Some(equals) = self.consume(Equal) else {
            return Ok(expr);
        };

        let value = Box::new(self.assignment()?);

        match expr {
            Expr::Variable(name) => Ok(Expr::Assign { name, value }),
            // Reported, but the parser is not confused here, so there is no need to synchronize
            expr => {
                self.errors
                    .push(ParserError::new(ParserErrorType::InvalidAssignmentTarget, equals).into());
                Ok(expr)
            }
        }
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.comparison()?;

        while let Some(operator) = self.consume_any(&[BangEqual, EqualEqual]) {
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.term()?;

        while let Some(operator) = self.consume_any(&[Greater, GreaterEqual, Less, LessEqual]) {
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.factor()?;

        while let Some(operator) = self.consume_any(&[Minus, Plus]) {
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.unary()?;

        while let Some(operator) = self.consume_any(&[Slash, Star]) {
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if let Some(operator) = self.consume_any(&[Bang, Minus]) {
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        if let Some(literal) = self.peek().literal() {
            self.advance();
            return Ok(Expr::Literal(literal));
        }

        if let Some(name) = self.consume(Identifier) {
            return Ok(Expr::Variable(name));
        }

        if self.consume(LeftParen).is_some() {
            let expr = self.expression()?;
            self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen)?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error_at_current(ParserErrorType::ExpectedExpression))
    }

    /// Skips tokens until the start of the next statement is likely.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().map(Token::token_type) == Some(Semicolon) {
                return;
            }

            match self.peek().token_type() {
                Class | Fun | Var | For | If | While | Print | Return => return,
                _ => {}
            }

            log::trace!("Syncing... skipping {:?}", self.peek());
            self.advance();
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn consume(&mut self, token_type: TokenType) -> Option<Token<'a>> {
        self.check(token_type).then(|| self.advance())
    }

    fn consume_any(&mut self, token_types: &[TokenType]) -> Option<Token<'a>> {
        token_types.iter().find_map(|t| self.consume(*t))
    }

    fn consume_or_error(
        &mut self,
        token_type: TokenType,
        error_type: ParserErrorType,
    ) -> Result<Token<'a>> {
        self.consume(token_type).ok_or_else(|| self.error_at_current(error_type))
    }

    fn error_at_current(&self, error_type: ParserErrorType) -> SyntaxError {
        ParserError::new(error_type, self.peek().clone()).into()
    }

    fn check(&self, token_type: TokenType) -> bool {
        !self.is_at_end() && self.peek().token_type() == token_type
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token<'a> {
        // `new` guarantees a trailing Eof, and `advance` never steps past it
        &self.tokens[self.current]
    }

    fn previous(&self) -> Option<&Token<'a>> {
        self.current.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type() == Eof
    }
}
