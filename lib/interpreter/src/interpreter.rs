use std::{cell::RefCell, io::Write, rc::Rc};

use cursor::Line;
use errors::{SyntaxError, SyntaxErrors};
use parser::{Expr, Parser, Stmt};
use scanner::{Token, TokenType};

pub mod environment;
mod value;

use environment::Environment;
pub use value::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorType {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    InvalidPlusOperands,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Variable '{0}' used before initialization.")]
    UninitializedVariable(String),
    #[error("Failed to write output: {0}")]
    Output(String),
}

/// Aborts the current unit of execution.
///
/// Only the message is displayed. Line and lexeme of the offending token are for the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct RuntimeError {
    pub error: RuntimeErrorType,
    pub line: Line,
    pub lexeme: String,
}

impl RuntimeError {
    pub fn new(error: RuntimeErrorType, token: &Token) -> Self {
        Self { error, line: token.line(), lexeme: token.lexeme().to_string() }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum InterpretError {
    /// Nothing was executed.
    #[error(transparent)]
    SyntaxErrors(#[from] SyntaxErrors),
    /// Execution stopped partway through.
    #[error(transparent)]
    RuntimeError(#[from] RuntimeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Run every statement for its effect.
    File,
    /// Like `File`, except that a lone expression statement is evaluated and its value returned.
    Repl,
}

/// Tree-walking interpreter.
///
/// Global bindings live as long as the interpreter, so one instance can serve a whole REPL
/// session, even across inputs that failed.
#[derive(Debug, Default)]
pub struct Interpreter {
    environment: Rc<RefCell<Environment>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans, parses, and runs `source`. Output of `print` goes to `out`.
    ///
    /// Nothing is executed if there is any syntax error.
    pub fn run_source(
        &mut self,
        source: &str,
        mode: Mode,
        out: &mut dyn Write,
    ) -> Result<Option<Value>, InterpretError> {
        let (tokens, scan_errors) = scanner::scan_tokens(source);
        let (stmts, parse_errors) = Parser::new(tokens).parse();

        let mut errors = SyntaxErrors(scan_errors.into_iter().map(SyntaxError::from).collect());
        errors.extend(parse_errors.0);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        match (mode, stmts.as_slice()) {
            (Mode::Repl, [Stmt::Expression(expr)]) => Ok(Some(self.evaluate(expr)?)),
            _ => {
                self.execute(&stmts, out)?;
                Ok(None)
            }
        }
    }

    pub fn execute(&mut self, stmts: &[Stmt], out: &mut dyn Write) -> Result<(), RuntimeError> {
        stmts.iter().try_for_each(|stmt| self.execute_stmt(stmt, out))
    }

    fn execute_stmt(&mut self, stmt: &Stmt, out: &mut dyn Write) -> Result<(), RuntimeError> {
        log::trace!("Executing {}", stmt);
        match stmt {
            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(out, "{}", value)
                    .map_err(|e| RuntimeError::new(RuntimeErrorType::Output(e.to_string()), keyword))
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Var { name, initializer: Some(init) } => {
                let value = self.evaluate(init)?;
                self.environment.borrow_mut().define(name.lexeme(), value);
                Ok(())
            }
            Stmt::Var { name, initializer: None } => {
                self.environment.borrow_mut().define_uninitialized(name.lexeme());
                Ok(())
            }
            Stmt::Block(stmts) => {
                let _scope = environment::Scope::new(self.environment.clone());
                self.execute(stmts, out)
            }
        }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok((*literal).into()),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Variable(name) => self.environment.borrow().get(name),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match (operator.token_type(), right) {
                    (TokenType::Minus, Value::Number(n)) => Ok((-n).into()),
                    (TokenType::Minus, _) => {
                        Err(RuntimeError::new(RuntimeErrorType::OperandMustBeNumber, operator))
                    }
                    (_, v) => Ok((!v.is_truthy()).into()),
                }
            }

            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(operator, left, right)
            }
        }
    }
}

fn binary(operator: &Token, left: Value, right: Value) -> Result<Value, RuntimeError> {
    use TokenType::*;
    use Value::Number as N;

    match (operator.token_type(), left, right) {
        (Comma, _, right) => Ok(right),

        (EqualEqual, l, r) => Ok((l == r).into()),
        (BangEqual, l, r) => Ok((l != r).into()),

        (Plus, N(l), N(r)) => Ok((l + r).into()),
        (Plus, l @ Value::Str(_), r) | (Plus, l, r @ Value::Str(_)) => {
            Ok(format!("{}{}", l, r).into())
        }
        (Plus, _, _) => Err(RuntimeError::new(RuntimeErrorType::InvalidPlusOperands, operator)),

        (Minus, N(l), N(r)) => Ok((l - r).into()),
        (Star, N(l), N(r)) => Ok((l * r).into()),
        (Slash, N(l), N(r)) => Ok((l / r).into()),

        (Greater, N(l), N(r)) => Ok((l > r).into()),
        (GreaterEqual, N(l), N(r)) => Ok((l >= r).into()),
        (Less, N(l), N(r)) => Ok((l < r).into()),
        (LessEqual, N(l), N(r)) => Ok((l <= r).into()),

        _ => Err(RuntimeError::new(RuntimeErrorType::OperandsMustBeNumbers, operator)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[ctor::ctor]
    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn run(source: &str) -> (String, Result<Option<Value>, InterpretError>) {
        run_in(&mut Interpreter::new(), source, Mode::File)
    }

    fn run_in(
        interpreter: &mut Interpreter,
        source: &str,
        mode: Mode,
    ) -> (String, Result<Option<Value>, InterpretError>) {
        let mut output = Vec::new();
        let result = interpreter.run_source(source, mode, &mut output);
        (String::from_utf8(output).unwrap(), result)
    }

    fn eval(source: &str) -> Value {
        let expr = Parser::new(scanner::scan_tokens(source).0).parse_expression().unwrap();
        Interpreter::new().evaluate(&expr).unwrap()
    }

    fn runtime_error(error: RuntimeErrorType, line: usize, lexeme: &str) -> InterpretError {
        RuntimeError { error, line: Line(line), lexeme: lexeme.into() }.into()
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
        assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
        assert_eq!(eval("-2 * -3 == 6"), Value::Bool(true));
    }

    #[test]
    fn stringify_output() {
        let (output, result) = run("print 3.0;\nprint 1/3;\nprint nil;\nprint \"hi\";\nprint 1 < 2;");
        assert_eq!(result, Ok(None));
        assert_eq!(output, "3\n0.3333333333333333\nnil\nhi\ntrue\n");
    }

    #[test]
    fn arithmetic_follows_ieee() {
        assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
        assert_eq!(eval("0.1 + 0.2"), Value::Number(0.1 + 0.2));
    }

    #[test]
    fn truthiness_and_equality() {
        assert_eq!(eval("!0"), Value::Bool(false));
        assert_eq!(eval("!\"\""), Value::Bool(false));
        assert_eq!(eval("!nil"), Value::Bool(true));
        assert_eq!(eval("nil == nil"), Value::Bool(true));
        assert_eq!(eval("nil == false"), Value::Bool(false));
        assert_eq!(eval("1 == \"1\""), Value::Bool(false));
        assert_eq!(eval("\"a\" != \"b\""), Value::Bool(true));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval("\"a\" + \"b\""), Value::from("ab"));
        assert_eq!(eval("\"a\" + 1"), Value::from("a1"));
        assert_eq!(eval("2.5 + \"x\""), Value::from("2.5x"));
        assert_eq!(eval("\"is \" + true"), Value::from("is true"));
    }

    #[test]
    fn comma_sequences() {
        let (output, result) = run("var a = 1;\nprint (a = 2, a + 1);\nprint a;");
        assert_eq!(result, Ok(None));
        assert_eq!(output, "3\n2\n");
    }

    #[test]
    fn assignment_is_an_expression() {
        let (output, _) = run("var a; var b;\na = b = 3;\nprint a + b;");
        assert_eq!(output, "6\n");
    }

    #[test]
    fn type_errors() {
        assert_eq!(run("-\"x\";").1, Err(runtime_error(RuntimeErrorType::OperandMustBeNumber, 1, "-")));
        assert_eq!(
            run("\n1 < \"a\";").1,
            Err(runtime_error(RuntimeErrorType::OperandsMustBeNumbers, 2, "<"))
        );
        assert_eq!(run("true + 1;").1, Err(runtime_error(RuntimeErrorType::InvalidPlusOperands, 1, "+")));
        assert_eq!(run("nil / 2;").1, Err(runtime_error(RuntimeErrorType::OperandsMustBeNumbers, 1, "/")));
    }

    #[test]
    fn output_failure_blames_print_statement() {
        struct BrokenPipe;

        impl Write for BrokenPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let result = Interpreter::new().run_source("var a = 1;\n\nprint \"x\";", Mode::File, &mut BrokenPipe);
        let e = match result {
            Err(InterpretError::RuntimeError(e)) => e,
            other => panic!("expected a runtime error, got {other:?}"),
        };
        assert!(matches!(e.error, RuntimeErrorType::Output(_)), "{e:?}");
        assert_eq!((e.line, e.lexeme.as_str()), (Line(3), "print"));
    }

    #[test]
    fn block_scoping() {
        let (output, result) =
            run("var x = \"global\";\n{ var x = \"inner\"; { print x; } }\nprint x;");
        assert_eq!(result, Ok(None));
        assert_eq!(output, "inner\nglobal\n");
    }

    #[test]
    fn sibling_scope_cannot_see_binding() {
        let (output, result) = run("{ var y = 1; print y; }\n{ print y; }");
        assert_eq!(output, "1\n");
        assert_eq!(
            result,
            Err(runtime_error(RuntimeErrorType::UndefinedVariable("y".into()), 2, "y"))
        );
    }

    #[test]
    fn use_before_initialization() {
        let (_, result) = run("var a;\nprint a;");
        assert_eq!(
            result,
            Err(runtime_error(RuntimeErrorType::UninitializedVariable("a".into()), 2, "a"))
        );

        let (output, result) = run("var a;\na = nil;\nprint a;");
        assert_eq!(result, Ok(None));
        assert_eq!(output, "nil\n");
    }

    #[test]
    fn assignment_to_undeclared() {
        let mut interpreter = Interpreter::new();
        let (_, result) = run_in(&mut interpreter, "undeclared = 1;", Mode::File);
        assert_eq!(
            result,
            Err(runtime_error(RuntimeErrorType::UndefinedVariable("undeclared".into()), 1, "undeclared"))
        );

        let (_, result) = run_in(&mut interpreter, "undeclared;", Mode::Repl);
        assert_eq!(
            result,
            Err(runtime_error(RuntimeErrorType::UndefinedVariable("undeclared".into()), 1, "undeclared"))
        );
    }

    #[test]
    fn syntax_errors_prevent_execution() {
        let (output, result) = run("print 1;\nprint ;\nprint 2;");
        assert_eq!(output, "");
        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 2] Error at ';': Expect expression."
        );

        let (_, result) = run("print 1;@\nprint 1 +;");
        assert_eq!(
            result.unwrap_err().to_string(),
            "[line 1] Error: Unexpected character.\n[line 2] Error at ';': Expect expression."
        );
    }

    #[test]
    fn runtime_error_keeps_earlier_output() {
        let (output, result) = run("print 1;\nprint -nil;\nprint 2;");
        assert_eq!(output, "1\n");
        assert_eq!(result, Err(runtime_error(RuntimeErrorType::OperandMustBeNumber, 2, "-")));
    }

    #[test]
    fn repl_auto_prints_lone_expressions() {
        let mut interpreter = Interpreter::new();

        let (output, result) = run_in(&mut interpreter, "1 + 2;", Mode::Repl);
        assert_eq!((output.as_str(), result), ("", Ok(Some(Value::Number(3.0)))));

        let (output, result) = run_in(&mut interpreter, "print 1 + 2;", Mode::Repl);
        assert_eq!((output.as_str(), result), ("3\n", Ok(None)));

        let (output, result) = run_in(&mut interpreter, "var a = 1; a;", Mode::Repl);
        assert_eq!((output.as_str(), result), ("", Ok(None)));

        // File mode never yields a value
        let (_, result) = run_in(&mut interpreter, "a;", Mode::File);
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn repl_session_keeps_globals_across_errors() {
        let mut interpreter = Interpreter::new();

        run_in(&mut interpreter, "var a = 1;", Mode::Repl).1.unwrap();

        let (_, result) = run_in(&mut interpreter, "var b = 2; { var a = 3; -a; -\"x\"; }", Mode::Repl);
        assert_eq!(result, Err(runtime_error(RuntimeErrorType::OperandMustBeNumber, 1, "-")));

        let (_, result) = run_in(&mut interpreter, "var c = ;", Mode::Repl);
        assert!(matches!(result, Err(InterpretError::SyntaxErrors(_))));

        // The block's scope was closed, so `a` is the global one again
        assert_eq!(run_in(&mut interpreter, "a;", Mode::Repl).1, Ok(Some(Value::Number(1.0))));
        assert_eq!(run_in(&mut interpreter, "b;", Mode::Repl).1, Ok(Some(Value::Number(2.0))));
        assert!(run_in(&mut interpreter, "c;", Mode::Repl).1.is_err());
    }
}
