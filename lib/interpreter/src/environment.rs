use std::{cell::RefCell, collections::HashMap, iter::successors, rc::Rc};

use scanner::Token;

use crate::{value::Value, RuntimeError, RuntimeErrorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

#[derive(Debug, Default)]
struct ScopeRecord {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

/// Variable bindings, organized as a chain of scopes.
///
/// Scopes live in an arena and point to their enclosing scope by index. The global scope is
/// always at [`ScopeId::GLOBAL`] and is never removed.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<ScopeRecord>,
    current: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Self { scopes: vec![ScopeRecord::default()], current: ScopeId::GLOBAL }
    }
}

impl Environment {
    pub fn current(&self) -> ScopeId {
        self.current
    }

    pub fn push_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeRecord { values: HashMap::new(), enclosing: Some(self.current) });
        self.current = id;
        log::debug!("Entered scope {:?}", id);
        id
    }

    pub fn pop_scope(&mut self) {
        let Some(enclosing) = self.scopes[self.current.0].enclosing else {
            log::debug!("Not popping the global scope");
            return;
        };
        debug_assert_eq!(self.current.0, self.scopes.len() - 1);
        log::debug!("Left scope {:?}", self.current);
        self.scopes.truncate(self.current.0);
        self.current = enclosing;
    }

    /// Binds `name` in the current scope, replacing any previous binding there.
    pub fn define(&mut self, name: &str, value: Value) {
        log::debug!("Defining {name} = {value:?} in {:?}", self.current);
        self.scopes[self.current.0].values.insert(name.to_string(), value);
    }

    pub fn define_uninitialized(&mut self, name: &str) {
        self.define(name, Value::Uninitialized);
    }

    /// Innermost scope that binds `name`.
    fn resolve(&self, name: &str) -> Option<ScopeId> {
        successors(Some(self.current), |id| self.scopes[id.0].enclosing)
            .find(|id| self.scopes[id.0].values.contains_key(name))
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        let value = self
            .resolve(name.lexeme())
            .and_then(|id| self.scopes[id.0].values.get(name.lexeme()))
            .ok_or_else(|| undefined(name))?;

        match value {
            Value::Uninitialized => Err(RuntimeError::new(
                RuntimeErrorType::UninitializedVariable(name.lexeme().to_string()),
                name,
            )),
            value => Ok(value.clone()),
        }
    }

    /// Overwrites the nearest existing binding of `name`. Never creates a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let id = self.resolve(name.lexeme()).ok_or_else(|| undefined(name))?;
        log::debug!("Assigning {} = {value:?} in {id:?}", name.lexeme());
        self.scopes[id.0].values.insert(name.lexeme().to_string(), value);
        Ok(())
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(RuntimeErrorType::UndefinedVariable(name.lexeme().to_string()), name)
}

/// Opens a new scope on creation and closes it again when dropped,
/// no matter how the block it belongs to was left.
pub struct Scope(Rc<RefCell<Environment>>);

impl Scope {
    pub fn new(env: Rc<RefCell<Environment>>) -> Self {
        env.borrow_mut().push_scope();
        Self(env)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.0.borrow_mut().pop_scope();
    }
}
