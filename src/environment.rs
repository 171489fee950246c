use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One scope frame: a name-to-value map plus the enclosing frame.
///
/// Frames are shared by reference: a closure captured inside a block
/// and the block itself point at the same `Rc`, so either keeps the
/// frame alive. `get_at`/`assign_at` hop exactly the distance the
/// resolver computed, which is what makes closures survive a block
/// scope being reentered.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Unconditional set in this scope. Redefinition is allowed here;
    /// the resolver forbids it for locals before execution starts.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read from the scope exactly `distance` hops up the chain.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        match Environment::ancestor(env, distance) {
            Some(scope) => {
                let value: Option<Value> = scope.borrow().values.get(name).cloned();
                value.ok_or_else(|| undefined(name, line))
            }

            None => Err(undefined(name, line)),
        }
    }

    /// Write into the scope exactly `distance` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        match Environment::ancestor(env, distance) {
            Some(scope) => {
                scope.borrow_mut().values.insert(name.to_string(), value);
                Ok(())
            }

            None => Err(undefined(name, line)),
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut scope: Rc<RefCell<Environment>> = env.clone();

        for _ in 0..distance {
            let enclosing = scope.borrow().enclosing.clone()?;
            scope = enclosing;
        }

        Some(scope)
    }
}

fn undefined(name: &str, line: usize) -> LoxError {
    LoxError::runtime(line, format!("Undefined variable '{}'.", name))
}
