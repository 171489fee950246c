use std::cell::RefCell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Built-in callable backed by a plain function pointer.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

/// A user-declared function or method together with its closure.
///
/// The closure is the environment that was active at the declaration
/// site, not a fresh scope; binding a method wraps it in one extra
/// scope holding `this`.
#[derive(Debug, Clone)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Wrap the method in a one-entry scope binding `this` to the
    /// receiver, so `var m = obj.method; m();` keeps its receiver.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(
            self.closure.clone(),
        )));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction::new(self.declaration.clone(), environment, self.is_initializer)
    }

    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(
            self.closure.clone(),
        )));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment)? {
            Flow::Return(value) => {
                if self.is_initializer {
                    // initializers yield `this` no matter what
                    self.bound_this()
                } else {
                    Ok(value)
                }
            }

            Flow::Break(keyword) => Err(LoxError::runtime(
                keyword.line,
                "Break only supported in loops.",
            )),

            Flow::Continue(keyword) => Err(LoxError::runtime(
                keyword.line,
                "Continue only supported in loops.",
            )),

            Flow::Normal => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(Value::Nil)
                }
            }
        }
    }

    /// `this` lives in the scope `bind` wrapped around the closure.
    fn bound_this(&self) -> Result<Value> {
        Environment::get_at(&self.closure, 0, "this", self.declaration.name.line)
    }
}

/// Install the built-in callables into the globals scope.
pub fn define_natives(globals: &Rc<RefCell<Environment>>) {
    globals.borrow_mut().define(
        "clock",
        Value::NativeFunction(Rc::new(NativeFunction {
            name: "clock".to_string(),
            arity: 0,
            func: clock_native,
        })),
    );
}

fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
