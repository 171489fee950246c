use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::Result;
use crate::function::LoxFunction;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A class value: name, optional superclass, and the method table.
///
/// Classes are callable; calling one constructs an instance and runs
/// `init` when the class (or an ancestor) declares it.
#[derive(Debug)]
pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method lookup walks the superclass chain; own methods shadow
    /// inherited ones.
    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method);
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class's call arity is its initializer's, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, LoxFunction::arity)
    }

    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(class.clone())));

        if let Some(initializer) = class.find_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// Instance state: a reference to the class plus the own-fields map.
///
/// Field reads fall back to method lookup on the class; that fallback
/// lives in the interpreter because binding needs the instance handle.
#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
