use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::Expr;
use crate::function::{define_natives, LoxFunction};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Where `print` output goes; stdout normally, a shared buffer in tests.
pub type OutputStream = Rc<RefCell<dyn Write>>;

/// Outcome of executing one statement.
///
/// `return`, `break`, and `continue` are not errors: they are signals
/// that bubble up through blocks until something consumes them.  Only a
/// call frame consumes `Return`; only a `while` loop consumes `Break`
/// and `Continue`; a signal that escapes everything is a runtime error.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
    Break(Token),
    Continue(Token),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
    output: OutputStream,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    pub fn with_output(output: OutputStream) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        define_natives(&globals);

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Resolver callback: this occurrence lives `depth` frames up.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Run a resolved program.  Yields the value of a trailing top-level
    /// expression statement so the REPL can echo it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<Option<Value>> {
        let mut last: Option<Value> = None;

        for statement in statements {
            last = match statement {
                Stmt::Expression(expr) => Some(self.evaluate(expr)?),

                _ => match self.execute(statement)? {
                    Flow::Normal => None,

                    Flow::Break(keyword) => {
                        return Err(LoxError::runtime(
                            keyword.line,
                            "Break only supported in loops.",
                        ))
                    }

                    Flow::Continue(keyword) => {
                        return Err(LoxError::runtime(
                            keyword.line,
                            "Continue only supported in loops.",
                        ))
                    }

                    Flow::Return(_) => None, // unreachable: the resolver rejects top-level return
                },
            };
        }

        Ok(last)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output.borrow_mut(), "{}", value)?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    match self.execute(body)? {
                        Flow::Normal => {}

                        Flow::Break(_) => break,

                        // Re-test the condition; in a desugared `for`
                        // the increment sits inside the body block and
                        // is skipped along with the rest of it.
                        Flow::Continue(_) => {}

                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Break(keyword) => Ok(Flow::Break(keyword.clone())),

            Stmt::Continue(keyword) => Ok(Flow::Continue(keyword.clone())),

            Stmt::Function(declaration) => {
                // The closure is the environment active right now.
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` in `environment`, restoring the previous scope
    /// on every exit path, including errors and control-flow signals.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => {}

                other => {
                    self.environment = previous;
                    return other;
                }
            }
        }

        self.environment = previous;

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<Flow> {
        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let line: usize = match expr {
                    Expr::Variable { name, .. } => name.line,
                    _ => name.line,
                };

                match self.evaluate(expr)? {
                    Value::Class(class) => Some(class),
                    _ => return Err(LoxError::runtime(line, "Superclass must be a class.")),
                }
            }

            None => None,
        };

        // Define the name first (as nil) so methods can reference the
        // class recursively before the value lands.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // Methods close over an extra scope holding `super` when there
        // is a superclass; `super` dispatch reads it at resolver depth.
        let mut method_closure: Rc<RefCell<Environment>> = self.environment.clone();
        if let Some(superclass) = &superclass_value {
            method_closure = Rc::new(RefCell::new(Environment::with_enclosing(method_closure)));
            method_closure
                .borrow_mut()
                .define("super", Value::Class(superclass.clone()));
        }

        let mut method_table: HashMap<String, LoxFunction> = HashMap::new();
        for method in methods {
            let is_initializer: bool = method.name.lexeme == "init";
            let function = LoxFunction::new(method.clone(), method_closure.clone(), is_initializer);

            method_table.insert(method.name.lexeme.clone(), function);
        }

        let class = Rc::new(LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            method_table,
        ));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(class), name.line)?;

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, expr: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(expr)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;

        // Comma: the left operand was evaluated for effect only.
        if operator.token_type == TokenType::COMMA {
            return self.evaluate(right);
        }

        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                // Either side being a string stringifies the other.
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),

                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(LoxError::runtime(operator.line, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.")),
            },

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;

        // Short-circuiting hands back the deciding operand as-is.
        match operator.token_type {
            TokenType::OR => {
                if is_truthy(&left_val) {
                    return Ok(left_val);
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_val) {
                    return Ok(left_val);
                }
            }

            _ => {
                return Err(LoxError::runtime(
                    operator.line,
                    "Invalid logical operator.",
                ))
            }
        }

        self.evaluate(right)
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee_val: Value = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        match callee_val {
            Value::NativeFunction(native) => {
                check_arity(native.arity, args.len(), paren)?;

                (native.func)(&args).map_err(|message| LoxError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;

                function.call(self, args)
            }

            Value::Class(class) => {
                check_arity(class.arity(), args.len(), paren)?;

                LoxClass::instantiate(&class, self, args)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> Result<Value> {
        match self.evaluate(object)? {
            Value::Instance(instance) => {
                // Fields shadow methods.
                if let Some(field) = instance.borrow().field(&name.lexeme) {
                    return Ok(field);
                }

                if let Some(method) = instance.borrow().class().find_method(&name.lexeme) {
                    return Ok(Value::Function(Rc::new(method.bind(instance.clone()))));
                }

                Err(LoxError::runtime(
                    name.line,
                    format!("Undefined property '{}'.", name.lexeme),
                ))
            }

            _ => Err(LoxError::runtime(
                name.line,
                "Only instances have properties.",
            )),
        }
    }

    fn evaluate_set(&mut self, object: &Expr, name: &Token, value_expr: &Expr) -> Result<Value> {
        match self.evaluate(object)? {
            Value::Instance(instance) => {
                let value: Value = self.evaluate(value_expr)?;

                instance
                    .borrow_mut()
                    .set_field(&name.lexeme, value.clone());

                Ok(value)
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have fields.")),
        }
    }

    /// `super` is bound at the recorded depth; the receiver sits one
    /// scope nearer the leaf.  The method comes from the superclass
    /// chain regardless of the receiver's own class.
    fn evaluate_super(&mut self, id: usize, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Can't use 'super' outside of a class.",
                ))
            }
        };

        let superclass: Rc<LoxClass> =
            match Environment::get_at(&self.environment, distance, "super", keyword.line)? {
                Value::Class(class) => class,

                _ => {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Superclass must be a class.",
                    ))
                }
            };

        let object = match Environment::get_at(&self.environment, distance - 1, "this", keyword.line)?
        {
            Value::Instance(instance) => instance,

            _ => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Can't use 'super' outside of a class.",
                ))
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(object)))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, name: &Token, id: usize) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn check_arity(arity: usize, supplied: usize, paren: &Token) -> Result<()> {
    if arity == supplied {
        Ok(())
    } else {
        Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", arity, supplied),
        ))
    }
}
