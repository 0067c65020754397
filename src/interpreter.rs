//! Tree-walking evaluator.
//!
//! Statements return a [`Flow`] describing how control leaves them; fatal
//! errors travel separately through [`Result`]. The interpreter owns the
//! resolved-locals table filled by the [`Resolver`](crate::resolver::Resolver)
//! and consults it for every variable read and write. Unresolved names are
//! looked up in the global frame.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, FunctionDecl, LiteralValue, NodeId, Stmt};
use crate::callable::{Callable, Function, FunctionKind, CONSTRUCTOR};
use crate::class::Class;
use crate::environment::{self, Env, Environment};
use crate::error::{Result, RouxError};
use crate::io::IoStream;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How control leaves a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: Env,
    environment: Env,
    locals: HashMap<NodeId, usize>,
    io: Rc<IoStream>,
}

impl Interpreter {
    /// Creates an interpreter whose global frame holds the `clock` and
    /// `input` built-ins.
    pub fn new(io: Rc<IoStream>) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Rc::new(std::cell::RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::native("clock", 0, |_, _| {
                let timestamp: f64 = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                    .as_secs_f64();
                Ok(Value::Number(timestamp))
            }),
        );

        debug!("Defining native function 'input'");

        globals.borrow_mut().define(
            "input",
            Value::native("input", 0, |interpreter, _| {
                Ok(Value::from(interpreter.io().input()))
            }),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            io,
        }
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn io(&self) -> &Rc<IoStream> {
        &self.io
    }

    /// Records that the variable node `id` lives `depth` frames out.
    pub fn note_local(&mut self, id: NodeId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Executes a resolved program.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for statement in statements {
            self.execute(statement)?;
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Evaluates a resolved standalone expression.
    pub fn interpret_expression(&mut self, expr: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(expr)?;
        info!("Expression evaluated to: {}", value);
        Ok(value)
    }

    /// Calls `callee` from host code. Failures carry no source line.
    pub fn call(&mut self, callee: &Value, arguments: Vec<Value>) -> Result<Value> {
        let callable: Rc<dyn Callable> = callee
            .as_callable()
            .ok_or_else(|| RouxError::Native(format!("'{}' is not callable", callee)))?;

        if arguments.len() != callable.arity() {
            return Err(RouxError::Native(format!(
                "Expected {} arguments but got {}.",
                callable.arity(),
                arguments.len()
            )));
        }

        callable.call(self, arguments)
    }

    // ───────────────────────── statements ─────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing: {}", value);
                self.io.output(&value.to_string());
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame: Env = Environment::child_of(&self.environment);
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }

                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function: Value = self.closure(declaration, FunctionKind::Function);
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, function);
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                base,
                methods,
                static_methods,
            } => {
                self.declare_class(name, base.as_ref(), methods, static_methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `frame` as the current scope, restoring the
    /// previous scope however the block exits.
    pub fn execute_block(&mut self, statements: &[Stmt], frame: Env) -> Result<Flow> {
        let previous: Env = std::mem::replace(&mut self.environment, frame);
        let mut outcome: Result<Flow> = Ok(Flow::Normal);

        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        self.environment = previous;
        outcome
    }

    fn declare_class(
        &mut self,
        name: &Token,
        base: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        static_methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        debug!("Declaring class '{}'", name.lexeme);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Null);

        // Evaluated for its errors only; nothing is inherited.
        if let Some(base) = base {
            if !matches!(self.evaluate(base)?, Value::Class(_)) {
                return Err(RouxError::runtime(name, "Base class must be a class."));
            }
        }

        let mut method_table: HashMap<String, Rc<Function>> = HashMap::new();
        for method in methods {
            let kind: FunctionKind = if method.name.lexeme == CONSTRUCTOR {
                FunctionKind::Constructor
            } else {
                FunctionKind::Method
            };

            let function = Function::new(Rc::clone(method), Rc::clone(&self.environment), kind);
            method_table.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let mut static_table: HashMap<String, Value> = HashMap::new();
        for method in static_methods {
            let function: Value = self.closure(method, FunctionKind::Static);
            static_table.insert(method.name.lexeme.clone(), function);
        }

        let class: Rc<Class> = Class::new(&name.lexeme, method_table, static_table);
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(class));

        Ok(())
    }

    fn closure(&self, declaration: &Rc<FunctionDecl>, kind: FunctionKind) -> Value {
        let function = Function::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            kind,
        );
        Value::Callable(Rc::new(function))
    }

    // ───────────────────────── expressions ─────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Text(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Null => Value::Null,
            }),

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
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Suffix { id, name, operator } => {
                let old: f64 = self
                    .look_up_variable(*id, name)?
                    .as_number()
                    .ok_or_else(|| RouxError::runtime(operator, "Operand must be a number."))?;

                let new: f64 = if operator.token_type == TokenType::PLUS_PLUS {
                    old + 1.0
                } else {
                    old - 1.0
                };

                self.assign_variable(*id, name, Value::Number(new))?;
                Ok(Value::Number(old))
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(&callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(&name.lexeme).ok_or_else(|| {
                    RouxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
                }),

                Value::Class(class) => class.find_static(&name.lexeme).ok_or_else(|| {
                    RouxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
                }),

                _ => Err(RouxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RouxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(&name.lexeme, value.clone());
                Ok(value)
            }

            Expr::Update {
                object,
                name,
                operator,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RouxError::runtime(name, "Only instances have fields."));
                };

                let current: Value = instance.get(&name.lexeme).ok_or_else(|| {
                    RouxError::runtime(name, format!("Undefined property '{}'.", name.lexeme))
                })?;
                let operand: Value = self.evaluate(value)?;

                let updated: Value = apply_binary(operator, current, operand)?;
                instance.set(&name.lexeme, updated.clone());
                Ok(updated)
            }

            Expr::Subscript {
                object,
                bracket,
                index,
            } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate(index)?;
                self.subscript(object, bracket, index)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Lambda(declaration) => Ok(self.closure(declaration, FunctionKind::Lambda)),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RouxError::runtime(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(RouxError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        apply_binary(operator, left, right)
    }

    fn subscript(&mut self, object: Value, bracket: &Token, index: Value) -> Result<Value> {
        match object {
            Value::Text(text) => {
                let position: usize = whole_index(&index)
                    .ok_or_else(|| RouxError::runtime(bracket, "Index must be a whole number."))?;

                text.chars()
                    .nth(position)
                    .map(|ch| Value::Text(ch.to_string()))
                    .ok_or_else(|| RouxError::runtime(bracket, "Index out of range."))
            }

            Value::Instance(instance) => {
                let at: Value = instance.get("at").ok_or_else(|| {
                    RouxError::runtime(bracket, "Instance does not support indexing.")
                })?;
                self.invoke_callable(&at, bracket, vec![index])
            }

            _ => Err(RouxError::runtime(
                bracket,
                "Only text and instances can be indexed.",
            )),
        }
    }

    /// Call path shared by every call site: callable check, arity check, then
    /// dispatch. Native failures pick up the call site's line here.
    fn invoke_callable(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let callable: Rc<dyn Callable> = callee
            .as_callable()
            .ok_or_else(|| RouxError::runtime(paren, "Can only call functions and classes."))?;

        if arguments.len() != callable.arity() {
            return Err(RouxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        callable.call(self, arguments).map_err(|e| match e {
            RouxError::Native(message) => RouxError::runtime(paren, message),
            other => other,
        })
    }

    // ───────────────────────── variables ─────────────────────────

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Value> {
        let found: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => {
                debug!("Reading '{}' at distance {}", name.lexeme, distance);
                environment::get_at(&self.environment, distance, &name.lexeme)
            }
            None => self.globals.borrow().fetch(&name.lexeme),
        };

        found.ok_or_else(|| {
            RouxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    fn assign_variable(&mut self, id: NodeId, name: &Token, value: Value) -> Result<()> {
        let assigned: bool = match self.locals.get(&id) {
            Some(&distance) => environment::assign_at(&self.environment, distance, &name.lexeme, value),
            None => self.globals.borrow_mut().assign(&name.lexeme, value),
        };

        if assigned {
            Ok(())
        } else {
            Err(RouxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}

// ───────────────────────── operator helpers ─────────────────────────

/// Applies a binary operator to two evaluated operands.
fn apply_binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {} {} {}", left, operator.lexeme, right);

    match operator.token_type {
        TokenType::COMMA => Ok(right),

        TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
        TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

        TokenType::PLUS => add(operator, left, right),

        TokenType::MINUS => arithmetic(operator, &left, &right, |a, b| a - b),
        TokenType::STAR => arithmetic(operator, &left, &right, |a, b| a * b),
        TokenType::SLASH => arithmetic(operator, &left, &right, |a, b| a / b),
        TokenType::PERCENT => arithmetic(operator, &left, &right, |a, b| a % b),

        TokenType::AMPERSAND => bitwise(operator, &left, &right, |a, b| a & b),
        TokenType::BAR => bitwise(operator, &left, &right, |a, b| a | b),
        TokenType::CARET => bitwise(operator, &left, &right, |a, b| a ^ b),

        TokenType::GREATER => compare(operator, &left, &right, |a, b| a > b),
        TokenType::GREATER_EQUAL => compare(operator, &left, &right, |a, b| a >= b),
        TokenType::LESS => compare(operator, &left, &right, |a, b| a < b),
        TokenType::LESS_EQUAL => compare(operator, &left, &right, |a, b| a <= b),

        _ => Err(RouxError::runtime(operator, "Invalid binary operator.")),
    }
}

/// `+`: numeric addition, text concatenation, or text joined with any other
/// non-null value in operand order.
fn add(operator: &Token, left: Value, right: Value) -> Result<Value> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(a + &b)),
        (Value::Text(a), other) if !other.is_null() => Ok(Value::Text(format!("{}{}", a, other))),
        (other, Value::Text(b)) if !other.is_null() => Ok(Value::Text(format!("{}{}", other, b))),
        _ => Err(RouxError::runtime(
            operator,
            "Operands must be two numbers or two strings.",
        )),
    }
}

fn numbers(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RouxError::runtime(operator, "Operands must be numbers.")),
    }
}

fn arithmetic(operator: &Token, left: &Value, right: &Value, op: fn(f64, f64) -> f64) -> Result<Value> {
    let (a, b) = numbers(operator, left, right)?;
    Ok(Value::Number(op(a, b)))
}

fn compare(operator: &Token, left: &Value, right: &Value, op: fn(f64, f64) -> bool) -> Result<Value> {
    let (a, b) = numbers(operator, left, right)?;
    Ok(Value::Bool(op(a, b)))
}

fn bitwise(operator: &Token, left: &Value, right: &Value, op: fn(i64, i64) -> i64) -> Result<Value> {
    let (a, b) = numbers(operator, left, right)?;
    Ok(Value::Number(op(a as i64, b as i64) as f64))
}

fn whole_index(index: &Value) -> Option<usize> {
    match index {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as usize),
        _ => None,
    }
}
