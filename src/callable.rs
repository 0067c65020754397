//! The callable capability shared by every invocable value.
//!
//! Four shapes implement [`Callable`]: host‑registered [`NativeFunction`]s,
//! declared functions and lambdas (both [`Function`]), and classes acting as
//! constructors ([`Class`](crate::class::Class)). The evaluator checks arity
//! once, before dispatch, so implementations may assume `arguments.len() ==
//! self.arity()`.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{self, Env, Environment};
use crate::error::{Result, RouxError};
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Name under which constructors are declared.
pub const CONSTRUCTOR: &str = "construct";

pub trait Callable: fmt::Display {
    fn name(&self) -> &str;

    /// Exact number of arguments the callable requires.
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Script functions
// ─────────────────────────────────────────────────────────────────────────────

/// How a [`Function`] was declared; decides its display form and whether a
/// call yields `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Lambda,
    Method,
    Constructor,
    Static,
}

/// A declared function, lambda or method paired with the frame it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Env,
    kind: FunctionKind,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Env, kind: FunctionKind) -> Self {
        Self {
            declaration,
            closure,
            kind,
        }
    }

    /// Wraps the closure in a frame that defines `this` as `instance`.
    pub fn bind(&self, instance: &Rc<Instance>) -> Function {
        let frame: Env = Environment::child_of(&self.closure);
        frame
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: frame,
            kind: self.kind,
        }
    }

    /// `this` as seen by a bound constructor.
    fn bound_this(&self) -> Value {
        environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Null)
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling {}", self);

        let frame: Env = Environment::child_of(&self.closure);
        {
            let mut scope = frame.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, frame)?;

        if self.kind == FunctionKind::Constructor {
            return Ok(self.bound_this());
        }

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Null),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FunctionKind::Lambda => write!(f, "<lambda fn>"),
            _ => write!(f, "<fn {}>", self.declaration.name.lexeme),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// Host closure signature. Failures are plain messages; the evaluator attaches
/// the call‑site line.
pub type NativeFn = dyn Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

/// A host‑implemented function. Native methods of native classes are these,
/// closing over private host state.
pub struct NativeFunction {
    name: String,
    arity: usize,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, arity: usize, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String> + 'static,
    {
        Self {
            name: name.to_owned(),
            arity,
            func: Box::new(func),
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments).map_err(RouxError::Native)
    }
}

impl fmt::Display for NativeFunction {
    /// Same form as a declared function: scripts cannot tell them apart.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}
