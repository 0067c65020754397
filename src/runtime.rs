//! Embedding surface.
//!
//! A [`Runtime`] owns one interpreter, its global frame and an error reporter.
//! Hosts feed it source with [`Runtime::run`], inject native capabilities
//! through [`LibraryBinder`]s, and reach into script state by dotted paths:
//!
//! ```no_run
//! use roux::runtime::Runtime;
//! use roux::value::Value;
//!
//! let mut runtime = Runtime::new();
//! runtime.run("class Point { construct(x) { this.x = x; } } var p = Point(3);")?;
//! assert_eq!(runtime.get_value("p.x")?, Value::Number(3.0));
//! # Ok::<(), roux::error::RouxError>(())
//! ```
//!
//! After any fatal error the runtime refuses further work with
//! [`RouxError::PendingErrors`] until [`Runtime::reset_error_system`] is called.

use std::rc::Rc;

use log::{info, warn};

use crate::ast::{Expr, NodeId, Stmt};
use crate::class::Instance;
use crate::error::{Result, RouxError, Warning};
use crate::interpreter::Interpreter;
use crate::io::IoStream;
use crate::parser::Parser;
use crate::reporter::ErrorReporter;
use crate::resolver::Resolver;
use crate::scanner;
use crate::stdlib::StandardLibrary;
use crate::token::Token;
use crate::value::Value;

/// Registers native capabilities with a runtime before scripts run.
pub trait LibraryBinder {
    fn bind(&self, runtime: &mut Runtime);
}

/// Something to call or instantiate: a dotted global path or a value in hand.
pub enum Target<'a> {
    Address(&'a str),
    Value(Value),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(address: &'a str) -> Self {
        Target::Address(address)
    }
}

impl From<Value> for Target<'_> {
    fn from(value: Value) -> Self {
        Target::Value(value)
    }
}

pub struct Runtime {
    interpreter: Interpreter,
    reporter: ErrorReporter,
    next_node_id: NodeId,
}

impl Runtime {
    /// Console I/O plus the standard library.
    pub fn new() -> Self {
        Runtime::with_io(IoStream::stdio())
    }

    /// Custom I/O hooks plus the standard library.
    pub fn with_io(io: IoStream) -> Self {
        info!("Initializing Runtime");

        let io: Rc<IoStream> = Rc::new(io);
        let mut runtime = Runtime {
            interpreter: Interpreter::new(Rc::clone(&io)),
            reporter: ErrorReporter::new(io),
            next_node_id: 0,
        };

        runtime.bind(&StandardLibrary);
        runtime
    }

    pub fn bind<B: LibraryBinder>(&mut self, binder: &B) -> &mut Self {
        binder.bind(self);
        self
    }

    /// Scans, parses, resolves and executes `source`, stopping at the first
    /// stage that fails. Every diagnostic goes to the error hook; the first
    /// fatal one is also returned.
    pub fn run(&mut self, source: &str) -> Result<()> {
        self.check_pending()?;
        info!("Running {} bytes of source", source.len());

        let tokens: Vec<Token> = self.scan(source)?;

        let mut parser = Parser::with_node_base(tokens, self.next_node_id);
        let parsed = parser.parse();
        self.next_node_id = parser.next_node_id();

        let statements: Vec<Stmt> = parsed.map_err(|errors| self.fail_all(errors))?;

        let (outcome, warnings) = {
            let mut resolver = Resolver::new(&mut self.interpreter);
            let outcome: Result<()> = resolver.resolve(&statements);
            (outcome, resolver.warnings())
        };
        self.report_warnings(&warnings);
        outcome.map_err(|e| self.fail(e))?;

        self.interpreter
            .interpret(&statements)
            .map_err(|e| self.fail(e))?;

        info!("Run finished");
        Ok(())
    }

    /// Evaluates a single expression (an optional trailing `;` is allowed)
    /// and returns its value.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        self.check_pending()?;

        let tokens: Vec<Token> = self.scan(source)?;

        let mut parser = Parser::with_node_base(tokens, self.next_node_id);
        let parsed = parser.parse_expression();
        self.next_node_id = parser.next_node_id();

        let expr: Expr = parsed.map_err(|errors| self.fail_all(errors))?;

        let (outcome, warnings) = {
            let mut resolver = Resolver::new(&mut self.interpreter);
            let outcome: Result<()> = resolver.resolve_expression(&expr);
            (outcome, resolver.warnings())
        };
        self.report_warnings(&warnings);
        outcome.map_err(|e| self.fail(e))?;

        self.interpreter
            .interpret_expression(&expr)
            .map_err(|e| self.fail(e))
    }

    /// Clears the error flags so the next `run` is accepted.
    pub fn reset_error_system(&mut self) {
        info!("Resetting error system");
        self.reporter.reset();
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    // ───────────────────────── host interaction ─────────────────────────

    /// Calls a script function, bound method, native or class. Failures
    /// raised by the call are reported like those of [`Runtime::run`].
    pub fn call_function<'a, T: Into<Target<'a>>>(
        &mut self,
        target: T,
        arguments: &[Value],
    ) -> Result<Value> {
        let callee: Value = self.target_value(target.into())?;
        self.interpreter
            .call(&callee, arguments.to_vec())
            .map_err(|e| self.fail(e))
    }

    /// Instantiates a class given by path or value.
    pub fn create_instance<'a, T: Into<Target<'a>>>(
        &mut self,
        target: T,
        arguments: &[Value],
    ) -> Result<Rc<Instance>> {
        let class: Value = self.target_value(target.into())?;

        if !matches!(class, Value::Class(_)) {
            return Err(RouxError::Native(format!("'{}' is not a class", class)));
        }

        let created: Value = self
            .interpreter
            .call(&class, arguments.to_vec())
            .map_err(|e| self.fail(e))?;

        match created {
            Value::Instance(instance) => Ok(instance),
            other => Err(RouxError::Native(format!(
                "Constructor produced {} instead of an instance",
                other.type_name()
            ))),
        }
    }

    /// Reads a global, or a property reached through a dotted path such as
    /// `"player.position.x"`.
    pub fn get_value(&self, address: &str) -> Result<Value> {
        let (container, last) = self.walk(address)?;

        let found: Option<Value> = match container {
            None => self.interpreter.globals().borrow().fetch(last),
            Some(Value::Instance(instance)) => instance.get(last),
            Some(Value::Class(class)) => class.find_static(last),
            Some(_) => None,
        };

        found.ok_or_else(|| undefined(address))
    }

    /// Overwrites an existing global, or sets a field on the instance a dotted
    /// path leads to.
    pub fn set_value<V: Into<Value>>(&mut self, address: &str, value: V) -> Result<()> {
        let value: Value = value.into();
        let (container, last) = self.walk(address)?;

        match container {
            None => {
                if self.interpreter.globals().borrow_mut().assign(last, value) {
                    Ok(())
                } else {
                    Err(undefined(address))
                }
            }

            Some(Value::Instance(instance)) => {
                instance.set(last, value);
                Ok(())
            }

            Some(other) => Err(RouxError::Native(format!(
                "Only instances have fields, '{}' is a {}",
                address,
                other.type_name()
            ))),
        }
    }

    /// Binds `name` in the global frame, replacing any existing binding.
    pub fn define_value<V: Into<Value>>(&mut self, name: &str, value: V) {
        let value: Value = value.into();
        info!("Defining global '{}' = {}", name, value);
        self.interpreter.globals().borrow_mut().define(name, value);
    }

    // ───────────────────────── internals ─────────────────────────

    fn check_pending(&self) -> Result<()> {
        if self.reporter.had_error() || self.reporter.had_runtime_error() {
            warn!("Refusing to run before reset_error_system()");
            return Err(RouxError::PendingErrors);
        }
        Ok(())
    }

    fn scan(&mut self, source: &str) -> Result<Vec<Token>> {
        let (tokens, errors) = scanner::scan(source);

        if errors.is_empty() {
            Ok(tokens)
        } else {
            Err(self.fail_all(errors))
        }
    }

    fn fail(&mut self, error: RouxError) -> RouxError {
        self.reporter.error(&error);
        error
    }

    /// Reports every error and hands back the first.
    fn fail_all(&mut self, errors: Vec<RouxError>) -> RouxError {
        let mut first: Option<RouxError> = None;

        for error in errors {
            self.reporter.error(&error);
            if first.is_none() {
                first = Some(error);
            }
        }

        first.unwrap_or(RouxError::PendingErrors)
    }

    fn report_warnings(&self, warnings: &[Warning]) {
        for warning in warnings {
            self.reporter.warning(warning);
        }
    }

    fn target_value(&self, target: Target<'_>) -> Result<Value> {
        match target {
            Target::Address(address) => self.get_value(address),
            Target::Value(value) => Ok(value),
        }
    }

    /// Follows every segment of `address` but the last. Returns the value
    /// holding the last segment (`None` for the global frame) and that
    /// segment's name.
    fn walk<'a>(&self, address: &'a str) -> Result<(Option<Value>, &'a str)> {
        let mut segments: Vec<&str> = address.split('.').collect();
        let last: &str = segments.pop().unwrap_or_default();

        if last.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(RouxError::Native(format!("Malformed address '{}'", address)));
        }

        let mut container: Option<Value> = None;
        for (depth, segment) in segments.iter().enumerate() {
            let next: Option<Value> = match &container {
                None => self.interpreter.globals().borrow().fetch(segment),
                Some(Value::Instance(instance)) => instance.get(segment),
                Some(Value::Class(class)) => class.find_static(segment),
                Some(_) => None,
            };

            let prefix: String = segments[..=depth].join(".");
            container = Some(next.ok_or_else(|| undefined(&prefix))?);
        }

        Ok((container, last))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

fn undefined(address: &str) -> RouxError {
    RouxError::Native(format!("Undefined value '{}'", address))
}
