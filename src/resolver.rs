//! Static resolver pass for the **Roux** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of maps tracking each local's lifecycle:
//!    declared → defined → read).
//! 2. Report static errors (redeclaration, read in own initializer, invalid
//!    `return` / `this`) and collect non-fatal warnings (unused locals,
//!    statements after a `return`).
//! 3. Tell the interpreter, for *each* variable occurrence found in a local
//!    scope, how many frames out it lives. Anything not found is global and
//!    looked up by name at run time.

use std::collections::HashMap;

use log::{debug, info};

use crate::ast::{Expr, FunctionDecl, NodeId, Stmt};
use crate::callable::CONSTRUCTOR;
use crate::error::{Result, RouxError, Warning};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// What kind of body we are inside. Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Constructor,
    Static,
}

/// What kind of class body we are inside. Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Static,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum VariableState {
    Declared,
    Defined,
    Read,
}

#[derive(Debug)]
struct Variable {
    /// `None` for the implicit `this`, which is never reported as unused.
    token: Option<Token>,
    state: VariableState,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    scopes: Vec<HashMap<String, Variable>>,
    current_function: FunctionType,
    current_class: ClassType,
    warnings: Vec<Warning>,
}

impl<'i> Resolver<'i> {
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            warnings: Vec::new(),
        }
    }

    /// Walk all top‑level statements. Stops at the first fatal error.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }

        Ok(())
    }

    /// Resolve a standalone expression evaluated against the global frame.
    pub fn resolve_expression(&mut self, expr: &Expr) -> Result<()> {
        self.resolve_expr(expr)
    }

    /// Warnings gathered so far, ordered by line.
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings: Vec<Warning> = self.warnings.clone();
        warnings.sort_by_key(|w| w.line);
        warnings
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                let outcome: Result<()> = self.resolve_all(statements);
                self.end_scope();
                outcome?;
            }

            Stmt::Var { name, initializer } => {
                self.declare(name)?;
                if let Some(expr) = initializer {
                    self.resolve_expr(expr)?;
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // The name is visible inside its own body, so recursion works.
                self.declare(&declaration.name)?;
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function)?;
            }

            Stmt::Class {
                name,
                base,
                methods,
                static_methods,
            } => self.resolve_class(name, base.as_ref(), methods, static_methods)?,

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr)?,

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }

            // Loop placement was already checked by the parser.
            Stmt::Break(_) | Stmt::Continue(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(RouxError::resolve(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Constructor {
                        return Err(RouxError::resolve(
                            keyword,
                            "Can't return a value from a constructor.",
                        ));
                    }
                    self.resolve_expr(expr)?;
                }
            }
        }

        Ok(())
    }

    fn resolve_all(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(())
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        base: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
        static_methods: &[std::rc::Rc<FunctionDecl>],
    ) -> Result<()> {
        let enclosing_class: ClassType = self.current_class;

        self.declare(name)?;
        self.define(name);

        if let Some(base) = base {
            if let Expr::Variable { name: base_name, .. } = base {
                if base_name.lexeme == name.lexeme {
                    return Err(RouxError::resolve(
                        base_name,
                        "A class can't inherit from itself.",
                    ));
                }
            }
            self.resolve_expr(base)?;
        }

        // Static methods close over the declaring scope directly: no `this`.
        self.current_class = ClassType::Static;
        for method in static_methods {
            if let Err(e) = self.resolve_function(method, FunctionType::Static) {
                self.current_class = enclosing_class;
                return Err(e);
            }
        }

        self.current_class = ClassType::Class;
        self.begin_scope();
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                "this".to_owned(),
                Variable {
                    token: None,
                    state: VariableState::Read,
                },
            );
        }

        let mut outcome: Result<()> = Ok(());
        for method in methods {
            let kind: FunctionType = if method.name.lexeme == CONSTRUCTOR {
                FunctionType::Constructor
            } else {
                FunctionType::Method
            };

            outcome = self.resolve_function(method, kind);
            if outcome.is_err() {
                break;
            }
        }

        self.end_scope();
        self.current_class = enclosing_class;
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner)?,

            Expr::Unary { right, .. } => self.resolve_expr(right)?,

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)?;
            }

            Expr::Variable { id, name } => {
                self.check_initialized(name)?;
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }

            Expr::Suffix { id, name, .. } => {
                self.check_initialized(name)?;
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object)?,

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value)?;
                self.resolve_expr(object)?;
            }

            Expr::Update { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)?;
            }

            Expr::Subscript { object, index, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(index)?;
            }

            Expr::This { id, keyword } => match self.current_class {
                ClassType::None => {
                    return Err(RouxError::resolve(
                        keyword,
                        "Can't use 'this' outside of a class.",
                    ))
                }
                ClassType::Static => {
                    return Err(RouxError::resolve(
                        keyword,
                        "Can't use 'this' inside a static method.",
                    ))
                }
                ClassType::Class => self.resolve_local(*id, keyword),
            },

            Expr::Lambda(declaration) => {
                self.resolve_function(declaration, FunctionType::Lambda)?
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) -> Result<()> {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        let mut outcome: Result<()> = Ok(());
        for param in &function.params {
            outcome = self.declare(param);
            if outcome.is_err() {
                break;
            }
            self.define(param);
        }

        if outcome.is_ok() {
            outcome = self.resolve_all(&function.body);
        }

        if outcome.is_ok() {
            self.flag_unreachable(&function.body);
        }

        self.end_scope();
        self.current_function = enclosing;
        outcome
    }

    /// Shallow lint: a `return` that is not the last statement of the body.
    /// Nested blocks and branches are not inspected.
    fn flag_unreachable(&mut self, body: &[Stmt]) {
        let last: usize = body.len().saturating_sub(1);

        let early_return: Option<&Token> = body[..last].iter().find_map(|stmt| match stmt {
            Stmt::Return { keyword, .. } => Some(keyword),
            _ => None,
        });

        if let Some(keyword) = early_return {
            self.warnings
                .push(Warning::new(keyword, "Unreachable code detected"));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<Warning> = scope
            .into_values()
            .filter(|v| v.state != VariableState::Read)
            .filter_map(|v| v.token)
            .map(|token| Warning::new(&token, "Local variable is never used."))
            .collect();

        unused.sort_by_key(|w| w.line);
        self.warnings.append(&mut unused);
    }

    fn declare(&mut self, name: &Token) -> Result<()> {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                return Err(RouxError::resolve(
                    name,
                    "Variable with this name is already declared in this scope.",
                ));
            }

            scope.insert(
                name.lexeme.clone(),
                Variable {
                    token: Some(name.clone()),
                    state: VariableState::Declared,
                },
            );
        }
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(variable) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            if variable.state == VariableState::Declared {
                variable.state = VariableState::Defined;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Rejects a read of a local whose initializer is still being resolved.
    fn check_initialized(&self, name: &Token) -> Result<()> {
        let declared_only: bool = self
            .scopes
            .last()
            .and_then(|scope| scope.get(&name.lexeme))
            .is_some_and(|v| v.state == VariableState::Declared);

        if declared_only {
            return Err(RouxError::resolve(
                name,
                "Can't read local variable in its own initializer.",
            ));
        }

        Ok(())
    }

    /// Record this occurrence as a local at depth `d`, or leave it unrecorded
    /// (global) if no scope declares it.
    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(variable) = scope.get_mut(&name.lexeme) {
                variable.state = VariableState::Read;
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
