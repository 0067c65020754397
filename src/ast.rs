//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes are immutable after construction. Every expression that reads or
//! writes a variable (`Variable`, `Assign`, `Suffix`, `This`) carries a
//! [`NodeId`] assigned by the parser; the resolver records scope distances
//! against those ids in a side table owned by the interpreter.
//!
//! Function bodies live behind `Rc<FunctionDecl>` so a closure can keep its
//! declaration alive after the statement list that produced it is dropped.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of a resolvable expression node.
pub type NodeId = usize;

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Null,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Prefix `!` or `-`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Arithmetic, comparison, equality, bitwise and comma operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    Grouping(Box<Expr>),

    Variable {
        id: NodeId,
        name: Token,
    },

    /// `name = value`; compound assignment and prefix `++`/`--` desugar to this.
    Assign {
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },

    /// Postfix `name++` / `name--`; evaluates to the value before the update.
    Suffix {
        id: NodeId,
        name: Token,
        operator: Token,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `object.name OP= value` and `++object.name`; `object` is evaluated once.
    Update {
        object: Box<Expr>,
        name: Token,
        operator: Token,
        value: Box<Expr>,
    },

    /// `object[index]`
    Subscript {
        object: Box<Expr>,
        /// The closing `]` token.
        bracket: Token,
        index: Box<Expr>,
    },

    This {
        id: NodeId,
        keyword: Token,
    },

    /// `fun (params) { body }` in expression position.
    Lambda(Rc<FunctionDecl>),
}

/// Parameters and body shared by named functions, methods and lambdas.
#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    /// The function's name, or the `fun` keyword for a lambda.
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// Statement nodes. A program is a sequence of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `var name (= initializer)? ;`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Break(Token),

    Continue(Token),

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword, for diagnostics.
        keyword: Token,

        /// Absent ⇒ `null` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,

        /// Optional base expression after `:`; evaluated but not inherited from.
        base: Option<Expr>,

        methods: Vec<Rc<FunctionDecl>>,

        static_methods: Vec<Rc<FunctionDecl>>,
    },
}
