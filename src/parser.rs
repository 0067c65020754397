/*!
Recursive‑descent parser for Roux.

Every token is consumed once by `advance()`; error recovery via `synchronize()`
discards tokens up to the next statement boundary, so one malformed statement
does not hide later diagnostics. Any recorded error still prevents the program
from being handed to the resolver.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths                  | `debug`| Context before recording the error.       |

--------------------------------------------------------------------------------
Grammar (EBNF — condensed)
--------------------------------------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( ":" call )? "{" ( "static"? method )* "}" ;
method         → IDENT "(" parameters? ")" block ;
funDecl        → "fun" IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | printStmt | whileStmt | ifStmt | block
               | returnStmt | breakStmt | continueStmt ;
block          → "{" declaration* "}" ;
expression     → comma ;
comma          → assignment ( "," assignment )* ;
assignment     → ( call "." )? IDENT ( "=" | "+=" | "-=" | "*=" | "/=" | "%=" ) assignment
               | ternary ;
ternary        → logic_or ( "?" ternary ":" ternary )? ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → bit_or ( ( ">" | ">=" | "<" | "<=" ) bit_or )* ;
bit_or         → bit_xor ( "|" bit_xor )* ;
bit_xor        → bit_and ( "^" bit_and )* ;
bit_and        → term ( "&" term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" | "%" ) unary )* ;
unary          → ( "!" | "-" ) unary | prefix ;
prefix         → ( "++" | "--" ) postfix | postfix ;
postfix        → call ( "++" | "--" )? ;
call           → primary ( "(" arguments? ")" | "." IDENT | "[" expression "]" )* ;
arguments      → assignment ( "," assignment )* ;
primary        → NUMBER | STRING | "true" | "false" | "null" | "this"
               | IDENT | "(" expression ")" | "fun" "(" parameters? ")" block ;
```
*/

use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LiteralValue, NodeId, Stmt};
use crate::error::{Result, RouxError};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
pub const MAX_ARITY: usize = 255;

/// Top‑level parser over an owned token sequence.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Number of enclosing `while` bodies in the current function.
    loop_depth: usize,
    next_id: NodeId,
    errors: Vec<RouxError>,
}

impl Parser {
    /// Construct a new parser whose node ids start at zero.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_node_base(tokens, 0)
    }

    /// Construct a parser whose node ids start at `base`. A runtime that parses
    /// several sources into one interpreter passes the previous
    /// [`next_node_id`](Self::next_node_id) here so ids never collide.
    pub fn with_node_base(mut tokens: Vec<Token>, base: NodeId) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if tokens.last().map(|t| t.token_type != TokenType::EOF).unwrap_or(true) {
            let line: usize = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            next_id: base,
            errors: Vec::new(),
        }
    }

    /// First id not yet handed out.
    pub fn next_node_id(&self) -> NodeId {
        self.next_id
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. On failure every collected error is returned.
    pub fn parse(&mut self) -> std::result::Result<Vec<Stmt>, Vec<RouxError>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    debug!("Parse error, synchronizing: {}", e);
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        self.finish(statements)
    }

    /// Parse a single expression (an optional trailing `;` is accepted).
    pub fn parse_expression(&mut self) -> std::result::Result<Expr, Vec<RouxError>> {
        info!("Beginning expression parse");

        match self.expression() {
            Ok(expr) => {
                self.matches(TokenType::SEMICOLON);

                if !self.is_at_end() {
                    let err = RouxError::parse(self.peek(), "Expected end of expression");
                    self.errors.push(err);
                }

                self.finish(expr)
            }
            Err(e) => {
                self.errors.push(e);
                Err(std::mem::take(&mut self.errors))
            }
        }
    }

    fn finish<T>(&mut self, value: T) -> std::result::Result<T, Vec<RouxError>> {
        if self.errors.is_empty() {
            info!("Parse completed without errors");
            Ok(value)
        } else {
            info!("Parse completed with {} error(s)", self.errors.len());
            Err(std::mem::take(&mut self.errors))
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<Stmt> {
        debug!("Entering declaration");

        if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            let function: Rc<FunctionDecl> = self.function("function")?;
            Ok(Stmt::Function(function))
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let base: Option<Expr> = if self.matches(TokenType::COLON) {
            Some(self.call()?)
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();
        let mut static_methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.matches(TokenType::STATIC) {
                static_methods.push(self.function("static method")?);
            } else {
                methods.push(self.function("method")?);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        debug!(
            "Parsed class '{}' with {} method(s), {} static",
            name.lexeme,
            methods.len(),
            static_methods.len()
        );

        Ok(Stmt::Class {
            name,
            base,
            methods,
            static_methods,
        })
    }

    /// `IDENT "(" parameters? ")" block` — the leading keyword, if any, is
    /// already consumed.
    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name: Token = self.consume(TokenType::IDENTIFIER, &format!("Expected {} name", kind))?;

        self.function_body(name, kind)
    }

    fn function_body(&mut self, name: Token, kind: &str) -> Result<Rc<FunctionDecl>> {
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    // Reported, but parsing carries on.
                    let err = RouxError::parse(
                        self.peek(),
                        format!("Can't have more than {} parameters", MAX_ARITY),
                    );
                    self.errors.push(err);
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body", kind),
        )?;

        // A loop around the declaration does not make `break` legal inside it.
        let enclosing_loops: usize = std::mem::replace(&mut self.loop_depth, 0);
        let body: Result<Vec<Stmt>> = self.block();
        self.loop_depth = enclosing_loops;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            body: body?,
        }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) || self.matches(TokenType::CONTINUE) {
            self.loop_control()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        self.loop_depth += 1;
        let body: Result<Stmt> = self.statement();
        self.loop_depth -= 1;

        Ok(Stmt::While {
            condition,
            body: Box::new(body?),
        })
    }

    fn loop_control(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            debug!("'{}' outside of a loop", keyword.lexeme);
            let err = RouxError::parse(
                &keyword,
                format!("Must be inside a loop to use '{}'", keyword.lexeme),
            );
            self.errors.push(err);
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expected ';' after '{}'", keyword.lexeme),
        )?;

        if keyword.token_type == TokenType::BREAK {
            Ok(Stmt::Break(keyword))
        } else {
            Ok(Stmt::Continue(keyword))
        }
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.assignment()?;

        while self.matches(TokenType::COMMA) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.assignment()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.ternary()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                other => {
                    // Reported without unwinding: the parser is not confused.
                    let err = RouxError::parse(&equals, "Invalid assignment target");
                    self.errors.push(err);
                    Ok(other)
                }
            };
        }

        if let Some((symbol, lexeme)) = self.compound_operator() {
            let compound: Token = self.previous().clone();
            let operator: Token = compound.with_type(symbol, lexeme);
            let value: Expr = self.assignment()?;

            return match self.desugar_update(expr, operator, value) {
                Some(desugared) => Ok(desugared),
                None => Err(RouxError::parse(&compound, "Invalid assignment target")),
            };
        }

        Ok(expr)
    }

    /// Consumes `+= -= *= /= %=` and yields the plain operator it stands for.
    fn compound_operator(&mut self) -> Option<(TokenType, &'static str)> {
        if self.matches(TokenType::PLUS_EQUAL) {
            Some((TokenType::PLUS, "+"))
        } else if self.matches(TokenType::MINUS_EQUAL) {
            Some((TokenType::MINUS, "-"))
        } else if self.matches(TokenType::STAR_EQUAL) {
            Some((TokenType::STAR, "*"))
        } else if self.matches(TokenType::SLASH_EQUAL) {
            Some((TokenType::SLASH, "/"))
        } else if self.matches(TokenType::PERCENT_EQUAL) {
            Some((TokenType::PERCENT, "%"))
        } else {
            None
        }
    }

    /// Rewrites `name OP= value` into `name = name OP value`; property targets
    /// become a single `Expr::Update`. Returns `None` when `target` is not
    /// assignable.
    fn desugar_update(&mut self, target: Expr, operator: Token, value: Expr) -> Option<Expr> {
        match target {
            Expr::Variable { id, name } => {
                let current = Expr::Variable {
                    id,
                    name: name.clone(),
                };

                Some(Expr::Assign {
                    id: self.fresh_id(),
                    name,
                    value: Box::new(Expr::Binary {
                        left: Box::new(current),
                        operator,
                        right: Box::new(value),
                    }),
                })
            }

            Expr::Get { object, name } => Some(Expr::Update {
                object,
                name,
                operator,
                value: Box::new(value),
            }),

            _ => None,
        }
    }

    fn ternary(&mut self) -> Result<Expr> {
        let condition: Expr = self.logical_or()?;

        if self.matches(TokenType::QUESTION) {
            let then_branch: Expr = self.ternary()?;
            self.consume(TokenType::COLON, "Expected ':' in ternary expression")?;
            let else_branch: Expr = self.ternary()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(condition)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            expr = self.binary_tail(expr, Self::comparison)?;
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.bit_or()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            expr = self.binary_tail(expr, Self::bit_or)?;
        }

        Ok(expr)
    }

    fn bit_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.bit_xor()?;

        while self.matches(TokenType::BAR) {
            expr = self.binary_tail(expr, Self::bit_xor)?;
        }

        Ok(expr)
    }

    fn bit_xor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.bit_and()?;

        while self.matches(TokenType::CARET) {
            expr = self.binary_tail(expr, Self::bit_and)?;
        }

        Ok(expr)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches(TokenType::AMPERSAND) {
            expr = self.binary_tail(expr, Self::term)?;
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            expr = self.binary_tail(expr, Self::factor)?;
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches(TokenType::STAR)
            || self.matches(TokenType::SLASH)
            || self.matches(TokenType::PERCENT)
        {
            expr = self.binary_tail(expr, Self::unary)?;
        }

        Ok(expr)
    }

    /// Builds `left OP right` where OP was just consumed and `right` is parsed
    /// by the next‑higher precedence rule.
    fn binary_tail(&mut self, left: Expr, operand: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        let operator: Token = self.previous().clone();
        let right: Expr = operand(self)?;

        Ok(Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.prefix()
    }

    /// `++x` becomes `x = x + 1`, so the expression yields the updated value.
    fn prefix(&mut self) -> Result<Expr> {
        if self.matches(TokenType::PLUS_PLUS) || self.matches(TokenType::MINUS_MINUS) {
            let step: Token = self.previous().clone();
            let operator: Token = step_operator(&step);
            let target: Expr = self.postfix()?;
            let one = Expr::Literal(LiteralValue::Number(1.0));

            return match self.desugar_update(target, operator, one) {
                Some(desugared) => Ok(desugared),
                None => Err(RouxError::parse(&step, "Invalid increment target")),
            };
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr: Expr = self.call()?;

        if self.check(TokenType::PLUS_PLUS) || self.check(TokenType::MINUS_MINUS) {
            let operator: Token = self.advance().clone();

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Suffix {
                    id: self.fresh_id(),
                    name,
                    operator,
                }),
                _ => Err(RouxError::parse(&operator, "Invalid increment target")),
            };
        }

        Ok(expr)
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else if self.matches(TokenType::LEFT_BRACKET) {
                let index: Expr = self.expression()?;
                let bracket: Token =
                    self.consume(TokenType::RIGHT_BRACKET, "Expected ']' after index")?;

                expr = Expr::Subscript {
                    object: Box::new(expr),
                    bracket,
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let err = RouxError::parse(
                        self.peek(),
                        format!("Can't have more than {} arguments", MAX_ARITY),
                    );
                    self.errors.push(err);
                }

                // `assignment`, not `expression`: commas separate arguments here.
                arguments.push(self.assignment()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NULL) {
            return Ok(Expr::Literal(LiteralValue::Null));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Number(n)));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            let s: String = s.clone();
            self.advance();
            return Ok(Expr::Literal(LiteralValue::Str(s)));
        }

        if self.matches(TokenType::THIS) {
            let keyword: Token = self.previous().clone();
            return Ok(Expr::This {
                id: self.fresh_id(),
                keyword,
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            let name: Token = self.previous().clone();
            return Ok(Expr::Variable {
                id: self.fresh_id(),
                name,
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::FUN) {
            let keyword: Token = self.previous().clone();
            return Ok(Expr::Lambda(self.function_body(keyword, "lambda")?));
        }

        debug!("No expression at '{}'", self.peek().lexeme);

        Err(RouxError::parse(self.peek(), "Expected expression"))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn fresh_id(&mut self) -> NodeId {
        let id: NodeId = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        debug!("consume failed at '{}': {}", self.peek().lexeme, message);

        Err(RouxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    fn check_next(&self, ttype: TokenType) -> bool {
        match self.tokens.get(self.current + 1) {
            Some(token) => token.token_type == ttype,
            None => false,
        }
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::CONTINUE => return,
                _ => {}
            }

            self.advance();
        }
    }
}

/// `++` → `+`, `--` → `-`, keeping the source line.
fn step_operator(step: &Token) -> Token {
    if step.token_type == TokenType::PLUS_PLUS {
        step.with_type(TokenType::PLUS, "+")
    } else {
        step.with_type(TokenType::MINUS, "-")
    }
}
