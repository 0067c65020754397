//! Centralised error hierarchy for the **Roux runtime**.
//!
//! All pipeline stages (scanner, parser, resolver, evaluator) and the embedding
//! surface convert their failure modes into one of the variants defined here.
//! This gives the crate a uniform `Result<T>` alias and lets the CLI lift every
//! failure into `anyhow` with `?`.
//!
//! The module **does not** print diagnostics itself; the
//! [`ErrorReporter`](crate::reporter::ErrorReporter) routes them to the host.

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the runtime.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'` or ` at end`.
        location: String,
    },

    /// Static resolution failure (redeclaration, use in own initializer,
    /// misplaced `return` / `this`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Failure raised by a host-side native capability. The evaluator re-tags
    /// it as [`RouxError::Runtime`] with the call-site line.
    #[error("Native error: {0}")]
    Native(String),

    /// A run was attempted while an earlier fatal error was still flagged.
    #[error("Previous errors must be cleared with reset_error_system() before running again")]
    PendingErrors,

    /// Wrapper around `std::io::Error` (transparent).
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RouxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        RouxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        RouxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        RouxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        RouxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// `true` for errors raised while evaluating, as opposed to compiling.
    pub fn is_runtime(&self) -> bool {
        matches!(self, RouxError::Runtime { .. } | RouxError::Native(_))
    }
}

/// A non-fatal diagnostic emitted by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub line: usize,
    pub location: String,
}

impl Warning {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        Self {
            message: msg.into(),
            line: token.line,
            location: location_of(token),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] Warning{}: {}",
            self.line, self.location, self.message
        )
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_owned()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, RouxError>;
