//! Module `scanner` implements a one‑pass, streaming lexer for the Roux language.
//!
//! It transforms source text into a sequence of `Token`s, skipping whitespace
//! and comments, and emitting exactly one `EOF` token at the end. Designed as a
//! `FusedIterator`, it can be chained safely with other iterator adapters.
//!
//! # Public API
//!
//! - `Scanner::new(src: &'a str) -> Scanner<'a>`
//!   Create a new lexer over the input text.
//!
//! - `impl Iterator for Scanner<'a>`
//!   Yields `Result<Token, RouxError>` on each `.next()`. Errors (unterminated
//!   strings, unexpected characters) are non‑fatal: scanning resumes after them.
//!
//! - `scan(src: &str) -> (Vec<Token>, Vec<RouxError>)`
//!   Drain a scanner, splitting tokens from diagnostics.
//!
//! # Token Recognition (`scan_token`)
//!
//! - Single‑character tokens: `( ) { } [ ] , . ; : ? & | ^`.
//! - Greedy one‑character lookahead: `+ ++ +=`, `- -- -=`, `* *=`, `/ /=`, `% %=`,
//!   `! !=`, `= ==`, `< <=`, `> >=`.
//! - Comments: `//` to end of line and `/* … */` blocks (newlines counted).
//! - String literals: `"…"` or `'…'`, may span lines.
//! - Numeric literals: integer with optional fractional part.
//! - Identifiers/keywords: alphanumeric/_ sequences, resolved via a perfect‑hash `KEYWORDS` map.
//!
//! Comment skipping uses `memchr` / `memmem` for bulk searches.

use crate::error::{Result, RouxError};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::{memchr, memchr_iter, memmem};
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"      => TokenType::AND,
    b"base"     => TokenType::BASE,
    b"break"    => TokenType::BREAK,
    b"class"    => TokenType::CLASS,
    b"continue" => TokenType::CONTINUE,
    b"else"     => TokenType::ELSE,
    b"false"    => TokenType::FALSE,
    b"fun"      => TokenType::FUN,
    b"if"       => TokenType::IF,
    b"null"     => TokenType::NULL,
    b"or"       => TokenType::OR,
    b"print"    => TokenType::PRINT,
    b"return"   => TokenType::RETURN,
    b"static"   => TokenType::STATIC,
    b"this"     => TokenType::THIS,
    b"true"     => TokenType::TRUE,
    b"var"      => TokenType::VAR,
    b"while"    => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
pub struct Scanner<'a> {
    text: &'a str,              // source, used for lexeme slicing
    src: &'a [u8],              // same buffer viewed as bytes
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `text`.
    #[inline]
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    #[inline(always)]
    const fn len(&self) -> usize {
        self.src.len()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it. Callers guard with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.src[self.curr];
        self.curr += 1;
        b
    }

    /// Current byte, or `0` past EOF.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Consume a byte **iff** it matches `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick `double` if the next byte is `second`, otherwise `single`.
    #[inline(always)]
    fn either(&mut self, second: u8, double: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(second) {
            double
        } else {
            single
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`. Whitespace and comments
    /// return `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        let tt: TokenType = match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b'[' => TokenType::LEFT_BRACKET,
            b']' => TokenType::RIGHT_BRACKET,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b';' => TokenType::SEMICOLON,
            b':' => TokenType::COLON,
            b'?' => TokenType::QUESTION,
            b'&' => TokenType::AMPERSAND,
            b'|' => TokenType::BAR,
            b'^' => TokenType::CARET,

            // ── one or two characters ────────────────────────────────────
            b'+' => {
                if self.match_byte(b'+') {
                    TokenType::PLUS_PLUS
                } else {
                    self.either(b'=', TokenType::PLUS_EQUAL, TokenType::PLUS)
                }
            }

            b'-' => {
                if self.match_byte(b'-') {
                    TokenType::MINUS_MINUS
                } else {
                    self.either(b'=', TokenType::MINUS_EQUAL, TokenType::MINUS)
                }
            }

            b'*' => self.either(b'=', TokenType::STAR_EQUAL, TokenType::STAR),
            b'%' => self.either(b'=', TokenType::PERCENT_EQUAL, TokenType::PERCENT),
            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => return Ok(()),

            b'\n' => {
                self.line += 1;

                return Ok(());
            }

            // ── comments or slash operators ──────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    match memchr(b'\n', &self.src[self.curr..]) {
                        Some(pos) => self.curr += pos,
                        None => self.curr = self.len(),
                    }

                    return Ok(());
                }

                if self.match_byte(b'*') {
                    self.skip_block_comment();

                    return Ok(());
                }

                self.either(b'=', TokenType::SLASH_EQUAL, TokenType::SLASH)
            }

            // ── string literal " … " or ' … ' ────────────────────────────
            b'"' | b'\'' => return self.parse_string(b),

            b'0'..=b'9' => self.parse_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.parse_identifier(),

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Step over the whole UTF‑8 sequence so lexeme slicing stays on
                // a char boundary.
                let ch: char = self.text[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + ch.len_utf8();

                return Err(RouxError::lex(
                    self.line,
                    format!("Unexpected character: {}", ch),
                ));
            }
        };

        self.pending = Some(tt);

        Ok(())
    }

    /// Skip to just past the closing `*/`, or to EOF if the comment never ends.
    fn skip_block_comment(&mut self) {
        let rest: &[u8] = &self.src[self.curr..];
        let end: usize = match memmem::find(rest, b"*/") {
            Some(pos) => pos + 2,
            None => rest.len(),
        };

        self.line += memchr_iter(b'\n', &rest[..end]).count();
        self.curr += end;
    }

    /// Parse a string literal delimited by `quote`.
    ///
    /// * `self.start` still points to the opening quote.
    /// * When we return, `self.curr` points **past** the closing quote.
    fn parse_string(&mut self, quote: u8) -> Result<()> {
        while !self.is_at_end() && self.peek() != quote {
            if self.advance() == b'\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(RouxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // closing quote

        let s: &str = &self.text[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`). Fractions are optional.
    fn parse_number(&mut self) -> TokenType {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.text[self.start..self.curr];

        // Only ASCII digits and at most one '.' were consumed.
        TokenType::NUMBER(s.parse::<f64>().unwrap_or(0.0))
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) -> TokenType {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.src[self.start..self.curr];

        KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.curr <= self.len() {
            // EOF guard: emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1;
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            self.start = self.curr;
            self.pending = None;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(tt) = self.pending.take() {
                let lexeme: &str = &self.text[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lexeme, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `source`, returning every token (always ending with `EOF`)
/// alongside every lexical error encountered.
pub fn scan(source: &str) -> (Vec<Token>, Vec<RouxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<RouxError> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scan finished: {} token(s), {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
