use log::trace;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::mem;

/// The different kinds of tokens recognized by the Roux scanner.
///
/// Variants without data represent punctuation, operators or keywords.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for user‑defined names.
/// `EOF` marks the end of input.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// '['
    LEFT_BRACKET,

    /// ']'
    RIGHT_BRACKET,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// ';'
    SEMICOLON,

    /// ':'
    COLON,

    /// '?'
    QUESTION,

    /// '-'
    MINUS,

    /// '--'
    MINUS_MINUS,

    /// '-='
    MINUS_EQUAL,

    /// '+'
    PLUS,

    /// '++'
    PLUS_PLUS,

    /// '+='
    PLUS_EQUAL,

    /// '/'
    SLASH,

    /// '/='
    SLASH_EQUAL,

    /// '*'
    STAR,

    /// '*='
    STAR_EQUAL,

    /// '%'
    PERCENT,

    /// '%='
    PERCENT_EQUAL,

    /// '&'
    AMPERSAND,

    /// '|'
    BAR,

    /// '^'
    CARET,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes)
    STRING(String),

    /// A numeric literal
    #[serde(rename = "NUMBER")]
    NUMBER(f64),

    /// 'and'
    AND,

    /// 'base' (reserved)
    BASE,

    /// 'break'
    BREAK,

    /// 'class'
    CLASS,

    /// 'continue'
    CONTINUE,

    /// 'else'
    ELSE,

    /// 'false'
    FALSE,

    /// 'fun'
    FUN,

    /// 'if'
    IF,

    /// 'null'
    NULL,

    /// 'or'
    OR,

    /// 'print'
    PRINT,

    /// 'return'
    RETURN,

    /// 'static'
    STATIC,

    /// 'this'
    THIS,

    /// 'true'
    TRUE,

    /// 'var'
    VAR,

    /// 'while'
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Variant name without payload, as printed by the `tokenize` command.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::LEFT_BRACKET => "LEFT_BRACKET",
            TokenType::RIGHT_BRACKET => "RIGHT_BRACKET",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::COLON => "COLON",
            TokenType::QUESTION => "QUESTION",
            TokenType::MINUS => "MINUS",
            TokenType::MINUS_MINUS => "MINUS_MINUS",
            TokenType::MINUS_EQUAL => "MINUS_EQUAL",
            TokenType::PLUS => "PLUS",
            TokenType::PLUS_PLUS => "PLUS_PLUS",
            TokenType::PLUS_EQUAL => "PLUS_EQUAL",
            TokenType::SLASH => "SLASH",
            TokenType::SLASH_EQUAL => "SLASH_EQUAL",
            TokenType::STAR => "STAR",
            TokenType::STAR_EQUAL => "STAR_EQUAL",
            TokenType::PERCENT => "PERCENT",
            TokenType::PERCENT_EQUAL => "PERCENT_EQUAL",
            TokenType::AMPERSAND => "AMPERSAND",
            TokenType::BAR => "BAR",
            TokenType::CARET => "CARET",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::AND => "AND",
            TokenType::BASE => "BASE",
            TokenType::BREAK => "BREAK",
            TokenType::CLASS => "CLASS",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::IF => "IF",
            TokenType::NULL => "NULL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::STATIC => "STATIC",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Two TokenTypes are equal if they share the same variant
    /// (ignoring any inner data). Uses `mem::discriminant` to compare.
    fn eq(&self, other: &Self) -> bool {
        let same: bool = mem::discriminant(self) == mem::discriminant(other);

        trace!("TokenType match: self={:?}, other={:?} => {}", self, other, same);

        same
    }
}

/// A scanned token, including its type, the original lexeme,
/// and the line number where it was found.
///
/// Tokens own their lexeme: the AST keeps them alive for as long as a closure
/// declared in the source is reachable, which outlives the source buffer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token (carries the literal value, if any).
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and line.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, line: usize) -> Self {
        let lexeme: String = lexeme.into();

        trace!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type,
            lexeme,
            line
        );

        Self {
            token_type,
            lexeme,
            line,
        }
    }

    /// A synthetic token on the same line, used by parser desugarings
    /// (`x += 1` becomes `x = x + 1` with a `+` token).
    pub fn with_type(&self, token_type: TokenType, lexeme: &str) -> Self {
        Token::new(token_type, lexeme, self.line)
    }
}

/// Formats a number the way literals are echoed by `tokenize`: `3` → `3.0`.
fn literal_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        format!("{}.0", buf.format(n as i64))
    } else {
        n.to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal: Cow<'_, str> = match &self.token_type {
            TokenType::STRING(s) => Cow::Borrowed(s),
            TokenType::NUMBER(n) => Cow::Owned(literal_number(*n)),
            _ => Cow::Borrowed("null"),
        };

        write!(f, "{} {} {}", self.token_type.name(), self.lexeme, literal)
    }
}
