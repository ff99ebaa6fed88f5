//! Marker expression language
//!
//! A deliberately tiny expression grammar for marker bodies:
//!
//! ```text
//! marker := ident | call
//! call   := ident '(' [ expr { ',' expr } [ ',' ] ] ')'
//! expr   := ident | call | string | raw | int
//! ```
//!
//! Strings are double quoted with the usual backslash escapes, raw strings
//! are backtick delimited and taken verbatim, integers are decimal digits.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// A parsed argument expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    /// Double quoted string, already unquoted
    Str(String),
    /// Backtick string, verbatim
    Raw(String),
    /// Decimal integer literal, as written
    Int(String),
    Call { name: String, args: Vec<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::Str(value) => write!(f, "{:?}", value),
            Expr::Raw(value) => write!(f, "`{}`", value),
            Expr::Int(digits) => f.write_str(digits),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Render an argument list as `[a, b, c]` for error messages
pub fn format_args_list(args: &[Expr]) -> String {
    let parts: Vec<String> = args.iter().map(Expr::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Raw(String),
    Int(String),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier {}", name),
            Token::Str(value) => write!(f, "string {:?}", value),
            Token::Raw(value) => write!(f, "raw string `{}`", value),
            Token::Int(digits) => write!(f, "integer {}", digits),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
        }
    }

    fn tokens(mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}

        let Some((pos, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '"' => Token::Str(self.string(pos)?),
            '`' => Token::Raw(self.raw(pos)?),
            c if c.is_ascii_digit() => {
                let mut digits = c.to_string();
                while let Some((_, d)) = self.chars.next_if(|(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                }
                if let Some(&(at, x)) = self.chars.peek() {
                    if is_ident_continue(x) {
                        return Err(format!("invalid character {:?} in number at {}", x, at));
                    }
                }
                Token::Int(digits)
            }
            c if is_ident_start(c) => {
                let mut name = c.to_string();
                while let Some((_, n)) = self.chars.next_if(|(_, n)| is_ident_continue(*n)) {
                    name.push(n);
                }
                Token::Ident(name)
            }
            other => return Err(format!("unexpected character {:?} at {}", other, pos)),
        };

        Ok(Some(token))
    }

    fn raw(&mut self, start: usize) -> Result<String, String> {
        let mut value = String::new();
        for (_, c) in self.chars.by_ref() {
            if c == '`' {
                return Ok(value);
            }
            value.push(c);
        }
        Err(format!("raw string starting at {} not terminated", start))
    }

    fn string(&mut self, start: usize) -> Result<String, String> {
        let mut value = String::new();
        loop {
            let Some((pos, c)) = self.chars.next() else {
                return Err(format!("string starting at {} not terminated", start));
            };
            match c {
                '"' => return Ok(value),
                '\n' => return Err(format!("newline in string starting at {}", start)),
                '\\' => value.push(self.escape(pos)?),
                c => value.push(c),
            }
        }
    }

    fn escape(&mut self, pos: usize) -> Result<char, String> {
        let Some((_, c)) = self.chars.next() else {
            return Err(format!("escape sequence at {} not terminated", pos));
        };
        let decoded = match c {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => self.code_point(pos, 2, 16)?,
            'u' => self.code_point(pos, 4, 16)?,
            'U' => self.code_point(pos, 8, 16)?,
            '0'..='7' => {
                let mut digits = c.to_string();
                for _ in 0..2 {
                    match self.chars.next() {
                        Some((_, d)) if d.is_digit(8) => digits.push(d),
                        _ => return Err(format!("invalid octal escape at {}", pos)),
                    }
                }
                let value = u32::from_str_radix(&digits, 8)
                    .map_err(|e| format!("invalid octal escape at {}: {}", pos, e))?;
                if value > 255 {
                    return Err(format!("octal escape value > 255 at {}", pos));
                }
                char::from_u32(value).ok_or_else(|| format!("invalid octal escape at {}", pos))?
            }
            other => return Err(format!("unknown escape sequence \\{} at {}", other, pos)),
        };
        Ok(decoded)
    }

    fn code_point(&mut self, pos: usize, width: usize, radix: u32) -> Result<char, String> {
        let mut digits = String::with_capacity(width);
        for _ in 0..width {
            match self.chars.next() {
                Some((_, d)) if d.is_digit(radix) => digits.push(d),
                _ => return Err(format!("invalid escape sequence at {}", pos)),
            }
        }
        u32::from_str_radix(&digits, radix)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("escape sequence at {} is an invalid code point", pos))
    }
}

/// Letters (general category L) and underscore
static IDENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\p{L}_]\z").expect("Invalid IDENT_START regex"));

/// Letters, decimal digits (category Nd) and underscore; `²` and `Ⅷ` are
/// numeric but not Nd, so they end an identifier
static IDENT_CONTINUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\p{L}\p{Nd}_]\z").expect("Invalid IDENT_CONTINUE regex"));

fn is_ident_start(c: char) -> bool {
    IDENT_START.is_match(c.encode_utf8(&mut [0; 4]))
}

fn is_ident_continue(c: char) -> bool {
    IDENT_CONTINUE.is_match(c.encode_utf8(&mut [0; 4]))
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
    lookahead: Option<Token>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens.into_iter();
        let lookahead = tokens.next();
        Self { tokens, lookahead }
    }

    fn bump(&mut self) -> Option<Token> {
        std::mem::replace(&mut self.lookahead, self.tokens.next())
    }

    fn expr(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Some(Token::Ident(name)) => {
                if self.lookahead == Some(Token::LParen) {
                    self.bump();
                    let args = self.args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            Some(Token::Str(value)) => Ok(Expr::Str(value)),
            Some(Token::Raw(value)) => Ok(Expr::Raw(value)),
            Some(Token::Int(digits)) => Ok(Expr::Int(digits)),
            Some(other) => Err(format!("expected expression, found {}", other)),
            None => Err("expected expression, found end of marker".to_string()),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one
    fn args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        loop {
            if self.lookahead == Some(Token::RParen) {
                self.bump();
                return Ok(args);
            }
            args.push(self.expr()?);
            match self.bump() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(args),
                Some(other) => return Err(format!("expected ',' or ')', found {}", other)),
                None => return Err("missing ',' or ')' before end of marker".to_string()),
            }
        }
    }
}

/// Parse one complete expression; trailing tokens are an error
pub fn parse_expr(src: &str) -> Result<Expr, String> {
    let tokens = Lexer::new(src).tokens()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.expr()?;
    if let Some(extra) = parser.bump() {
        return Err(format!("unexpected {} after expression", extra));
    }
    Ok(expr)
}
