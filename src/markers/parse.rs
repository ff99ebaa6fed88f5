//! Marker extraction
//!
//! Turns the raw `//@` bodies of each indexed line into [`Marker`] records.
//!
//! A bare identifier is sugar for declaring an anchor of the same name that
//! matches its own text, so `//@Name` is read as `//@mark(Name, "Name")`.

use std::fmt;
use std::rc::Rc;

use crate::markers::error::{MarkerError, Result};
use crate::markers::expr::{parse_expr, Expr};
use crate::markers::lines::{index_lines, Line, SourceFile};

/// Method name of the built-in anchor declaration
pub const MARK_METHOD: &str = "mark";

/// One marker occurrence within a source file
#[derive(Debug, Clone)]
pub struct Marker {
    /// The line on which the marker occurred
    pub line: Rc<Line>,
    /// The method the marker invokes
    pub method: String,
    /// The arguments to pass to that method
    pub args: Vec<Expr>,
}

impl Marker {
    /// The marker as it would be written, e.g. `mark(Name, "Name")`
    pub fn source(&self) -> String {
        Expr::Call {
            name: self.method.clone(),
            args: self.args.clone(),
        }
        .to_string()
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.method, self.line)
    }
}

/// Parse one marker body found on `line`
pub fn parse_marker(line: &Rc<Line>, body: &[u8]) -> Result<Marker> {
    let text = String::from_utf8_lossy(body);
    let body = text.trim();

    let syntax = |reason: String| MarkerError::Syntax {
        file: line.file.name.clone(),
        line: line.number,
        body: body.to_string(),
        reason,
    };

    match parse_expr(body).map_err(&syntax)? {
        Expr::Ident(name) => Ok(Marker {
            line: Rc::clone(line),
            method: MARK_METHOD.to_string(),
            args: vec![Expr::Ident(name.clone()), Expr::Str(name)],
        }),
        Expr::Call { name, args } => Ok(Marker {
            line: Rc::clone(line),
            method: name,
            args,
        }),
        other => Err(syntax(format!(
            "unhandled marker expression {}, expected identifier or call",
            other
        ))),
    }
}

/// Extract every marker in file, line, occurrence order.
///
/// Stops at the first syntax error; markers parsed before it are still
/// appended to `out`.
pub fn extract_markers(file: SourceFile, out: &mut Vec<Marker>) -> Result<usize> {
    let file = Rc::new(file);
    let before = out.len();

    for indexed in index_lines(&file) {
        for body in &indexed.bodies {
            out.push(parse_marker(&indexed.line, body)?);
        }
    }

    Ok(out.len() - before)
}
