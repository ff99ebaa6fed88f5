//! Type-directed argument conversion
//!
//! A handler declares the kinds of its parameters; from that declaration one
//! converter per parameter is built. Each converter consumes argument
//! expressions from the front of the marker's remaining arguments and yields
//! one typed [`Value`].
//!
//! Position conversion depends on the expression shape:
//! - an identifier names an anchor
//! - a double quoted string is matched literally against the marker's line
//! - a backtick string is a regular expression matched against the line

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::markers::error::{MarkerError, Result};
use crate::markers::expr::Expr;
use crate::markers::parse::Marker;
use crate::markers::position::{find_literal, find_regex, Position};

/// Name to position bindings established by `mark` markers
pub type AnchorTable = HashMap<String, Position>;

/// Source of anchor bindings for identifier positions
pub trait AnchorLookup {
    fn anchor(&self, name: &str) -> Option<Position>;
}

impl AnchorLookup for AnchorTable {
    fn anchor(&self, name: &str) -> Option<Position> {
        self.get(name).cloned()
    }
}

impl AnchorLookup for RefCell<AnchorTable> {
    fn anchor(&self, name: &str) -> Option<Position> {
        self.borrow().get(name).cloned()
    }
}

/// Kinds of handler parameter a converter can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Position,
    String,
    Int,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParamKind::Position => "position",
            ParamKind::String => "string",
            ParamKind::Int => "int",
        })
    }
}

impl FromStr for ParamKind {
    type Err = MarkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "position" | "pos" => Ok(ParamKind::Position),
            "string" | "str" => Ok(ParamKind::String),
            "int" | "integer" => Ok(ParamKind::Int),
            other => Err(MarkerError::UnsupportedParam(other.to_string())),
        }
    }
}

/// Parse a comma separated parameter list such as `string, position`
pub fn parse_kinds(signature: &str) -> Result<Vec<ParamKind>> {
    if signature.trim().is_empty() {
        return Ok(Vec::new());
    }
    signature.split(',').map(str::parse).collect()
}

/// A converted argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Position(Position),
    String(String),
    Int(i64),
}

/// Rust types that can be declared as handler parameters
pub trait Param: Sized {
    const KIND: ParamKind;

    fn from_value(value: Value) -> Option<Self>;
}

impl Param for Position {
    const KIND: ParamKind = ParamKind::Position;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Position(p) => Some(p),
            _ => None,
        }
    }
}

impl Param for String {
    const KIND: ParamKind = ParamKind::String;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Param for i64 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }
}

/// Converts the next expression(s) of `args` into a value
pub type Converter = fn(&dyn AnchorLookup, &Marker, &mut &[Expr]) -> Result<Value>;

/// Build the converters for a parameter list, in declaration order
pub fn build_converters(kinds: &[ParamKind]) -> Vec<Converter> {
    kinds.iter().map(|kind| converter_for(*kind)).collect()
}

fn converter_for(kind: ParamKind) -> Converter {
    match kind {
        ParamKind::Position => convert_position,
        ParamKind::String => convert_string,
        ParamKind::Int => convert_int,
    }
}

fn next_arg<'a>(marker: &Marker, args: &mut &'a [Expr]) -> Result<&'a Expr> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| MarkerError::MissingArgument {
            marker: marker.to_string(),
        })?;
    *args = rest;
    Ok(first)
}

fn convert_position(
    anchors: &dyn AnchorLookup,
    marker: &Marker,
    args: &mut &[Expr],
) -> Result<Value> {
    let position = match next_arg(marker, args)? {
        Expr::Ident(name) => anchors
            .anchor(name)
            .ok_or_else(|| MarkerError::UnknownAnchor {
                name: name.clone(),
                marker: marker.to_string(),
            })?,
        Expr::Str(pattern) => find_literal(&marker.line, pattern)?,
        Expr::Raw(pattern) => find_regex(&marker.line, pattern)?,
        other => {
            return Err(MarkerError::NotAPosition {
                arg: other.to_string(),
                marker: marker.to_string(),
            })
        }
    };
    Ok(Value::Position(position))
}

fn convert_string(_: &dyn AnchorLookup, marker: &Marker, args: &mut &[Expr]) -> Result<Value> {
    match next_arg(marker, args)? {
        Expr::Ident(name) => Ok(Value::String(name.clone())),
        Expr::Str(value) | Expr::Raw(value) => Ok(Value::String(value.clone())),
        other => Err(MarkerError::TypeMismatch {
            arg: other.to_string(),
            expected: "string",
            marker: marker.to_string(),
        }),
    }
}

fn convert_int(_: &dyn AnchorLookup, marker: &Marker, args: &mut &[Expr]) -> Result<Value> {
    match next_arg(marker, args)? {
        Expr::Int(digits) => digits
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|source| MarkerError::InvalidInt {
                arg: digits.clone(),
                marker: marker.to_string(),
                source,
            }),
        other => Err(MarkerError::TypeMismatch {
            arg: other.to_string(),
            expected: "int",
            marker: marker.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::lines::{Line, SourceFile};
    use std::rc::Rc;

    fn marker(value: &str, args: Vec<Expr>) -> Marker {
        Marker {
            line: Rc::new(Line {
                file: Rc::new(SourceFile::new("conv.go", value)),
                offset: 20,
                number: 4,
                value: value.as_bytes().to_vec(),
                len: value.len(),
            }),
            method: "test".to_string(),
            args,
        }
    }

    fn convert_all(kinds: &[ParamKind], m: &Marker, anchors: &AnchorTable) -> Result<Vec<Value>> {
        let mut args: &[Expr] = &m.args;
        build_converters(kinds)
            .iter()
            .map(|convert| convert(anchors, m, &mut args))
            .collect()
    }

    #[test]
    fn test_position_from_literal_and_regex() {
        let m = marker(
            "let αβ = 1 ",
            vec![Expr::Str("=".to_string()), Expr::Raw(r"\p{Greek}".to_string())],
        );
        let values =
            convert_all(&[ParamKind::Position, ParamKind::Position], &m, &AnchorTable::new())
                .unwrap();

        let Value::Position(eq) = &values[0] else {
            panic!("expected position");
        };
        // "let αβ " is 9 bytes but 7 characters
        assert_eq!(eq.offset, 29);
        assert_eq!(eq.column, 8);

        let Value::Position(greek) = &values[1] else {
            panic!("expected position");
        };
        assert_eq!(greek.offset, 24);
        assert_eq!(greek.column, 5);
    }

    #[test]
    fn test_position_from_anchor_name() {
        let mut anchors = AnchorTable::new();
        let pos = Position {
            filename: "other.go".to_string(),
            line: 1,
            column: 1,
            offset: 0,
        };
        anchors.insert("Known".to_string(), pos.clone());

        let m = marker("x", vec![Expr::Ident("Known".to_string())]);
        let values = convert_all(&[ParamKind::Position], &m, &anchors).unwrap();
        assert_eq!(values, vec![Value::Position(pos)]);

        let m = marker("x", vec![Expr::Ident("Unknown".to_string())]);
        let err = convert_all(&[ParamKind::Position], &m, &anchors).unwrap_err();
        assert!(matches!(err, MarkerError::UnknownAnchor { .. }));
        assert!(err.to_string().contains("test@conv.go:4"));
    }

    #[test]
    fn test_position_rejects_other_shapes() {
        let m = marker("42", vec![Expr::Int("42".to_string())]);
        let err = convert_all(&[ParamKind::Position], &m, &AnchorTable::new()).unwrap_err();
        assert!(matches!(err, MarkerError::NotAPosition { .. }));
    }

    #[test]
    fn test_string_accepts_identifier_and_string() {
        let m = marker(
            "",
            vec![Expr::Ident("Name".to_string()), Expr::Str("text".to_string())],
        );
        let values =
            convert_all(&[ParamKind::String, ParamKind::String], &m, &AnchorTable::new()).unwrap();
        assert_eq!(
            values,
            vec![
                Value::String("Name".to_string()),
                Value::String("text".to_string())
            ]
        );

        let m = marker("", vec![Expr::Raw(r"raw\n".to_string())]);
        let values = convert_all(&[ParamKind::String], &m, &AnchorTable::new()).unwrap();
        assert_eq!(values, vec![Value::String(r"raw\n".to_string())]);

        let m = marker("", vec![Expr::Int("7".to_string())]);
        let err = convert_all(&[ParamKind::String], &m, &AnchorTable::new()).unwrap_err();
        assert!(matches!(err, MarkerError::TypeMismatch { expected: "string", .. }));
    }

    #[test]
    fn test_int_conversion() {
        let m = marker("", vec![Expr::Int("12".to_string())]);
        let values = convert_all(&[ParamKind::Int], &m, &AnchorTable::new()).unwrap();
        assert_eq!(values, vec![Value::Int(12)]);

        let m = marker("", vec![Expr::Int("99999999999999999999".to_string())]);
        let err = convert_all(&[ParamKind::Int], &m, &AnchorTable::new()).unwrap_err();
        assert!(matches!(err, MarkerError::InvalidInt { .. }));

        let m = marker("", vec![Expr::Str("12".to_string())]);
        let err = convert_all(&[ParamKind::Int], &m, &AnchorTable::new()).unwrap_err();
        assert!(matches!(err, MarkerError::TypeMismatch { expected: "int", .. }));
    }

    #[test]
    fn test_missing_argument() {
        let m = marker("", vec![]);
        let err = convert_all(&[ParamKind::String], &m, &AnchorTable::new()).unwrap_err();
        assert!(matches!(err, MarkerError::MissingArgument { .. }));
    }

    #[test]
    fn test_parse_kinds() {
        assert_eq!(
            parse_kinds("string, position,INT").unwrap(),
            vec![ParamKind::String, ParamKind::Position, ParamKind::Int]
        );
        assert!(parse_kinds("").unwrap().is_empty());
        let err = parse_kinds("string, float").unwrap_err();
        assert!(matches!(err, MarkerError::UnsupportedParam(ref t) if t == "float"));
    }
}
