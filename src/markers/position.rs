//! Positions within source files and the line-local pattern lookups that
//! produce them

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::markers::error::{MarkerError, Result};
use crate::markers::lines::Line;

/// A resolved location within a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub filename: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
    /// Byte offset from the start of the file
    pub offset: usize,
}

impl Position {
    /// Position of the byte at `index` within `line`'s stored content
    pub fn in_line(line: &Line, index: usize) -> Self {
        let prefix = &line.value[..index];
        Self {
            filename: line.file.name.clone(),
            line: line.number,
            column: String::from_utf8_lossy(prefix).chars().count() + 1,
            offset: line.offset + index,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}:{}:{}",
            self.offset, self.filename, self.line, self.column
        )
    }
}

/// Find the first exact occurrence of `pattern` in the line
pub fn find_literal(line: &Line, pattern: &str) -> Result<Position> {
    let needle = pattern.as_bytes();
    let index = if needle.is_empty() {
        Some(0)
    } else {
        line.value
            .windows(needle.len())
            .position(|window| window == needle)
    };

    match index {
        Some(i) => Ok(Position::in_line(line, i)),
        None => Err(MarkerError::PatternNotFound {
            pattern: pattern.to_string(),
            location: line.to_string(),
        }),
    }
}

/// Find the first match of the regular expression `pattern` in the line
pub fn find_regex(line: &Line, pattern: &str) -> Result<Position> {
    let re = Regex::new(pattern).map_err(|source| MarkerError::InvalidPattern {
        pattern: pattern.to_string(),
        location: line.to_string(),
        source,
    })?;

    match re.find(&line.value) {
        Some(m) => Ok(Position::in_line(line, m.start())),
        None => Err(MarkerError::PatternNotFound {
            pattern: pattern.to_string(),
            location: line.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::lines::SourceFile;
    use std::rc::Rc;

    fn line(value: &str, offset: usize) -> Line {
        Line {
            file: Rc::new(SourceFile::new("pos.go", value)),
            offset,
            number: 7,
            value: value.as_bytes().to_vec(),
            len: value.len(),
        }
    }

    #[test]
    fn test_literal_match_at_start() {
        let pos = find_literal(&line("foo ", 0), "foo").unwrap();
        assert_eq!(pos.offset, 0);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.line, 7);
        assert_eq!(pos.filename, "pos.go");
    }

    #[test]
    fn test_column_counts_characters_not_bytes() {
        // 'α' is two bytes; the match starts at byte 2 but column 2
        let pos = find_literal(&line("αβ", 10), "β").unwrap();
        assert_eq!(pos.offset, 12);
        assert_eq!(pos.column, 2);
    }

    #[test]
    fn test_regex_matches_first_code_point() {
        let pos = find_regex(&line("abc γ δ", 100), r"\p{Greek}").unwrap();
        assert_eq!(pos.offset, 104);
        assert_eq!(pos.column, 5);
    }

    #[test]
    fn test_missing_pattern_is_an_error() {
        let err = find_literal(&line("nothing here", 0), "absent").unwrap_err();
        assert!(matches!(err, MarkerError::PatternNotFound { .. }));
        assert!(err.to_string().contains("pos.go:7"));
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let err = find_regex(&line("anything", 0), "(unclosed").unwrap_err();
        assert!(matches!(err, MarkerError::InvalidPattern { .. }));
    }

    #[test]
    fn test_empty_literal_matches_line_start() {
        let pos = find_literal(&line("x", 3), "").unwrap();
        assert_eq!(pos.offset, 3);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_display() {
        let pos = Position {
            filename: "a.go".to_string(),
            line: 2,
            column: 5,
            offset: 17,
        };
        assert_eq!(pos.to_string(), "17=a.go:2:5");
    }
}
