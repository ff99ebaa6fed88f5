//! Line index
//!
//! Splits a source file into lines, keeping the byte offset of every line and
//! storing the line content with marker comments stripped so that a marker
//! never matches its own text.

use std::fmt;
use std::rc::Rc;

/// The comment prefix that introduces a marker
pub const MARKER_COMMENT: &[u8] = b"//@";

/// A source file that was scanned for markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// The name of the file, often its full path on disk
    pub name: String,
    /// The unmodified contents of the file
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A single line within a source file
#[derive(Debug, Clone)]
pub struct Line {
    /// The file the line is part of
    pub file: Rc<SourceFile>,
    /// Byte offset of the start of the line within the file
    pub offset: usize,
    /// 1-based line number
    pub number: usize,
    /// Line content up to the first marker comment
    pub value: Vec<u8>,
    /// Length of the line on disk in bytes, terminator included
    pub len: usize,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.name, self.number)
    }
}

/// A line together with the raw marker bodies found on it
#[derive(Debug, Clone)]
pub struct IndexedLine {
    pub line: Rc<Line>,
    /// Text following each `//@` on the line, in order of occurrence
    pub bodies: Vec<Vec<u8>>,
}

/// Index every line of a file
pub fn index_lines(file: &Rc<SourceFile>) -> Vec<IndexedLine> {
    let mut offset = 0;
    let mut lines = Vec::new();

    for (n, segment) in split_after(&file.content, b'\n').into_iter().enumerate() {
        let mut parts = split_on(segment, MARKER_COMMENT).into_iter();
        let value = parts.next().unwrap_or_default().to_vec();
        let bodies = parts.map(<[u8]>::to_vec).collect();

        lines.push(IndexedLine {
            line: Rc::new(Line {
                file: Rc::clone(file),
                offset,
                number: n + 1,
                value,
                len: segment.len(),
            }),
            bodies,
        });

        // offsets follow the raw segment, not the stripped value
        offset += segment.len();
    }

    lines
}

/// Split after every terminator, keeping it attached to its segment.
///
/// The result always ends with the (possibly empty) remainder after the last
/// terminator.
fn split_after(content: &[u8], terminator: u8) -> Vec<&[u8]> {
    let mut segments = Vec::new();
    let mut start = 0;

    for (i, b) in content.iter().enumerate() {
        if *b == terminator {
            segments.push(&content[start..=i]);
            start = i + 1;
        }
    }
    segments.push(&content[start..]);

    segments
}

/// Split on every occurrence of a multi-byte separator
fn split_on<'a>(haystack: &'a [u8], separator: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i + separator.len() <= haystack.len() {
        if &haystack[i..i + separator.len()] == separator {
            parts.push(&haystack[start..i]);
            i += separator.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&haystack[start..]);

    parts
}
