//! Unified Result Model
//!
//! Every command maps what it found (markers, anchors, problems) to this
//! model before rendering output.

use serde::{Deserialize, Serialize};

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Marker,
    Anchor,
    Warning,
    Error,
}

/// Line-based range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeLine {
    pub start: u32,
    pub end: u32,
}

/// Range within a file; markers and anchors are always line-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Range {
    Line(RangeLine),
}

impl Range {
    /// Create a new line range
    pub fn lines(start: u32, end: u32) -> Self {
        Range::Line(RangeLine { start, end })
    }

    fn start(&self) -> u32 {
        match self {
            Range::Line(r) => r.start,
        }
    }
}

/// Error or warning information attached to a result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerIssue {
    pub code: String,
    pub message: String,
}

impl MarkerIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::markers::error::MarkerError> for MarkerIssue {
    fn from(err: &crate::markers::error::MarkerError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    /// The kind of this result
    pub kind: Kind,

    /// Path relative to root, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Range within the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,

    /// Marker source text or offending annotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// Structured payload (marker arguments, anchor position)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Errors (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MarkerIssue>,
}

impl ResultItem {
    fn with_kind(kind: Kind) -> Self {
        Self {
            kind,
            path: None,
            range: None,
            excerpt: None,
            data: None,
            errors: Vec::new(),
        }
    }

    /// Create a new marker result
    pub fn marker(path: impl Into<String>, line: u32, excerpt: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            range: Some(Range::lines(line, line)),
            excerpt: Some(excerpt.into()),
            ..Self::with_kind(Kind::Marker)
        }
    }

    /// Create a new anchor result
    pub fn anchor(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: Some(path.into()),
            range: Some(Range::lines(line, line)),
            ..Self::with_kind(Kind::Anchor)
        }
    }

    /// Create a new error result
    pub fn error(error: MarkerIssue) -> Self {
        Self {
            errors: vec![error],
            ..Self::with_kind(Kind::Error)
        }
    }

    /// Create a new warning result
    pub fn warning(warning: MarkerIssue) -> Self {
        Self {
            errors: vec![warning],
            ..Self::with_kind(Kind::Warning)
        }
    }

    /// Set structured data payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the path and line the result refers to
    pub fn at(mut self, path: impl Into<String>, line: u32) -> Self {
        self.path = Some(path.into());
        self.range = Some(Range::lines(line, line));
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ResultItem>) {
        self.items.extend(items);
    }

    /// Sort items by path and range start for stable output.
    ///
    /// The sort is stable, so items on the same line keep their order.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| match (&a.path, &b.path) {
            (Some(pa), Some(pb)) => pa.cmp(pb).then_with(|| match (&a.range, &b.range) {
                (Some(ra), Some(rb)) => ra.start().cmp(&rb.start()),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    /// Number of items of the given kind
    pub fn count(&self, kind: Kind) -> usize {
        self.items.iter().filter(|item| item.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for ResultSet {
    type Item = ResultItem;
    type IntoIter = std::vec::IntoIter<ResultItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_path_then_line() {
        let mut set: ResultSet = vec![
            ResultItem::anchor("b.go", 1),
            ResultItem::anchor("a.go", 9),
            ResultItem::anchor("a.go", 2),
            ResultItem::error(MarkerIssue::new("X", "no path")),
        ]
        .into_iter()
        .collect();

        set.sort();
        let keys: Vec<_> = set
            .items
            .iter()
            .map(|i| (i.path.clone(), i.range))
            .collect();
        assert_eq!(keys[0], (Some("a.go".to_string()), Some(Range::lines(2, 2))));
        assert_eq!(keys[1], (Some("a.go".to_string()), Some(Range::lines(9, 9))));
        assert_eq!(keys[2].0, Some("b.go".to_string()));
        assert_eq!(keys[3].0, None);
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let item = ResultItem::marker("a.go", 3, "check(A, A)");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "marker");
        assert_eq!(json["range"], serde_json::json!({"start": 3, "end": 3}));
        assert!(json.get("errors").is_none());
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_count_by_kind() {
        let mut set = ResultSet::new();
        set.push(ResultItem::error(MarkerIssue::new("A", "a")));
        set.push(ResultItem::warning(MarkerIssue::new("B", "b")));
        set.push(ResultItem::error(MarkerIssue::new("C", "c")));
        assert_eq!(set.count(Kind::Error), 2);
        assert_eq!(set.count(Kind::Warning), 1);
        assert_eq!(set.len(), 3);
    }
}
