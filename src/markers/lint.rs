//! Marker linting module
//!
//! Checks for:
//! - Unreadable files and malformed markers
//! - Duplicate anchor declarations
//! - Anchor patterns that do not occur on their line
//! - Expected methods whose arguments do not fit a declared signature

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::backends::scan::ScanOptions;
use crate::core::file_reader::FileReadConfig;
use crate::core::model::{Kind, MarkerIssue, Range, ResultItem, ResultSet};
use crate::core::render::{RenderConfig, Renderer};
use crate::markers::api::{load_corpus, Corpus};
use crate::markers::error::MarkerError;
use crate::markers::handler::{Diagnostics, Handler, Handlers};

/// Lint issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Error,
    Warning,
}

/// A lint issue
#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: LintSeverity,
    pub code: String,
    pub message: String,
    pub path: Option<String>,
    pub line: Option<u32>,
}

impl LintIssue {
    pub fn error(code: &str, message: &str, path: Option<&str>, line: Option<u32>) -> Self {
        Self {
            severity: LintSeverity::Error,
            code: code.to_string(),
            message: message.to_string(),
            path: path.map(str::to_string),
            line,
        }
    }

    pub fn warning(code: &str, message: &str, path: Option<&str>, line: Option<u32>) -> Self {
        Self {
            severity: LintSeverity::Warning,
            code: code.to_string(),
            message: message.to_string(),
            path: path.map(str::to_string),
            line,
        }
    }

    pub fn from_error(err: &MarkerError) -> Self {
        let (path, line) = match err.location() {
            Some((file, line)) => (Some(file), Some(line as u32)),
            None => (None, None),
        };
        Self::error(err.code(), &err.to_string(), path, line)
    }

    /// Issues already rendered by corpus loading
    fn from_item(item: &ResultItem) -> Option<Self> {
        let issue = item.errors.first()?;
        let line = match item.range {
            Some(Range::Line(r)) => Some(r.start),
            _ => None,
        };
        let path = item.path.as_deref();
        match item.kind {
            Kind::Error => Some(Self::error(&issue.code, &issue.message, path, line)),
            Kind::Warning => Some(Self::warning(&issue.code, &issue.message, path, line)),
            _ => None,
        }
    }

    pub fn to_result_item(&self) -> ResultItem {
        let issue = MarkerIssue::new(&self.code, &self.message);
        let mut item = match self.severity {
            LintSeverity::Error => ResultItem::error(issue),
            LintSeverity::Warning => ResultItem::warning(issue),
        };
        item.path = self.path.clone();
        item.range = self.line.map(|l| Range::lines(l, l));
        item
    }
}

/// A method expected in the corpus, with the parameter kinds it takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub method: String,
    pub signature: String,
}

impl std::str::FromStr for Expectation {
    type Err = String;

    /// Parse `METHOD=KINDS`, e.g. `check=string,position`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (method, signature) = s
            .split_once('=')
            .ok_or_else(|| format!("expected METHOD=KINDS, got {}", s))?;
        let method = method.trim();
        if method.is_empty() {
            return Err(format!("missing method name in {}", s));
        }
        Ok(Self {
            method: method.to_string(),
            signature: signature.trim().to_string(),
        })
    }
}

/// Lint an already loaded corpus against a set of expectations
pub fn lint_corpus(corpus: &Corpus, expectations: &[Expectation]) -> Vec<LintIssue> {
    let mut issues: Vec<LintIssue> = corpus.issues.iter().filter_map(LintIssue::from_item).collect();

    // Signatures are checked before any marker is dispatched
    let mut handlers = Vec::with_capacity(expectations.len());
    for expect in expectations {
        match Handler::from_signature(&expect.signature, |_call, _values| Ok(())) {
            Ok(handler) => handlers.push((expect.method.as_str(), handler)),
            Err(err) => issues.push(LintIssue::from_error(&err)),
        }
    }
    if handlers.len() != expectations.len() {
        return issues;
    }

    let mut diagnostics = Diagnostics::new();
    if let Err(err) = corpus.markers.anchors(&mut diagnostics) {
        issues.extend(diagnostics.errors().iter().map(LintIssue::from_error));
        issues.push(LintIssue::from_error(&err));
        return issues;
    }

    // One pass per method so a failure in one does not hide the others
    for (method, handler) in handlers {
        let mut single = Handlers::new().on(method, handler);
        if let Err(err) = corpus.markers.invoke(&mut diagnostics, &mut single) {
            issues.push(LintIssue::from_error(&err));
        }
    }

    issues.extend(diagnostics.errors().iter().map(LintIssue::from_error));
    issues
}

/// Run lint command
pub fn run_lint(
    root: &Path,
    paths: &[PathBuf],
    expectations: &[Expectation],
    options: ScanOptions,
    read_config: &FileReadConfig,
    render_config: RenderConfig,
) -> Result<()> {
    let corpus = load_corpus(root, paths, options, read_config)?;
    let issues = lint_corpus(&corpus, expectations);

    let mut result_set: ResultSet = issues.iter().map(LintIssue::to_result_item).collect();
    result_set.sort();

    let renderer = Renderer::with_config(render_config);
    let output = renderer.render(&result_set);
    if !output.is_empty() {
        println!("{}", output);
    }

    let errors = issues
        .iter()
        .filter(|i| i.severity == LintSeverity::Error)
        .count();
    let warnings = issues.len() - errors;

    eprintln!(
        "Lint: {} markers, {} errors, {} warnings",
        corpus.markers.len(),
        errors,
        warnings
    );

    if errors > 0 {
        bail!("Lint found {} errors", errors);
    }

    Ok(())
}
