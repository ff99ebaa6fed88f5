//! Marker API - load a corpus, list markers and anchors

use anyhow::Result;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::backends::scan::{collect_sources, ScanOptions};
use crate::core::file_reader::FileReadConfig;
use crate::core::model::{MarkerIssue, ResultItem, ResultSet};
use crate::core::paths::display_name;
use crate::core::render::{RenderConfig, Renderer};
use crate::markers::engine::Markers;
use crate::markers::error::MarkerError;
use crate::markers::handler::Diagnostics;
use crate::markers::position::Position;

/// Markers extracted from a set of paths, plus everything that went wrong
/// while reading them
#[derive(Debug, Default)]
pub struct Corpus {
    pub markers: Markers,
    /// Read and syntax errors, and file reader warnings
    pub issues: Vec<ResultItem>,
}

/// Convert an engine error to an error result located where it points
pub fn error_item(err: &MarkerError) -> ResultItem {
    let item = ResultItem::error(MarkerIssue::from(err));
    match err.location() {
        Some((file, line)) => item.at(file, line as u32),
        None => item,
    }
}

/// Collect sources under `paths` and extract their markers.
///
/// A file that cannot be read or contains a malformed marker is reported in
/// [`Corpus::issues`] and the remaining files are still processed.
pub fn load_corpus(
    root: &Path,
    paths: &[PathBuf],
    options: ScanOptions,
    config: &FileReadConfig,
) -> Result<Corpus> {
    let mut corpus = Corpus::default();

    for path in collect_sources(root, paths, options)? {
        let name = display_name(&path, root);

        match corpus.markers.extract_file_as(&path, &name, config) {
            Ok(warnings) => corpus
                .issues
                .extend(warnings.iter().map(|w| w.to_result_item())),
            Err(err) => {
                let mut item = error_item(&err);
                item.path.get_or_insert(name);
                corpus.issues.push(item);
            }
        }
    }

    Ok(corpus)
}

/// One result per extracted marker
pub fn list_markers(corpus: &Corpus) -> ResultSet {
    let mut result_set = ResultSet::new();

    for marker in corpus.markers.markers() {
        let args: Vec<String> = marker.args.iter().map(|a| a.to_string()).collect();
        result_set.push(
            ResultItem::marker(
                marker.line.file.name.as_str(),
                marker.line.number as u32,
                marker.source(),
            )
            .with_data(json!({
                "method": marker.method,
                "args": args,
            })),
        );
    }

    result_set.extend(corpus.issues.iter().cloned());
    result_set.sort();
    result_set
}

/// Anchor result for a resolved position
pub fn anchor_item(name: &str, pos: &Position) -> ResultItem {
    let mut item = ResultItem::anchor(pos.filename.as_str(), pos.line as u32).with_data(json!({
        "name": name,
        "line": pos.line,
        "column": pos.column,
        "offset": pos.offset,
    }));
    item.excerpt = Some(name.to_string());
    item
}

/// One result per declared anchor, duplicates as errors
pub fn list_anchors(corpus: &Corpus) -> ResultSet {
    let mut result_set = ResultSet::new();
    let mut diagnostics = Diagnostics::new();

    match corpus.markers.anchors(&mut diagnostics) {
        Ok(table) => {
            let mut anchors: Vec<_> = table.iter().collect();
            anchors.sort_by(|(_, a), (_, b)| {
                a.filename.cmp(&b.filename).then(a.offset.cmp(&b.offset))
            });
            result_set.extend(anchors.into_iter().map(|(name, pos)| anchor_item(name, pos)));
        }
        Err(err) => result_set.push(error_item(&err)),
    }

    result_set.extend(diagnostics.errors().iter().map(error_item));
    result_set.extend(corpus.issues.iter().cloned());
    result_set.sort();
    result_set
}

/// Run markers command
pub fn run_markers(
    root: &Path,
    paths: &[PathBuf],
    options: ScanOptions,
    read_config: &FileReadConfig,
    render_config: RenderConfig,
) -> Result<()> {
    let corpus = load_corpus(root, paths, options, read_config)?;
    let result_set = list_markers(&corpus);

    let renderer = Renderer::with_config(render_config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

/// Run anchors command
pub fn run_anchors(
    root: &Path,
    paths: &[PathBuf],
    options: ScanOptions,
    read_config: &FileReadConfig,
    render_config: RenderConfig,
) -> Result<()> {
    let corpus = load_corpus(root, paths, options, read_config)?;
    let result_set = list_anchors(&corpus);

    let renderer = Renderer::with_config(render_config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}
