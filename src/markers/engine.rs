//! The marker engine
//!
//! [`Markers`] collects markers from any number of source files and then
//! dispatches them to handlers as many times as needed.
//!
//! All files must be extracted before the first call to
//! [`Markers::anchors`] or [`Markers::invoke`]: the anchor table is computed
//! once, on first use, and never recomputed. A pass that fails is not retried
//! either; later requests report its error again.

use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, trace, warn};

use crate::core::file_reader::{read_source, FileReadConfig, FileWarning};
use crate::core::paths::normalize_path;
use crate::markers::convert::{build_converters, AnchorLookup, AnchorTable, Converter};
use crate::markers::error::{MarkerError, Result};
use crate::markers::expr::{format_args_list, Expr};
use crate::markers::handler::{Call, Diagnostics, Handler, Handlers};
use crate::markers::lines::SourceFile;
use crate::markers::parse::{extract_markers, Marker, MARK_METHOD};
use crate::markers::position::Position;

/// Extracted markers plus the lazily built anchor table
#[derive(Debug, Default)]
pub struct Markers {
    anchors: OnceCell<AnchorPass>,
    markers: Vec<Marker>,
}

/// Outcome of the one and only anchor pass
#[derive(Debug)]
struct AnchorPass {
    /// Anchors declared before the pass stopped, if it stopped early
    table: AnchorTable,
    /// Code and message of the fatal error that stopped the pass
    failure: Option<(&'static str, String)>,
}

impl AnchorPass {
    fn table(&self) -> Result<&AnchorTable> {
        match &self.failure {
            Some((code, message)) => Err(MarkerError::IncompleteAnchors {
                code: *code,
                message: message.clone(),
            }),
            None => Ok(&self.table),
        }
    }
}

/// A handler with its converters, built once per dispatch pass
struct Prepared<'p, 'h> {
    converters: Vec<Converter>,
    handler: &'p mut Handler<'h>,
}

impl Markers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect all the markers present in a file.
    ///
    /// When `content` is `None` the file is read from disk. Returns the number
    /// of markers found. Markers on lines before a syntax error are kept.
    pub fn extract(&mut self, filename: &str, content: Option<Vec<u8>>) -> Result<usize> {
        if self.anchors.get().is_some() {
            warn!(
                file = filename,
                "extracting after anchors were computed; new anchors will not be visible"
            );
        }

        let content = match content {
            Some(content) => content,
            None => std::fs::read(filename).map_err(|source| MarkerError::Read {
                path: filename.to_string(),
                source,
            })?,
        };

        let count = extract_markers(SourceFile::new(filename, content), &mut self.markers)?;
        debug!(file = filename, markers = count, "extracted markers");
        Ok(count)
    }

    /// Read a file through the size-capped reader and extract its markers.
    ///
    /// Markers and positions are reported under the normalized path. Skipped
    /// files yield no markers, only warnings.
    pub fn extract_file(
        &mut self,
        path: &Path,
        config: &FileReadConfig,
    ) -> Result<Vec<FileWarning>> {
        self.extract_file_as(path, &normalize_path(path), config)
    }

    /// Like [`Markers::extract_file`], reporting the file as `name`
    pub fn extract_file_as(
        &mut self,
        path: &Path,
        name: &str,
        config: &FileReadConfig,
    ) -> Result<Vec<FileWarning>> {
        let read = read_source(path, name, config)?;
        if let Some(content) = read.content {
            self.extract(name, Some(content))?;
        } else {
            debug!(file = name, "skipped");
        }
        Ok(read.warnings)
    }

    /// All extracted markers, in file, line, occurrence order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The anchor table if it has already been computed.
    ///
    /// After a failed pass this holds the anchors declared before the error.
    pub fn computed_anchors(&self) -> Option<&AnchorTable> {
        self.anchors.get().map(|pass| &pass.table)
    }

    /// The anchors declared in the processed files.
    ///
    /// Anchors are declared with either `//@Name` or `//@mark(Name, pattern)`.
    /// The first call runs every `mark` marker; redeclaring a name is recorded
    /// in `diagnostics` and the first declaration wins. Later calls return the
    /// same table, or [`MarkerError::IncompleteAnchors`] if the first pass
    /// failed; duplicates are never reported twice.
    pub fn anchors(&self, diagnostics: &mut Diagnostics) -> Result<&AnchorTable> {
        if let Some(pass) = self.anchors.get() {
            return pass.table();
        }

        let table = RefCell::new(AnchorTable::new());
        let outcome = {
            let mut handlers = Handlers::new().on(
                MARK_METHOD,
                Handler::new(|call, (name, pos): (String, Position)| {
                    let mut anchors = table.borrow_mut();
                    if let Some(existing) = anchors.get(&name) {
                        let err = MarkerError::DuplicateAnchor {
                            name,
                            existing: existing.clone(),
                            duplicate: pos,
                        };
                        drop(anchors);
                        call.diagnostics().error(err);
                        return Ok(());
                    }
                    trace!(anchor = %name, position = %pos, "declared anchor");
                    anchors.insert(name, pos);
                    Ok(())
                }),
            );
            self.dispatch(diagnostics, &mut handlers, &table)
        };

        let table = table.into_inner();
        let (pass, err) = match outcome {
            Ok(()) => {
                debug!(anchors = table.len(), "computed anchor table");
                (
                    AnchorPass {
                        table,
                        failure: None,
                    },
                    None,
                )
            }
            Err(err) => {
                debug!(anchors = table.len(), error = %err, "anchor pass failed");
                let failure = Some((err.code(), err.to_string()));
                (AnchorPass { table, failure }, Some(err))
            }
        };

        let pass = self.anchors.get_or_init(|| pass);
        match err {
            Some(err) => Err(err),
            None => pass.table(),
        }
    }

    /// Evaluate the markers against `handlers`.
    ///
    /// Markers whose method has no handler are skipped. The first fatal
    /// conversion or handler error stops the pass and is returned. This may be
    /// called any number of times with different handler sets.
    pub fn invoke(&self, diagnostics: &mut Diagnostics, handlers: &mut Handlers<'_>) -> Result<()> {
        let anchors = self.anchors(diagnostics)?;
        self.dispatch(diagnostics, handlers, anchors)
    }

    fn dispatch(
        &self,
        diagnostics: &mut Diagnostics,
        handlers: &mut Handlers<'_>,
        anchors: &dyn AnchorLookup,
    ) -> Result<()> {
        let mut prepared: HashMap<&str, Prepared<'_, '_>> = handlers
            .iter_mut()
            .map(|(name, handler)| {
                let converters = build_converters(handler.kinds());
                (
                    name,
                    Prepared {
                        converters,
                        handler,
                    },
                )
            })
            .collect();

        for marker in &self.markers {
            let Some(method) = prepared.get_mut(marker.method.as_str()) else {
                trace!(marker = %marker, "no handler, skipping");
                continue;
            };

            let mut args: &[Expr] = &marker.args;
            let mut values = Vec::with_capacity(method.converters.len());
            for convert in &method.converters {
                values.push(convert(anchors, marker, &mut args)?);
            }
            if !args.is_empty() {
                return Err(MarkerError::UnwantedArguments {
                    args: format_args_list(args),
                    marker: marker.to_string(),
                });
            }

            trace!(marker = %marker, "invoking handler");
            let mut call = Call::new(&mut *diagnostics, self, marker);
            method.handler.call(&mut call, values)?;
        }

        Ok(())
    }
}
