//! Source file reading
//!
//! Marker offsets must be faithful to the bytes on disk, so sources are never
//! truncated or re-encoded here. The reader only decides whether a file is
//! worth scanning:
//! - Oversized files are skipped
//! - Binary files (NUL bytes in the first 8 KB) are skipped
//! - Invalid UTF-8 is kept as-is, with a warning

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::model::{MarkerIssue, ResultItem};
use crate::markers::error::MarkerError;

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Number of leading bytes inspected for NUL bytes
const BINARY_CHECK_LEN: usize = 8192;

/// Configuration for reading source files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,

    /// Skip files that look binary
    pub skip_binary: bool,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            skip_binary: true,
        }
    }
}

/// Warning codes for file operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningCode {
    /// File was skipped due to size
    FileSkippedSize,
    /// File appears to be binary
    BinaryFile,
    /// File is not valid UTF-8; columns are approximate
    InvalidUtf8,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::FileSkippedSize => "FILE_SKIPPED_SIZE",
            WarningCode::BinaryFile => "BINARY_FILE",
            WarningCode::InvalidUtf8 => "INVALID_UTF8",
        }
    }
}

/// A structured warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWarning {
    pub code: WarningCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl FileWarning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Convert to a warning ResultItem
    pub fn to_result_item(&self) -> ResultItem {
        let mut item = ResultItem::warning(MarkerIssue::new(self.code.as_str(), &self.message));
        item.path = self.path.clone();
        item
    }
}

/// Result of reading a source file
#[derive(Debug, Clone, Default)]
pub struct FileReadResult {
    /// The raw file content, unless the file was skipped
    pub content: Option<Vec<u8>>,

    /// Warnings generated during reading
    pub warnings: Vec<FileWarning>,
}

impl FileReadResult {
    fn success(content: Vec<u8>) -> Self {
        Self {
            content: Some(content),
            warnings: Vec::new(),
        }
    }

    fn skipped(warning: FileWarning) -> Self {
        Self {
            content: None,
            warnings: vec![warning],
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.content.is_none()
    }
}

/// Read a source file with the given configuration.
///
/// `name` is the display name used in warnings. I/O failures are returned as
/// read errors; size and encoding problems are warnings.
pub fn read_source(
    path: &Path,
    name: &str,
    config: &FileReadConfig,
) -> Result<FileReadResult, MarkerError> {
    let read_error = |source| MarkerError::Read {
        path: name.to_string(),
        source,
    };

    let file_size = fs::metadata(path).map_err(read_error)?.len();
    if file_size > config.max_file_size {
        return Ok(FileReadResult::skipped(
            FileWarning::new(
                WarningCode::FileSkippedSize,
                format!(
                    "File exceeds size limit ({} > {} bytes)",
                    file_size, config.max_file_size
                ),
            )
            .with_path(name),
        ));
    }

    let bytes = fs::read(path).map_err(read_error)?;

    let check_len = std::cmp::min(BINARY_CHECK_LEN, bytes.len());
    if config.skip_binary && bytes[..check_len].contains(&0) {
        return Ok(FileReadResult::skipped(
            FileWarning::new(
                WarningCode::BinaryFile,
                "File appears to be binary (contains null bytes)",
            )
            .with_path(name),
        ));
    }

    let mut result = FileReadResult::success(bytes);
    let valid_utf8 = result
        .content
        .as_deref()
        .map(|b| std::str::from_utf8(b).is_ok())
        .unwrap_or(true);
    if !valid_utf8 {
        result.warnings.push(
            FileWarning::new(
                WarningCode::InvalidUtf8,
                "File contains invalid UTF-8 sequences; columns are approximate",
            )
            .with_path(name),
        );
    }

    Ok(result)
}
