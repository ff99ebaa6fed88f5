//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, Range, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown, grouped by kind
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let sections = [
            (Kind::Error, "Errors"),
            (Kind::Warning, "Warnings"),
            (Kind::Anchor, "Anchors"),
            (Kind::Marker, "Markers"),
        ];

        for (kind, title) in sections {
            let items: Vec<&ResultItem> =
                result_set.items.iter().filter(|i| i.kind == kind).collect();
            if items.is_empty() {
                continue;
            }

            output.push_str(&format!("## {}\n\n", title));
            for item in items {
                self.render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        output
    }

    fn render_item_md(&self, output: &mut String, item: &ResultItem) {
        output.push_str("- ");
        if let Some(path) = &item.path {
            output.push_str(&format!("`{}`", path));
            if let Some(Range::Line(r)) = &item.range {
                output.push_str(&format!(":{}", r.start));
            }
            output.push(' ');
        }

        if let Some(excerpt) = &item.excerpt {
            output.push_str(&format!("`{}`", excerpt));
        }

        if item.kind == Kind::Anchor {
            if let Some(data) = &item.data {
                if let (Some(column), Some(offset)) =
                    (data["column"].as_u64(), data["offset"].as_u64())
                {
                    output.push_str(&format!(" (column {}, offset {})", column, offset));
                }
            }
        }

        for error in &item.errors {
            output.push_str(&format!(" **{}**: {}", error.code, error.message));
        }

        output.push('\n');
    }

    /// Render as raw output (for debugging)
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                item.excerpt
                    .clone()
                    .or_else(|| item.errors.first().map(|e| e.message.clone()))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{MarkerIssue, ResultItem};

    fn sample() -> ResultSet {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::marker("src/a.go", 3, "check(A, A)"));
        result_set.push(ResultItem::anchor("src/a.go", 1));
        result_set.push(ResultItem::error(MarkerIssue::new(
            "SYNTAX_ERROR",
            "src/b.go:2: invalid marker",
        )));
        result_set
    }

    #[test]
    fn test_render_jsonl() {
        let output = Renderer::new(OutputFormat::Jsonl).render(&sample());
        assert!(output.contains("src/a.go"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_render_json() {
        let output = Renderer::new(OutputFormat::Json).render(&sample());
        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
    }

    #[test]
    fn test_render_markdown_sections_in_order() {
        let output = Renderer::new(OutputFormat::Markdown).render(&sample());
        let errors = output.find("## Errors").unwrap();
        let anchors = output.find("## Anchors").unwrap();
        let markers = output.find("## Markers").unwrap();
        assert!(errors < anchors && anchors < markers);
        assert!(output.contains("`src/a.go`:3 `check(A, A)`"));
        assert!(!output.contains("## Warnings"));
    }

    #[test]
    fn test_render_markdown_anchor_position() {
        let mut result_set = ResultSet::new();
        let mut item = ResultItem::anchor("src/a.go", 4)
            .with_data(serde_json::json!({"name": "ζ", "column": 3, "offset": 41}));
        item.excerpt = Some("ζ".to_string());
        result_set.push(item);

        let output = Renderer::new(OutputFormat::Markdown).render(&result_set);
        assert!(output.contains("- `src/a.go`:4 `ζ` (column 3, offset 41)"));
    }

    #[test]
    fn test_render_raw_falls_back_to_error_message() {
        let output = Renderer::new(OutputFormat::Raw).render(&sample());
        assert_eq!(output, "check(A, A)\nsrc/b.go:2: invalid marker");
    }

    #[test]
    fn test_pretty_jsonl_separates_items() {
        let config = RenderConfig::with_pretty(OutputFormat::Jsonl, true);
        let output = Renderer::with_config(config).render(&sample());
        assert_eq!(output.matches("\n\n").count(), 2);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("MARKDOWN".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
