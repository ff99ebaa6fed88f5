//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::backends::scan::ScanOptions;
use crate::core::file_reader::{FileReadConfig, DEFAULT_MAX_FILE_SIZE};
use crate::core::render::{OutputFormat, RenderConfig};
use crate::markers::lint::Expectation;

/// markex - extract `//@` markers from source files and check them.
#[derive(Parser, Debug)]
#[command(name = "markex")]
#[command(
    author,
    version,
    about,
    long_about = r#"markex finds structured `//@` annotations in source files.

A marker is a comment of the form `//@method(args...)`. The built-in `mark`
method declares a named anchor at a position on its line; `//@Name` is short
for `//@mark(Name, "Name")`. Other markers reference anchors by name.

Each command prints a ResultSet in the selected format (default: jsonl).

Output formats:
- jsonl: one JSON object per line (best for piping into other tools)
- json: a single JSON array
- md: human-friendly Markdown
- raw: excerpts only (unstable; intended for debugging)

Examples:
    markex markers testdata
    markex anchors --format md src/fake.go
    markex lint testdata --expect check=string,position
"#
)]
pub struct Cli {
    /// Root directory for all operations.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
Relative PATHS are resolved against this root, and file names in results and\n\
anchor positions are reported relative to it."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for ResultSet.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- raw\n\n\
Tip: Prefer jsonl when you want stable, line-oriented output for piping."
    )]
    pub format: String,

    /// Quiet mode (errors only on stderr).
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        long_help = "Only log errors to stderr. Results are still printed to stdout.\n\n\
RUST_LOG, when set, takes precedence."
    )]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Log debug diagnostics to stderr: files scanned, marker counts,\n\
anchor table size.\n\n\
RUST_LOG, when set, takes precedence."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on md/raw formats."
    )]
    pub pretty: bool,

    /// Skip files larger than this many bytes.
    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_FILE_SIZE,
        value_name = "BYTES",
        env = "MARKEX_MAX_FILE_SIZE",
        long_help = "Skip files larger than this many bytes. Skipped files are reported as\n\
FILE_SKIPPED_SIZE warnings."
    )]
    pub max_file_size: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which files to read
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Files or directories to scan.
    #[arg(
        default_value = ".",
        value_name = "PATHS",
        long_help = "Files or directories to scan, relative to ROOT.\n\n\
Directories are walked recursively (respecting .gitignore) and only text source\n\
files are read. Files named explicitly are always read."
    )]
    pub paths: Vec<PathBuf>,

    /// Maximum directory depth to walk.
    #[arg(
        long,
        value_name = "N",
        long_help = "Maximum directory depth below each directory in PATHS.\n\n\
If omitted, directories are walked to any depth. Files named explicitly are\n\
always read."
    )]
    pub max_depth: Option<usize>,

    /// Include hidden files and directories.
    #[arg(long)]
    pub hidden: bool,

    /// Don't respect ignore files (.gitignore, .ignore, etc.).
    #[arg(long)]
    pub no_ignore: bool,
}

impl SourceArgs {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            hidden: self.hidden,
            no_ignore: self.no_ignore,
            max_depth: self.max_depth,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every marker found in PATHS.
    #[command(
        long_about = "Extract markers from PATHS and emit one marker ResultItem per marker,\n\
in file, line, occurrence order.\n\n\
The excerpt is the marker as written (bare identifiers are shown expanded to\n\
mark(...)), and data carries the method name and argument list.\n\n\
Files with malformed markers are reported as SYNTAX_ERROR; markers before the\n\
error are still listed.\n\n\
Examples:\n\
  markex markers\n\
  markex markers src/fake.go --format md\n"
    )]
    Markers {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the anchors declared in PATHS.
    #[command(
        long_about = "Resolve every mark marker in PATHS and emit one anchor ResultItem per\n\
anchor, with its line, column (in characters) and byte offset.\n\n\
When a name is declared twice the first declaration wins and the duplicate is\n\
reported as DUPLICATE_ANCHOR.\n\n\
Examples:\n\
  markex anchors testdata\n\
  markex anchors --format json --pretty testdata/markers.go\n"
    )]
    Anchors {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Check markers and exit non-zero on problems.
    #[command(
        long_about = "Extract all markers in PATHS, resolve anchors, and optionally check\n\
the arguments of expected methods.\n\n\
Each --expect METHOD=KINDS dispatches METHOD with a handler taking KINDS, a\n\
comma-separated list of position, string or int. Argument count, shape, and\n\
anchor references are validated.\n\n\
Checks:\n\
- READ_ERROR: file could not be read\n\
- SYNTAX_ERROR: malformed marker\n\
- DUPLICATE_ANCHOR: anchor name declared twice\n\
- UNRESOLVED: unknown anchor or pattern not on the line\n\
- BAD_ARGUMENTS: arguments do not fit the expected kinds\n\
- UNSUPPORTED_PARAM: unknown kind in --expect\n\n\
Examples:\n\
  markex lint\n\
  markex lint testdata --expect check=string,position --expect printI=string,string,int\n"
    )]
    Lint {
        #[command(flatten)]
        source: SourceArgs,

        /// Expected method and parameter kinds, as METHOD=KINDS.
        #[arg(long = "expect", value_name = "METHOD=KINDS")]
        expectations: Vec<Expectation>,
    },
}

/// Install the stderr log subscriber
fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.quiet, cli.verbose);

    // Parse output format
    let format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(anyhow::Error::msg)
        .context("invalid --format")?;
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let read_config = FileReadConfig {
        max_file_size: cli.max_file_size,
        ..Default::default()
    };

    // Get absolute root path
    let root = cli.root.canonicalize().unwrap_or(cli.root);

    match cli.command {
        Commands::Markers { source } => crate::markers::api::run_markers(
            &root,
            &source.paths,
            source.scan_options(),
            &read_config,
            render_config,
        ),

        Commands::Anchors { source } => crate::markers::api::run_anchors(
            &root,
            &source.paths,
            source.scan_options(),
            &read_config,
            render_config,
        ),

        Commands::Lint {
            source,
            expectations,
        } => crate::markers::lint::run_lint(
            &root,
            &source.paths,
            &expectations,
            source.scan_options(),
            &read_config,
            render_config,
        ),
    }
}
