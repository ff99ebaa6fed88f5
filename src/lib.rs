//! markex - extract and dispatch `//@` source markers
//!
//! markex provides:
//! - Marker extraction from any number of source files
//! - Anchor resolution by literal text or regular expression
//! - Type-directed dispatch of markers to registered handlers
//! - A CLI front end with a unified output format (jsonl/json/md/raw)

pub mod backends;
pub mod cli;
pub mod core;
pub mod markers;
