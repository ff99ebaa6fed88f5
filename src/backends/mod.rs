//! Backends module - Integration with the filesystem
//!
//! - scan: gitignore-aware source discovery

pub mod scan;
