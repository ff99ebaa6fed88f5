//! Markers module - Extract and dispatch `//@` annotations
//!
//! Markers are comments embedded in source text, starting with `//@`:
//! - `//@Name` declares the anchor `Name` at the text "Name" on that line
//! - `//@mark(Name, "text")` declares it at the first occurrence of "text"
//! - ``//@mark(Name, `re`)`` declares it at the first match of a regex
//! - `//@method(args...)` is dispatched to the handler registered for `method`

pub mod api;
pub mod convert;
pub mod engine;
pub mod error;
pub mod expr;
pub mod handler;
pub mod lines;
pub mod lint;
pub mod parse;
pub mod position;

pub use convert::{AnchorTable, ParamKind, Value};
pub use engine::Markers;
pub use error::MarkerError;
pub use expr::Expr;
pub use handler::{Call, Diagnostics, Handler, Handlers};
pub use parse::Marker;
pub use position::Position;
