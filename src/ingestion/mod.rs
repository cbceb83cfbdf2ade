//! Source loading.
//!
//! Most callers should use [`load_source`] (from [`unified`]) which auto-detects the
//! format by file extension (or you can override via [`LoadOptions`]).
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature-gated)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod unified;

pub use unified::{load_source, LoadOptions, SourceFormat};
