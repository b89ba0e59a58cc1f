//! # stratus-templates
//!
//! Remote template source and the per-workspace template cache.
//!
//! Call [`cache::resolve_at`] to turn a `(runtime, trigger)` key into a local
//! template directory, fetching from the remote source at most once per key
//! per workspace lifetime.

pub mod cache;
pub mod error;
pub mod source;

pub use cache::resolve_at;
pub use error::TemplateError;
pub use source::{HttpTemplateSource, TemplateSource, DEFAULT_TEMPLATE_BASE_URL};
