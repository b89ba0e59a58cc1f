//! # stratus-scaffold
//!
//! Service registration: name normalization, conflict checks, template
//! materialization, and descriptor rewriting.

pub mod error;
pub mod registrar;

pub use error::ScaffoldError;
pub use registrar::{register_at, RegisterRequest, SOURCES_DIR};
