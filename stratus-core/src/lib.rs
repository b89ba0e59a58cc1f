//! Stratus core library — domain types, spec persistence, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`error`] — [`SpecError`]
//! - [`spec_store`] — load / save / init

pub mod error;
pub mod spec_store;
pub mod types;

pub use error::SpecError;
pub use types::{
    EventTrigger, FunctionConfig, HttpsTrigger, ProjectSpec, Runtime, ServiceName, ServiceSpec,
    TemplateKey, Trigger, DEFAULT_ENTRY_POINT, DESCRIPTOR_FILE, SPEC_VERSION,
};
