//! # stratus-cloud
//!
//! Collaborator interfaces for the remote platform (function management,
//! object storage, discovery) and their ureq-backed production clients.
//!
//! The reconciliation engine consumes only the traits defined here
//! ([`FunctionsApi`], [`ObjectStore`]); credentials are threaded explicitly
//! as [`AccessToken`] values, never read from ambient process state.

pub mod auth;
pub mod credentials;
pub mod discovery;
pub mod error;
pub mod functions;
pub mod storage;

pub use auth::AccessToken;
pub use error::CloudError;
pub use functions::{
    FunctionsApi, HttpFunctionsClient, IamBinding, IamPolicy, ALL_USERS, INVOKER_ROLE,
};
pub use storage::{BucketRef, HttpStorageClient, ObjectStore};
