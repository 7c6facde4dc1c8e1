//! # config-console-ports
//!
//! Port traits for the config-console hexagonal architecture.
//!
//! This crate defines the interfaces between the editing session and the
//! outside world: the config API and structured logging. It depends only on
//! `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod config_api;
pub mod logger;

pub use config_api::*;
pub use logger::*;

// Re-export the domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `config-console-domain`.
pub use config_console_domain::{ConfigDocument, SchemaDocument, SectionName, SectionPatch};
