//! WebAssembly runtime implementation
//!
//! This module links compiled modules against the host: it resolves imported
//! globals from an [`ImportObject`], evaluates global initializers and
//! exposes exported globals as host numbers through an [`Instance`].

pub mod imports;
pub mod instance;
pub mod value;

pub use imports::ImportObject;
pub use instance::{instantiate, Instance};
pub use value::Value;

/// Errors raised while linking a module against the host.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("import {module}.{name} not provided")]
    MissingImport { module: String, name: String },
    #[error("cannot import i64 global {module}.{name}")]
    I64Import { module: String, name: String },
    #[error("cannot export i64 global \"{name}\"")]
    I64Export { name: String },
    #[error("Global variable index out of bounds: {0}")]
    UnknownGlobal(u32),
}
