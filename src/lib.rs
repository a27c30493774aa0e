//! A WebAssembly module builder for globals, with a binary codec,
//! validator and host linker written in Rust.
//!
//! wasm-builder provides the pipeline a host goes through with a module that
//! exports globals: authoring the module, encoding it to `.wasm` bytes,
//! compiling (decoding and validating) those bytes, and instantiating the
//! result against host-provided imports.
//!
//! # Modules
//!
//! - [`builder`] -- `ModuleBuilder` / `GlobalBuilder`, the authoring API.
//! - [`encoder`] -- Binary encoder. Serialises a `Module` to `.wasm` bytes.
//! - [`parser`] -- Binary format decoder and validator. Reads `.wasm` bytes into a [`parser::module::Module`].
//! - [`runtime`] -- Values, host imports and linked instances.
//! - [`manifest`] -- JSON module manifests, as read by the `wasm-builder` CLI.
//! - [`render`] -- Output formats of the CLI: encoded bytes, export JSON, inspection.
//!
//! # Example
//!
//! Export an `i32` and an `f32` global and read them back as host numbers:
//!
//! ```
//! use wasm_builder::builder::ModuleBuilder;
//! use wasm_builder::parser::module::ValueType;
//!
//! let mut builder = ModuleBuilder::new();
//! builder.add_global(ValueType::I32, false).export_as("i32").init(4711.0);
//! builder.add_global(ValueType::F32, false).export_as("f32").init(0.5);
//!
//! let instance = builder.instantiate().unwrap();
//! assert_eq!(instance.export("i32"), Some(4711.0));
//! assert_eq!(instance.export("f32"), Some(0.5));
//! ```
//!
//! # Binary format
//!
//! Reads and writes the [WebAssembly 1.0](https://www.w3.org/TR/wasm-core-1/)
//! binary format for the import, global and export sections. Mutable globals
//! cannot be imported or exported, and `i64` globals cannot cross the host
//! boundary.

pub mod builder;
pub mod encoder;
pub mod manifest;
pub mod parser;
pub mod render;
pub mod runtime;
