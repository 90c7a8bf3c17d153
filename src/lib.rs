//! Modweave: a module-aware incremental compiler and loader.
//!
//! This crate provides the core that sits between a language-level
//! type-checking/transpiling service and a host environment:
//! - **Registry**: canonical module identities and their records (`registry` module)
//! - **Loader**: resolution, compilation caching, dependency-graph build
//!   and execution (`loader` module)
//! - **Service host**: the fixed query surface consumed by the external
//!   compilation backend (`service` module)
//! - **Host traits**: fetch/cache, backend, and evaluator seams (`host` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use modweave::Loader;
//!
//! let loader = Loader::new(host, backend, evaluator);
//! let record = loader.run("foo/bar.ts", "/root/project")?;
//! assert!(record.has_run());
//! println!("{:?}", record.exports().snapshot());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Error taxonomy shared across the crate
pub mod error;

/// Shared, mutable export namespaces
pub mod exports;

/// Host-integration traits: fetch/cache, backend, evaluator
pub mod host;

/// Loader: resolution, compilation, dependency-graph execution
pub mod loader;

/// Media types and script-kind classification
pub mod media;

/// Per-module registry state
pub mod module;

/// Process-wide module registry
pub mod registry;

/// Fixed query surface consumed by the compilation backend
pub mod service;

pub use error::{Diagnostic, LoaderError, LoaderResult};
pub use exports::{ExportsHandle, ExportsObject};
pub use host::{
    CompilerBackend, EmitOutput, Evaluator, FactoryArg, FetchedModule, ModuleDefinition,
    ModuleFactory, ModuleHost,
};
pub use loader::Loader;
pub use media::{MediaType, ScriptKind};
pub use module::{ModuleRecord, ScriptSnapshot};
pub use registry::ModuleRegistry;
pub use service::{CompilationSettings, ResolvedName, ServiceHost, DEFAULT_LIB_FILE_NAME};
