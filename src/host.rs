//! Host-integration traits: fetch/cache, backend, evaluator
//!
//! The loader core owns no I/O and no language semantics. Everything it
//! needs from the outside world comes through three seams: the module host
//! (fetch and persistent code cache), the compilation backend (typed
//! emit), and the evaluator (the execution environment that turns
//! compiled output into a dependency declaration plus a module body).

use crate::error::Diagnostic;
use crate::exports::ExportsHandle;
use crate::media::MediaType;
use crate::service::ServiceHost;

/// A module the host resolved and fetched for the loader.
#[derive(Debug, Clone)]
pub struct FetchedModule {
    /// Module name reported by the host.
    pub module_name: String,
    /// Canonical file name; the registry key.
    pub file_name: String,
    /// Kind of source fetched.
    pub media_type: MediaType,
    /// Original source text.
    pub source_code: String,
    /// Compiled output from the host's persistent code cache, when the
    /// host has previously cached an emit for this source.
    pub output_code: Option<String>,
}

/// Host fetch service and persistent code cache.
pub trait ModuleHost: Send + Sync {
    /// Resolve and fetch a module. `None` means the specifier does not
    /// map to any module the host knows about.
    fn fetch(&self, specifier: &str, containing_file: &str) -> Option<FetchedModule>;

    /// Persist compiled output for a source file. Fire-and-forget from
    /// the loader's perspective, assumed durable by the host.
    fn write_cache(&self, file_name: &str, source_code: &str, output_code: &str);
}

/// Result of asking the backend to emit one file.
#[derive(Debug, Clone, Default)]
pub struct EmitOutput {
    /// Emitted output texts; the first entry is the module's output code.
    pub output_files: Vec<String>,
    /// The backend declined to emit. Always fatal.
    pub emit_skipped: bool,
    /// Diagnostics produced during the emit. Surfaced, but only fatal
    /// together with `emit_skipped`.
    pub diagnostics: Vec<Diagnostic>,
}

/// External type-checking/transpiling service.
///
/// The backend reads everything it needs through the [`ServiceHost`]
/// surface it is handed; it never reads files directly.
pub trait CompilerBackend: Send {
    /// Emit compiled output for one tracked file.
    fn emit(&mut self, file_name: &str, host: &dyn ServiceHost) -> EmitOutput;
}

/// One argument materialized for a module factory, parallel to the
/// declared dependency list.
#[derive(Debug, Clone)]
pub enum FactoryArg {
    /// The `require` pseudo-module.
    Require,
    /// The module's own export namespace (the `exports` pseudo-module).
    Exports(ExportsHandle),
    /// A resolved dependency's export namespace, or a builtin module's.
    Namespace(ExportsHandle),
}

impl FactoryArg {
    /// The namespace handle carried by this argument, if any.
    pub fn namespace(&self) -> Option<&ExportsHandle> {
        match self {
            FactoryArg::Require => None,
            FactoryArg::Exports(handle) | FactoryArg::Namespace(handle) => Some(handle),
        }
    }
}

/// A module body. Receives one argument per declared dependency, in
/// declaration order, and populates its own exports through them.
pub type ModuleFactory = Box<dyn FnMut(&[FactoryArg]) -> Result<(), String> + Send>;

/// The declaration a compiled module makes when evaluated: its dependency
/// list and the factory that runs its body.
pub struct ModuleDefinition {
    /// Declared dependency specifiers, in declaration order. May include
    /// the `require` and `exports` pseudo-modules and builtin modules.
    pub deps: Vec<String>,
    /// The module body.
    pub factory: ModuleFactory,
}

impl std::fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Execution environment that evaluates compiled output in a shared
/// global scope and captures the declaration it makes.
pub trait Evaluator: Send {
    /// Evaluate one module's compiled output.
    fn evaluate(&mut self, output_code: &str) -> Result<ModuleDefinition, String>;
}
