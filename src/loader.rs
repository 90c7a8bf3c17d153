//! Loader: resolution, compilation, dependency-graph execution
//!
//! The [`Loader`] drives the full life of a module: it resolves a
//! specifier to a canonical record, compiles the record when no valid
//! output exists, evaluates the output to extract the declared dependency
//! list, walks that list depth-first to build the graph, and finally
//! drains a post-order run queue so each body executes after the
//! dependencies it can see. Cycles are broken by handing the importer the
//! in-progress record's export namespace instead of re-entering it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{LoaderError, LoaderResult};
use crate::exports::ExportsHandle;
use crate::host::{CompilerBackend, Evaluator, FactoryArg, ModuleFactory, ModuleHost};
use crate::module::ModuleRecord;
use crate::registry::ModuleRegistry;
use crate::service::CompilationSettings;

/// The `require` pseudo-module.
pub(crate) const REQUIRE: &str = "require";
/// The `exports` pseudo-module.
pub(crate) const EXPORTS: &str = "exports";

/// A gathered module together with the factory that runs its body.
type RunQueue = Vec<(Arc<ModuleRecord>, ModuleFactory)>;

/// Module-aware incremental compiler and loader.
pub struct Loader {
    pub(crate) registry: ModuleRegistry,
    pub(crate) settings: CompilationSettings,
    /// Canonical names of records participating in built graphs.
    pub(crate) script_file_names: RwLock<Vec<String>>,
    /// Runtime-provided builtin modules, resolvable without a fetch.
    pub(crate) builtins: RwLock<FxHashMap<String, ExportsHandle>>,
    host: Box<dyn ModuleHost>,
    backend: Mutex<Box<dyn CompilerBackend>>,
    evaluator: Mutex<Box<dyn Evaluator>>,
    /// Process-wide recompile flag; forces re-emit of cached output.
    recompile: AtomicBool,
    /// A run owns the registry until its graph is fully resolved and
    /// executed; graph building is serialized globally.
    graph_lock: Mutex<()>,
}

impl Loader {
    /// Create a loader over a host, a compilation backend, and an
    /// execution environment.
    pub fn new(
        host: Box<dyn ModuleHost>,
        backend: Box<dyn CompilerBackend>,
        evaluator: Box<dyn Evaluator>,
    ) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            settings: CompilationSettings::default(),
            script_file_names: RwLock::new(Vec::new()),
            builtins: RwLock::new(FxHashMap::default()),
            host,
            backend: Mutex::new(backend),
            evaluator: Mutex::new(evaluator),
            recompile: AtomicBool::new(false),
            graph_lock: Mutex::new(()),
        }
    }

    /// Replace the compilation settings handed to the backend.
    pub fn with_settings(mut self, settings: CompilationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Register a builtin module the runtime provides. Builtins resolve
    /// without a fetch and are excluded from recursive graph building;
    /// factories receive the namespace handle positionally.
    pub fn register_builtin(&self, name: impl Into<String>, exports: ExportsHandle) {
        self.builtins.write().insert(name.into(), exports);
    }

    /// Set the process-wide recompile flag. While set, the next compile of
    /// an already-cached module re-emits even though its source is
    /// unchanged.
    pub fn set_recompile(&self, recompile: bool) {
        self.recompile.store(recompile, Ordering::SeqCst);
    }

    /// Current value of the recompile flag.
    pub fn recompile(&self) -> bool {
        self.recompile.load(Ordering::SeqCst)
    }

    /// The underlying registry.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Reset all registry state and graph tracking. Used between
    /// independent run sessions.
    pub fn clear(&self) {
        let _guard = self.graph_lock.lock();
        self.registry.clear();
        self.script_file_names.write().clear();
    }

    /// Resolve a specifier from a containing file to its module record.
    ///
    /// Repeated calls for the same pair are served from the registry;
    /// exactly one host fetch happens per unique pair per registry
    /// lifetime.
    pub fn resolve_module(
        &self,
        specifier: &str,
        containing_file: &str,
    ) -> LoaderResult<Arc<ModuleRecord>> {
        if let Some(record) = self.registry.lookup(specifier, containing_file) {
            return Ok(record);
        }
        trace!("fetching \"{}\" from \"{}\"", specifier, containing_file);
        let fetched = self.host.fetch(specifier, containing_file).ok_or_else(|| {
            LoaderError::Resolution {
                specifier: specifier.to_string(),
                containing_file: containing_file.to_string(),
            }
        })?;
        if fetched.file_name.is_empty() || fetched.module_name.is_empty() {
            return Err(LoaderError::Resolution {
                specifier: specifier.to_string(),
                containing_file: containing_file.to_string(),
            });
        }
        if !fetched.media_type.is_compilable() {
            return Err(LoaderError::UnknownMediaType {
                specifier: specifier.to_string(),
                containing_file: containing_file.to_string(),
            });
        }
        let record = Arc::new(ModuleRecord::from_fetch(fetched));
        Ok(self.registry.insert(specifier, containing_file, record))
    }

    /// Ensure a record has compiled output, honoring the process-wide
    /// recompile flag. Returns the output code.
    pub fn compile(&self, record: &ModuleRecord) -> LoaderResult<String> {
        self.compile_with(record, self.recompile())
    }

    /// Ensure a record has compiled output, with an explicit recompile
    /// override. A no-op when output is present and `force` is false.
    ///
    /// On emit, the output is assigned to the record, the version token is
    /// bumped, and the host cache-write service is invoked with the
    /// `(file name, source, output)` triple.
    pub fn compile_with(&self, record: &ModuleRecord, force: bool) -> LoaderResult<String> {
        if let Some(output_code) = record.output_code() {
            if !force {
                return Ok(output_code);
            }
        }
        debug!("compiling {}", record.file_name);
        let emitted = {
            let mut backend = self.backend.lock();
            backend.emit(&record.file_name, self)
        };
        for diagnostic in &emitted.diagnostics {
            warn!("{}: {}", record.file_name, diagnostic.message);
        }
        if emitted.emit_skipped || emitted.output_files.is_empty() {
            return Err(LoaderError::Compilation {
                file_name: record.file_name.clone(),
                diagnostics: emitted.diagnostics,
            });
        }
        let mut output_files = emitted.output_files;
        let output_code = output_files.swap_remove(0);
        record.set_output_code(output_code.clone());
        self.host
            .write_cache(&record.file_name, &record.source_code, &output_code);
        Ok(output_code)
    }

    /// Resolve, compile, and execute a module and its full dependency
    /// graph, returning the fully executed entry record.
    ///
    /// Bodies run at most once per record for the registry's lifetime;
    /// re-running an already-executed entry performs no fetch, no emit,
    /// no cache write, and no re-execution.
    pub fn run(&self, specifier: &str, containing_file: &str) -> LoaderResult<Arc<ModuleRecord>> {
        let _guard = self.graph_lock.lock();
        debug!("run \"{}\" from \"{}\"", specifier, containing_file);
        let record = self.resolve_module(specifier, containing_file)?;
        let mut queue = RunQueue::new();
        let mut visited = FxHashSet::default();
        self.gather_dependencies(&record, &mut queue, &mut visited)?;
        self.track_graph(&queue);
        self.drain_run_queue(queue)?;
        Ok(record)
    }

    /// Resolve and compile a module graph without executing any body,
    /// returning canonical file names in execution order: dependencies
    /// before dependents, entry module last.
    pub fn module_dependencies(
        &self,
        specifier: &str,
        containing_file: &str,
    ) -> LoaderResult<Vec<String>> {
        let _guard = self.graph_lock.lock();
        let record = self.resolve_module(specifier, containing_file)?;
        let mut queue = RunQueue::new();
        let mut visited = FxHashSet::default();
        self.gather_dependencies(&record, &mut queue, &mut visited)?;
        self.track_graph(&queue);
        Ok(queue
            .iter()
            .map(|(record, _)| record.file_name.clone())
            .collect())
    }

    /// Depth-first graph build: compile the record, evaluate its output to
    /// extract the declared dependency list, recurse into each dependency,
    /// then append the record to the post-order run queue.
    ///
    /// A record whose gathering is already in progress in this call is not
    /// re-entered; that is the cycle break. A record executed by an
    /// earlier run is skipped entirely unless the recompile flag forces a
    /// fresh emit pass over it.
    fn gather_dependencies(
        &self,
        record: &Arc<ModuleRecord>,
        queue: &mut RunQueue,
        visited: &mut FxHashSet<String>,
    ) -> LoaderResult<()> {
        if visited.contains(&record.file_name) {
            return Ok(());
        }
        if record.has_run() && record.deps().is_some() && !self.recompile() {
            return Ok(());
        }
        visited.insert(record.file_name.clone());

        let output_code = self.compile(record)?;
        let definition = self
            .evaluator
            .lock()
            .evaluate(&output_code)
            .map_err(|message| LoaderError::Execution {
                file_name: record.file_name.clone(),
                message,
            })?;
        record.set_deps(definition.deps.clone());

        for dep in &definition.deps {
            if dep == REQUIRE || dep == EXPORTS || self.builtins.read().contains_key(dep) {
                continue;
            }
            let dep_record = self.resolve_module(dep, &record.file_name)?;
            self.gather_dependencies(&dep_record, queue, visited)?;
        }
        queue.push((Arc::clone(record), definition.factory));
        Ok(())
    }

    /// Execute queued factories in post-order. Each body receives one
    /// argument per declared dependency, in declaration order, and only
    /// runs if it has never run before.
    fn drain_run_queue(&self, queue: RunQueue) -> LoaderResult<()> {
        for (record, mut factory) in queue {
            if record.has_run() {
                continue;
            }
            let args = self.materialize_args(&record)?;
            debug!("executing {}", record.file_name);
            factory(&args).map_err(|message| LoaderError::Execution {
                file_name: record.file_name.clone(),
                message,
            })?;
            record.mark_run();
        }
        Ok(())
    }

    /// Build a factory's argument list from its declared dependencies.
    fn materialize_args(&self, record: &ModuleRecord) -> LoaderResult<Vec<FactoryArg>> {
        let deps = record.deps().unwrap_or_default();
        let mut args = Vec::with_capacity(deps.len());
        for dep in &deps {
            if dep == REQUIRE {
                args.push(FactoryArg::Require);
            } else if dep == EXPORTS {
                args.push(FactoryArg::Exports(record.exports()));
            } else if let Some(builtin) = self.builtins.read().get(dep) {
                args.push(FactoryArg::Namespace(builtin.clone()));
            } else {
                let dep_record = self.resolve_module(dep, &record.file_name)?;
                args.push(FactoryArg::Namespace(dep_record.exports()));
            }
        }
        Ok(args)
    }

    /// Add a gathered graph's file names to the tracked root set.
    fn track_graph(&self, queue: &RunQueue) {
        let mut tracked = self.script_file_names.write();
        for (record, _) in queue {
            if !tracked.contains(&record.file_name) {
                tracked.push(record.file_name.clone());
            }
        }
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("registry", &self.registry)
            .field("recompile", &self.recompile())
            .finish_non_exhaustive()
    }
}
