//! Per-module registry state
//!
//! One [`ModuleRecord`] exists per canonical file identity for the
//! registry's lifetime. The record is created on first fetch, updated in
//! place on (re)compile and dependency extraction, and torn down only by
//! a full registry reset.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::exports::ExportsHandle;
use crate::host::FetchedModule;
use crate::media::MediaType;

/// Registry-owned state for one canonical module identity.
#[derive(Debug)]
pub struct ModuleRecord {
    /// Module name reported by the host at fetch time.
    pub module_name: String,
    /// Canonical file name; the registry key.
    pub file_name: String,
    /// Kind of source fetched. Immutable.
    pub media_type: MediaType,
    /// Original source text. Immutable once fetched.
    pub source_code: String,
    /// Compiled output; absent until first compile.
    output_code: Mutex<Option<String>>,
    /// Bumped whenever `output_code` changes. Surfaced as a string token.
    version: AtomicU32,
    /// Declared dependency specifiers; absent until extraction has run.
    deps: Mutex<Option<Vec<String>>>,
    /// Export namespace slot, allocated before the body runs.
    exports: ExportsHandle,
    /// Set exactly once, after the body has run to completion.
    has_run: AtomicBool,
}

impl ModuleRecord {
    /// Create a record from a host fetch result.
    ///
    /// A fetch that already carries cached output starts at version `"1"`;
    /// an uncompiled record has the empty version token.
    pub fn from_fetch(fetched: FetchedModule) -> Self {
        let version = u32::from(fetched.output_code.is_some());
        Self {
            module_name: fetched.module_name,
            file_name: fetched.file_name,
            media_type: fetched.media_type,
            source_code: fetched.source_code,
            output_code: Mutex::new(fetched.output_code),
            version: AtomicU32::new(version),
            deps: Mutex::new(None),
            exports: ExportsHandle::new(),
            has_run: AtomicBool::new(false),
        }
    }

    /// Current compiled output, if any.
    pub fn output_code(&self) -> Option<String> {
        self.output_code.lock().clone()
    }

    /// Replace the compiled output and bump the version token.
    pub(crate) fn set_output_code(&self, output_code: String) {
        let mut slot = self.output_code.lock();
        *slot = Some(output_code);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Opaque version token: empty until first output, then `"1"`, `"2"`, …
    ///
    /// Compared as a string by the backend, never numerically.
    pub fn script_version(&self) -> String {
        match self.version.load(Ordering::SeqCst) {
            0 => String::new(),
            n => n.to_string(),
        }
    }

    /// Declared dependency specifiers, once extracted.
    pub fn deps(&self) -> Option<Vec<String>> {
        self.deps.lock().clone()
    }

    /// Record the declared dependency list extracted from compiled output.
    pub(crate) fn set_deps(&self, deps: Vec<String>) {
        *self.deps.lock() = Some(deps);
    }

    /// Handle to this module's export namespace. The handle identity is
    /// stable for the record's lifetime.
    pub fn exports(&self) -> ExportsHandle {
        self.exports.clone()
    }

    /// Whether the module body has run to completion.
    pub fn has_run(&self) -> bool {
        self.has_run.load(Ordering::SeqCst)
    }

    /// Mark the body as having run to completion.
    pub(crate) fn mark_run(&self) {
        self.has_run.store(true, Ordering::SeqCst);
    }

    /// Copy-on-read view of the source text.
    pub fn snapshot(&self) -> ScriptSnapshot {
        ScriptSnapshot::new(&self.source_code)
    }
}

/// Read-only, fixed-length view over a module's source text.
///
/// Length and substring access stay stable for the snapshot's lifetime
/// even if the record is later recompiled.
#[derive(Debug, Clone)]
pub struct ScriptSnapshot {
    text: Arc<str>,
}

impl ScriptSnapshot {
    fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
        }
    }

    /// Length of the snapshot text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The whole snapshot text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substring of the snapshot in `start..end`.
    pub fn text_range(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }
}
