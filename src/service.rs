//! Fixed query surface consumed by the compilation backend
//!
//! The backend never touches the filesystem: every question it has about
//! tracked files is answered through [`ServiceHost`]. The [`Loader`]
//! implements the surface over its registry; queries take only read locks
//! so the backend may call back into the loader mid-emit.

use serde::Serialize;

use crate::error::{LoaderError, LoaderResult};
use crate::loader::Loader;
use crate::media::ScriptKind;
use crate::module::ScriptSnapshot;

/// Fixed virtual path identifying the built-in ambient declarations.
pub const DEFAULT_LIB_FILE_NAME: &str = "$asset$/lib.modweave.d.ts";

/// Settings handed to the backend for every emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilationSettings {
    /// Whether plain (untyped) scripts are accepted for emit.
    pub allow_plain_scripts: bool,
    /// Output module format the executor understands.
    pub module_format: String,
    /// Virtual output directory; output never touches disk directly.
    pub out_dir: String,
    /// Embed source maps in emitted output.
    pub inline_source_map: bool,
    /// Embed original sources in emitted source maps.
    pub inline_sources: bool,
    /// Strip comments from emitted output.
    pub strip_comments: bool,
    /// Language level the backend emits for.
    pub target: String,
}

impl Default for CompilationSettings {
    fn default() -> Self {
        Self {
            allow_plain_scripts: true,
            module_format: "amd".to_string(),
            out_dir: "$modweave$".to_string(),
            inline_source_map: true,
            inline_sources: true,
            strip_comments: true,
            target: "latest".to_string(),
        }
    }
}

/// Resolution result for one specifier, parallel to the request slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Canonical file name the specifier resolved to.
    pub resolved_file_name: String,
    /// Whether this is a runtime-provided external library rather than a
    /// graph module.
    pub is_external_library: bool,
}

/// The query surface an external compilation backend drives.
pub trait ServiceHost {
    /// Settings for every emit.
    fn compilation_settings(&self) -> CompilationSettings;

    /// Newline used in emitted output.
    fn new_line(&self) -> &'static str {
        "\n"
    }

    /// Canonical names of every record participating in a built graph.
    fn script_file_names(&self) -> Vec<String>;

    /// Version token for a file; the empty token for an untracked file.
    /// Never fails.
    fn script_version(&self, file_name: &str) -> String;

    /// Copy-on-read snapshot of a tracked file's source text.
    fn script_snapshot(&self, file_name: &str) -> Option<ScriptSnapshot>;

    /// Resolve import specifiers without triggering execution. Builtin
    /// modules resolve to the default library path and are flagged
    /// external; unresolvable specifiers yield `None` rather than an
    /// error.
    fn resolve_module_names(
        &self,
        specifiers: &[String],
        containing_file: &str,
    ) -> Vec<Option<ResolvedName>>;

    /// Classification of a tracked file.
    fn script_kind(&self, file_name: &str) -> ScriptKind;

    /// Fixed virtual path of the built-in ambient declarations.
    fn default_lib_file_name(&self) -> &'static str {
        DEFAULT_LIB_FILE_NAME
    }

    /// This runtime has no ambient working directory.
    fn current_directory(&self) -> &'static str {
        ""
    }

    /// File-name case is always significant.
    fn use_case_sensitive_file_names(&self) -> bool {
        true
    }

    /// Whether a file name refers to a tracked record or the default
    /// library. Never fetches.
    fn file_exists(&self, file_name: &str) -> bool;

    /// Unsupported; backends must use [`ServiceHost::script_snapshot`].
    fn read_file(&self, file_name: &str) -> LoaderResult<String>;
}

impl ServiceHost for Loader {
    fn compilation_settings(&self) -> CompilationSettings {
        self.settings.clone()
    }

    fn script_file_names(&self) -> Vec<String> {
        self.script_file_names.read().clone()
    }

    fn script_version(&self, file_name: &str) -> String {
        self.registry
            .get(file_name)
            .map(|record| record.script_version())
            .unwrap_or_default()
    }

    fn script_snapshot(&self, file_name: &str) -> Option<ScriptSnapshot> {
        self.registry.get(file_name).map(|record| record.snapshot())
    }

    fn resolve_module_names(
        &self,
        specifiers: &[String],
        containing_file: &str,
    ) -> Vec<Option<ResolvedName>> {
        specifiers
            .iter()
            .map(|specifier| {
                if self.builtins.read().contains_key(specifier) {
                    return Some(ResolvedName {
                        resolved_file_name: DEFAULT_LIB_FILE_NAME.to_string(),
                        is_external_library: true,
                    });
                }
                match self.resolve_module(specifier, containing_file) {
                    Ok(record) => Some(ResolvedName {
                        resolved_file_name: record.file_name.clone(),
                        is_external_library: false,
                    }),
                    Err(_) => None,
                }
            })
            .collect()
    }

    fn script_kind(&self, file_name: &str) -> ScriptKind {
        self.registry
            .get(file_name)
            .map(|record| record.media_type.script_kind())
            .unwrap_or(ScriptKind::Plain)
    }

    fn file_exists(&self, file_name: &str) -> bool {
        file_name == DEFAULT_LIB_FILE_NAME || self.registry.contains(file_name)
    }

    fn read_file(&self, _file_name: &str) -> LoaderResult<String> {
        Err(LoaderError::NotImplemented("read_file"))
    }
}
