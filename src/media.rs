//! Media types and script-kind classification
//!
//! The host reports what kind of source it fetched; the backend asks how a
//! tracked file should be classified. Both are closed enumerations so the
//! dispatch is exhaustive rather than inferred from file contents.

use serde::{Deserialize, Serialize};

/// Kind of source the host fetched for a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// Plain, untyped script source.
    Script,
    /// Typed script source, including declaration-file variants.
    TypedScript,
    /// JSON data.
    Json,
    /// The host could not classify the content. Terminal when resolution
    /// or compilation is requested.
    Unknown,
}

impl MediaType {
    /// Whether a record of this type can be handed to the backend at all.
    pub fn is_compilable(self) -> bool {
        self != MediaType::Unknown
    }

    /// Classification reported to the compilation backend.
    ///
    /// Declaration-style and script-style typed sources both classify as
    /// typed; plain scripts and script-like sources fetched under an
    /// unrelated extension both classify as plain.
    pub fn script_kind(self) -> ScriptKind {
        match self {
            MediaType::TypedScript => ScriptKind::Typed,
            MediaType::Json => ScriptKind::Json,
            MediaType::Script | MediaType::Unknown => ScriptKind::Plain,
        }
    }
}

/// Classification the backend uses to select a compilation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptKind {
    /// Untyped script.
    Plain,
    /// Typed script, including declaration files.
    Typed,
    /// JSON source.
    Json,
}
