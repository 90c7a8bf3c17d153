//! Error taxonomy shared across the crate
//!
//! Every fatal condition propagates synchronously out of the call that
//! triggered it; nothing is swallowed or retried internally.

use thiserror::Error;

/// A diagnostic reported by the compilation backend.
///
/// Diagnostics are surfaced alongside compilation failures but do not by
/// themselves abort an emit unless the backend skips emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the diagnostic refers to, when the backend attributes one.
    pub file_name: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic without file attribution.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file_name: None,
            message: message.into(),
        }
    }

    /// Create a diagnostic attributed to a file.
    pub fn for_file(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            message: message.into(),
        }
    }
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.file_name {
            Some(file_name) => format!("{}: {}", file_name, d.message),
            None => d.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by resolution, compilation, and execution.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The host could not map a specifier to any module identity.
    #[error("Cannot resolve module \"{specifier}\" from \"{containing_file}\"")]
    Resolution {
        /// The specifier that failed to resolve.
        specifier: String,
        /// The containing context the specifier was resolved from.
        containing_file: String,
    },

    /// Fetched content whose kind cannot be classified.
    #[error("Unknown media type for: \"{specifier}\" from \"{containing_file}\".")]
    UnknownMediaType {
        /// The specifier whose fetch produced unclassifiable content.
        specifier: String,
        /// The containing context the specifier was resolved from.
        containing_file: String,
    },

    /// The backend reported an emit failure.
    #[error("Compilation of {file_name} failed: {}", format_diagnostics(.diagnostics))]
    Compilation {
        /// File whose emit failed.
        file_name: String,
        /// Diagnostics the backend attached to the failure.
        diagnostics: Vec<Diagnostic>,
    },

    /// Intentionally unsupported operation.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Evaluation of compiled output or a module body failed.
    #[error("Execution of module {file_name} failed: {message}")]
    Execution {
        /// File whose output or body failed.
        file_name: String,
        /// Message produced by the execution environment.
        message: String,
    },
}

/// Result alias for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
