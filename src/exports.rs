//! Shared, mutable export namespaces
//!
//! A module's export namespace is allocated empty when its record is
//! created and handed out by reference to every importer. The handle
//! identity never changes, which is what makes circular imports
//! observable: an importer in a cycle receives the namespace before the
//! producer's body has run and sees exports appear in place afterwards.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

/// The underlying key/value object a module body populates.
pub type ExportsObject = Map<String, Value>;

/// Handle to a module's export namespace.
///
/// Cloning the handle shares the same underlying object; two-phase module
/// lifecycle means the slot is allocated first and the body fills it later.
#[derive(Debug, Clone, Default)]
pub struct ExportsHandle {
    object: Arc<Mutex<ExportsObject>>,
}

impl ExportsHandle {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one export, replacing any previous value under the same name.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.object.lock().insert(name.into(), value);
    }

    /// Read one export by name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.object.lock().get(name).cloned()
    }

    /// Copy of the namespace contents at this moment.
    pub fn snapshot(&self) -> ExportsObject {
        self.object.lock().clone()
    }

    /// Whether no exports have been populated yet.
    pub fn is_empty(&self) -> bool {
        self.object.lock().is_empty()
    }

    /// Number of populated exports.
    pub fn len(&self) -> usize {
        self.object.lock().len()
    }

    /// Whether two handles refer to the same underlying namespace.
    pub fn ptr_eq(&self, other: &ExportsHandle) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}
