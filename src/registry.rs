//! Process-wide module registry
//!
//! Maps `(containing file, specifier)` pairs to canonical file names, and
//! canonical file names to module records. Exactly one record exists per
//! canonical identity for the registry's lifetime; repeated lookups for
//! the same pair always return the same record. Teardown is only via
//! [`ModuleRegistry::clear`], used between independent run sessions.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::module::ModuleRecord;

/// Registry of canonical module identities and their records.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// containing file -> specifier -> canonical file name
    file_names: RwLock<FxHashMap<String, FxHashMap<String, String>>>,
    /// canonical file name -> record
    records: RwLock<FxHashMap<String, Arc<ModuleRecord>>>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the record for a previously resolved pair.
    pub fn lookup(&self, specifier: &str, containing_file: &str) -> Option<Arc<ModuleRecord>> {
        let file_names = self.file_names.read();
        let file_name = file_names.get(containing_file)?.get(specifier)?;
        self.records.read().get(file_name).cloned()
    }

    /// Get a record by canonical file name.
    pub fn get(&self, file_name: &str) -> Option<Arc<ModuleRecord>> {
        self.records.read().get(file_name).cloned()
    }

    /// Whether a record exists for the canonical file name.
    pub fn contains(&self, file_name: &str) -> bool {
        self.records.read().contains_key(file_name)
    }

    /// Register a record under its canonical file name and remember the
    /// `(containing file, specifier)` mapping that produced it.
    ///
    /// If a record already exists for the same canonical identity, the
    /// existing record wins and is returned; two specifiers that resolve
    /// to one file share a single record.
    pub fn insert(
        &self,
        specifier: &str,
        containing_file: &str,
        record: Arc<ModuleRecord>,
    ) -> Arc<ModuleRecord> {
        let record = {
            let mut records = self.records.write();
            records
                .entry(record.file_name.clone())
                .or_insert(record)
                .clone()
        };
        self.file_names
            .write()
            .entry(containing_file.to_string())
            .or_default()
            .insert(specifier.to_string(), record.file_name.clone());
        record
    }

    /// Canonical file names of all registered records.
    pub fn file_names(&self) -> Vec<String> {
        self.records.read().keys().cloned().collect()
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether no records are registered.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop every record and every specifier mapping.
    pub fn clear(&self) {
        self.file_names.write().clear();
        self.records.write().clear();
    }
}
