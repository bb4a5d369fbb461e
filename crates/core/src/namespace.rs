//! Namespace table shared by resolution and graph building.
//!
//! The table is filled during the builder's first pass and only read after
//! that. It is passed explicitly to every stage that needs name lookups.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};

use crate::naming::qualify;
use crate::source::Import;

/// What an import's local name points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget<'a> {
    /// A namespace that is part of the compiled set.
    Parsed(&'a str),
    /// A namespace outside the compiled set, identified by its path.
    External(&'a str),
}

#[derive(Debug, Clone, Default)]
struct NamespaceEntry {
    objects: IndexSet<String>,
    services: IndexSet<String>,
    /// Local import name -> import path.
    imports: IndexMap<String, String>,
    /// Paths of `.` imports, whose names are usable unqualified.
    dot_imports: Vec<String>,
}

/// Names declared per namespace, plus each namespace's imports.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    namespaces: IndexMap<String, NamespaceEntry>,
    /// Import path -> parsed namespace name, for imports of parsed namespaces.
    paths: HashMap<String, String>,
}

impl NamespaceTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a namespace and the imports its declarations can see.
    pub fn add_namespace(&mut self, name: &str, imports: &[Import]) {
        let entry = self.namespaces.entry(name.to_string()).or_default();
        for import in imports {
            if import.alias.as_deref() == Some(".") {
                entry.dot_imports.push(import.path.clone());
            } else {
                entry
                    .imports
                    .insert(import.local_name().to_string(), import.path.clone());
            }
        }
    }

    /// Register an object name. Registering a name twice keeps one entry;
    /// duplicates are reported by validation.
    pub fn register_object(&mut self, namespace: &str, name: &str) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .objects
            .insert(name.to_string());
    }

    /// Register a service name. Registering a name twice keeps one entry.
    pub fn register_service(&mut self, namespace: &str, name: &str) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .services
            .insert(name.to_string());
    }

    /// True if `namespace` is part of the compiled set.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Qualified name of `name` if `namespace` declares it as an object.
    pub fn lookup_object(&self, namespace: &str, name: &str) -> Option<String> {
        self.namespaces
            .get(namespace)
            .filter(|entry| entry.objects.contains(name))
            .map(|_| qualify(namespace, name))
    }

    /// Where `local` points when used as a qualifier inside `namespace`.
    pub fn resolve_import(&self, namespace: &str, local: &str) -> Option<ImportTarget<'_>> {
        let path = self.namespaces.get(namespace)?.imports.get(local)?;
        Some(self.import_target(path))
    }

    /// Targets of the `.` imports of `namespace`, in declaration order.
    pub fn dot_imports(&self, namespace: &str) -> Vec<ImportTarget<'_>> {
        self.namespaces
            .get(namespace)
            .map(|entry| {
                entry
                    .dot_imports
                    .iter()
                    .map(|path| self.import_target(path))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Map import paths onto parsed namespaces. Call once all namespaces are added.
    pub fn link_imports(&mut self) {
        let mut paths = HashMap::new();
        for entry in self.namespaces.values() {
            for path in entry.imports.values().chain(entry.dot_imports.iter()) {
                if let Some(parsed) = self.parsed_namespace_for(path) {
                    paths.insert(path.clone(), parsed.to_string());
                }
            }
        }
        self.paths = paths;
    }

    /// Registered object names across all namespaces.
    pub fn object_count(&self) -> usize {
        self.namespaces.values().map(|e| e.objects.len()).sum()
    }

    /// Registered service names across all namespaces.
    pub fn service_count(&self) -> usize {
        self.namespaces.values().map(|e| e.services.len()).sum()
    }

    fn import_target<'a>(&'a self, path: &'a str) -> ImportTarget<'a> {
        match self.paths.get(path) {
            Some(parsed) => ImportTarget::Parsed(parsed),
            None => ImportTarget::External(path),
        }
    }

    // An import targets a parsed namespace when the namespace is named either
    // by the full import path or by its last segment.
    fn parsed_namespace_for(&self, path: &str) -> Option<&str> {
        if let Some((name, _)) = self.namespaces.get_key_value(path) {
            return Some(name);
        }
        let last = path.rsplit('/').next().unwrap_or(path);
        self.namespaces
            .get_key_value(last)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(path: &str, alias: Option<&str>) -> Import {
        Import {
            path: path.into(),
            alias: alias.map(Into::into),
        }
    }

    fn table() -> NamespaceTable {
        let mut table = NamespaceTable::new();
        table.add_namespace(
            "pleasantries",
            &[
                import("github.com/acme/api/services", None),
                import("github.com/acme/time", Some("t")),
            ],
        );
        table.add_namespace("services", &[]);
        table.register_object("pleasantries", "Greeting");
        table.register_object("services", "Page");
        table.link_imports();
        table
    }

    #[test]
    fn test_lookup_object_in_namespace() {
        let table = table();
        assert_eq!(
            table.lookup_object("pleasantries", "Greeting"),
            Some("pleasantries.Greeting".to_string())
        );
        assert_eq!(table.lookup_object("services", "Greeting"), None);
        assert_eq!(
            table.lookup_object("services", "Page"),
            Some("services.Page".to_string())
        );
    }

    #[test]
    fn test_import_targets() {
        let table = table();
        assert_eq!(
            table.resolve_import("pleasantries", "services"),
            Some(ImportTarget::Parsed("services"))
        );
        assert_eq!(
            table.resolve_import("pleasantries", "t"),
            Some(ImportTarget::External("github.com/acme/time"))
        );
        assert_eq!(table.resolve_import("pleasantries", "time"), None);
        assert_eq!(table.resolve_import("services", "services"), None);
    }

    #[test]
    fn test_register_keeps_one_entry_per_name() {
        let mut table = NamespaceTable::new();
        table.register_object("pkg", "Item");
        table.register_object("pkg", "Item");
        table.register_service("pkg", "Item");
        assert_eq!(table.object_count(), 1);
        assert_eq!(table.service_count(), 1);
    }

    #[test]
    fn test_dot_imports() {
        let mut table = NamespaceTable::new();
        table.add_namespace("app", &[import("github.com/acme/shared", Some("."))]);
        table.add_namespace("shared", &[]);
        table.link_imports();
        assert_eq!(table.dot_imports("app"), vec![ImportTarget::Parsed("shared")]);
    }
}
