//! Module-resolution collaborator interface.
//!
//! Resolving an import path to the file that implements it is project-layout
//! knowledge the core does not own (package roots, search paths, namespace
//! packages). The engine asks a [`ModuleResolver`] and treats "not found" as
//! an unresolved placeholder, never an error.

use std::collections::HashSet;

use crate::tree::module_name_for_path;

/// Resolves imported module paths to indexed file paths.
///
/// Implementations must be thread-safe: resolution happens concurrently
/// across per-file workers.
pub trait ModuleResolver: Send + Sync {
    /// Resolve a module path (e.g. `pkg.util`) imported from `from_file` to
    /// the workspace-relative path of the file implementing it, or None if
    /// the module is outside the indexed set.
    fn resolve_module(&self, module_path: &str, from_file: &str) -> Option<String>;
}

/// Resolver that never finds anything; every cross-module reference becomes
/// an unresolved placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl ModuleResolver for NullResolver {
    fn resolve_module(&self, _module_path: &str, _from_file: &str) -> Option<String> {
        None
    }
}

/// Resolver over a fixed set of workspace file paths.
///
/// Maps dotted module paths to files by the same rule that derives module
/// names from paths, with no search-path or namespace-package handling.
/// Suitable for single-root workspaces and tests; richer layouts supply
/// their own [`ModuleResolver`].
#[derive(Debug, Default)]
pub struct WorkspaceResolver {
    files: HashSet<String>,
}

impl WorkspaceResolver {
    /// Build a resolver over the given workspace file paths.
    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        WorkspaceResolver {
            files: paths.into_iter().collect(),
        }
    }
}

impl ModuleResolver for WorkspaceResolver {
    fn resolve_module(&self, module_path: &str, _from_file: &str) -> Option<String> {
        self.files
            .iter()
            .find(|path| module_name_for_path(path) == module_path)
            .cloned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_resolver_finds_nothing() {
        assert_eq!(NullResolver.resolve_module("pkg.util", "main.py"), None);
    }

    #[test]
    fn workspace_resolver_maps_dotted_paths() {
        let resolver = WorkspaceResolver::new(vec![
            "pkg/util.py".to_string(),
            "pkg/__init__.py".to_string(),
            "main.py".to_string(),
        ]);
        assert_eq!(
            resolver.resolve_module("pkg.util", "main.py"),
            Some("pkg/util.py".to_string())
        );
        assert_eq!(
            resolver.resolve_module("pkg", "main.py"),
            Some("pkg/__init__.py".to_string())
        );
        assert_eq!(resolver.resolve_module("missing", "main.py"), None);
    }
}
