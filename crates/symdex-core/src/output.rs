//! Exchange format: the versioned record set consumed by search and
//! navigation tooling.
//!
//! The snapshot schema is the consumer contract. Evolution is additive-only:
//! new optional fields may appear, existing fields never change meaning or
//! type. [`SCHEMA_VERSION`] identifies the contract revision.
//!
//! Record types carry plain strings for ids and kinds so consumers do not
//! depend on internal representations; the `Record` suffix marks them as
//! serialization carriers, distinct from the graph model types.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::graph::{
    Decorator, ProjectIndex, Relation, RelationTarget, Signature, Symbol,
    GRAPH_SCHEMA_VERSION,
};
use crate::span::Location;

/// Current schema version for emitted snapshots.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Records
// ============================================================================

/// A symbol as emitted to consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    /// Stable symbol id (`sym_<hex>`).
    pub id: String,
    /// Symbol kind string (class, function, enum_member, ...).
    pub kind: String,
    /// Simple name.
    pub name: String,
    /// Dot-joined qualified name.
    pub qualified_name: String,
    /// Declaration location.
    pub location: Location,
    /// Modifier flag strings, canonical order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub modifiers: Vec<String>,
    /// Signature for callable kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Associated documentation block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Applied decorators, source order preserved.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub decorators: Vec<Decorator>,
}

impl SymbolRecord {
    /// Build a record from a graph symbol.
    pub fn from_symbol(symbol: &Symbol) -> Self {
        SymbolRecord {
            id: symbol.symbol_id.to_string(),
            kind: symbol.kind.as_str().to_string(),
            name: symbol.name.clone(),
            qualified_name: symbol.qualified_name.clone(),
            location: symbol.location.clone(),
            modifiers: symbol
                .modifiers
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            signature: symbol.signature.clone(),
            documentation: symbol.documentation.clone(),
            decorators: symbol.decorators.clone(),
        }
    }
}

/// A relation edge as emitted to consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
    /// Edge kind string (extends, implements, decorates, composes, references).
    pub kind: String,
    /// Source symbol id.
    pub from: String,
    /// Target symbol id, when resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Placeholder name, when the target is outside the indexed set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<String>,
}

impl RelationRecord {
    /// Build a record from a graph relation.
    pub fn from_relation(relation: &Relation) -> Self {
        let (to, unresolved) = match &relation.to {
            RelationTarget::Resolved(id) => (Some(id.to_string()), None),
            RelationTarget::Unresolved(name) => (None, Some(name.clone())),
        };
        RelationRecord {
            kind: relation.kind.as_str().to_string(),
            from: relation.from.to_string(),
            to,
            unresolved,
        }
    }
}

/// A warning surfaced alongside the graph (never an indexing failure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Stable warning code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// File the warning applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Warning {
    /// Create a warning scoped to a file.
    pub fn for_file(
        code: impl Into<String>,
        message: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Warning {
            code: code.into(),
            message: message.into(),
            file: Some(file.into()),
        }
    }
}

/// Per-file outcome entry in the snapshot manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Workspace-relative path.
    pub path: String,
    /// Outcome status string (clean, degraded, skipped).
    pub status: String,
    /// Reason for a non-clean status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Count of skipped unclassifiable nodes.
    pub unclassified_nodes: u32,
    /// Content hash at index time.
    pub content_hash: String,
}

/// One full index snapshot: the exchange representation of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Exchange schema version.
    pub schema_version: String,
    /// Internal graph model version the snapshot was built from.
    pub graph_version: u32,
    /// ISO-8601 generation timestamp.
    pub generated_at: String,
    /// All symbols, in id order.
    pub symbols: Vec<SymbolRecord>,
    /// All relations, grouped by owning file in deterministic file order.
    pub relations: Vec<RelationRecord>,
    /// File path → ids of its top-level (module-scope) symbols.
    pub files: BTreeMap<String, Vec<String>>,
    /// Per-file outcome manifest.
    pub manifest: Vec<ManifestEntry>,
    /// Warnings (unresolved references and the like).
    pub warnings: Vec<Warning>,
}

impl IndexSnapshot {
    /// Build a snapshot from an index, stamped with the current time.
    pub fn from_index(index: &ProjectIndex) -> Self {
        Self::from_index_at(index, chrono::Utc::now().to_rfc3339())
    }

    /// Build a snapshot with an explicit timestamp (deterministic output).
    pub fn from_index_at(index: &ProjectIndex, generated_at: String) -> Self {
        let symbols = index.symbols().map(SymbolRecord::from_symbol).collect();

        let mut relations = Vec::with_capacity(index.relation_count());
        let mut warnings = Vec::new();
        for summary in index.files() {
            if let Some(edges) = index.relations_of(&summary.path) {
                for relation in edges {
                    if let RelationTarget::Unresolved(name) = &relation.to {
                        warnings.push(Warning::for_file(
                            "unresolved_reference",
                            format!("could not resolve '{}'", name),
                            summary.path.clone(),
                        ));
                    }
                    relations.push(RelationRecord::from_relation(relation));
                }
            }
        }

        let files = index
            .files()
            .map(|summary| {
                (
                    summary.path.clone(),
                    summary.top_level.iter().map(|id| id.to_string()).collect(),
                )
            })
            .collect();

        let manifest = index
            .files()
            .map(|summary| ManifestEntry {
                path: summary.path.clone(),
                status: summary.status.as_str().to_string(),
                reason: summary.reason.clone(),
                unclassified_nodes: summary.unclassified_nodes,
                content_hash: summary.content_hash.to_string(),
            })
            .collect();

        IndexSnapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            graph_version: GRAPH_SCHEMA_VERSION,
            generated_at,
            symbols,
            relations,
            files,
            manifest,
            warnings,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the snapshot as JSON to a writer.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        FileGraph, FileId, IndexStatus, Modifier, RelationKind, SymbolId, SymbolKind,
    };
    use crate::span::{ContentHash, Point};

    fn sample_index() -> ProjectIndex {
        let path = "m.py";
        let file_id = FileId::derive(path);
        let class_id = SymbolId::derive(path, "m.Token", 0);
        let symbol = Symbol::new(
            class_id,
            SymbolKind::Class,
            "Token",
            "m.Token",
            file_id,
            Location::new(path, Point::new(1, 1), Point::new(3, 1)),
        )
        .with_modifier(Modifier::Abstract)
        .with_documentation("A lexical token.");

        let graph = FileGraph {
            path: path.to_string(),
            module_name: "m".to_string(),
            content_hash: ContentHash::compute(b"class Token: ..."),
            status: IndexStatus::Clean,
            reason: None,
            unclassified_nodes: 0,
            symbols: vec![symbol],
            relations: vec![Relation::new(
                RelationKind::Extends,
                class_id,
                RelationTarget::Unresolved("Base".to_string()),
            )],
            top_level: vec![class_id],
            imports: Vec::new(),
        };
        let mut index = ProjectIndex::new();
        index.insert_file(graph);
        index
    }

    #[test]
    fn snapshot_carries_schema_version() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        assert_eq!(snapshot.schema_version, SCHEMA_VERSION);
        assert_eq!(snapshot.graph_version, GRAPH_SCHEMA_VERSION);
    }

    #[test]
    fn unresolved_edges_become_warnings_not_failures() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.warnings[0].code, "unresolved_reference");
        assert_eq!(snapshot.manifest[0].status, "clean");
    }

    #[test]
    fn relation_record_splits_resolved_and_unresolved() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        let record = &snapshot.relations[0];
        assert_eq!(record.kind, "extends");
        assert_eq!(record.to, None);
        assert_eq!(record.unresolved.as_deref(), Some("Base"));
    }

    #[test]
    fn modifiers_serialize_snake_case() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        assert_eq!(snapshot.symbols[0].modifiers, vec!["abstract".to_string()]);
    }

    #[test]
    fn snapshot_json_omits_absent_optionals() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        let json = snapshot.to_json().unwrap();
        assert!(!json.contains("\"signature\""));
        assert!(json.contains("\"documentation\""));
    }

    #[test]
    fn files_map_lists_top_level_ids() {
        let snapshot = IndexSnapshot::from_index_at(&sample_index(), "t0".to_string());
        let ids = snapshot.files.get("m.py").unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids[0].starts_with("sym_"));
    }
}
