//! Tree walker: the driver that visits each parse-tree node once.
//!
//! A single depth-first pre-order traversal per file. Entering a class or
//! function body pushes a scope; leaving it pops. Declaration-kind nodes go
//! to the symbol table builder, documentation and decorator nodes update
//! the associator, and everything else either recurses (compound
//! statements, unknown kinds) or clears the pending attachment buffer.
//!
//! The walk never aborts on malformed input: nodes whose shape violates
//! expectations are counted and skipped, and a scope imbalance marks the
//! file degraded while still emitting its partial symbols. The only hard
//! stop is the cooperative deadline, which the driver turns into a skipped
//! manifest entry.

use std::time::Instant;

use symdex_core::graph::{
    Decorator, FileGraph, ImportRecord, IndexStatus, Modifier, Param, Relation, ScopeKind,
    Signature, SymbolId, SymbolKind,
};
use symdex_core::span::Location;
use symdex_core::tree::{module_name_for_path, ParseTree, SyntaxNode};
use thiserror::Error;
use tracing::debug;

use crate::assoc::Associator;
use crate::builder::SymbolTable;
use crate::classify::{Classifier, Construct};
use crate::scope::ScopeStack;

/// Base class names that make a class an enumeration.
const ENUM_BASES: &[&str] = &["Enum", "IntEnum", "StrEnum", "Flag", "IntFlag"];

/// Built-in and typing-machinery names never recorded as reference targets.
const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "str", "bool", "bytes", "bytearray", "complex", "list", "List", "dict",
    "Dict", "set", "Set", "frozenset", "FrozenSet", "tuple", "Tuple", "type", "Type", "object",
    "None", "NoneType", "Any", "Optional", "Union", "Callable", "Awaitable", "Coroutine",
    "Iterator", "Iterable", "Generator", "AsyncIterator", "AsyncIterable", "AsyncGenerator",
    "Sequence", "Mapping", "MutableMapping", "MutableSequence", "MutableSet", "TypeVar",
    "Generic", "Protocol", "Final", "Literal", "ClassVar", "Self",
];

/// Cooperative limits for one file's walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkOptions {
    /// Deadline checked at every node visit; exceeding it aborts the file.
    pub deadline: Option<Instant>,
}

/// Hard stop during a walk.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalkError {
    /// The per-file deadline expired mid-walk.
    #[error("file walk exceeded its deadline")]
    Timeout,
}

/// Result of walking one file: the per-file graph plus the name references
/// the relationship resolver still has to link.
#[derive(Debug)]
pub struct WalkOutcome {
    /// Symbols, imports, and manifest data; `relations` is filled by the
    /// resolver pass.
    pub graph: FileGraph,
    /// Declared base references per class-kind symbol, in source order,
    /// with capability markers (Protocol, Generic, ABC, object) stripped.
    pub class_bases: Vec<(SymbolId, Vec<String>)>,
    /// Annotation base names per symbol, for advisory References edges.
    pub annotations: Vec<(SymbolId, String)>,
}

/// Which body the walker is currently inside.
#[derive(Debug, Clone, Copy)]
enum BodyKind {
    Module,
    Class { is_enum: bool },
    Function,
}

/// Walk one parse tree into a [`WalkOutcome`].
pub fn walk_tree(tree: &ParseTree, options: &WalkOptions) -> Result<WalkOutcome, WalkError> {
    let module_name = module_name_for_path(&tree.path);
    let mut walker = Walker {
        path: &tree.path,
        classifier: Classifier::new(),
        assoc: Associator::new(),
        scopes: ScopeStack::new(module_name.clone()),
        table: SymbolTable::new(&tree.path),
        imports: Vec::new(),
        class_bases: Vec::new(),
        annotations: Vec::new(),
        deadline: options.deadline,
        defect: None,
    };

    let module_location = node_location(&tree.path, &tree.root);
    let module_id = walker.table.declare_module(&module_name, module_location);

    walker.visit_body(&tree.root.children, BodyKind::Module, Some(module_id))?;

    if walker.scopes.exit().is_err() {
        walker.note_defect("module scope already closed");
    }
    let top_level: Vec<SymbolId> = walker
        .scopes
        .module_scope()
        .entries
        .iter()
        .map(|(_, id)| *id)
        .collect();
    if let Err(err) = walker.scopes.finish() {
        walker.defect.get_or_insert(err.to_string());
    }

    let status = if walker.defect.is_some() {
        IndexStatus::Degraded
    } else {
        IndexStatus::Clean
    };
    debug!(
        "walked {}: {} symbols, {} unclassified, status {}",
        tree.path,
        walker.table.len(),
        walker.classifier.unclassified(),
        status.as_str()
    );

    let graph = FileGraph {
        path: tree.path.clone(),
        module_name,
        content_hash: tree.source_hash.clone(),
        status,
        reason: walker.defect,
        unclassified_nodes: walker.classifier.unclassified(),
        symbols: walker.table.into_symbols(),
        relations: Vec::<Relation>::new(),
        top_level,
        imports: walker.imports,
    };
    Ok(WalkOutcome {
        graph,
        class_bases: walker.class_bases,
        annotations: walker.annotations,
    })
}

struct Walker<'a> {
    path: &'a str,
    classifier: Classifier,
    assoc: Associator,
    scopes: ScopeStack,
    table: SymbolTable,
    imports: Vec<ImportRecord>,
    class_bases: Vec<(SymbolId, Vec<String>)>,
    annotations: Vec<(SymbolId, String)>,
    deadline: Option<Instant>,
    defect: Option<String>,
}

impl Walker<'_> {
    fn check_deadline(&self) -> Result<(), WalkError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(WalkError::Timeout);
            }
        }
        Ok(())
    }

    fn note_defect(&mut self, reason: &str) {
        if self.defect.is_none() {
            self.defect = Some(reason.to_string());
        }
    }

    /// Visit a body's statements. `doc_owner` receives a docstring found in
    /// first-statement position.
    fn visit_body(
        &mut self,
        nodes: &[SyntaxNode],
        ctx: BodyKind,
        doc_owner: Option<SymbolId>,
    ) -> Result<(), WalkError> {
        for (pos, node) in nodes.iter().enumerate() {
            self.visit_statement(node, ctx, doc_owner.filter(|_| pos == 0))?;
        }
        Ok(())
    }

    fn visit_statement(
        &mut self,
        node: &SyntaxNode,
        ctx: BodyKind,
        doc_owner: Option<SymbolId>,
    ) -> Result<(), WalkError> {
        self.check_deadline()?;
        match self.classifier.classify(node) {
            Construct::Module => self.visit_body(&node.children, ctx, None)?,
            Construct::Comment => self.assoc.push_comment(&node.text),
            Construct::DocString => match doc_owner {
                Some(owner) => {
                    let text = node
                        .children
                        .first()
                        .map(|s| strip_string_quotes(&s.text))
                        .unwrap_or_default();
                    if let Some(symbol) = self.table.symbol_mut(owner) {
                        // A docstring is authoritative over leading comments.
                        symbol.documentation = Some(text);
                    }
                }
                None => self.assoc.clear(),
            },
            Construct::Decorator => {
                self.assoc
                    .push_decorator(Decorator::from_source(&node.text, node.span));
            }
            Construct::DecoratedDef => {
                for child in &node.children {
                    match child.kind.as_str() {
                        "decorator" => self
                            .assoc
                            .push_decorator(Decorator::from_source(&child.text, child.span)),
                        "class_definition" => self.handle_class(child, ctx)?,
                        "function_definition" | "async_function_definition" => {
                            self.handle_function(child, ctx)?
                        }
                        _ => {}
                    }
                }
            }
            Construct::ClassDef => self.handle_class(node, ctx)?,
            Construct::FunctionDef => self.handle_function(node, ctx)?,
            Construct::Assignment => self.handle_assignment(node, ctx),
            Construct::Import => {
                self.assoc.clear();
                self.collect_import(node);
            }
            Construct::ImportFrom => {
                self.assoc.clear();
                self.collect_import_from(node);
            }
            Construct::Compound => {
                self.assoc.clear();
                self.visit_body(&node.children, ctx, None)?;
            }
            Construct::Statement => self.assoc.clear(),
            Construct::Unknown => {
                self.assoc.clear();
                self.visit_body(&node.children, ctx, None)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    fn handle_class(&mut self, node: &SyntaxNode, _ctx: BodyKind) -> Result<(), WalkError> {
        let Some(name_node) = node.child_by_kind("identifier") else {
            self.classifier.note_malformed(node);
            self.assoc.clear();
            return Ok(());
        };
        let name = name_node.text.trim().to_string();

        let mut bases: Vec<String> = Vec::new();
        let mut is_enum = false;
        let mut is_protocol = false;
        let mut is_generic = false;
        let mut is_abstract = false;
        if let Some(args) = node.child_by_kind("argument_list") {
            for arg in &args.children {
                let text = arg.text.trim();
                if text.contains('=') {
                    // Keyword arguments (metaclass=..., total=...) are not bases.
                    if text.replace(' ', "").contains("metaclass=ABCMeta") {
                        is_abstract = true;
                    }
                    continue;
                }
                match base_name(text) {
                    "Protocol" => {
                        is_protocol = true;
                        continue;
                    }
                    "Generic" => {
                        is_generic = true;
                        continue;
                    }
                    "ABC" => {
                        is_abstract = true;
                        continue;
                    }
                    "object" => continue,
                    bare => {
                        if ENUM_BASES.contains(&bare) {
                            is_enum = true;
                        }
                    }
                }
                bases.push(text.to_string());
            }
        }

        let kind = if is_enum {
            SymbolKind::Enum
        } else if is_protocol {
            SymbolKind::Protocol
        } else {
            SymbolKind::Class
        };

        let (pending_doc, decorators) = self.assoc.take();
        let location = node_location(self.path, node);
        let id = self.table.declare(&mut self.scopes, kind, &name, location);
        if let Some(symbol) = self.table.symbol_mut(id) {
            if is_abstract {
                symbol.add_modifier(Modifier::Abstract);
            }
            if is_generic {
                symbol.add_modifier(Modifier::Generic);
            }
            if let Some(doc) = pending_doc {
                symbol.documentation = Some(doc);
            }
            symbol.decorators = decorators;
        }
        if !bases.is_empty() {
            self.class_bases.push((id, bases));
        }

        self.scopes.enter(ScopeKind::Class, Some(name));
        self.declare_type_params(node, id);
        let body = node
            .child_by_kind("block")
            .map(|b| b.children.as_slice())
            .unwrap_or(&[]);
        self.visit_body(body, BodyKind::Class { is_enum }, Some(id))?;
        if self.scopes.exit().is_err() {
            self.note_defect("scope imbalance leaving class body");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Functions and methods
    // ------------------------------------------------------------------

    fn handle_function(&mut self, node: &SyntaxNode, ctx: BodyKind) -> Result<(), WalkError> {
        let Some(name_node) = node.child_by_kind("identifier") else {
            self.classifier.note_malformed(node);
            self.assoc.clear();
            return Ok(());
        };
        let name = name_node.text.trim().to_string();
        let in_class = matches!(ctx, BodyKind::Class { .. });

        let (pending_doc, decorators) = self.assoc.take();
        let mut kind = if in_class {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };
        let mut modifiers: Vec<Modifier> = Vec::new();
        for decorator in &decorators {
            match decorator.name.as_str() {
                "property" if in_class => kind = SymbolKind::Property,
                "staticmethod" => modifiers.push(Modifier::Static),
                "classmethod" => modifiers.push(Modifier::ClassMethod),
                "abstractmethod" | "abc.abstractmethod" => modifiers.push(Modifier::Abstract),
                other if in_class && (other.ends_with(".setter") || other.ends_with(".deleter")) => {
                    kind = SymbolKind::Property
                }
                _ => {}
            }
        }
        let is_async = node.kind == "async_function_definition"
            || node.has_child_kind("async")
            || node.text.trim_start().starts_with("async ");

        let (signature, annotation_bases) = extract_signature(node);
        let location = node_location(self.path, node);
        let id = self.table.declare(&mut self.scopes, kind, &name, location);
        if let Some(symbol) = self.table.symbol_mut(id) {
            if is_async {
                symbol.add_modifier(Modifier::Async);
            }
            for modifier in modifiers {
                symbol.add_modifier(modifier);
            }
            if let Some(doc) = pending_doc {
                symbol.documentation = Some(doc);
            }
            symbol.decorators = decorators;
            symbol.signature = Some(signature);
        }
        for base in annotation_bases {
            self.annotations.push((id, base));
        }

        self.scopes.enter(ScopeKind::Function, Some(name));
        self.declare_type_params(node, id);
        let body = node
            .child_by_kind("block")
            .map(|b| b.children.as_slice())
            .unwrap_or(&[]);
        self.visit_body(body, BodyKind::Function, Some(id))?;
        if self.scopes.exit().is_err() {
            self.note_defect("scope imbalance leaving function body");
        }
        Ok(())
    }

    /// Declare explicit type parameters (`class Stack[T]:` / `def first[T](...)`)
    /// into the just-entered scope and mark the owner generic.
    fn declare_type_params(&mut self, node: &SyntaxNode, owner: SymbolId) {
        let Some(params) = node.child_by_kind("type_parameters") else {
            return;
        };
        let mut declared = false;
        for ident in params.children_by_kind("identifier") {
            let location = node_location(self.path, ident);
            self.table
                .declare(&mut self.scopes, SymbolKind::TypeParameter, &ident.text, location);
            declared = true;
        }
        if declared {
            if let Some(symbol) = self.table.symbol_mut(owner) {
                symbol.add_modifier(Modifier::Generic);
            }
        }
    }

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    fn handle_assignment(&mut self, node: &SyntaxNode, ctx: BodyKind) {
        let assignment = if node.kind == "assignment" {
            node
        } else {
            match node.child_by_kind("assignment") {
                Some(inner) => inner,
                None => {
                    self.assoc.clear();
                    return;
                }
            }
        };
        self.handle_assignment_node(assignment, ctx);
    }

    fn handle_assignment_node(&mut self, assignment: &SyntaxNode, ctx: BodyKind) {
        if matches!(ctx, BodyKind::Function) {
            // Local variables are not indexed symbols.
            self.assoc.clear();
            return;
        }

        let Some(target) = assignment.children.first() else {
            self.classifier.note_malformed(assignment);
            return;
        };
        let annotation = assignment
            .child_by_kind("type")
            .map(|t| t.text.trim().to_string());
        let value = assignment
            .children
            .iter()
            .enumerate()
            .find(|(i, c)| *i > 0 && c.kind != "type")
            .map(|(_, c)| c);

        // One statement may declare a grouped set of names.
        let targets: Vec<&SyntaxNode> = match target.kind.as_str() {
            "identifier" => vec![target],
            "pattern_list" | "tuple_pattern" => {
                target.children_by_kind("identifier").collect()
            }
            _ => {
                self.classifier.note_malformed(assignment);
                self.assoc.clear();
                return;
            }
        };
        if targets.is_empty() {
            self.classifier.note_malformed(assignment);
            self.assoc.clear();
            return;
        }

        let (doc, _decorators) = self.assoc.take();
        let is_enum_body = matches!(ctx, BodyKind::Class { is_enum: true });
        let value_text = value.map(|v| v.text.trim().to_string()).unwrap_or_default();

        for target in targets {
            let name = target.text.trim();
            let kind = if matches!(ctx, BodyKind::Module) && value_text.starts_with("TypeVar(") {
                SymbolKind::TypeParameter
            } else if is_enum_body && value.is_some() && annotation.is_none() {
                SymbolKind::EnumMember
            } else {
                SymbolKind::Field
            };
            let location = node_location(self.path, target);
            let id = self.table.declare(&mut self.scopes, kind, name, location);
            if let Some(symbol) = self.table.symbol_mut(id) {
                if let Some(doc) = &doc {
                    symbol.documentation = Some(doc.clone());
                }
            }
            if let Some(annotation) = &annotation {
                if let Some(base) = annotation_base(annotation) {
                    self.annotations.push((id, base));
                }
            }
        }

        // Chained assignment: `a = b = value`.
        if let Some(inner) = assignment.child_by_kind("assignment") {
            self.handle_assignment_node(inner, ctx);
        }
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    fn collect_import(&mut self, node: &SyntaxNode) {
        for child in &node.children {
            match child.kind.as_str() {
                "dotted_name" | "identifier" => self
                    .imports
                    .push(ImportRecord::module(child.text.trim(), child.span)),
                "aliased_import" => {
                    if let (Some(module), Some(alias)) =
                        (child.children.first(), child.children.last())
                    {
                        self.imports.push(
                            ImportRecord::module(module.text.trim(), child.span)
                                .with_alias(alias.text.trim()),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_import_from(&mut self, node: &SyntaxNode) {
        let Some(pos) = node.children.iter().position(|c| {
            matches!(c.kind.as_str(), "dotted_name" | "identifier" | "relative_import")
        }) else {
            self.classifier.note_malformed(node);
            return;
        };
        let module = node.children[pos].text.trim().to_string();
        for child in &node.children[pos + 1..] {
            match child.kind.as_str() {
                "dotted_name" | "identifier" => self
                    .imports
                    .push(ImportRecord::named(&module, child.text.trim(), child.span)),
                "aliased_import" => {
                    if let (Some(name), Some(alias)) =
                        (child.children.first(), child.children.last())
                    {
                        self.imports.push(
                            ImportRecord::named(&module, name.text.trim(), child.span)
                                .with_alias(alias.text.trim()),
                        );
                    }
                }
                "wildcard_import" => self
                    .imports
                    .push(ImportRecord::named(&module, "*", child.span)),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Text helpers
// ============================================================================

fn node_location(path: &str, node: &SyntaxNode) -> Location {
    Location::new(path, node.start, node.end)
}

/// Base identifier of a possibly-subscripted reference (`Mixin[int]` → `Mixin`).
fn base_name(text: &str) -> &str {
    text.split('[').next().unwrap_or(text).trim()
}

/// Base identifier of a type annotation, or None for built-in and
/// typing-machinery names that never become reference targets.
fn annotation_base(text: &str) -> Option<String> {
    let bare = base_name(text);
    if bare.is_empty() || BUILTIN_TYPES.contains(&bare) {
        return None;
    }
    // Quoted forward references: "Token" → Token.
    let bare = bare.trim_matches(|c| c == '"' || c == '\'');
    if bare.is_empty() {
        None
    } else {
        Some(bare.to_string())
    }
}

/// Strip string quoting from a docstring literal.
fn strip_string_quotes(raw: &str) -> String {
    let mut text = raw.trim();
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(stripped) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            text = stripped;
            break;
        }
    }
    text.trim().to_string()
}

/// Extract the signature of a callable node plus annotation base names.
fn extract_signature(node: &SyntaxNode) -> (Signature, Vec<String>) {
    let mut params = Vec::new();
    let mut annotation_bases = Vec::new();
    if let Some(param_list) = node.child_by_kind("parameters") {
        for param in &param_list.children {
            match param.kind.as_str() {
                "identifier" => params.push(Param {
                    name: param.text.trim().to_string(),
                    annotation: None,
                    has_default: false,
                }),
                "typed_parameter" | "typed_default_parameter" => {
                    let name = param
                        .child_by_kind("identifier")
                        .map(|n| n.text.trim().to_string())
                        .unwrap_or_else(|| param.text.trim().to_string());
                    let annotation = param
                        .child_by_kind("type")
                        .map(|t| t.text.trim().to_string());
                    if let Some(base) = annotation.as_deref().and_then(annotation_base) {
                        annotation_bases.push(base);
                    }
                    params.push(Param {
                        name,
                        annotation,
                        has_default: param.kind == "typed_default_parameter",
                    });
                }
                "default_parameter" => {
                    let name = param
                        .child_by_kind("identifier")
                        .map(|n| n.text.trim().to_string())
                        .unwrap_or_else(|| param.text.trim().to_string());
                    params.push(Param {
                        name,
                        annotation: None,
                        has_default: true,
                    });
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => params.push(Param {
                    name: param.text.trim().to_string(),
                    annotation: None,
                    has_default: false,
                }),
                _ => {}
            }
        }
    }
    let returns = node
        .child_by_kind("type")
        .map(|t| t.text.trim().to_string());
    if let Some(base) = returns.as_deref().and_then(annotation_base) {
        annotation_bases.push(base);
    }
    (Signature { params, returns }, annotation_bases)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod text_helpers {
        use super::*;

        #[test]
        fn base_name_strips_subscripts() {
            assert_eq!(base_name("Mixin[int]"), "Mixin");
            assert_eq!(base_name("Base"), "Base");
            assert_eq!(base_name(" Generic[T] "), "Generic");
        }

        #[test]
        fn annotation_base_skips_builtins() {
            assert_eq!(annotation_base("str"), None);
            assert_eq!(annotation_base("Optional[Token]"), None);
            assert_eq!(annotation_base("Token"), Some("Token".to_string()));
            assert_eq!(annotation_base("\"Token\""), Some("Token".to_string()));
        }

        #[test]
        fn strip_string_quotes_handles_all_forms() {
            assert_eq!(strip_string_quotes("\"\"\"Doc.\"\"\""), "Doc.");
            assert_eq!(strip_string_quotes("'''Doc.'''"), "Doc.");
            assert_eq!(strip_string_quotes("'Doc.'"), "Doc.");
            assert_eq!(strip_string_quotes("\"Doc.\""), "Doc.");
        }
    }
}
