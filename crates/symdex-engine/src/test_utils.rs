//! Parse-tree builders for tests.
//!
//! Tests never parse source text: they construct the trees the parser
//! collaborator would deliver, using the Python-flavored kind vocabulary
//! the classifier understands. Positions are assigned by [`finalize`] in
//! pre-order, so source order maps to increasing spans the way it does in
//! a real file.

use symdex_core::span::{Point, Span};
use symdex_core::tree::{ParseTree, SyntaxNode};

fn node(kind: &str, text: &str) -> SyntaxNode {
    SyntaxNode::new(
        kind,
        text,
        Span::new(0, 0),
        Point::new(1, 1),
        Point::new(1, 1),
    )
}

/// Assign pre-order positions: one line per node, byte spans covering the
/// node's subtree.
pub fn finalize(root: &mut SyntaxNode) {
    let mut next_line = 1u32;
    let mut next_byte = 0u64;
    assign_positions(root, &mut next_line, &mut next_byte);
}

fn assign_positions(node: &mut SyntaxNode, next_line: &mut u32, next_byte: &mut u64) {
    let start_line = *next_line;
    let start_byte = *next_byte;
    *next_byte += node.text.len() as u64 + 1;
    *next_line += 1;
    for child in &mut node.children {
        assign_positions(child, next_line, next_byte);
    }
    let end_line = (*next_line - 1).max(start_line);
    node.span = Span::new(start_byte, *next_byte);
    node.start = Point::new(start_line, 1);
    node.end = Point::new(end_line, 1 + node.text.len() as u32);
}

fn render(node: &SyntaxNode) -> String {
    if node.children.is_empty() {
        return node.text.clone();
    }
    let mut parts = Vec::with_capacity(node.children.len() + 1);
    if !node.text.is_empty() {
        parts.push(node.text.clone());
    }
    parts.extend(node.children.iter().map(render));
    parts.join("\n")
}

/// Build a finalized parse tree for a file.
pub fn tree(path: &str, children: Vec<SyntaxNode>) -> ParseTree {
    let mut root = node("module", "").with_children(children);
    root.text = render(&root);
    finalize(&mut root);
    ParseTree::new(path, root)
}

/// `class Name(bases): body`
pub fn class_def(name: &str, bases: &[&str], body: Vec<SyntaxNode>) -> SyntaxNode {
    let mut children = vec![node("identifier", name)];
    if !bases.is_empty() {
        let args: Vec<SyntaxNode> = bases
            .iter()
            .map(|b| {
                if b.contains('=') {
                    node("keyword_argument", b)
                } else {
                    node("identifier", b)
                }
            })
            .collect();
        children.push(node("argument_list", "").with_children(args));
    }
    children.push(node("block", "").with_children(body));
    let header = if bases.is_empty() {
        format!("class {}:", name)
    } else {
        format!("class {}({}):", name, bases.join(", "))
    };
    node("class_definition", &header).with_children(children)
}

/// One parameter spec: name, optional annotation text, default present.
pub type ParamSpec<'a> = (&'a str, Option<&'a str>, bool);

fn param_node(spec: &ParamSpec<'_>) -> SyntaxNode {
    let (name, annotation, has_default) = *spec;
    match (annotation, has_default) {
        (None, false) => node("identifier", name),
        (None, true) => node("default_parameter", name)
            .with_children(vec![node("identifier", name)]),
        (Some(ann), false) => node("typed_parameter", name)
            .with_children(vec![node("identifier", name), node("type", ann)]),
        (Some(ann), true) => node("typed_default_parameter", name)
            .with_children(vec![node("identifier", name), node("type", ann)]),
    }
}

/// `def name(params) -> returns: body`
pub fn function_def(
    name: &str,
    params: &[ParamSpec<'_>],
    returns: Option<&str>,
    body: Vec<SyntaxNode>,
) -> SyntaxNode {
    let mut children = vec![node("identifier", name)];
    children.push(
        node("parameters", "").with_children(params.iter().map(param_node).collect()),
    );
    if let Some(ret) = returns {
        children.push(node("type", ret));
    }
    children.push(node("block", "").with_children(body));
    node("function_definition", &format!("def {}(...):", name)).with_children(children)
}

/// `async def name(params) -> returns: body`
pub fn async_function_def(
    name: &str,
    params: &[ParamSpec<'_>],
    returns: Option<&str>,
    body: Vec<SyntaxNode>,
) -> SyntaxNode {
    let mut def = function_def(name, params, returns, body);
    def.text = format!("async def {}(...):", name);
    def.children.insert(0, node("async", "async"));
    def
}

/// Wrap a definition with decorators, listed top to bottom.
pub fn decorated(decorators: &[&str], definition: SyntaxNode) -> SyntaxNode {
    let mut children: Vec<SyntaxNode> = decorators
        .iter()
        .map(|d| node("decorator", d))
        .collect();
    children.push(definition);
    node("decorated_definition", "").with_children(children)
}

/// A docstring statement (first statement of a body).
pub fn docstring(text: &str) -> SyntaxNode {
    let quoted = format!("\"\"\"{}\"\"\"", text);
    node("expression_statement", "")
        .with_children(vec![node("string", &quoted)])
}

/// A comment line.
pub fn comment(text: &str) -> SyntaxNode {
    node("comment", &format!("# {}", text))
}

/// `name: annotation = value`
pub fn assign(name: &str, annotation: Option<&str>, value: Option<&str>) -> SyntaxNode {
    let mut children = vec![node("identifier", name)];
    if let Some(ann) = annotation {
        children.push(node("type", ann));
    }
    if let Some(v) = value {
        children.push(node("expression", v));
    }
    let assignment = node("assignment", "").with_children(children);
    node("expression_statement", "").with_children(vec![assignment])
}

/// `a, b = value` (grouped declaration from one statement).
pub fn tuple_assign(names: &[&str], value: &str) -> SyntaxNode {
    let targets: Vec<SyntaxNode> = names.iter().map(|n| node("identifier", n)).collect();
    let assignment = node("assignment", "").with_children(vec![
        node("pattern_list", "").with_children(targets),
        node("expression", value),
    ]);
    node("expression_statement", "").with_children(vec![assignment])
}

/// `import module`
pub fn import_stmt(module: &str) -> SyntaxNode {
    node("import_statement", &format!("import {}", module))
        .with_children(vec![node("dotted_name", module)])
}

/// `import module as alias`
pub fn import_as(module: &str, alias: &str) -> SyntaxNode {
    let aliased = node("aliased_import", "")
        .with_children(vec![node("dotted_name", module), node("identifier", alias)]);
    node("import_statement", &format!("import {} as {}", module, alias))
        .with_children(vec![aliased])
}

/// `from module import a, b as c`
pub fn from_import(module: &str, names: &[(&str, Option<&str>)]) -> SyntaxNode {
    let mut children = vec![node("dotted_name", module)];
    for (name, alias) in names {
        match alias {
            None => children.push(node("dotted_name", name)),
            Some(alias) => children.push(node("aliased_import", "").with_children(vec![
                node("identifier", name),
                node("identifier", alias),
            ])),
        }
    }
    node("import_from_statement", &format!("from {} import ...", module))
        .with_children(children)
}

/// An uninteresting statement (clears pending attachments).
pub fn pass_stmt() -> SyntaxNode {
    node("pass_statement", "pass")
}

/// An expression statement that is not a docstring or assignment.
pub fn call_stmt(text: &str) -> SyntaxNode {
    node("expression_statement", "").with_children(vec![node("call", text)])
}

/// A node with an arbitrary (possibly unknown) kind.
pub fn raw(kind: &str, text: &str, children: Vec<SyntaxNode>) -> SyntaxNode {
    node(kind, text).with_children(children)
}

/// Insert explicit type parameters after the name of a definition.
pub fn with_type_params(mut definition: SyntaxNode, names: &[&str]) -> SyntaxNode {
    let params = node("type_parameters", "")
        .with_children(names.iter().map(|n| node("identifier", n)).collect());
    definition.children.insert(1, params);
    definition
}
