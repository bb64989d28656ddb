//! Tree mutation
//!
//! Inserting, replacing and removing docstrings. Every operation consumes a
//! tree and returns the edited one; nothing outside the first statement of
//! a definition's body is touched.

use docsmith_ast::{Line, NodeId, SimpleKind, Statement, StatementKind, Suite, SyntaxTree};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DocSite;

#[derive(Debug, Error)]
pub enum MutateError {
    #[error("no statement {0} in tree")]
    NotFound(NodeId),

    #[error("statement {0} is not a class or function definition")]
    NotADefinition(NodeId),
}

/// What [`insert_doc`] did to a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    Inserted,
    Replaced,
    Unchanged,
}

/// Give `site` the docstring `text`.
///
/// Without `override_existing` a definition that already has a docstring is
/// left alone. Definitions with an inline body are never edited.
pub fn insert_doc(
    mut tree: SyntaxTree,
    site: &DocSite,
    text: &str,
    override_existing: bool,
) -> Result<(SyntaxTree, Edit), MutateError> {
    let id = tree.fresh_id();
    let stmt = tree.find_mut(site.node).ok_or(MutateError::NotFound(site.node))?;
    let newline = match &stmt.kind {
        StatementKind::Class(class) => class.header.newline.clone(),
        StatementKind::Function(func) => func.header.newline.clone(),
        _ => return Err(MutateError::NotADefinition(site.node)),
    };
    let Some(Suite::Block(body)) = stmt.definition_body_mut() else {
        return Ok((tree, Edit::Unchanged));
    };
    let Some(first) = body.first() else {
        return Ok((tree, Edit::Unchanged));
    };

    let indent = first.first_line().indent.clone();
    let mut line = Line::new(indent.clone(), docstring_literal(text, &indent, &newline), newline);

    let edit = if first.is_string_literal() {
        if !override_existing {
            return Ok((tree, Edit::Unchanged));
        }
        line.leading = first.first_line().leading.clone();
        body[0] = Statement::simple(id, line, SimpleKind::StringLiteral);
        Edit::Replaced
    } else {
        body.insert(0, Statement::simple(id, line, SimpleKind::StringLiteral));
        Edit::Inserted
    };

    Ok((tree, edit))
}

/// Remove the docstring of the module and of every class and function,
/// including ones nested inside compound statements.
///
/// Comments above a removed docstring move to the statement that follows
/// it. A body left empty gets a `pass` so the output still parses.
pub fn strip_doc(mut tree: SyntaxTree) -> SyntaxTree {
    let mut module = std::mem::take(tree.module_mut());
    let mut fresh_id = || tree.fresh_id();

    strip_first(&mut module.body, &mut fresh_id);
    for stmt in &mut module.body {
        strip_nested(stmt, &mut fresh_id);
    }

    *tree.module_mut() = module;
    tree
}

fn strip_nested(stmt: &mut Statement, fresh_id: &mut impl FnMut() -> NodeId) {
    let is_definition = stmt.is_definition();
    for suite in stmt.suites_mut() {
        if let Suite::Block(body) = suite {
            if is_definition {
                strip_first(body, fresh_id);
            }
            for child in body.iter_mut() {
                strip_nested(child, fresh_id);
            }
        }
    }
}

fn strip_first(body: &mut Vec<Statement>, fresh_id: &mut impl FnMut() -> NodeId) {
    if !body.first().is_some_and(Statement::is_string_literal) {
        return;
    }
    let removed = body.remove(0);
    let removed = removed.first_line();

    match body.first_mut() {
        Some(next) => {
            let line = next.first_line_mut();
            line.leading.insert_str(0, &removed.leading);
        }
        None => {
            let pass = Line {
                leading: removed.leading.clone(),
                indent: removed.indent.clone(),
                text: "pass".to_string(),
                newline: removed.newline.clone(),
            };
            body.push(Statement::simple(fresh_id(), pass, SimpleKind::Pass));
        }
    }
}

/// The source text of a triple-quoted docstring holding `text`, for a body
/// indented with `indent`.
///
/// Continuation lines are re-indented and, for multi-line text, the closing
/// quotes go on their own line.
pub fn docstring_literal(text: &str, indent: &str, newline: &str) -> String {
    let newline = if newline.is_empty() { "\n" } else { newline };
    let escaped = escape(text.trim());

    let mut lines = escaped.lines();
    let mut out = String::from("\"\"\"");
    out.push_str(lines.next().unwrap_or_default());

    let mut multiline = false;
    for line in lines {
        multiline = true;
        out.push_str(newline);
        let line = line.trim_end();
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    if multiline {
        out.push_str(newline);
        out.push_str(indent);
    }
    out.push_str("\"\"\"");
    out
}

fn escape(text: &str) -> String {
    let mut escaped = text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    // A quote right before the closing delimiter would end the literal early
    if let Some(body) = escaped.strip_suffix('"') {
        let slashes = body.len() - body.trim_end_matches('\\').len();
        if slashes % 2 == 0 {
            let at = body.len();
            escaped.insert(at, '\\');
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate;
    use docsmith_ast::ToSource;
    use docsmith_parser::parse;

    fn apply(source: &str, index: usize, text: &str, override_existing: bool) -> (String, Edit) {
        let tree = parse(source).expect("source should parse");
        let site = locate(&tree).remove(index);
        let (tree, edit) = insert_doc(tree, &site, text, override_existing).expect("insert should succeed");
        (tree.to_source(), edit)
    }

    #[test]
    fn test_insert_single_line() {
        let (out, edit) = apply("def f(x):\n    return x+1\n", 0, "Return x incremented.", false);
        assert_eq!(edit, Edit::Inserted);
        assert_eq!(out, "def f(x):\n    \"\"\"Return x incremented.\"\"\"\n    return x+1\n");
    }

    #[test]
    fn test_insert_multi_line_reindents() {
        let source = "class A:\n\tdef m(self):\r\n\t\tpass\r\n";
        let (out, _) = apply(source, 1, "Do it.\n\nArgs:\n    x: thing\n", false);
        assert_eq!(
            out,
            "class A:\n\tdef m(self):\r\n\t\t\"\"\"Do it.\r\n\r\n\t\tArgs:\r\n\t\t    x: thing\r\n\t\t\"\"\"\r\n\t\tpass\r\n"
        );
    }

    #[test]
    fn test_existing_docstring_kept_without_override() {
        let source = "def f():\n    'Old.'\n    return 1\n";
        let (out, edit) = apply(source, 0, "New.", false);
        assert_eq!(edit, Edit::Unchanged);
        assert_eq!(out, source);
    }

    #[test]
    fn test_override_replaces_and_keeps_comments() {
        let source = "def f():\n    # note\n    '''Old.'''\n    return 1\n";
        let (out, edit) = apply(source, 0, "New.", true);
        assert_eq!(edit, Edit::Replaced);
        assert_eq!(out, "def f():\n    # note\n    \"\"\"New.\"\"\"\n    return 1\n");
    }

    #[test]
    fn test_inline_body_is_not_edited() {
        let source = "def f(): return 1\n";
        let (out, edit) = apply(source, 0, "Doc.", true);
        assert_eq!(edit, Edit::Unchanged);
        assert_eq!(out, source);
    }

    #[test]
    fn test_insert_into_decorated_nested_definition() {
        let source = "if x:\n    @d\n    def f():\n        # c\n        pass\n";
        let (out, _) = apply(source, 0, "Doc.", false);
        assert_eq!(out, "if x:\n    @d\n    def f():\n        \"\"\"Doc.\"\"\"\n        # c\n        pass\n");
    }

    #[test]
    fn test_insert_errors() {
        let tree = parse("x = 1\n").unwrap();
        let site = DocSite {
            node: NodeId(1),
            name: "x".to_string(),
            kind: crate::DocKind::Function,
            enclosing_class: None,
            has_documentation: false,
            inline_body: false,
        };
        assert!(matches!(
            insert_doc(tree.clone(), &site, "Doc.", false),
            Err(MutateError::NotADefinition(_))
        ));
        let missing = DocSite { node: NodeId(42), ..site };
        assert!(matches!(insert_doc(tree, &missing, "Doc.", false), Err(MutateError::NotFound(_))));
    }

    #[test]
    fn test_docstring_literal_escapes() {
        assert_eq!(docstring_literal("a \\ b", "", "\n"), "\"\"\"a \\\\ b\"\"\"");
        assert_eq!(
            docstring_literal("say \"\"\"hi\"\"\"", "", "\n"),
            "\"\"\"say \\\"\\\"\\\"hi\\\"\\\"\\\"\"\"\""
        );
        assert_eq!(docstring_literal("ends \"quoted\"", "", "\n"), "\"\"\"ends \"quoted\\\"\"\"\"");
    }

    #[test]
    fn test_inserted_docstring_reparses_as_docstring() {
        let (out, _) = apply("def f():\n    pass\n", 0, "Say \"\"\"hi\"\"\" with \\n and \"quotes\"", false);
        let tree = parse(&out).expect("output should parse");
        assert!(locate(&tree)[0].has_documentation);
    }

    #[test]
    fn test_strip_doc_everywhere() {
        let source = "'''Module.'''\nimport os\n\nclass A:\n    '''A.'''\n    # kept\n    \"B\"\n    def m(self):\n        r'''M.'''\n        if x:\n            def g():\n                '''G.'''\n                return 1\n        return 2\n";
        let stripped = strip_doc(parse(source).unwrap()).to_source();
        assert_eq!(
            stripped,
            "import os\n\nclass A:\n    # kept\n    \"B\"\n    def m(self):\n        if x:\n            def g():\n                return 1\n        return 2\n"
        );
    }

    #[test]
    fn test_strip_doc_keeps_non_docstrings() {
        let source = "def f():\n    x = 'a'\n    'not first'\n\ndef g():\n    f'''{x}'''\n";
        assert_eq!(strip_doc(parse(source).unwrap()).to_source(), source);
    }

    #[test]
    fn test_strip_doc_leaves_pass_in_empty_body() {
        let source = "class E(Exception):\n    # why\n    '''Raised on failure.'''\n\nx = 1\n";
        let stripped = strip_doc(parse(source).unwrap()).to_source();
        assert_eq!(stripped, "class E(Exception):\n    # why\n    pass\n\nx = 1\n");
        assert!(parse(&stripped).is_ok());
    }
}
