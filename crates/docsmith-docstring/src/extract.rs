//! Fragment extraction
//!
//! Rebuilds a reduced copy of a definition as the text a generator sees.

use docsmith_ast::{
    dedent, ClassDef, FunctionDef, NodeId, Statement, StatementKind, Suite, SyntaxTree, ToSource,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no statement {0} in tree")]
    NotFound(NodeId),

    #[error("statement {0} is not a class or function definition")]
    NotADefinition(NodeId),
}

/// Source fragment for the definition `node`, dedented to column zero.
///
/// Functions keep their full header and body without decorators. Classes
/// lose their decorators and bases, and their body is cut down to the
/// `__init__` method or a lone `pass`.
pub fn extract(tree: &SyntaxTree, node: NodeId) -> Result<String, ExtractError> {
    let stmt = tree.find(node).ok_or(ExtractError::NotFound(node))?;
    match &stmt.kind {
        StatementKind::Function(func) => Ok(function_fragment(func)),
        StatementKind::Class(class) => Ok(class_fragment(class)),
        _ => Err(ExtractError::NotADefinition(node)),
    }
}

/// Source of a function without its decorators or the comments above it.
fn undecorated(func: &FunctionDef) -> String {
    let mut func = func.clone();
    func.decorators.clear();
    func.header.leading.clear();

    let mut out = String::new();
    func.header.write_source(&mut out);
    func.body.write_source(&mut out);
    out
}

fn function_fragment(func: &FunctionDef) -> String {
    dedent(&undecorated(func), &func.header.indent)
}

fn class_fragment(class: &ClassDef) -> String {
    let indent = &class.header.indent;
    let newline = line_ending(class);

    let mut out = format!("{indent}class {}:{newline}", class.name);
    match constructor(&class.body) {
        Some(init) => out.push_str(&undecorated(init)),
        None => {
            let body_indent = body_indent(class);
            out.push_str(&format!("{body_indent}pass{newline}"));
        }
    }

    dedent(&out, indent)
}

fn constructor(body: &Suite) -> Option<&FunctionDef> {
    body.statements().iter().find_map(|stmt| match &stmt.kind {
        StatementKind::Function(func) if func.name == "__init__" => Some(func),
        _ => None,
    })
}

fn body_indent(class: &ClassDef) -> String {
    class
        .body
        .statements()
        .first()
        .map(|stmt: &Statement| stmt.first_line().indent.clone())
        .unwrap_or_else(|| format!("{}    ", class.header.indent))
}

fn line_ending(class: &ClassDef) -> &str {
    match &class.body {
        _ if !class.header.newline.is_empty() => class.header.newline.as_str(),
        Suite::Inline { newline, .. } if !newline.is_empty() => newline.as_str(),
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsmith_parser::parse;

    fn fragment(source: &str, node: u32) -> String {
        let tree = parse(source).expect("source should parse");
        extract(&tree, NodeId(node)).expect("node should be a definition")
    }

    #[test]
    fn test_function_fragment_drops_decorators() {
        let source = "# lead\n@app.route('/')\n@login_required\ndef index(request):\n    # body comment\n    return render(request)\n";
        assert_eq!(
            fragment(source, 1),
            "def index(request):\n    # body comment\n    return render(request)\n"
        );
    }

    #[test]
    fn test_nested_method_is_dedented() {
        let source = "class A:\n    @staticmethod\n    def m(x,\n          y):\n        return '''a\nb'''\n";
        assert_eq!(
            fragment(source, 2),
            "def m(x,\n      y):\n    return '''a\nb'''\n"
        );
    }

    #[test]
    fn test_class_fragment_keeps_only_constructor() {
        let source = "@dataclass\nclass Point(Base, metaclass=Meta):\n    '''Old.'''\n    x = 0\n\n    @trace\n    def __init__(self, a, b):\n        self.a = a\n        self.b = b\n\n    def norm(self):\n        return 0\n";
        assert_eq!(
            fragment(source, 1),
            "class Point:\n    def __init__(self, a, b):\n        self.a = a\n        self.b = b\n"
        );
    }

    #[test]
    fn test_class_without_constructor_becomes_pass() {
        let source = "if True:\n  class Empty(object):\n      x = 1\n      def m(self):\n          pass\n";
        assert_eq!(fragment(source, 2), "class Empty:\n    pass\n");
    }

    #[test]
    fn test_inline_class() {
        assert_eq!(fragment("class E(Exception): pass", 1), "class E:\n    pass\n");
    }

    #[test]
    fn test_extract_leaves_tree_untouched() {
        let source = "@d\nclass A(B):\n    def __init__(self):\n        pass\n";
        let tree = parse(source).unwrap();
        extract(&tree, NodeId(1)).unwrap();
        assert_eq!(tree.to_source(), source);
    }

    #[test]
    fn test_extract_errors() {
        let tree = parse("x = 1\n").unwrap();
        assert!(matches!(extract(&tree, NodeId(1)), Err(ExtractError::NotADefinition(_))));
        assert!(matches!(extract(&tree, NodeId(7)), Err(ExtractError::NotFound(_))));
    }
}
