//! Source printer
//!
//! Writes a tree back to text. For an unedited tree the output is the exact
//! input, byte for byte.

use crate::{Line, Module, Statement, StatementKind, Suite, SyntaxTree};

const BOM: char = '\u{feff}';

/// Trait for writing tree nodes back to Python source text.
pub trait ToSource {
    fn write_source(&self, out: &mut String);

    fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }
}

impl ToSource for Line {
    fn write_source(&self, out: &mut String) {
        out.push_str(&self.leading);
        out.push_str(&self.indent);
        out.push_str(&self.text);
        out.push_str(&self.newline);
    }
}

impl ToSource for Suite {
    fn write_source(&self, out: &mut String) {
        match self {
            Suite::Inline { text, newline } => {
                out.push_str(text);
                out.push_str(newline);
            }
            Suite::Block(statements) => {
                for stmt in statements {
                    stmt.write_source(out);
                }
            }
        }
    }
}

impl ToSource for Statement {
    fn write_source(&self, out: &mut String) {
        match &self.kind {
            StatementKind::Simple(simple) => simple.line.write_source(out),
            StatementKind::Class(class) => {
                for decorator in &class.decorators {
                    decorator.write_source(out);
                }
                class.header.write_source(out);
                class.body.write_source(out);
            }
            StatementKind::Function(func) => {
                for decorator in &func.decorators {
                    decorator.write_source(out);
                }
                func.header.write_source(out);
                func.body.write_source(out);
            }
            StatementKind::Compound(compound) => {
                for clause in &compound.clauses {
                    clause.header.write_source(out);
                    clause.body.write_source(out);
                }
            }
        }
    }
}

impl ToSource for Module {
    fn write_source(&self, out: &mut String) {
        if self.bom {
            out.push(BOM);
        }
        for stmt in &self.body {
            stmt.write_source(out);
        }
        out.push_str(&self.footer);
    }
}

impl ToSource for SyntaxTree {
    fn write_source(&self, out: &mut String) {
        self.module().write_source(out);
    }
}

/// Remove `indent` from the start of every physical line that carries it.
///
/// Used to lift a nested definition out to column zero; lines that do not
/// start with the prefix (continuation lines inside strings, blank lines)
/// are kept as they are.
pub fn dedent(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.split_inclusive('\n')
        .map(|line| line.strip_prefix(indent).unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FunctionDef, NodeId, SimpleKind};

    #[test]
    fn test_function_prints_decorators_header_and_body() {
        let mut decorator = Line::new("", "@cache", "\n");
        decorator.leading = "# memoised\n".to_string();
        let stmt = Statement {
            id: NodeId(1),
            kind: StatementKind::Function(FunctionDef {
                name: "f".to_string(),
                is_async: false,
                decorators: vec![decorator],
                header: Line::new("", "def f():", "\n"),
                body: Suite::Block(vec![Statement::simple(
                    NodeId(2),
                    Line::new("    ", "return 1", "\n"),
                    SimpleKind::Other,
                )]),
            }),
        };
        assert_eq!(stmt.to_source(), "# memoised\n@cache\ndef f():\n    return 1\n");
    }

    #[test]
    fn test_inline_suite_prints_on_header_line() {
        let suite = Suite::Inline {
            text: " return 1".to_string(),
            newline: "\n".to_string(),
        };
        let mut out = "def f():".to_string();
        suite.write_source(&mut out);
        assert_eq!(out, "def f(): return 1\n");
    }

    #[test]
    fn test_module_keeps_bom_and_footer() {
        let module = Module {
            bom: true,
            body: vec![],
            footer: "# end\n".to_string(),
        };
        assert_eq!(module.to_source(), "\u{feff}# end\n");
    }

    #[test]
    fn test_dedent_only_strips_matching_prefix() {
        let text = "    def f():\n        x = '''\nraw'''\n";
        assert_eq!(dedent(text, "    "), "def f():\n    x = '''\nraw'''\n");
    }
}
