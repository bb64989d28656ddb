//! Lossless syntax tree nodes
//!
//! Every byte of the parsed source lives in exactly one [`Line`], one inline
//! [`Suite`], or the module footer, so printing an untouched tree gives back
//! the original text.

use serde::{Deserialize, Serialize};

/// Identifier of a statement, unique within one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The module itself. Statements are numbered from 1.
    pub const MODULE: NodeId = NodeId(0);
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ownership root for one parsed source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    module: Module,
    next_id: u32,
}

impl SyntaxTree {
    pub fn new(module: Module, next_id: u32) -> Self {
        Self { module, next_id }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    /// Allocate an id for a statement created after parsing.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn find(&self, id: NodeId) -> Option<&Statement> {
        find_in(&self.module.body, id)
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut Statement> {
        find_in_mut(&mut self.module.body, id)
    }
}

fn find_in(statements: &[Statement], id: NodeId) -> Option<&Statement> {
    for stmt in statements {
        if stmt.id == id {
            return Some(stmt);
        }
        if let Some(found) = stmt.suites().find_map(|s| find_in(s.statements(), id)) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut(statements: &mut [Statement], id: NodeId) -> Option<&mut Statement> {
    for stmt in statements {
        if stmt.id == id {
            return Some(stmt);
        }
        for suite in stmt.suites_mut() {
            if let Suite::Block(body) = suite {
                if let Some(found) = find_in_mut(body, id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// A whole source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// Whether the file started with a UTF-8 byte-order mark
    pub bom: bool,
    pub body: Vec<Statement>,
    /// Blank lines and comments after the last statement
    pub footer: String,
}

/// One logical line together with the layout around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Blank and comment-only lines that precede this line
    pub leading: String,
    pub indent: String,
    /// Content up to (not including) the terminating newline; may span
    /// several physical lines inside brackets or strings
    pub text: String,
    /// `"\n"`, `"\r\n"`, `"\r"`, or empty at end of file
    pub newline: String,
}

impl Line {
    pub fn new(indent: impl Into<String>, text: impl Into<String>, newline: impl Into<String>) -> Self {
        Self {
            leading: String::new(),
            indent: indent.into(),
            text: text.into(),
            newline: newline.into(),
        }
    }
}

/// A statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub id: NodeId,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatementKind {
    /// A single logical line: expression, assignment, import, `pass`, ...
    Simple(SimpleStatement),
    /// `class Name(...):`
    Class(ClassDef),
    /// `def name(...):` or `async def name(...):`
    Function(FunctionDef),
    /// `if`, `for`, `while`, `try`, `with`, `match`, `case` and their clauses
    Compound(CompoundStatement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleStatement {
    pub line: Line,
    pub kind: SimpleKind,
}

/// Coarse classification of a simple statement, decided at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimpleKind {
    /// The line holds only plain string literals, possibly parenthesized
    StringLiteral,
    Pass,
    Ellipsis,
    Import,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub decorators: Vec<Line>,
    pub header: Line,
    pub body: Suite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub is_async: bool,
    pub decorators: Vec<Line>,
    pub header: Line,
    pub body: Suite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundStatement {
    /// Keyword of the first clause, e.g. `if` or `async with`
    pub keyword: String,
    pub clauses: Vec<Clause>,
}

/// One `header: body` part of a compound statement (`elif`, `except`, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub header: Line,
    pub body: Suite,
}

/// The body of a block header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Suite {
    /// Statements written after the colon: `def f(): return 1`
    Inline { text: String, newline: String },
    /// An indented block of statements; never empty
    Block(Vec<Statement>),
}

impl Suite {
    pub fn statements(&self) -> &[Statement] {
        match self {
            Suite::Inline { .. } => &[],
            Suite::Block(statements) => statements,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Suite::Inline { .. })
    }

    /// The block's first statement, if it is a standalone string literal.
    pub fn docstring(&self) -> Option<&Statement> {
        match self {
            Suite::Block(statements) => statements.first().filter(|s| s.is_string_literal()),
            Suite::Inline { .. } => None,
        }
    }
}

impl Statement {
    pub fn simple(id: NodeId, line: Line, kind: SimpleKind) -> Self {
        Self {
            id,
            kind: StatementKind::Simple(SimpleStatement { line, kind }),
        }
    }

    pub fn is_string_literal(&self) -> bool {
        matches!(
            &self.kind,
            StatementKind::Simple(SimpleStatement { kind: SimpleKind::StringLiteral, .. })
        )
    }

    pub fn is_definition(&self) -> bool {
        matches!(self.kind, StatementKind::Class(_) | StatementKind::Function(_))
    }

    /// Name of a class or function definition.
    pub fn definition_name(&self) -> Option<&str> {
        match &self.kind {
            StatementKind::Class(class) => Some(&class.name),
            StatementKind::Function(func) => Some(&func.name),
            _ => None,
        }
    }

    /// The body of a class or function definition.
    pub fn definition_body(&self) -> Option<&Suite> {
        match &self.kind {
            StatementKind::Class(class) => Some(&class.body),
            StatementKind::Function(func) => Some(&func.body),
            _ => None,
        }
    }

    pub fn definition_body_mut(&mut self) -> Option<&mut Suite> {
        match &mut self.kind {
            StatementKind::Class(class) => Some(&mut class.body),
            StatementKind::Function(func) => Some(&mut func.body),
            _ => None,
        }
    }

    /// The physical first line of the statement (first decorator for
    /// decorated definitions).
    pub fn first_line(&self) -> &Line {
        match &self.kind {
            StatementKind::Simple(simple) => &simple.line,
            StatementKind::Class(class) => class.decorators.first().unwrap_or(&class.header),
            StatementKind::Function(func) => func.decorators.first().unwrap_or(&func.header),
            StatementKind::Compound(compound) => &compound.clauses[0].header,
        }
    }

    pub fn first_line_mut(&mut self) -> &mut Line {
        match &mut self.kind {
            StatementKind::Simple(simple) => &mut simple.line,
            StatementKind::Class(class) => match class.decorators.first_mut() {
                Some(decorator) => decorator,
                None => &mut class.header,
            },
            StatementKind::Function(func) => match func.decorators.first_mut() {
                Some(decorator) => decorator,
                None => &mut func.header,
            },
            StatementKind::Compound(compound) => &mut compound.clauses[0].header,
        }
    }

    /// Every suite directly owned by this statement, in source order.
    pub fn suites(&self) -> impl Iterator<Item = &Suite> {
        let suites: Vec<&Suite> = match &self.kind {
            StatementKind::Simple(_) => Vec::new(),
            StatementKind::Class(class) => vec![&class.body],
            StatementKind::Function(func) => vec![&func.body],
            StatementKind::Compound(compound) => compound.clauses.iter().map(|c| &c.body).collect(),
        };
        suites.into_iter()
    }

    pub fn suites_mut(&mut self) -> impl Iterator<Item = &mut Suite> {
        let suites: Vec<&mut Suite> = match &mut self.kind {
            StatementKind::Simple(_) => Vec::new(),
            StatementKind::Class(class) => vec![&mut class.body],
            StatementKind::Function(func) => vec![&mut func.body],
            StatementKind::Compound(compound) => {
                compound.clauses.iter_mut().map(|c| &mut c.body).collect()
            }
        };
        suites.into_iter()
    }
}

/// Visit every statement in pre-order. The callback receives the id of the
/// statement (or the module) whose suite directly contains it.
pub fn walk(module: &Module, f: &mut impl FnMut(&Statement, NodeId)) {
    fn go(statements: &[Statement], parent: NodeId, f: &mut impl FnMut(&Statement, NodeId)) {
        for stmt in statements {
            f(stmt, parent);
            for suite in stmt.suites() {
                go(suite.statements(), stmt.id, f);
            }
        }
    }
    go(&module.body, NodeId::MODULE, f);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass_line(id: u32, indent: &str) -> Statement {
        Statement::simple(NodeId(id), Line::new(indent, "pass", "\n"), SimpleKind::Pass)
    }

    fn sample_tree() -> SyntaxTree {
        let func = Statement {
            id: NodeId(1),
            kind: StatementKind::Function(FunctionDef {
                name: "f".to_string(),
                is_async: false,
                decorators: vec![],
                header: Line::new("", "def f():", "\n"),
                body: Suite::Block(vec![pass_line(2, "    ")]),
            }),
        };
        let module = Module {
            bom: false,
            body: vec![func],
            footer: String::new(),
        };
        SyntaxTree::new(module, 3)
    }

    #[test]
    fn test_find_nested_statement() {
        let tree = sample_tree();
        let found = tree.find(NodeId(2)).expect("nested statement");
        assert!(matches!(
            found.kind,
            StatementKind::Simple(SimpleStatement { kind: SimpleKind::Pass, .. })
        ));
        assert!(tree.find(NodeId(9)).is_none());
    }

    #[test]
    fn test_fresh_ids_continue_after_parse() {
        let mut tree = sample_tree();
        assert_eq!(tree.fresh_id(), NodeId(3));
        assert_eq!(tree.fresh_id(), NodeId(4));
    }

    #[test]
    fn test_walk_reports_parents() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        walk(tree.module(), &mut |stmt, parent| seen.push((stmt.id, parent)));
        assert_eq!(seen, vec![(NodeId(1), NodeId::MODULE), (NodeId(2), NodeId(1))]);
    }
}
