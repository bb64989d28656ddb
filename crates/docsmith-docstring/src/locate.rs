//! Documentation sites
//!
//! Finds every class and function definition in document order and records
//! whether it already carries a docstring.

use std::collections::HashMap;
use std::fmt;

use docsmith_ast::{walk, NodeId, Statement, StatementKind, SyntaxTree};
use serde::{Deserialize, Serialize};

/// What kind of definition a docstring documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Class,
    Function,
    Method,
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Class => "class",
            DocKind::Function => "function",
            DocKind::Method => "method",
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A located definition plus its documentation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSite {
    pub node: NodeId,
    pub name: String,
    pub kind: DocKind,
    /// The class a method belongs to
    pub enclosing_class: Option<NodeId>,
    pub has_documentation: bool,
    /// Body written on the header line; such definitions are never edited
    pub inline_body: bool,
}

/// Coarse shape of a statement, enough to resolve nearest enclosing
/// definitions without holding borrows into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Class,
    Function,
    Other,
}

/// Side table from each statement to the statement (or module) whose suite
/// directly contains it.
#[derive(Debug, Default)]
pub struct ParentTable {
    parents: HashMap<NodeId, NodeId>,
    shapes: HashMap<NodeId, Shape>,
}

impl ParentTable {
    pub fn build(tree: &SyntaxTree) -> Self {
        let mut table = ParentTable::default();
        walk(tree.module(), &mut |stmt, parent| {
            table.parents.insert(stmt.id, parent);
            let shape = match stmt.kind {
                StatementKind::Class(_) => Shape::Class,
                StatementKind::Function(_) => Shape::Function,
                _ => Shape::Other,
            };
            table.shapes.insert(stmt.id, shape);
        });
        table
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents.get(&node).copied()
    }

    /// Nearest enclosing class or function, skipping compound statements.
    /// Returns the definition and whether it is a class.
    pub fn enclosing_definition(&self, node: NodeId) -> Option<(NodeId, bool)> {
        let mut current = self.parent(node)?;
        while current != NodeId::MODULE {
            match self.shapes.get(&current) {
                Some(Shape::Class) => return Some((current, true)),
                Some(Shape::Function) => return Some((current, false)),
                _ => current = self.parent(current)?,
            }
        }
        None
    }
}

/// Every class and function definition, in pre-order.
pub fn locate(tree: &SyntaxTree) -> Vec<DocSite> {
    let parents = ParentTable::build(tree);
    let mut sites = Vec::new();

    walk(tree.module(), &mut |stmt, _| {
        if let Some(site) = site_for(stmt, &parents) {
            sites.push(site);
        }
    });

    sites
}

fn site_for(stmt: &Statement, parents: &ParentTable) -> Option<DocSite> {
    let (name, body, is_class) = match &stmt.kind {
        StatementKind::Class(class) => (&class.name, &class.body, true),
        StatementKind::Function(func) => (&func.name, &func.body, false),
        _ => return None,
    };

    let enclosing_class = match parents.enclosing_definition(stmt.id) {
        Some((id, true)) => Some(id),
        _ => None,
    };
    let kind = match (is_class, enclosing_class) {
        (true, _) => DocKind::Class,
        (false, Some(_)) => DocKind::Method,
        (false, None) => DocKind::Function,
    };

    Some(DocSite {
        node: stmt.id,
        name: name.clone(),
        kind,
        enclosing_class,
        has_documentation: body.docstring().is_some(),
        inline_body: body.is_inline(),
    })
}
