//! Per-file documentation pipeline
//!
//! pre-flight -> parse -> locate -> (extract, synthesize, insert) per site
//! -> print -> validate.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docsmith_ast::ToSource;
use docsmith_parser::{parse, ParseError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    check_source, check_tree, ensure_documentation_only, extract, insert_doc, locate, strip_doc,
    synthesize, DocSite, Edit, ExtractError, Generator, MutateError, SkipReason, ValidationFailure,
};

/// File-fatal errors. Nothing is written for a file that fails.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{}: refusing to write, {source}", path.display())]
    Validation {
        path: PathBuf,
        #[source]
        source: ValidationFailure,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Mutate(#[from] MutateError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    /// Replace existing docstrings instead of keeping them
    pub override_existing: bool,
}

/// What happened to a whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    Skipped(SkipReason),
    Unchanged,
    /// New source text, already validated
    Modified(String),
}

/// What happened to one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeResult {
    Inserted,
    Replaced,
    AlreadyDocumented,
    GeneratorFailed,
    Inline,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub site: DocSite,
    pub result: NodeResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    pub nodes: Vec<NodeReport>,
}

impl FileReport {
    pub fn count(&self, result: NodeResult) -> usize {
        self.nodes.iter().filter(|n| n.result == result).count()
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.outcome, FileOutcome::Modified(_))
    }
}

pub struct DocumentPipeline {
    generator: Arc<dyn Generator>,
    options: PipelineOptions,
}

impl DocumentPipeline {
    pub fn new(generator: Arc<dyn Generator>, options: PipelineOptions) -> Self {
        Self { generator, options }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Document every class and function in `source`.
    pub async fn document_source(&self, path: &Path, source: &str) -> Result<FileReport, FileError> {
        let report = |outcome, nodes| FileReport {
            path: path.to_path_buf(),
            outcome,
            nodes,
        };

        if let Some(reason) = check_source(source) {
            info!(path = %path.display(), %reason, "skipped");
            return Ok(report(FileOutcome::Skipped(reason), Vec::new()));
        }

        let mut tree = parse(source).map_err(|source| FileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(reason) = check_tree(&tree) {
            info!(path = %path.display(), %reason, "skipped");
            return Ok(report(FileOutcome::Skipped(reason), Vec::new()));
        }

        let mut nodes = Vec::new();
        for site in locate(&tree) {
            let result;
            (tree, result) = self.document_site(tree, &site, path).await?;
            debug!(path = %path.display(), name = %site.name, kind = %site.kind, ?result, "node done");
            nodes.push(NodeReport { site, result });
        }

        let output = tree.to_source();
        if output == source {
            info!(path = %path.display(), "unchanged");
            return Ok(report(FileOutcome::Unchanged, nodes));
        }

        if let Err(failure) = ensure_documentation_only(source, &output) {
            error!(path = %path.display(), error = %failure, "validation failed");
            return Err(FileError::Validation {
                path: path.to_path_buf(),
                source: failure,
            });
        }

        info!(
            path = %path.display(),
            inserted = nodes.iter().filter(|n| n.result == NodeResult::Inserted).count(),
            replaced = nodes.iter().filter(|n| n.result == NodeResult::Replaced).count(),
            "documented"
        );
        Ok(report(FileOutcome::Modified(output), nodes))
    }

    async fn document_site(
        &self,
        tree: docsmith_ast::SyntaxTree,
        site: &DocSite,
        path: &Path,
    ) -> Result<(docsmith_ast::SyntaxTree, NodeResult), FileError> {
        if site.inline_body {
            debug!(path = %path.display(), name = %site.name, "inline body, not editable");
            return Ok((tree, NodeResult::Inline));
        }
        if site.has_documentation && !self.options.override_existing {
            return Ok((tree, NodeResult::AlreadyDocumented));
        }

        let fragment = extract(&tree, site.node)?;
        let Some(text) = synthesize(self.generator.as_ref(), &fragment, site.kind).await else {
            warn!(path = %path.display(), name = %site.name, kind = %site.kind, "no docstring generated");
            return Ok((tree, NodeResult::GeneratorFailed));
        };

        let (tree, edit) = insert_doc(tree, site, &text, self.options.override_existing)?;
        let result = match edit {
            Edit::Inserted => NodeResult::Inserted,
            Edit::Replaced => NodeResult::Replaced,
            Edit::Unchanged => NodeResult::AlreadyDocumented,
        };
        Ok((tree, result))
    }
}

/// Remove every docstring from `source`.
pub fn strip_source(source: &str) -> Result<String, ParseError> {
    Ok(strip_doc(parse(source)?).to_source())
}
