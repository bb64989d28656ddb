//! Docsmith CLI - Generate and strip Python docstrings

mod config;
mod exclude;
mod files;
mod logger;
mod summary;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

use docsmith_docstring::{
    ensure_documentation_only, locate, strip_source, DocKind, DocSite, DocumentPipeline, FileError,
    FileOutcome, FileReport, ValidationFailure,
};
use docsmith_llm::Provider;
use docsmith_parser::{parse, ParseError};

use crate::config::RunConfig;
use crate::exclude::ExclusionPatterns;
use crate::files::{collect_python_files, PythonFiles};
use crate::logger::init_logging;
use crate::summary::Summary;

#[derive(Parser)]
#[command(name = "docsmith", version)]
#[command(about = "Add and remove Python docstrings without touching code", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate missing docstrings with an LLM
    Generate(GenerateArgs),
    /// Remove docstrings from modules, classes and functions
    Strip {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Glob patterns of files to leave alone
        #[arg(long, num_args = 1..)]
        exclude: Vec<String>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// List the classes and functions of a file and their docstring status
    Sites {
        /// Input file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that two versions of a file differ only in docstrings
    Validate {
        /// Original file
        original: PathBuf,
        /// Modified file
        modified: PathBuf,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Files or directories to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Glob patterns of files to leave alone
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,
    /// Replace existing docstrings
    #[arg(long = "override")]
    override_existing: bool,
    /// LLM provider: openai, groq or anthropic
    #[arg(long, env = "DOCSMITH_PROVIDER", default_value = "openai")]
    provider: Provider,
    /// Model name (defaults to the provider's default)
    #[arg(long, env = "DOCSMITH_MODEL")]
    model: Option<String>,
    /// API key (otherwise read from DOCSMITH_API_KEY or the provider's variable)
    #[arg(long, env = "DOCSMITH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Stream responses from the provider
    #[arg(long)]
    stream: bool,
    /// Number of files processed concurrently
    #[arg(short, long, default_value_t = 4)]
    jobs: usize,
    /// Report what would change without writing
    #[arg(long)]
    dry_run: bool,
}

impl From<GenerateArgs> for RunConfig {
    fn from(args: GenerateArgs) -> Self {
        RunConfig {
            paths: args.paths,
            exclude: args.exclude,
            provider: args.provider,
            model: args.model,
            api_key: args.api_key,
            stream: args.stream,
            jobs: args.jobs.max(1),
            override_existing: args.override_existing,
            dry_run: args.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate(args) => cmd_generate(RunConfig::from(args)).await,
        Commands::Strip { paths, exclude, dry_run } => cmd_strip(&paths, &exclude, dry_run),
        Commands::Sites { file, json } => cmd_sites(&file, json),
        Commands::Validate { original, modified } => cmd_validate(&original, &modified),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn exclusions(patterns: &[String]) -> anyhow::Result<ExclusionPatterns> {
    let cwd = env::current_dir().context("cannot determine the working directory")?;
    ExclusionPatterns::new(patterns, &cwd).context("invalid --exclude pattern")
}

async fn cmd_generate(config: RunConfig) -> anyhow::Result<ExitCode> {
    let excludes = exclusions(&config.exclude)?;
    let client = config.client().context("cannot configure the LLM client")?;
    info!(provider = %client.provider(), model = %client.model(), "using generator");

    let pipeline = Arc::new(DocumentPipeline::new(Arc::new(client), config.pipeline_options()));
    let selected = collect_python_files(&config.paths, &excludes);
    info!(files = selected.files.len(), excluded = selected.excluded, jobs = config.jobs, "documenting");

    let summary = run_generate(pipeline, selected, config.jobs, config.dry_run).await;
    println!("{summary}");
    Ok(ExitCode::SUCCESS)
}

/// Document the selected files with at most `jobs` in flight.
async fn run_generate(
    pipeline: Arc<DocumentPipeline>,
    selected: PythonFiles,
    jobs: usize,
    dry_run: bool,
) -> Summary {
    let results: Vec<(PathBuf, anyhow::Result<FileReport>)> = stream::iter(selected.files)
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let result = document_file(&pipeline, &path, dry_run).await;
                (path, result)
            }
        })
        .buffer_unordered(jobs.max(1))
        .collect()
        .await;

    let mut summary = Summary::new(dry_run);
    summary.excluded = selected.excluded;
    for (path, result) in results {
        match result {
            Ok(report) => summary.record(&report),
            Err(e) => {
                error!(path = %path.display(), "{e:#}");
                summary.record_failure();
            }
        }
    }
    summary
}

async fn document_file(
    pipeline: &DocumentPipeline,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<FileReport> {
    let source = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    let report = match pipeline.document_source(path, &source).await {
        Ok(report) => report,
        Err(FileError::Parse { source: err, .. }) => {
            report_parse_error(&source, path, &err);
            bail!("not valid Python, left untouched");
        }
        Err(e) => return Err(e.into()),
    };

    if let FileOutcome::Modified(text) = &report.outcome {
        if !dry_run {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("cannot write {}", path.display()))?;
        }
    }
    Ok(report)
}

fn cmd_strip(paths: &[PathBuf], exclude: &[String], dry_run: bool) -> anyhow::Result<ExitCode> {
    let excludes = exclusions(exclude)?;
    let summary = run_strip(collect_python_files(paths, &excludes), dry_run);
    println!("{summary}");
    Ok(ExitCode::SUCCESS)
}

fn run_strip(selected: PythonFiles, dry_run: bool) -> Summary {
    let mut summary = Summary::new(dry_run);
    summary.excluded = selected.excluded;

    for file in selected.files {
        match strip_file(&file, dry_run) {
            Ok(true) => {
                info!(path = %file.display(), "docstrings removed");
                summary.modified += 1;
            }
            Ok(false) => summary.unchanged += 1,
            Err(e) => {
                error!(path = %file.display(), "{e:#}");
                summary.record_failure();
            }
        }
    }
    summary
}

/// Strip one file in place; `Ok(true)` when its text changed.
fn strip_file(path: &Path, dry_run: bool) -> anyhow::Result<bool> {
    let source = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let stripped = match strip_source(&source) {
        Ok(stripped) => stripped,
        Err(e) => {
            report_parse_error(&source, path, &e);
            bail!("not valid Python, left untouched");
        }
    };

    if stripped == source {
        return Ok(false);
    }
    if !dry_run {
        fs::write(path, stripped).with_context(|| format!("cannot write {}", path.display()))?;
    }
    Ok(true)
}

fn cmd_sites(file: &Path, json: bool) -> anyhow::Result<ExitCode> {
    let source = fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let tree = match parse(&source) {
        Ok(tree) => tree,
        Err(e) => {
            report_parse_error(&source, file, &e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let sites = locate(&tree);
    if json {
        println!("{}", serde_json::to_string_pretty(&sites)?);
    } else {
        for line in describe_sites(&sites) {
            println!("{line}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// One human-readable line per site: kind, qualified name and status.
fn describe_sites(sites: &[DocSite]) -> Vec<String> {
    sites
        .iter()
        .map(|site| {
            let name = match site.enclosing_class {
                Some(class) if site.kind == DocKind::Method => {
                    let owner = sites.iter().find(|s| s.node == class).map(|s| s.name.as_str());
                    format!("{}.{}", owner.unwrap_or("?"), site.name)
                }
                _ => site.name.clone(),
            };
            let status = if site.inline_body {
                "inline"
            } else if site.has_documentation {
                "documented"
            } else {
                "missing"
            };
            format!("{:<8} {:<40} {}", site.kind, name, status)
        })
        .collect()
}

fn cmd_validate(original: &Path, modified: &Path) -> anyhow::Result<ExitCode> {
    let before = fs::read_to_string(original).with_context(|| format!("cannot read {}", original.display()))?;
    let after = fs::read_to_string(modified).with_context(|| format!("cannot read {}", modified.display()))?;

    match ensure_documentation_only(&before, &after) {
        Ok(()) => {
            println!("✓ only docstrings differ");
            Ok(ExitCode::SUCCESS)
        }
        Err(ValidationFailure::Original(e)) => {
            report_parse_error(&before, original, &e);
            Ok(ExitCode::FAILURE)
        }
        Err(ValidationFailure::Modified(e)) => {
            report_parse_error(&after, modified, &e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            println!("✗ {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report_parse_error(source: &str, file: &Path, error: &ParseError) {
    let name = file.to_string_lossy().to_string();
    // ariadne counts characters, spans count bytes
    let to_char = |byte: usize| source.get(..byte).map_or(0, |s| s.chars().count());
    let span = error.span();
    let range = to_char(span.start)..to_char(span.end).max(to_char(span.start) + 1);

    let printed = Report::build(ReportKind::Error, name.clone(), range.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((name.clone(), range))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(source)));
    if let Err(e) = printed {
        error!(path = %file.display(), "{error} (report failed: {e})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docsmith_docstring::{Generation, Generator, GeneratorError, PipelineOptions};
    use tempfile::TempDir;

    struct Scripted;

    #[async_trait]
    impl Generator for Scripted {
        async fn generate(&self, fragment: &str, _kind: DocKind) -> Result<Generation, GeneratorError> {
            if fragment.contains("broken") {
                return Err(GeneratorError::Transport("scripted failure".to_string()));
            }
            Ok(Generation::Complete("Scripted summary.".to_string()))
        }
    }

    fn pipeline() -> Arc<DocumentPipeline> {
        Arc::new(DocumentPipeline::new(Arc::new(Scripted), PipelineOptions::default()))
    }

    fn selection(files: Vec<PathBuf>) -> PythonFiles {
        PythonFiles { files, excluded: 0 }
    }

    #[test]
    fn test_cli_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "docsmith", "generate", "src", "lib.py", "--override", "--provider", "groq", "--jobs", "2",
            "--stream", "--exclude", "*/tests/*", "*/migrations/*",
        ])
        .unwrap();
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = RunConfig::from(args);
        assert_eq!(config.paths, vec![PathBuf::from("src"), PathBuf::from("lib.py")]);
        assert_eq!(config.provider, Provider::Groq);
        assert_eq!(config.exclude.len(), 2);
        assert_eq!(config.jobs, 2);
        assert!(config.override_existing && config.stream && !config.dry_run);
    }

    #[test]
    fn test_cli_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["docsmith", "generate", "x.py", "--provider", "azure"]).is_err());
    }

    #[tokio::test]
    async fn test_generate_writes_only_changed_files() {
        let dir = TempDir::new().unwrap();
        let documented = dir.path().join("a.py");
        let constants = dir.path().join("b.py");
        let invalid = dir.path().join("c.py");
        fs::write(&documented, "def f(x):\n    return x+1\n").unwrap();
        fs::write(&constants, "X = 1\n").unwrap();
        fs::write(&invalid, "def f(:\n").unwrap();

        let files = vec![documented.clone(), constants.clone(), invalid.clone()];
        let summary = run_generate(pipeline(), selection(files), 2, false).await;

        assert_eq!(
            fs::read_to_string(&documented).unwrap(),
            "def f(x):\n    \"\"\"Scripted summary.\"\"\"\n    return x+1\n"
        );
        assert_eq!(fs::read_to_string(&constants).unwrap(), "X = 1\n");
        assert_eq!(fs::read_to_string(&invalid).unwrap(), "def f(:\n");
        assert_eq!((summary.modified, summary.skipped, summary.failed), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_dry_run_and_generator_failures_leave_files_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.py");
        let source = "def ok():\n    pass\n\ndef broken():\n    pass\n";
        fs::write(&path, source).unwrap();

        let summary = run_generate(pipeline(), selection(vec![path.clone()]), 1, true).await;
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
        assert_eq!((summary.modified, summary.inserted, summary.generator_failures), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_excluded_files_are_never_touched() {
        let dir = TempDir::new().unwrap();
        let kept = dir.path().join("keep.py");
        let skipped = dir.path().join("generated_pb2.py");
        fs::write(&kept, "def f():\n    pass\n").unwrap();
        fs::write(&skipped, "def g():\n    pass\n").unwrap();

        let excludes = ExclusionPatterns::new(&["*_pb2.py".to_string()], dir.path()).unwrap();
        let selected = collect_python_files(&[dir.path().to_path_buf()], &excludes);
        let summary = run_generate(pipeline(), selected, 4, false).await;

        assert_eq!((summary.modified, summary.excluded), (1, 1));
        assert_eq!(fs::read_to_string(&skipped).unwrap(), "def g():\n    pass\n");
    }

    #[test]
    fn test_strip_failures_do_not_stop_the_run() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.py");
        let invalid = dir.path().join("bad.py");
        let documented = dir.path().join("doc.py");
        let plain = dir.path().join("plain.py");
        fs::write(&invalid, "def f(:\n    '''Doc.'''\n").unwrap();
        fs::write(&documented, "def f():\n    '''Doc.'''\n    return 1\n").unwrap();
        fs::write(&plain, "X = 1\n").unwrap();

        let files = vec![missing, invalid.clone(), documented.clone(), plain];
        let summary = run_strip(selection(files), false);

        assert_eq!((summary.failed, summary.modified, summary.unchanged), (2, 1, 1));
        assert_eq!(fs::read_to_string(&documented).unwrap(), "def f():\n    return 1\n");
        assert_eq!(fs::read_to_string(&invalid).unwrap(), "def f(:\n    '''Doc.'''\n");
    }

    #[test]
    fn test_strip_dry_run_counts_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.py");
        let source = "'''Module.'''\nX = 1\n";
        fs::write(&path, source).unwrap();

        let summary = run_strip(selection(vec![path.clone()]), true);
        assert_eq!(summary.modified, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), source);
    }

    #[test]
    fn test_describe_sites_qualifies_methods() {
        let tree = parse("class A:\n    def m(self):\n        '''Doc.'''\n\ndef f(): pass\n").unwrap();
        let lines = describe_sites(&locate(&tree));
        assert!(lines[0].starts_with("class") && lines[0].ends_with("missing"));
        assert!(lines[1].contains("A.m") && lines[1].ends_with("documented"));
        assert!(lines[2].ends_with("inline"));
    }
}
