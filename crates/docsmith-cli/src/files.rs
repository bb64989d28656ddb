//! Input file discovery

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::exclude::ExclusionPatterns;

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}

/// Files selected for a run.
#[derive(Debug, Default)]
pub struct PythonFiles {
    pub files: Vec<PathBuf>,
    /// Python files that matched an exclusion pattern
    pub excluded: usize,
}

impl PythonFiles {
    fn add(&mut self, seen: &mut HashSet<PathBuf>, path: &Path, excludes: &ExclusionPatterns) {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !seen.insert(key) {
            debug!(path = %path.display(), "already selected");
            return;
        }
        if excludes.is_excluded(path) {
            debug!(path = %path.display(), "excluded");
            self.excluded += 1;
            return;
        }
        self.files.push(path.to_path_buf());
    }
}

/// Every `.py` file named by `paths` or found below them, minus excluded
/// ones, in a stable order. A file reached twice (named directly and also
/// found under a named directory) is listed once. Excluded files are never
/// opened.
pub fn collect_python_files(paths: &[PathBuf], excludes: &ExclusionPatterns) -> PythonFiles {
    let mut selected = PythonFiles::default();
    let mut seen = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_python(path) {
                selected.add(&mut seen, path, excludes);
            } else {
                debug!(path = %path.display(), "not a Python file");
            }
            continue;
        }
        if !path.is_dir() {
            warn!(path = %path.display(), "path does not exist");
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_python(entry.path()) {
                selected.add(&mut seen, entry.path(), excludes);
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, relative: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "def f():\n    pass\n").unwrap();
        path
    }

    #[test]
    fn test_walks_directories_for_python_files() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "pkg/a.py");
        let b = touch(&dir, "pkg/sub/b.py");
        touch(&dir, "pkg/readme.md");

        let selected = collect_python_files(&[dir.path().to_path_buf()], &ExclusionPatterns::empty(dir.path()));
        assert_eq!(selected.files, vec![a, b]);
        assert_eq!(selected.excluded, 0);
    }

    #[test]
    fn test_exclusions_apply_to_walked_and_named_files() {
        let dir = TempDir::new().unwrap();
        let keep = touch(&dir, "app/models.py");
        let generated = touch(&dir, "app/migrations/0001.py");

        let patterns = vec!["*/migrations/*".to_string()];
        let excludes = ExclusionPatterns::new(&patterns, dir.path()).unwrap();
        let selected = collect_python_files(&[dir.path().to_path_buf(), generated], &excludes);
        assert_eq!(selected.files, vec![keep]);
        assert_eq!(selected.excluded, 1);
    }

    #[test]
    fn test_file_inside_named_directory_is_listed_once() {
        let dir = TempDir::new().unwrap();
        let a = touch(&dir, "pkg/a.py");
        let b = touch(&dir, "pkg/b.py");

        let pkg = dir.path().join("pkg");
        let selected = collect_python_files(
            &[pkg.clone(), a.clone(), pkg.join("..").join("pkg").join("b.py")],
            &ExclusionPatterns::empty(dir.path()),
        );
        assert_eq!(selected.files, vec![a, b]);

        let selected = collect_python_files(&[pkg.join("b.py"), pkg], &ExclusionPatterns::empty(dir.path()));
        assert_eq!(selected.files.len(), 2);
        assert_eq!(selected.files[0], dir.path().join("pkg/b.py"));
    }

    #[test]
    fn test_missing_and_non_python_paths_are_ignored() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "x").unwrap();
        let selected = collect_python_files(
            &[dir.path().join("missing.py"), notes],
            &ExclusionPatterns::empty(dir.path()),
        );
        assert!(selected.files.is_empty());
        assert_eq!(selected.excluded, 0);
    }
}
