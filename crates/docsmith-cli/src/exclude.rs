//! Exclusion patterns
//!
//! fnmatch-style globs matched against absolute paths. `*` also matches
//! `/`, so `*/migrations/*` excludes every file below any `migrations`
//! directory. Relative patterns are anchored at the working directory.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Compiled exclusion patterns, built once per run.
#[derive(Debug, Clone)]
pub struct ExclusionPatterns {
    set: GlobSet,
    cwd: PathBuf,
}

impl ExclusionPatterns {
    pub fn new(patterns: &[String], cwd: &Path) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let absolute = absolutize(Path::new(pattern), cwd);
            let glob = GlobBuilder::new(&absolute.to_string_lossy())
                .literal_separator(false)
                .build()?;
            builder.add(glob);
        }
        Ok(Self {
            set: builder.build()?,
            cwd: cwd.to_path_buf(),
        })
    }

    pub fn empty(cwd: &Path) -> Self {
        Self {
            set: GlobSet::empty(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        !self.set.is_empty() && self.set.is_match(absolutize(path, &self.cwd))
    }
}

/// Join `path` onto `cwd` when relative and fold `.` and `..` lexically.
fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> ExclusionPatterns {
        let owned: Vec<String> = list.iter().map(|p| p.to_string()).collect();
        ExclusionPatterns::new(&owned, Path::new("/work/project")).expect("patterns should compile")
    }

    #[test]
    fn test_relative_patterns_anchor_at_cwd() {
        let excludes = patterns(&["tests/*"]);
        assert!(excludes.is_excluded(Path::new("tests/test_app.py")));
        assert!(excludes.is_excluded(Path::new("/work/project/tests/unit/test_x.py")));
        assert!(!excludes.is_excluded(Path::new("src/tests/test_app.py")));
    }

    #[test]
    fn test_star_crosses_directories() {
        let excludes = patterns(&["*/migrations/*.py"]);
        assert!(excludes.is_excluded(Path::new("app/db/migrations/0001_initial.py")));
        assert!(!excludes.is_excluded(Path::new("app/db/models.py")));
    }

    #[test]
    fn test_dot_segments_are_folded() {
        let excludes = patterns(&["./vendor/*"]);
        assert!(excludes.is_excluded(Path::new("src/../vendor/lib.py")));
    }

    #[test]
    fn test_absolute_patterns_and_character_classes() {
        let excludes = patterns(&["/tmp/gen_[0-9].py"]);
        assert!(excludes.is_excluded(Path::new("/tmp/gen_3.py")));
        assert!(!excludes.is_excluded(Path::new("/tmp/gen_x.py")));
    }

    #[test]
    fn test_empty_set_excludes_nothing() {
        let excludes = ExclusionPatterns::empty(Path::new("/work"));
        assert!(!excludes.is_excluded(Path::new("anything.py")));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let owned = vec!["[unclosed".to_string()];
        assert!(ExclusionPatterns::new(&owned, Path::new("/")).is_err());
    }
}
