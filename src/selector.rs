//! Test selector
//!
//! Turns "which exercise" into the arguments handed to the test tool. Exercises found in
//! the registry are passed as their test files. For anything else the tool is still run
//! without a shell, so `test_ex<N>_*` is expanded here with the same fallback a POSIX
//! shell uses: when nothing matches, the literal pattern is passed through and the tool
//! decides what an empty selection means.

use std::path::{Path, PathBuf};

use crate::error::{DispatchError, DispatchResult};
use crate::exercise::TEST_FILE_PREFIX;

/// Which tests to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestSelector {
    /// Every test in the tests directory
    All,
    /// One exercise. `label` is its number as it appears in `test_ex<label>_*`;
    /// `test_files` are the registered files, empty when none was discovered.
    Exercise { label: String, test_files: Vec<PathBuf> },
}

/// Selector arguments after pattern expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Paths (relative to the course root) or the literal pattern when nothing matched
    pub args: Vec<String>,
    /// Number of files selected; `None` when a whole directory is passed
    pub matched: Option<usize>,
}

impl TestSelector {
    pub fn exercise(label: impl Into<String>, test_files: Vec<PathBuf>) -> Self {
        TestSelector::Exercise {
            label: label.into(),
            test_files,
        }
    }

    pub fn test_files(&self) -> &[PathBuf] {
        match self {
            TestSelector::All => &[],
            TestSelector::Exercise { test_files, .. } => test_files,
        }
    }

    /// Progress line printed before delegating.
    pub fn notice(&self) -> String {
        match self {
            TestSelector::All => "Running ALL exercise tests...".to_string(),
            TestSelector::Exercise { label, .. } => format!("Running tests for Exercise {}...", label),
        }
    }

    /// File-name pattern for this selector, without the directory.
    pub fn file_pattern(&self) -> Option<String> {
        match self {
            TestSelector::All => None,
            TestSelector::Exercise { label, .. } => Some(format!("{}{}_*", TEST_FILE_PREFIX, label)),
        }
    }

    /// Pattern relative to the course root: `tests/` or `tests/test_ex1_*`.
    pub fn pattern(&self, tests_dir: &Path) -> String {
        let dir = tests_dir.to_string_lossy();
        let dir = dir.trim_end_matches(['/', '\\']);
        match self.file_pattern() {
            None => format!("{}/", dir),
            Some(file_pattern) => format!("{}/{}", dir, file_pattern),
        }
    }

    /// Turn the selector into tool arguments relative to `root`.
    ///
    /// Registered test files are passed as they are. Otherwise the pattern is expanded
    /// against the filesystem.
    pub fn expand(&self, root: &Path, tests_dir: &Path) -> DispatchResult<Expansion> {
        let pattern = self.pattern(tests_dir);
        let Some(file_pattern) = self.file_pattern() else {
            return Ok(Expansion {
                args: vec![pattern],
                matched: None,
            });
        };

        let test_files = self.test_files();
        if !test_files.is_empty() {
            let mut args: Vec<String> = test_files.iter().map(|path| relative_to(root, path)).collect();
            args.sort();
            return Ok(Expansion {
                matched: Some(args.len()),
                args,
            });
        }

        let search_dir = root.join(tests_dir);
        let glob_pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&search_dir.to_string_lossy()),
            file_pattern
        );
        let entries = glob::glob(&glob_pattern)
            .map_err(|e| DispatchError::Config(format!("invalid selector pattern '{}': {}", pattern, e)))?;

        let mut matches: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|path| relative_to(root, &path))
            .collect();
        matches.sort();

        let matched = matches.len();
        let args = if matches.is_empty() { vec![pattern] } else { matches };
        Ok(Expansion {
            args,
            matched: Some(matched),
        })
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;

    #[test]
    fn test_all_selector() {
        let selector = TestSelector::All;
        assert_eq!(selector.notice(), "Running ALL exercise tests...");
        assert_eq!(selector.pattern(Path::new("tests")), "tests/");
        assert_eq!(selector.pattern(Path::new("tests/")), "tests/");
        assert!(selector.test_files().is_empty());
    }

    #[test]
    fn test_exercise_selector() {
        let selector = TestSelector::exercise("1", vec![]);
        assert_eq!(selector.notice(), "Running tests for Exercise 1...");
        assert_eq!(selector.pattern(Path::new("tests")), "tests/test_ex1_*");

        let padded = TestSelector::exercise("07", vec![]);
        assert_eq!(padded.notice(), "Running tests for Exercise 07...");
        assert_eq!(padded.pattern(Path::new("tests")), "tests/test_ex07_*");
    }

    #[test]
    fn test_expand_all_passes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let expansion = TestSelector::All.expand(dir.path(), Path::new("tests")).unwrap();
        assert_eq!(expansion.args, vec!["tests/"]);
        assert_eq!(expansion.matched, None);
    }

    #[test]
    fn test_expand_passes_registered_files() {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("tests");
        let selector = TestSelector::exercise(
            "1",
            vec![tests.join("test_ex01_validate_input.py"), tests.join("test_ex1_extra.py")],
        );

        let expansion = selector.expand(dir.path(), Path::new("tests")).unwrap();
        assert_eq!(expansion.matched, Some(2));
        let expected: Vec<String> = ["test_ex01_validate_input.py", "test_ex1_extra.py"]
            .iter()
            .map(|n| Path::new("tests").join(n).to_string_lossy().into_owned())
            .collect();
        assert_eq!(expansion.args, expected);
    }

    #[test]
    fn test_expand_pattern_matches_only_that_number() {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("tests");
        fs::create_dir(&tests).unwrap();
        for name in ["test_ex1_validate_input.py", "test_ex10_other.py", "test_ex1_notes.txt", "test_ex2_guard.py"] {
            fs::write(tests.join(name), "").unwrap();
        }

        let expansion = TestSelector::exercise("1", vec![]).expand(dir.path(), Path::new("tests")).unwrap();
        assert_eq!(expansion.matched, Some(2));
        let expected: Vec<String> = ["test_ex1_notes.txt", "test_ex1_validate_input.py"]
            .iter()
            .map(|n| Path::new("tests").join(n).to_string_lossy().into_owned())
            .collect();
        assert_eq!(expansion.args, expected);
    }

    #[test]
    fn test_expand_without_match_keeps_literal_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("tests")).unwrap();

        let expansion = TestSelector::exercise("07", vec![]).expand(dir.path(), Path::new("tests")).unwrap();
        assert_eq!(expansion.args, vec!["tests/test_ex07_*"]);
        assert_eq!(expansion.matched, Some(0));
    }

    #[test]
    fn test_expand_escapes_root_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("course [draft]");
        let tests = root.join("tests");
        fs::create_dir_all(&tests).unwrap();
        fs::write(tests.join("test_ex3_custom_exceptions.py"), "").unwrap();

        let expansion = TestSelector::exercise("3", vec![]).expand(&root, Path::new("tests")).unwrap();
        assert_eq!(expansion.matched, Some(1));
    }

    proptest! {
        #[test]
        fn prop_pattern_embeds_label(n in 1u32..=u32::MAX, padding in 0usize..3) {
            let label = format!("{}{}", "0".repeat(padding), n);
            let selector = TestSelector::exercise(label.clone(), vec![]);
            prop_assert_eq!(selector.pattern(Path::new("tests")), format!("tests/test_ex{}_*", label));
            prop_assert!(selector.notice().contains(&label));
        }

        #[test]
        fn prop_selector_is_idempotent(n in proptest::option::of(1u32..1000)) {
            let make = || match n {
                Some(n) => TestSelector::exercise(n.to_string(), vec![]),
                None => TestSelector::All,
            };
            let (first, second) = (make(), make());
            prop_assert_eq!(first.pattern(Path::new("tests")), second.pattern(Path::new("tests")));
            prop_assert_eq!(first.notice(), second.notice());
            prop_assert_eq!(first, second);
        }
    }
}
