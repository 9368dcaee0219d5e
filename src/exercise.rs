//! Exercise identifiers and the exercise registry
//!
//! Exercises are not declared anywhere; they are discovered from test file names of the
//! form `test_ex<number>_<slug>.<ext>` in the tests directory. The registry built from
//! them is what human-supplied tokens are checked against before they end up inside a
//! file pattern.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DispatchError, DispatchResult};
use crate::selector::TestSelector;

/// File name prefix shared by every exercise test file.
pub const TEST_FILE_PREFIX: &str = "test_ex";

/// A discovered exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub number: u32,
    pub slug: String,
    pub test_file: PathBuf,
}

/// Split a test file name into `(number, slug)`.
///
/// `test_ex3_custom_exceptions.py` with extension `py` yields `(3, "custom_exceptions")`.
pub fn parse_test_file_name(name: &str, extension: &str) -> Option<(u32, String)> {
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    let rest = stem.strip_prefix(TEST_FILE_PREFIX)?;
    let (digits, slug) = rest.split_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || slug.is_empty() {
        return None;
    }
    let number: u32 = digits.parse().ok()?;
    if number == 0 {
        return None;
    }
    Some((number, slug.to_string()))
}

/// Exercises discovered in a tests directory, ordered by number then slug
#[derive(Debug, Clone, Default)]
pub struct ExerciseRegistry {
    exercises: Vec<Exercise>,
}

impl ExerciseRegistry {
    /// Scan `tests_dir` (non-recursively) for exercise test files.
    pub fn discover(tests_dir: &Path, extension: &str) -> DispatchResult<Self> {
        if !tests_dir.is_dir() {
            return Err(DispatchError::TestsDirMissing(tests_dir.to_path_buf()));
        }

        let mut exercises = Vec::new();
        for entry in fs::read_dir(tests_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some((number, slug)) = parse_test_file_name(name, extension) {
                exercises.push(Exercise {
                    number,
                    slug,
                    test_file: path.clone(),
                });
            }
        }

        exercises.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.slug.cmp(&b.slug)));
        tracing::debug!(dir = %tests_dir.display(), count = exercises.len(), "discovered exercises");
        Ok(Self { exercises })
    }

    pub fn from_exercises(mut exercises: Vec<Exercise>) -> Self {
        exercises.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.slug.cmp(&b.slug)));
        Self { exercises }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Test files of every exercise numbered `number`, whatever its zero padding.
    pub fn test_files_for(&self, number: u32) -> Vec<PathBuf> {
        self.exercises
            .iter()
            .filter(|e| e.number == number)
            .map(|e| e.test_file.clone())
            .collect()
    }

    /// Look up an exercise by slug. An exact match wins; otherwise case and `-`/`_`
    /// are ignored, so `guard-clauses` finds `test_ex2_Guard_Clauses.py`.
    pub fn find_slug(&self, slug: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.slug == slug).or_else(|| {
            let wanted = fold_slug(slug);
            self.exercises.iter().find(|e| fold_slug(&e.slug) == wanted)
        })
    }

    /// Comma-separated `ex<N> (<slug>)` list for error messages.
    pub fn describe(&self) -> String {
        if self.exercises.is_empty() {
            return "none".to_string();
        }
        self.exercises
            .iter()
            .map(|e| format!("ex{} ({})", e.number, e.slug))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fold_slug(slug: &str) -> String {
    slug.to_lowercase().replace('-', "_")
}

/// A validated exercise identifier as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseId {
    /// `digits` is kept as typed so `07` still selects `test_ex07_*`
    Number { number: u32, digits: String },
    Slug(String),
}

impl ExerciseId {
    /// Parse a raw token. Only the shape is checked here; slugs are resolved against the
    /// registry by [`ExerciseId::resolve`].
    pub fn parse(token: &str) -> DispatchResult<Self> {
        let invalid = |reason: &str| DispatchError::InvalidExercise {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(invalid("exercise identifier is empty"));
        }

        let digits = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ex") => &trimmed[2..],
            _ => trimmed,
        };
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let number: u32 = digits
                .parse()
                .map_err(|_| invalid("exercise number is too large"))?;
            if number == 0 {
                return Err(invalid("exercise numbers start at 1"));
            }
            return Ok(ExerciseId::Number {
                number,
                digits: digits.to_string(),
            });
        }

        // Path separators and glob metacharacters never name an exercise
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "/\\*?[]{}!".contains(c))
        {
            return Err(invalid(
                "expected a positive number (e.g. 3), 'ex3', or an exercise name (e.g. guard_clauses)",
            ));
        }
        Ok(ExerciseId::Slug(trimmed.to_string()))
    }

    /// Resolve against the registry into the selector handed to the test tool.
    ///
    /// Registered exercises select their actual test files. Numbers missing from the
    /// registry are accepted unless `strict` is set and fall back to the
    /// `test_ex<digits>_*` pattern, so the test tool still gets to report that nothing
    /// matched.
    pub fn resolve(&self, token: &str, registry: &ExerciseRegistry, strict: bool) -> DispatchResult<TestSelector> {
        let unknown = || DispatchError::UnknownExercise {
            token: token.to_string(),
            known: registry.describe(),
        };

        match self {
            ExerciseId::Number { number, digits } => {
                let test_files = registry.test_files_for(*number);
                if test_files.is_empty() {
                    if strict {
                        return Err(unknown());
                    }
                    tracing::warn!(exercise = %digits, "no test file found for exercise; delegating anyway");
                }
                Ok(TestSelector::exercise(digits.clone(), test_files))
            }
            ExerciseId::Slug(slug) => {
                let exercise = registry.find_slug(slug).ok_or_else(unknown)?;
                Ok(TestSelector::exercise(
                    exercise.number.to_string(),
                    vec![exercise.test_file.clone()],
                ))
            }
        }
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseId::Number { digits, .. } => write!(f, "{}", digits),
            ExerciseId::Slug(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_registry() -> ExerciseRegistry {
        ExerciseRegistry::from_exercises(vec![
            Exercise {
                number: 2,
                slug: "guard_clauses".to_string(),
                test_file: PathBuf::from("tests/test_ex2_guard_clauses.py"),
            },
            Exercise {
                number: 1,
                slug: "validate_input".to_string(),
                test_file: PathBuf::from("tests/test_ex1_validate_input.py"),
            },
        ])
    }

    #[test]
    fn test_parse_test_file_name() {
        assert_eq!(
            parse_test_file_name("test_ex3_custom_exceptions.py", "py"),
            Some((3, "custom_exceptions".to_string()))
        );
        assert_eq!(
            parse_test_file_name("test_ex12_x.py", "py"),
            Some((12, "x".to_string()))
        );
    }

    #[test]
    fn test_parse_test_file_name_rejects_others() {
        assert_eq!(parse_test_file_name("test_cli.py", "py"), None);
        assert_eq!(parse_test_file_name("test_ex1_validate_input.rs", "py"), None);
        assert_eq!(parse_test_file_name("test_ex_validate.py", "py"), None);
        assert_eq!(parse_test_file_name("test_ex1_.py", "py"), None);
        assert_eq!(parse_test_file_name("test_ex0_zero.py", "py"), None);
        assert_eq!(parse_test_file_name("test_exa_b.py", "py"), None);
        assert_eq!(parse_test_file_name("test_ex1_validate_inputpy", "py"), None);
    }

    fn number(number: u32, digits: &str) -> ExerciseId {
        ExerciseId::Number {
            number,
            digits: digits.to_string(),
        }
    }

    #[test]
    fn test_parse_numeric_tokens() {
        assert_eq!(ExerciseId::parse("1").unwrap(), number(1, "1"));
        assert_eq!(ExerciseId::parse("07").unwrap(), number(7, "07"));
        assert_eq!(ExerciseId::parse("ex3").unwrap(), number(3, "3"));
        assert_eq!(ExerciseId::parse("EX04").unwrap(), number(4, "04"));
        assert_eq!(ExerciseId::parse(" 5 ").unwrap(), number(5, "5"));
        assert_eq!(ExerciseId::parse("07").unwrap().to_string(), "07");
    }

    #[test]
    fn test_parse_slug_tokens() {
        for token in ["guard_clauses", "eafp-vs-lbyl", "Guard", "café"] {
            assert_eq!(ExerciseId::parse(token).unwrap(), ExerciseId::Slug(token.to_string()));
        }
        // "ex" alone is not a number
        assert_eq!(ExerciseId::parse("ex").unwrap(), ExerciseId::Slug("ex".to_string()));
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for token in ["", "   ", "0", "ex0", "99999999999", "a*c", "1/../2", "test_ex1_*", "1 2", "a\\b", "[ab]"] {
            let err = ExerciseId::parse(token).unwrap_err();
            assert!(
                matches!(err, DispatchError::InvalidExercise { .. }),
                "expected {token:?} to be rejected, got {err:?}"
            );
            assert!(err.is_usage());
        }
    }

    #[test]
    fn test_resolve_number_and_slug() {
        let registry = sample_registry();
        let selector = ExerciseId::parse("2").unwrap().resolve("2", &registry, true).unwrap();
        assert_eq!(
            selector,
            TestSelector::exercise("2", vec![PathBuf::from("tests/test_ex2_guard_clauses.py")])
        );

        let selector = ExerciseId::parse("validate_input")
            .unwrap()
            .resolve("validate_input", &registry, false)
            .unwrap();
        assert_eq!(
            selector,
            TestSelector::exercise("1", vec![PathBuf::from("tests/test_ex1_validate_input.py")])
        );
    }

    #[test]
    fn test_resolve_zero_padded_test_files() {
        let registry = ExerciseRegistry::from_exercises(vec![Exercise {
            number: 1,
            slug: "validate_input".to_string(),
            test_file: PathBuf::from("tests/test_ex01_validate_input.py"),
        }]);
        let expected = vec![PathBuf::from("tests/test_ex01_validate_input.py")];

        for token in ["1", "01", "ex01"] {
            let selector = ExerciseId::parse(token).unwrap().resolve(token, &registry, true).unwrap();
            assert_eq!(selector.test_files(), expected.as_slice(), "token {token:?}");
        }
        let selector = ExerciseId::parse("validate_input")
            .unwrap()
            .resolve("validate_input", &registry, true)
            .unwrap();
        assert_eq!(selector.test_files(), expected.as_slice());
    }

    #[test]
    fn test_resolve_unknown_number_depends_on_strict() {
        let registry = sample_registry();
        let id = ExerciseId::parse("07").unwrap();
        let selector = id.resolve("07", &registry, false).unwrap();
        assert_eq!(selector, TestSelector::exercise("07", vec![]));
        assert_eq!(selector.file_pattern().as_deref(), Some("test_ex07_*"));

        let err = id.resolve("07", &registry, true).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownExercise { .. }));
        assert_eq!(
            err.to_string(),
            "unknown exercise '07' (known: ex1 (validate_input), ex2 (guard_clauses))"
        );
    }

    #[test]
    fn test_resolve_unknown_slug_is_rejected() {
        let registry = sample_registry();
        let id = ExerciseId::parse("abc").unwrap();
        let err = id.resolve("abc", &registry, false).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownExercise { .. }));

        let err = id.resolve("abc", &ExerciseRegistry::default(), false).unwrap_err();
        assert!(err.to_string().contains("known: none"));
    }

    #[test]
    fn test_every_discovered_slug_is_selectable() {
        let registry = ExerciseRegistry::from_exercises(vec![
            Exercise {
                number: 2,
                slug: "Guard".to_string(),
                test_file: PathBuf::from("tests/test_ex2_Guard.py"),
            },
            Exercise {
                number: 3,
                slug: "a-b".to_string(),
                test_file: PathBuf::from("tests/test_ex3_a-b.py"),
            },
        ]);

        for exercise in registry.exercises() {
            let id = ExerciseId::parse(&exercise.slug).unwrap();
            let selector = id.resolve(&exercise.slug, &registry, true).unwrap();
            assert_eq!(selector.test_files(), [exercise.test_file.clone()]);
        }

        // Case and separator spelling are forgiven
        assert_eq!(registry.find_slug("guard").unwrap().number, 2);
        assert_eq!(registry.find_slug("a_b").unwrap().number, 3);
        assert!(registry.find_slug("ab").is_none());
    }

    #[test]
    fn test_discover_registry() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "test_ex2_guard_clauses.py",
            "test_ex10_late.py",
            "test_ex1_validate_input.py",
            "test_cli.py",
            "conftest.py",
            "test_ex3_notes.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("test_ex4_dir.py")).unwrap();

        let registry = ExerciseRegistry::discover(dir.path(), "py").unwrap();
        let numbers: Vec<u32> = registry.exercises().iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(registry.exercises()[0].slug, "validate_input");
        assert_eq!(
            registry.exercises()[0].test_file,
            dir.path().join("test_ex1_validate_input.py")
        );
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExerciseRegistry::discover(&dir.path().join("tests"), "py").unwrap_err();
        assert!(matches!(err, DispatchError::TestsDirMissing(_)));
    }
}
