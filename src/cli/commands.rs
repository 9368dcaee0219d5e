//! Command implementations

use std::path::Path;

use serde::Serialize;

use super::dispatch::{self, ConsoleReporter};
use super::interfaces::{DryRunExecutor, ProcessExecutor, TestExecutor};
use super::{CliError, CliResult, ExitCode};
use crate::config::{Config, ConfigLoader};
use crate::error::DispatchError;
use crate::exercise::ExerciseRegistry;

/// Map a dispatcher error onto the exit code the shell sees.
impl From<DispatchError> for CliError {
    fn from(err: DispatchError) -> Self {
        let code = if err.is_usage() { ExitCode::USAGE } else { ExitCode::FAILURE };
        CliError::new(format!("Error: {}", err), code)
    }
}

fn load_config(root: &Path, config_path: Option<&Path>) -> CliResult<Config> {
    let mut loader = ConfigLoader::new(root);
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }
    Ok(loader.load()?)
}

/// Run the tests for one exercise, or all of them.
pub fn run_exercise_tests(
    root: &Path,
    config_path: Option<&Path>,
    exercise: Option<&str>,
    dry_run: bool,
) -> CliResult<ExitCode> {
    let config = load_config(root, config_path)?;

    let executor: Box<dyn TestExecutor> = if dry_run {
        Box::new(DryRunExecutor)
    } else {
        Box::new(ProcessExecutor::new(config.runner.capture_summary))
    };

    let outcome = dispatch::dispatch(&config, root, exercise, executor.as_ref(), &mut ConsoleReporter)?;
    Ok(ExitCode(outcome.exit_code()))
}

#[derive(Serialize)]
struct ListedExercise {
    number: u32,
    slug: String,
    test_file: String,
}

/// Print the exercises found in the tests directory.
pub fn list_exercises(root: &Path, config_path: Option<&Path>, json: bool) -> CliResult<ExitCode> {
    let config = load_config(root, config_path)?;
    let tests_path = config.tests_path(root);
    let registry = ExerciseRegistry::discover(&tests_path, &config.test_extension)?;

    print!("{}", render_listing(&registry, root, &tests_path, json)?);
    Ok(ExitCode::SUCCESS)
}

fn render_listing(registry: &ExerciseRegistry, root: &Path, tests_path: &Path, json: bool) -> CliResult<String> {
    let listed: Vec<ListedExercise> = registry
        .exercises()
        .iter()
        .map(|e| ListedExercise {
            number: e.number,
            slug: e.slug.clone(),
            test_file: e
                .test_file
                .strip_prefix(root)
                .unwrap_or(&e.test_file)
                .to_string_lossy()
                .into_owned(),
        })
        .collect();

    if json {
        let text = serde_json::to_string_pretty(&listed)
            .map_err(|e| CliError::failure(format!("Error: failed to serialize exercises: {}", e)))?;
        return Ok(format!("{}\n", text));
    }

    if listed.is_empty() {
        return Ok(format!("No exercises found in {}\n", tests_path.display()));
    }

    let slug_width = listed.iter().map(|e| e.slug.len()).max().unwrap_or(0);
    let mut out = String::new();
    for e in &listed {
        out.push_str(&format!(
            "ex{:<4} {:<width$}  {}\n",
            e.number,
            e.slug,
            e.test_file,
            width = slug_width
        ));
    }
    Ok(out)
}
