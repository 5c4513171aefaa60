//! Execute tally programs against JSON input

use std::collections::HashMap;

use super::{CliError, json_to_value, value_to_json};
use crate::Value;

/// Options for the run command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// The tally program to execute
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a run operation
#[derive(Debug)]
pub enum RunResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Program executed; one JSON value per query name
    Success(serde_json::Map<String, serde_json::Value>),
}

/// Parse and optionally execute a tally program.
pub fn execute_run(options: &RunOptions) -> Result<RunResult, CliError> {
    let compiled = crate::parse(&options.query)?;

    if options.syntax_only {
        return Ok(RunResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let data = json_to_value(json_value);

    let results: HashMap<String, Value> = compiled.execute(&data)?;

    let mut output = serde_json::Map::new();
    let mut names: Vec<&String> = results.keys().collect();
    names.sort();
    for name in names {
        output.insert(name.clone(), value_to_json(results[name].clone()));
    }
    Ok(RunResult::Success(output))
}
