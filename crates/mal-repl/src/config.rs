//! Command-line configuration.

use mal_eval::DEFAULT_MAX_DEPTH;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PROMPT: &str = "user> ";
pub const DEFAULT_HISTORY_FILE: &str = ".mal-history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    pub prompt: String,
    /// History file, or `None` when history is disabled.
    pub history: Option<PathBuf>,
    pub max_depth: usize,
    /// Print results and errors as JSON lines.
    pub json: bool,
    /// Evaluate this expression and exit instead of starting the loop.
    pub eval: Option<String>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            history: Some(PathBuf::from(DEFAULT_HISTORY_FILE)),
            max_depth: DEFAULT_MAX_DEPTH,
            json: false,
            eval: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(ReplConfig),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

/// Parse process arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut config = ReplConfig::default();
    let mut custom_history = None;
    let mut no_history = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--json" => config.json = true,
            "--no-history" => no_history = true,
            "--prompt" => config.prompt = value_for(&arg, args.next())?,
            "--history" => custom_history = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "-e" | "--eval" => config.eval = Some(value_for(&arg, args.next())?),
            "--max-depth" => {
                let value = value_for(&arg, args.next())?;
                config.max_depth = match value.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(ConfigError::InvalidValue { flag: arg, value }),
                };
            }
            _ => return Err(ConfigError::UnknownArgument(arg)),
        }
    }

    if no_history {
        config.history = None;
    } else if custom_history.is_some() {
        config.history = custom_history;
    }
    Ok(Command::Run(config))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}
