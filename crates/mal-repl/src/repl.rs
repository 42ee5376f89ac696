//! The interactive loop and per-line response formatting.

use crate::config::ReplConfig;
use mal_eval::{Interpreter, ReplError};
use mal_types::SourceFile;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// What to print for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Value(String),
    Error(String),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Value(text) | Response::Error(text) => f.write_str(text),
        }
    }
}

#[derive(Serialize)]
struct ValueLine<'a> {
    value: &'a str,
}

pub struct Repl {
    interp: Interpreter,
    json: bool,
}

impl Repl {
    pub fn new(interp: Interpreter, json: bool) -> Self {
        Self { interp, json }
    }

    /// Evaluate one line. Blank lines produce no response.
    pub fn respond(&mut self, line: &str) -> Option<Response> {
        if line.trim().is_empty() {
            return None;
        }
        let response = match self.interp.rep(line) {
            Ok(printed) if self.json => Response::Value(json_line(&ValueLine { value: &printed })),
            Ok(printed) => Response::Value(printed),
            Err(err) if self.json => Response::Error(json_line(&err.diagnostic())),
            Err(ReplError::Read(err)) => Response::Error(err.render(&SourceFile::repl(line))),
            Err(err @ ReplError::Eval(_)) => Response::Error(err.to_string()),
        };
        Some(response)
    }

    /// Run the line-editing loop until end of input.
    pub fn run(&mut self, config: &ReplConfig) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = &config.history {
            if let Err(err) = rl.load_history(path) {
                debug!(path = %path.display(), %err, "no history loaded");
            }
        }

        loop {
            match rl.readline(&config.prompt) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Err(err) = rl.add_history_entry(line.as_str()) {
                        warn!(%err, "could not add history entry");
                    }
                    if let Some(response) = self.respond(&line) {
                        println!("{response}");
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        if let Some(path) = &config.history {
            if let Err(err) = rl.save_history(path) {
                warn!(path = %path.display(), %err, "could not save history");
            }
        }
        Ok(())
    }
}

fn json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|err| format!("{{\"stage\":\"print\",\"message\":\"{err}\"}}"))
}
