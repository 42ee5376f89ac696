//! Read-eval-print over a persistent root environment.

use crate::builtins;
use crate::evaluator::{EvalConfig, Evaluator};
use mal_parser::read_str;
use mal_types::{pr_str, Diagnostic, Env, EvalError, ReadError, Value};
use std::io::Write;
use thiserror::Error;
use tracing::error;

/// Definitions evaluated into every new root environment, after the builtins.
pub const PRELUDE: &[&str] = &["(def! not (fn* (a) (if a false true)))"];

/// Failure of one read-eval-print call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplError {
    #[error("read error at {0}")]
    Read(#[from] ReadError),
    #[error("error: {0}")]
    Eval(#[from] EvalError),
}

impl ReplError {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            ReplError::Read(err) => Diagnostic::from(err),
            ReplError::Eval(err) => Diagnostic::from(err),
        }
    }
}

/// An interpreter session: the root environment plus its evaluator.
///
/// Definitions persist across calls. An error aborts only the call that
/// raised it.
pub struct Interpreter {
    root: Env,
    evaluator: Evaluator,
}

impl Interpreter {
    pub fn new(config: EvalConfig) -> Self {
        Self::from_evaluator(Evaluator::new(config))
    }

    /// Create an interpreter whose `prn` output goes to `out`.
    pub fn with_output(config: EvalConfig, out: impl Write + 'static) -> Self {
        Self::from_evaluator(Evaluator::with_output(config, out))
    }

    fn from_evaluator(evaluator: Evaluator) -> Self {
        let root = Env::root();
        builtins::install(&root);
        let mut interp = Self { root, evaluator };
        for source in PRELUDE {
            if let Err(err) = interp.eval_str(source) {
                error!(%err, source = *source, "prelude definition failed");
            }
        }
        interp
    }

    pub fn root(&self) -> &Env {
        &self.root
    }

    /// Evaluate a form in the root environment.
    pub fn eval(&mut self, ast: &Value) -> Result<Value, EvalError> {
        self.evaluator.eval(ast, &self.root)
    }

    /// Read the first form of `source` and evaluate it.
    pub fn eval_str(&mut self, source: &str) -> Result<Value, ReplError> {
        let ast = read_str(source)?;
        Ok(self.eval(&ast)?)
    }

    /// Read, evaluate, and print one line.
    pub fn rep(&mut self, line: &str) -> Result<String, ReplError> {
        self.eval_str(line).map(|value| pr_str(&value, true))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mal_types::Stage;
    use std::io;

    fn interp() -> Interpreter {
        Interpreter::with_output(EvalConfig::default(), io::sink())
    }

    #[test]
    fn test_prelude_defines_not() {
        let interp = interp();
        assert!(interp.root().get("not").is_some());
        assert!(interp.root().get("+").is_some());
    }

    #[test]
    fn test_repl_error_display() {
        let mut interp = interp();
        let err = interp.rep("(+ 1").unwrap_err();
        assert_eq!(err.diagnostic().stage, Stage::Read);
        assert!(err.to_string().starts_with("read error at 1:1"));

        let err = interp.rep("nope").unwrap_err();
        assert_eq!(err.to_string(), "error: 'nope' not found");
        assert_eq!(err.diagnostic().kind, "unbound-symbol");
    }
}
