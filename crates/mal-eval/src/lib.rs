//! mal evaluator.
//!
//! Evaluates [`mal_types::Value`] forms against an [`mal_types::Env`] chain.
//! Calls in tail position (the last form of `do`, the chosen branch of `if`,
//! the body of `let*` and of a closure) reuse the current evaluation loop
//! instead of growing the host stack, so self-recursive loops run in
//! constant stack space.

pub mod builtins;
mod evaluator;
mod interpreter;

pub use evaluator::{EvalConfig, Evaluator, DEFAULT_MAX_DEPTH};
pub use interpreter::{Interpreter, ReplError, PRELUDE};
