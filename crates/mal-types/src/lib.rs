//! Shared types for the mal interpreter.
//!
//! This crate defines the runtime value model, the lexical environment
//! chain, the error taxonomy, source spans, and the value printer used by
//! every other stage of the pipeline.

mod env;
mod error;
mod printer;
mod span;
mod value;

pub use env::Env;
pub use error::{
    Diagnostic, EvalError, EvalResult, ReadError, ReadErrorKind, ReadErrors, Stage, MAX_ERRORS,
};
pub use printer::pr_str;
pub use span::{SourceFile, Span};
pub use value::{Arity, Closure, Function, List, NativeFn, NativeFnPtr, Value, MAX_NESTING};
