//! mal reader: converts a token stream into [`mal_types::Value`] forms.

mod parser;

pub use mal_types::MAX_NESTING;
pub use parser::{read_all, read_str, ParseResult, Parser};
