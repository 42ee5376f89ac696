//! Value-to-text formatting.

use crate::{Function, Value};

/// Format a value as text.
///
/// With `readably`, strings are quoted and escaped so the reader can read
/// them back. Functions print as opaque placeholders either way.
pub fn pr_str(value: &Value, readably: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, value, readably);
    out
}

fn write_value(out: &mut String, value: &Value, readably: bool) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Str(s) if readably => write_escaped(out, s),
        Value::Str(s) => out.push_str(s),
        Value::Symbol(name) => out.push_str(name),
        Value::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item, readably);
            }
            out.push(')');
        }
        Value::Function(Function::Native(native)) => {
            out.push_str("#<native ");
            out.push_str(native.name);
            out.push('>');
        }
        Value::Function(Function::Closure(_)) => out.push_str("#<function>"),
    }
}

fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Closure, Env};
    use std::rc::Rc;

    #[test]
    fn test_atoms() {
        assert_eq!(pr_str(&Value::Nil, true), "nil");
        assert_eq!(pr_str(&Value::Bool(true), true), "true");
        assert_eq!(pr_str(&Value::Bool(false), true), "false");
        assert_eq!(pr_str(&Value::Int(-42), true), "-42");
        assert_eq!(pr_str(&Value::symbol("let*"), true), "let*");
    }

    #[test]
    fn test_nested_lists() {
        let v = Value::list(vec![
            Value::symbol("+"),
            Value::Int(1),
            Value::list(vec![Value::symbol("*"), Value::Int(2), Value::Int(3)]),
        ]);
        assert_eq!(pr_str(&v, true), "(+ 1 (* 2 3))");
        assert_eq!(pr_str(&Value::empty_list(), true), "()");
    }

    #[test]
    fn test_strings_readably_and_raw() {
        let s = Value::string("say \"hi\"\n\\");
        assert_eq!(pr_str(&s, true), r#""say \"hi\"\n\\""#);
        assert_eq!(pr_str(&s, false), "say \"hi\"\n\\");
    }

    #[test]
    fn test_closure_is_opaque() {
        let f = Value::Function(Function::Closure(Rc::new(Closure {
            params: vec!["x".into()],
            body: Value::symbol("x"),
            env: Env::root(),
        })));
        assert_eq!(pr_str(&f, true), "#<function>");
        assert_eq!(f.to_string(), "#<function>");
    }
}
