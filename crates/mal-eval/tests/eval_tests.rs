//! Evaluator tests.
//!
//! Tests verify:
//! - Self-evaluation of atoms and the empty list
//! - Environment shadowing and `def!` scoping
//! - Special forms: `def!`, `let*`, `if`, `do`, `fn*`
//! - Tail calls in constant stack space
//! - Closures: arity, lexical capture
//! - Builtins through application, including `prn` output order
//! - Error reporting and recovery between top-level calls
//! - Determinism (100-iteration)

use mal_eval::{EvalConfig, Interpreter, ReplError};
use mal_types::{EvalError, Value};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// In-memory output sink shared with the test.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn interp() -> Interpreter {
    Interpreter::with_output(EvalConfig::default(), io::sink())
}

fn interp_with_output() -> (Interpreter, SharedBuffer) {
    let out = SharedBuffer::default();
    (
        Interpreter::with_output(EvalConfig::default(), out.clone()),
        out,
    )
}

/// Evaluate each line in order and return the value of the last one.
fn run(interp: &mut Interpreter, lines: &[&str]) -> Value {
    let mut last = Value::Nil;
    for line in lines {
        last = interp
            .eval_str(line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
    }
    last
}

fn eval(source: &str) -> Value {
    run(&mut interp(), &[source])
}

/// Evaluate and return the printed form.
fn rep(source: &str) -> String {
    interp()
        .rep(source)
        .unwrap_or_else(|e| panic!("{source}: {e}"))
}

fn eval_err(source: &str) -> EvalError {
    match interp().eval_str(source) {
        Err(ReplError::Eval(err)) => err,
        Err(ReplError::Read(err)) => panic!("{source}: unexpected read error {err}"),
        Ok(value) => panic!("{source}: expected an error, got {value}"),
    }
}

fn int(n: i64) -> Value {
    Value::Int(n)
}

fn ints(ns: &[i64]) -> Value {
    Value::list(ns.iter().copied().map(Value::Int).collect())
}

// ══════════════════════════════════════════════════════════════════════════════
// Self-evaluation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn atoms_evaluate_to_themselves() {
    assert_eq!(eval("7"), int(7));
    assert_eq!(eval("-3"), int(-3));
    assert_eq!(eval("nil"), Value::Nil);
    assert_eq!(eval("true"), Value::Bool(true));
    assert_eq!(eval("false"), Value::Bool(false));
    assert_eq!(eval("\"text\""), Value::string("text"));
}

#[test]
fn empty_list_evaluates_to_itself() {
    assert_eq!(eval("()"), Value::empty_list());
}

#[test]
fn functions_print_as_placeholders() {
    assert_eq!(rep("+"), "#<native +>");
    assert_eq!(rep("(fn* (a) a)"), "#<function>");
}

// ══════════════════════════════════════════════════════════════════════════════
// Environments
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn unbound_symbol_is_an_error() {
    assert_eq!(eval_err("abc"), EvalError::UnboundSymbol("abc".into()));
}

#[test]
fn def_returns_and_binds_the_value() {
    let mut i = interp();
    assert_eq!(run(&mut i, &["(def! x (+ 1 2))"]), int(3));
    assert_eq!(run(&mut i, &["x"]), int(3));
}

#[test]
fn let_shadows_without_touching_root() {
    let mut i = interp();
    assert_eq!(run(&mut i, &["(def! x 1)", "(let* (x 2) x)"]), int(2));
    assert_eq!(run(&mut i, &["x"]), int(1));
}

#[test]
fn def_inside_let_stays_in_the_child() {
    let mut i = interp();
    assert_eq!(run(&mut i, &["(let* (y 1) (def! z 5))"]), int(5));
    assert_eq!(
        i.eval_str("z"),
        Err(ReplError::Eval(EvalError::UnboundSymbol("z".into())))
    );
}

#[test]
fn let_bindings_are_sequential() {
    assert_eq!(eval("(let* (a 1 b (+ a 1)) b)"), int(2));
}

#[test]
fn closure_body_sees_later_root_definitions() {
    let mut i = interp();
    run(&mut i, &["(def! f (fn* () later))", "(def! later 9)"]);
    assert_eq!(run(&mut i, &["(f)"]), int(9));
}

// ══════════════════════════════════════════════════════════════════════════════
// Conditionals and truthiness
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn zero_is_truthy() {
    assert_eq!(eval("(if 0 \"a\" \"b\")"), Value::string("a"));
}

#[test]
fn nil_and_false_are_falsy() {
    assert_eq!(eval("(if nil \"a\" \"b\")"), Value::string("b"));
    assert_eq!(eval("(if false 1 2)"), int(2));
}

#[test]
fn empty_list_is_truthy() {
    assert_eq!(eval("(if () 1 2)"), int(1));
}

#[test]
fn if_without_else_yields_nil() {
    assert_eq!(eval("(if false 1)"), Value::Nil);
    assert_eq!(eval("(if true 1)"), int(1));
}

#[test]
fn if_evaluates_only_the_chosen_branch() {
    let (mut i, out) = interp_with_output();
    run(&mut i, &["(if true (prn 1) (prn 2))"]);
    assert_eq!(out.contents(), "1\n");
}

#[test]
fn not_is_defined_by_the_prelude() {
    assert_eq!(eval("(not nil)"), Value::Bool(true));
    assert_eq!(eval("(not false)"), Value::Bool(true));
    assert_eq!(eval("(not 0)"), Value::Bool(false));
    assert_eq!(eval("(not (list))"), Value::Bool(false));
}

// ══════════════════════════════════════════════════════════════════════════════
// do
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn do_runs_side_effects_in_order() {
    let (mut i, out) = interp_with_output();
    assert_eq!(run(&mut i, &["(do (prn \"a\") (prn \"b\") 3)"]), int(3));
    assert_eq!(out.contents(), "\"a\"\n\"b\"\n");
}

#[test]
fn empty_do_is_nil() {
    assert_eq!(eval("(do)"), Value::Nil);
}

#[test]
fn prn_returns_nil() {
    let (mut i, out) = interp_with_output();
    assert_eq!(run(&mut i, &["(prn (list 1 \"x\" nil))"]), Value::Nil);
    assert_eq!(out.contents(), "(1 \"x\" nil)\n");
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn closure_application() {
    assert_eq!(eval("((fn* (a b) (+ a b)) 2 3)"), int(5));
    assert_eq!(eval("((fn* () 4))"), int(4));
}

#[test]
fn closure_arity_is_exact() {
    assert_eq!(
        eval_err("((fn* (a) a) 1 2)"),
        EvalError::arity("#<function>", "1", 2)
    );
}

#[test]
fn captured_environment_outlives_its_call() {
    let mut i = interp();
    run(
        &mut i,
        &[
            "(def! make-adder (fn* (x) (fn* (y) (+ x y))))",
            "(def! add5 (make-adder 5))",
            "(def! add7 (make-adder 7))",
        ],
    );
    assert_eq!(run(&mut i, &["(add5 3)"]), int(8));
    assert_eq!(run(&mut i, &["(add7 3)"]), int(10));
}

#[test]
fn returned_closure_called_immediately() {
    assert_eq!(eval("(((fn* (x) (fn* () x)) 5))"), int(5));
}

#[test]
fn closures_use_defining_scope_not_caller_scope() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! x 1)", "(def! get-x (fn* () x))"],
    );
    assert_eq!(run(&mut i, &["(let* (x 2) (get-x))"]), int(1));
}

#[test]
fn parameters_shadow_outer_bindings() {
    let mut i = interp();
    run(&mut i, &["(def! a 100)", "(def! f (fn* (a) (* a 2)))"]);
    assert_eq!(run(&mut i, &["(f 4)"]), int(8));
    assert_eq!(run(&mut i, &["a"]), int(100));
}

#[test]
fn functions_are_values() {
    let mut i = interp();
    run(&mut i, &["(def! twice (fn* (f x) (f (f x))))"]);
    assert_eq!(run(&mut i, &["(twice (fn* (n) (* n 3)) 2)"]), int(18));
    assert_eq!(run(&mut i, &["(twice not true)"]), Value::Bool(true));
}

#[test]
fn recursion() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! fib (fn* (n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))))"],
    );
    assert_eq!(run(&mut i, &["(fib 15)"]), int(610));
}

// ══════════════════════════════════════════════════════════════════════════════
// Tail calls
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn tail_recursive_loop_runs_in_constant_stack() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! loop (fn* (n acc) (if (= n 0) acc (loop (- n 1) (+ acc 1)))))"],
    );
    assert_eq!(run(&mut i, &["(loop 100000 0)"]), int(100000));
}

#[test]
fn single_argument_countdown_loop() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! loop (fn* (n) (if (= n 0) 0 (loop (- n 1)))))"],
    );
    assert_eq!(run(&mut i, &["(loop 100000)"]), int(0));
}

#[test]
fn tail_position_inside_do_and_let() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! count-down (fn* (n) (do (if (= n 0) 0 (let* (m (- n 1)) (count-down m))))))"],
    );
    assert_eq!(run(&mut i, &["(count-down 50000)"]), int(0));
}

#[test]
fn mutual_tail_recursion() {
    let mut i = interp();
    run(
        &mut i,
        &[
            "(def! even? (fn* (n) (if (= n 0) true (odd? (- n 1)))))",
            "(def! odd? (fn* (n) (if (= n 0) false (even? (- n 1)))))",
        ],
    );
    assert_eq!(run(&mut i, &["(even? 20001)"]), Value::Bool(false));
}

#[test]
fn deep_non_tail_recursion_hits_the_limit() {
    let mut i = Interpreter::with_output(EvalConfig { max_depth: 64 }, io::sink());
    run(
        &mut i,
        &["(def! sum (fn* (n) (if (= n 0) 0 (+ n (sum (- n 1))))))"],
    );
    assert_eq!(
        i.eval_str("(sum 1000)"),
        Err(ReplError::Eval(EvalError::RecursionLimit(64)))
    );
    // Shallow calls still work afterwards.
    assert_eq!(run(&mut i, &["(sum 10)"]), int(55));
}

#[test]
fn default_depth_limit_trips_before_the_host_stack() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! sum (fn* (n) (if (= n 0) 0 (+ n (sum (- n 1))))))"],
    );
    assert_eq!(
        i.eval_str("(sum 100000)"),
        Err(ReplError::Eval(EvalError::RecursionLimit(512)))
    );
    assert_eq!(run(&mut i, &["(sum 100)"]), int(5050));
}

#[test]
fn tail_loop_cannot_nest_lists_past_the_limit() {
    let mut i = interp();
    run(
        &mut i,
        &["(def! nest (fn* (n acc) (if (= n 0) acc (nest (- n 1) (list acc)))))"],
    );
    assert_eq!(
        i.eval_str("(count (nest 200000 nil))"),
        Err(ReplError::Eval(EvalError::NestingLimit(512)))
    );
    // Up to the limit the value is usable, and the session goes on.
    assert_eq!(run(&mut i, &["(count (nest 512 nil))"]), int(1));
    assert_eq!(
        run(&mut i, &["(= (nest 300 nil) (nest 300 nil))"]),
        Value::Bool(true)
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Builtins
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(eval("(+ 1 (* 2 3))"), int(7));
    assert_eq!(eval("(- 10 (/ 9 3))"), int(7));
    assert_eq!(eval("(< 1 2)"), Value::Bool(true));
    assert_eq!(eval("(<= 2 2)"), Value::Bool(true));
    assert_eq!(eval("(> 1 2)"), Value::Bool(false));
    assert_eq!(eval("(>= 1 2)"), Value::Bool(false));
}

#[test]
fn list_builtins() {
    assert_eq!(eval("(list 1 2 3)"), ints(&[1, 2, 3]));
    assert_eq!(eval("(list? (list))"), Value::Bool(true));
    assert_eq!(eval("(list? 1)"), Value::Bool(false));
    assert_eq!(eval("(empty? (list))"), Value::Bool(true));
    assert_eq!(eval("(count (list 1 2))"), int(2));
    assert_eq!(eval("(count nil)"), int(0));
}

#[test]
fn equality_is_structural() {
    assert_eq!(eval("(= (list 1 2) (list 1 2))"), Value::Bool(true));
    assert_eq!(eval("(= (list 1 2) (list 1 2 3))"), Value::Bool(false));
    assert_eq!(eval("(= (list (list 1)) (list (list 1)))"), Value::Bool(true));
    assert_eq!(eval("(= 1 true)"), Value::Bool(false));
    assert_eq!(eval("(= 1 \"1\")"), Value::Bool(false));
    assert_eq!(eval("(= nil false)"), Value::Bool(false));
    assert_eq!(eval("(= \"a\" \"a\")"), Value::Bool(true));
}

#[test]
fn arguments_are_evaluated_left_to_right() {
    let (mut i, out) = interp_with_output();
    run(&mut i, &["(list (prn 1) (prn 2) (prn 3))"]);
    assert_eq!(out.contents(), "1\n2\n3\n");
}

#[test]
fn builtins_can_be_shadowed() {
    let mut i = interp();
    assert_eq!(run(&mut i, &["(let* (+ -) (+ 5 3))"]), int(2));
    assert_eq!(run(&mut i, &["(+ 5 3)"]), int(8));
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn division_by_zero() {
    assert_eq!(
        eval_err("(/ 1 0)"),
        EvalError::Arithmetic("division by zero".into())
    );
}

#[test]
fn integer_overflow() {
    assert_eq!(
        eval_err("(* 9223372036854775807 2)"),
        EvalError::Arithmetic("integer overflow".into())
    );
}

#[test]
fn type_errors() {
    assert_eq!(
        eval_err("(+ 1 \"2\")"),
        EvalError::type_error("+", "integer", "string")
    );
    assert_eq!(
        eval_err("(count 5)"),
        EvalError::type_error("count", "list or nil", "integer")
    );
}

#[test]
fn native_arity() {
    assert_eq!(eval_err("(+ 1)"), EvalError::arity("+", "2", 1));
    assert_eq!(eval_err("(prn)"), EvalError::arity("prn", "1", 0));
}

#[test]
fn not_callable() {
    assert_eq!(eval_err("(1 2)"), EvalError::NotCallable("integer".into()));
    assert_eq!(
        eval_err("(\"f\" 2)"),
        EvalError::NotCallable("string".into())
    );
}

#[test]
fn special_form_arity() {
    assert_eq!(eval_err("(def! x)"), EvalError::arity("def!", "2", 1));
    assert_eq!(eval_err("(let* (a 1))"), EvalError::arity("let*", "2", 1));
    assert_eq!(eval_err("(if true)"), EvalError::arity("if", "2 or 3", 1));
    assert_eq!(eval_err("(if 1 2 3 4)"), EvalError::arity("if", "2 or 3", 4));
    assert_eq!(eval_err("(fn* (a))"), EvalError::arity("fn*", "2", 1));
}

#[test]
fn malformed_special_forms() {
    assert_eq!(
        eval_err("(let* (a 1 b) a)"),
        EvalError::malformed("let*", "odd number of binding forms")
    );
    assert_eq!(
        eval_err("(let* (1 2) 3)"),
        EvalError::malformed("let*", "binding name must be a symbol, got integer")
    );
    assert_eq!(
        eval_err("(let* x 1)"),
        EvalError::malformed("let*", "bindings must be a list, got symbol")
    );
    assert_eq!(
        eval_err("(def! 1 2)"),
        EvalError::malformed("def!", "name must be a symbol, got integer")
    );
    assert_eq!(
        eval_err("(fn* (a a) a)"),
        EvalError::malformed("fn*", "duplicate parameter 'a'")
    );
    assert_eq!(
        eval_err("(fn* (a 1) a)"),
        EvalError::malformed("fn*", "parameter must be a symbol, got integer")
    );
    assert_eq!(
        eval_err("(fn* a a)"),
        EvalError::malformed("fn*", "parameters must be a list, got symbol")
    );
}

#[test]
fn failed_def_binds_nothing() {
    let mut i = interp();
    assert!(i.eval_str("(def! x (/ 1 0))").is_err());
    assert_eq!(
        i.eval_str("x"),
        Err(ReplError::Eval(EvalError::UnboundSymbol("x".into())))
    );
}

#[test]
fn errors_do_not_poison_the_session() {
    let mut i = interp();
    run(&mut i, &["(def! kept 1)"]);
    assert!(i.eval_str("(undefined-fn 1)").is_err());
    assert!(i.eval_str("(+ 1").is_err());
    assert!(i.eval_str(")").is_err());
    assert_eq!(run(&mut i, &["(+ kept 1)"]), int(2));
}

#[test]
fn read_errors_are_reported_as_read_errors() {
    assert!(matches!(interp().eval_str("(+ 1"), Err(ReplError::Read(_))));
    assert!(matches!(interp().eval_str(""), Err(ReplError::Read(_))));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn evaluation_is_deterministic() {
    let program = [
        "(def! fact (fn* (n acc) (if (<= n 1) acc (fact (- n 1) (* n acc)))))",
        "(list (fact 10 1) (let* (a 2 b (* a a)) (list a b)) (not nil))",
    ];
    let first = run(&mut interp(), &program);
    for iteration in 0..100 {
        let again = run(&mut interp(), &program);
        assert_eq!(first, again, "determinism failure at iteration {iteration}");
    }
    assert_eq!(first.to_string(), "(3628800 (2 4) true)");
}
