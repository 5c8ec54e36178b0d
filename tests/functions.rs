mod lox_test;
use lox_test::*;

lox_test!(functions_print_their_name
  "fun greet() {} print greet;"
  "<fn greet>"
);

lox_test!(call_with_arguments_and_return
  "fun add(a, b) { return a + b; } print add(1, 2);"
  "3"
);

lox_test!(functions_return_nil_by_default
  "fun noop() {} print noop();"
  "nil"
);

lox_test!(bare_return_yields_nil
  "fun f() { return; } print f();"
  "nil"
);

lox_test!(recursion
  "fun fib(n) { if (n < 2) return n; return fib(n - 2) + fib(n - 1); } print fib(10);"
  "55"
);

lox_test!(functions_are_values
  "fun twice(f, x) { return f(f(x)); } fun inc(n) { return n + 1; } print twice(inc, 5);"
  "7"
);

lox_test!(parameters_shadow_globals
  "var x = \"global\"; fun f(x) { print x; } f(\"param\"); print x;"
  "param"
  "global"
);

lox_test!(wrong_arity_is_reported_with_both_counts
  "fun f(a, b) { return a + b; } f(1);"
  RuntimeError "Expected 2 arguments but got 1."
);

lox_test!(calling_a_number_fails
  "var x = 1; x();"
  RuntimeError "Can only call functions and classes."
);

lox_test!(calling_a_string_fails
  "\"not a function\"();"
  RuntimeError "Can only call functions and classes."
);

lox_test!(return_at_top_level_is_rejected
  "return 1;"
  CompileError "Can't return from top-level code."
);

lox_test!(recursion_sixty_four_deep_runs
  "fun f(n) { if (n < 64) f(n + 1); } f(1); print \"ok\";"
  "ok"
);

lox_test!(recursion_sixty_five_deep_overflows
  "fun f(n) { if (n < 65) f(n + 1); } f(1);"
  RuntimeError "Stack overflow."
);

lox_test!(clock_is_a_native
  "print clock;"
  "<native>"
);

lox_test!(clock_returns_a_number
  "print clock() >= 0;"
  "true"
);

#[test]
fn arity_error_has_a_one_line_stack_trace() {
  match run("fun f(a, b) { return a + b; } f(1);") {
    RunResult::RuntimeError { message, traceback } => {
      assert_eq!(message, "Expected 2 arguments but got 1.");
      assert_eq!(traceback, vec!["[line 1] in script"]);
    }
    result => panic!("expected a runtime error, got {result:?}"),
  }
}

#[test]
fn tracebacks_list_frames_innermost_first() {
  let source = "fun a() { b(); }\nfun b() { return 1 + nil; }\na();";
  match run(source) {
    RunResult::RuntimeError { message, traceback } => {
      assert_eq!(message, "Operands must be two numbers or two strings.");
      assert_eq!(
        traceback,
        vec![
          "[line 2] in b()",
          "[line 1] in a()",
          "[line 3] in script",
        ]
      );
    }
    result => panic!("expected a runtime error, got {result:?}"),
  }
}
