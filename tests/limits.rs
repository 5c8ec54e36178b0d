mod lox_test;
use lox_test::*;

use std::fmt::Write;

fn parameter_list(count: usize) -> String {
  let mut list = String::new();
  for i in 0..count {
    if i > 0 {
      list.push_str(", ");
    }
    write!(list, "p{i}").unwrap();
  }
  list
}

#[test]
fn two_hundred_and_fifty_five_parameters_compile() {
  let source = format!("fun f({}) {{}} print \"ok\";", parameter_list(255));
  assert_eq!(run(&source), RunResult::Success(vec!["ok".to_string()]));
}

#[test]
fn two_hundred_and_fifty_six_parameters_fail() {
  let source = format!("fun f({}) {{}}", parameter_list(256));
  match run(&source) {
    RunResult::CompileError(messages) => {
      assert!(
        messages
          .iter()
          .any(|message| message.contains("Can't have more than 255 parameters.")),
        "got {messages:?}"
      );
    }
    result => panic!("expected a compile error, got {result:?}"),
  }
}

#[test]
fn two_hundred_and_fifty_six_arguments_fail() {
  let mut arguments = String::new();
  for i in 0..256 {
    if i > 0 {
      arguments.push_str(", ");
    }
    write!(arguments, "{i}").unwrap();
  }
  let source = format!("fun f() {{}} f({arguments});");

  match run(&source) {
    RunResult::CompileError(messages) => {
      assert!(
        messages
          .iter()
          .any(|message| message.contains("Can't have more than 255 arguments.")),
        "got {messages:?}"
      );
    }
    result => panic!("expected a compile error, got {result:?}"),
  }
}

#[test]
fn two_hundred_and_fifty_five_locals_compile() {
  let mut body = String::new();
  for i in 0..255 {
    write!(body, "var l{i} = {i}; ").unwrap();
  }
  let source = format!("fun f() {{ {body} }} f(); print \"ok\";");

  assert_eq!(run(&source), RunResult::Success(vec!["ok".to_string()]));
}

#[test]
fn two_hundred_and_fifty_six_locals_fail() {
  let mut body = String::new();
  for i in 0..256 {
    write!(body, "var l{i} = {i}; ").unwrap();
  }
  let source = format!("fun f() {{ {body} }}");

  match run(&source) {
    RunResult::CompileError(messages) => {
      assert!(
        messages
          .iter()
          .any(|message| message.contains("Too many local variables in function.")),
        "got {messages:?}"
      );
    }
    result => panic!("expected a compile error, got {result:?}"),
  }
}

#[test]
fn two_hundred_and_fifty_six_constants_compile() {
  let mut source = String::new();
  for i in 0..256 {
    writeln!(source, "print {i};").unwrap();
  }

  match run(&source) {
    RunResult::Success(output) => assert_eq!(output.len(), 256),
    result => panic!("expected success, got {result:?}"),
  }
}

#[test]
fn two_hundred_and_fifty_seven_constants_fail() {
  let mut source = String::new();
  for i in 0..257 {
    writeln!(source, "print {i};").unwrap();
  }

  match run(&source) {
    RunResult::CompileError(messages) => {
      assert!(
        messages
          .iter()
          .any(|message| message.contains("Too many constants in one chunk.")),
        "got {messages:?}"
      );
    }
    result => panic!("expected a compile error, got {result:?}"),
  }
}

// a `0;` statement compiles to three bytes, and an else-less if's jump spans
// the then branch plus six bytes of scaffolding
#[test]
fn jump_of_exactly_the_maximum_width_compiles() {
  let source = format!("if (true) {{ {} }} print \"ok\";", "0; ".repeat(21843));
  assert_eq!(run(&source), RunResult::Success(vec!["ok".to_string()]));
}

#[test]
fn jump_beyond_the_maximum_width_fails() {
  let source = format!("if (true) {{ {} }}", "0; ".repeat(21844));
  match run(&source) {
    RunResult::CompileError(messages) => {
      assert!(
        messages
          .iter()
          .any(|message| message.contains("Too much code to jump over.")),
        "got {messages:?}"
      );
    }
    result => panic!("expected a compile error, got {result:?}"),
  }
}
