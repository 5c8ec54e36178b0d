use lox::{compile, Context, VM};
use std::cell::RefCell;

#[derive(Debug, PartialEq)]
pub enum RunResult {
  Success(Vec<String>),
  CompileError(Vec<String>),
  RuntimeError {
    message: String,
    traceback: Vec<String>,
  },
}

#[derive(Default)]
struct TestContext {
  output: RefCell<Vec<String>>,
}
impl Context for TestContext {
  fn define_globals(&self, vm: &mut VM) {
    lox::define_globals(vm);
  }

  fn print(&self, message: &str) {
    self.output.borrow_mut().push(message.to_string());
  }
}

pub fn run(source: &str) -> RunResult {
  let function = match compile(source) {
    Ok(function) => function,
    Err(diagnostics) => {
      let messages = diagnostics.iter().map(ToString::to_string).collect();
      return RunResult::CompileError(messages);
    }
  };

  let context = TestContext::default();
  let result = {
    let mut vm = VM::new(&context);
    vm.run(&function)
  };

  match result {
    Ok(()) => RunResult::Success(context.output.into_inner()),
    Err(error) => RunResult::RuntimeError {
      message: error.message.clone(),
      traceback: error.trace_lines(),
    },
  }
}

#[macro_export]
macro_rules! lox_test {
  ($name:ident $code:literal CompileError) => {
    #[test]
    fn $name() {
      let result = run($code);
      assert!(
        matches!(result, RunResult::CompileError(_)),
        "expected a compile error, got {result:?}"
      );
    }
  };

  ($name:ident $code:literal CompileError $message:literal) => {
    #[test]
    fn $name() {
      match run($code) {
        RunResult::CompileError(messages) => {
          assert!(
            messages.iter().any(|found| found.contains($message)),
            "expected a diagnostic containing {:?}, got {messages:?}",
            $message,
          );
        }
        result => panic!("expected a compile error, got {result:?}"),
      }
    }
  };

  ($name:ident $code:literal RuntimeError $message:literal) => {
    #[test]
    fn $name() {
      match run($code) {
        RunResult::RuntimeError { message, .. } => assert_eq!(message, $message),
        result => panic!("expected a runtime error, got {result:?}"),
      }
    }
  };

  ($name:ident $code:literal $( $expected:literal )*) => {
    #[test]
    fn $name() {
      let expected: Vec<String> = vec![$($expected.to_string()),*];
      match run($code) {
        RunResult::Success(output) => assert_eq!(output, expected),
        result => panic!("expected {expected:?}, got {result:?}"),
      }
    }
  };
}
