use crate::builtins;
use crate::vm::VM;

/// The environment a VM runs in: it owns the print sink and decides which
/// native functions are defined when the VM starts.
pub trait Context {
  fn define_globals(&self, vm: &mut VM);

  /// Writes one printed value, followed by a newline
  fn print(&self, message: &str);
}

/// The standard environment: builtins defined, printing to stdout
pub struct StdContext;
impl Context for StdContext {
  fn define_globals(&self, vm: &mut VM) {
    builtins::define_globals(vm);
  }

  fn print(&self, message: &str) {
    println!("{message}");
  }
}

/// An environment with no builtins which swallows printed output
pub struct Empty;
impl Context for Empty {
  fn define_globals(&self, _: &mut VM) {}
  fn print(&self, _: &str) {}
}
