use crate::value::Value;
use crate::vm::VM;

/// Defines the native functions available to every script
pub fn define_globals(vm: &mut VM) {
  vm.define_native("clock", clock);
}

/// Seconds since the interpreter started
fn clock(vm: &mut VM, _arguments: &[Value]) -> Value {
  Value::Number(vm.uptime())
}
