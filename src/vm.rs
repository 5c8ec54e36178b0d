use crate::chunk::{ConstantValue, OpCode};
use crate::context::Context;
use crate::gc::{Handle, Heap};
use crate::object::{
  BoundMethod, Class, Closure, Function, GcString, Instance, NativeFn, NativeFunction, Object,
  Upvalue,
};
use crate::scanner::LineNumber;
use crate::table::{hash_str, StringKey, Table};
use crate::value::Value;

use smartstring::alias::String as SmartString;
use std::rc::Rc;
use std::time::Instant;
use std::{error, fmt};

pub const FRAMES_MAX: usize = 64;
pub const STACK_MAX: usize = FRAMES_MAX * 256;

struct CallFrame {
  closure: Handle,
  ip: usize,
  offset: usize,
}

macro_rules! numeric_expression {
  ($vm:expr, $token:tt) => {
    let (right, left) = ($vm.pop(), $vm.pop());

    match (left, right) {
      (Value::Number(left), Value::Number(right)) => {
        $vm.push(Value::Number(left $token right));
      }
      _ => break Some("Operands must be numbers.".to_string()),
    }
  };
}

macro_rules! comparison_expression {
  ($vm:expr, $token:tt) => {
    let (right, left) = ($vm.pop(), $vm.pop());

    match (left, right) {
      (Value::Number(left), Value::Number(right)) => {
        $vm.push(Value::Boolean(left $token right));
      }
      _ => break Some("Operands must be numbers.".to_string()),
    }
  };
}

/// Pushes a call frame for a closure, re-pointing the cached dispatch state
/// at the callee's chunk. Slot 0 of the new frame aliases the callee itself,
/// or the receiver for a method call.
macro_rules! begin_call {
  ($vm:expr, $closure:ident, $function:ident, $ip:ident, $offset:ident,
   $callee:expr, $argument_count:expr, $return_ip:expr) => {{
    let callee: Handle = $callee;
    let callee_function = match &$vm.heap[callee] {
      Object::Closure(closure) => closure.function.clone(),
      _ => unreachable!("callee must be a closure"),
    };

    if usize::from(callee_function.arity) != $argument_count {
      break Some(format!(
        "Expected {} arguments but got {}.",
        callee_function.arity, $argument_count
      ));
    }
    if $vm.frames.len() >= FRAMES_MAX {
      break Some("Stack overflow.".to_string());
    }

    $vm.frames.push(CallFrame {
      closure: $closure,
      ip: $return_ip,
      offset: $offset,
    });
    $closure = callee;
    $function = callee_function;
    $offset = $vm.stack.len() - $argument_count - 1;
    $ip = 0;
  }};
}

/// Calls any callable value: closure, native, class, or bound method
macro_rules! call_value {
  ($vm:expr, $closure:ident, $function:ident, $ip:ident, $offset:ident,
   $callee:expr, $argument_count:expr, $return_ip:expr) => {{
    let argument_count: usize = $argument_count;

    match $callee {
      Value::Object(handle) => match &$vm.heap[handle] {
        Object::Closure(_) => {
          begin_call!($vm, $closure, $function, $ip, $offset, handle, argument_count, $return_ip);
        }
        Object::Native(native) => {
          let native_function = native.function;
          let start_of_args = $vm.stack.len() - argument_count;
          let arguments: Vec<Value> = $vm.stack.split_off(start_of_args);

          let result = native_function($vm, &arguments);
          $vm.pop();
          $vm.push(result);
          $ip = $return_ip;
        }
        Object::BoundMethod(bound) => {
          let receiver = bound.receiver;
          let method = bound.method;
          let slot = $vm.stack.len() - argument_count - 1;
          $vm.stack[slot] = receiver;
          begin_call!($vm, $closure, $function, $ip, $offset, method, argument_count, $return_ip);
        }
        Object::Class(_) => {
          let instance = $vm.heap.allocate(Object::Instance(Instance {
            class: handle,
            fields: Table::new(),
          }));
          let slot = $vm.stack.len() - argument_count - 1;
          $vm.stack[slot] = Value::Object(instance);

          let init_key = $vm.string_key($vm.init_string);
          let initializer = match &$vm.heap[handle] {
            Object::Class(class) => class.methods.get(init_key),
            _ => unreachable!(),
          };

          match initializer {
            Some(Value::Object(init)) => {
              begin_call!($vm, $closure, $function, $ip, $offset, init, argument_count, $return_ip);
            }
            Some(_) => unreachable!("methods are closures"),
            None if argument_count != 0 => {
              break Some(format!("Expected 0 arguments but got {argument_count}."));
            }
            None => $ip = $return_ip,
          }
        }
        _ => break Some("Can only call functions and classes.".to_string()),
      },
      _ => break Some("Can only call functions and classes.".to_string()),
    }
  }};
}

/// A virtual machine executing compiled bytecode.
///
/// Owns the value stack, call frames, global environment, interned strings,
/// the open-upvalue list, and the garbage-collected heap.
pub struct VM<'context> {
  stack: Vec<Value>,
  frames: Vec<CallFrame>,
  globals: Table,
  strings: Table,
  // open upvalues, sorted by descending stack slot
  open_upvalues: Vec<Handle>,
  pub(crate) heap: Heap,
  init_string: Handle,
  start: Instant,
  context: &'context dyn Context,
}

impl<'context> VM<'context> {
  pub fn new(context: &'context dyn Context) -> Self {
    let mut heap = Heap::new();
    let mut strings = Table::new();

    let hash = hash_str("init");
    let init_string = heap.allocate(Object::String(GcString {
      chars: "init".into(),
      hash,
    }));
    strings.insert(
      StringKey {
        string: init_string,
        hash,
      },
      Value::Nil,
    );

    let mut vm = Self {
      stack: Vec::with_capacity(STACK_MAX / 64),
      frames: Vec::with_capacity(FRAMES_MAX),
      globals: Table::new(),
      strings,
      open_upvalues: Vec::new(),
      heap,
      init_string,
      start: Instant::now(),
      context,
    };
    context.define_globals(&mut vm);
    vm
  }

  /// Interns a string, returning the handle every equal string shares
  pub(crate) fn intern(&mut self, chars: &str) -> Handle {
    let hash = hash_str(chars);
    if let Some(existing) = self.strings.find_string(&self.heap, chars, hash) {
      return existing;
    }

    let handle = self.heap.allocate(Object::String(GcString {
      chars: chars.into(),
      hash,
    }));
    self.strings.insert(StringKey { string: handle, hash }, Value::Nil);
    handle
  }

  fn string_key(&self, string: Handle) -> StringKey {
    StringKey {
      string,
      hash: self.heap[string].as_string().hash,
    }
  }

  /// Reads a name from the constant pool and interns it for table lookups
  fn constant_key(&mut self, function: &Function, position: usize) -> StringKey {
    let constant_position = function.chunk.get_value(position);
    match function.chunk.get_constant(usize::from(constant_position)) {
      ConstantValue::String(name) => {
        let handle = self.intern(name.as_str());
        self.string_key(handle)
      }
      _ => unreachable!("name constants are strings"),
    }
  }

  pub fn define_native(&mut self, name: &'static str, function: NativeFn) {
    let native = self.heap.allocate(Object::Native(NativeFunction { name, function }));
    let string = self.intern(name);
    let key = self.string_key(string);
    self.globals.insert(key, Value::Object(native));
  }

  /// Looks up a global by name; handy for the REPL and for tests
  pub fn get_global(&self, name: &str) -> Option<Value> {
    let hash = hash_str(name);
    let string = self.strings.find_string(&self.heap, name, hash)?;
    self.globals.get(StringKey { string, hash })
  }

  pub fn display(&self, value: Value) -> String {
    value.display(&self.heap)
  }

  pub(crate) fn uptime(&self) -> f64 {
    self.start.elapsed().as_secs_f64()
  }

  #[inline]
  fn pop(&mut self) -> Value {
    self.stack.pop().unwrap()
  }

  #[inline]
  fn push(&mut self, value: Value) {
    self.stack.push(value);
  }

  #[inline]
  fn peek(&self, distance: usize) -> Value {
    self.stack[self.stack.len() - 1 - distance]
  }

  /// Finds or creates the open upvalue for a stack slot, keeping the list
  /// sorted by descending slot so entries for the same slot are shared
  fn capture_upvalue(&mut self, slot: usize) -> Handle {
    let mut index = 0;
    while index < self.open_upvalues.len() {
      let handle = self.open_upvalues[index];
      match self.heap[handle] {
        Object::Upvalue(Upvalue::Open(open_slot)) => {
          if open_slot == slot {
            return handle;
          }
          if open_slot < slot {
            break;
          }
        }
        _ => unreachable!("open upvalue list holds open upvalues"),
      }
      index += 1;
    }

    let upvalue = self.heap.allocate(Object::Upvalue(Upvalue::Open(slot)));
    self.open_upvalues.insert(index, upvalue);
    upvalue
  }

  /// Closes every open upvalue at or above `from_slot`: the captured value
  /// moves off the stack and into the upvalue itself
  fn close_upvalues(&mut self, from_slot: usize) {
    while let Some(&handle) = self.open_upvalues.first() {
      let slot = match self.heap[handle] {
        Object::Upvalue(Upvalue::Open(slot)) => slot,
        _ => unreachable!("open upvalue list holds open upvalues"),
      };
      if slot < from_slot {
        break;
      }

      let value = self.stack[slot];
      self.heap[handle] = Object::Upvalue(Upvalue::Closed(value));
      self.open_upvalues.remove(0);
    }
  }

  fn garbage_collect(&mut self, current_closure: Handle) {
    self.heap.mark(current_closure);
    for value in &self.stack {
      self.heap.mark_value(*value);
    }
    for frame in &self.frames {
      self.heap.mark(frame.closure);
    }
    for &upvalue in &self.open_upvalues {
      self.heap.mark(upvalue);
    }
    for (key, value) in self.globals.iter() {
      self.heap.mark(key.string);
      self.heap.mark_value(value);
    }
    self.heap.mark(self.init_string);

    self.heap.trace();
    self.strings.remove_white(&self.heap);
    self.heap.sweep();
  }

  /// Runs a compiled script in this VM.
  ///
  /// # Errors
  /// Returns a runtime error, carrying a traceback of the active frames,
  /// if execution aborts. The stack is reset afterwards so the VM can be
  /// reused.
  #[allow(clippy::too_many_lines)]
  pub fn run(&mut self, script: &Rc<Function>) -> Result<(), RuntimeError> {
    let script_closure = self.heap.allocate(Object::Closure(Closure::new(script.clone())));
    self.push(Value::Object(script_closure));

    let mut closure = script_closure;
    let mut function = script.clone();
    let mut ip: usize = 0;
    let mut offset: usize = 0;

    let error = loop {
      let instruction = match function.chunk.get(ip) {
        Some(instruction) => instruction,
        None => break Some("Unknown OpCode".to_string()),
      };

      match instruction {
        OpCode::Constant => {
          let constant_position = function.chunk.get_value(ip + 1);
          let value = match function.chunk.get_constant(usize::from(constant_position)) {
            ConstantValue::Number(number) => Value::Number(*number),
            ConstantValue::String(string) => Value::Object(self.intern(string.as_str())),
            ConstantValue::Function(_) => unreachable!("function constants are loaded by Closure"),
          };
          self.push(value);
          ip += 2;
        }
        OpCode::Nil => {
          self.push(Value::Nil);
          ip += 1;
        }
        OpCode::True => {
          self.push(Value::Boolean(true));
          ip += 1;
        }
        OpCode::False => {
          self.push(Value::Boolean(false));
          ip += 1;
        }
        OpCode::Pop => {
          self.pop();
          ip += 1;
        }

        OpCode::GetLocal => {
          let slot = usize::from(function.chunk.get_value(ip + 1));
          self.push(self.stack[offset + slot]);
          ip += 2;
        }
        OpCode::SetLocal => {
          let slot = usize::from(function.chunk.get_value(ip + 1));
          self.stack[offset + slot] = self.peek(0);
          ip += 2;
        }
        OpCode::GetGlobal => {
          let key = self.constant_key(&function, ip + 1);
          match self.globals.get(key) {
            Some(value) => self.push(value),
            None => {
              break Some(format!(
                "Undefined variable '{}'.",
                self.heap[key.string].as_string().chars
              ));
            }
          }
          ip += 2;
        }
        OpCode::DefineGlobal => {
          let key = self.constant_key(&function, ip + 1);
          let value = self.pop();
          self.globals.insert(key, value);
          ip += 2;
        }
        OpCode::SetGlobal => {
          let key = self.constant_key(&function, ip + 1);
          let value = self.peek(0);
          if self.globals.insert(key, value) {
            self.globals.remove(key);
            break Some(format!(
              "Undefined variable '{}'.",
              self.heap[key.string].as_string().chars
            ));
          }
          ip += 2;
        }

        OpCode::GetUpvalue => {
          let slot = usize::from(function.chunk.get_value(ip + 1));
          let upvalue = match &self.heap[closure] {
            Object::Closure(closure) => closure.upvalues[slot],
            _ => unreachable!("current frame holds a closure"),
          };
          let value = match self.heap[upvalue] {
            Object::Upvalue(Upvalue::Open(stack_slot)) => self.stack[stack_slot],
            Object::Upvalue(Upvalue::Closed(value)) => value,
            _ => unreachable!("captured variables are upvalues"),
          };
          self.push(value);
          ip += 2;
        }
        OpCode::SetUpvalue => {
          let slot = usize::from(function.chunk.get_value(ip + 1));
          let upvalue = match &self.heap[closure] {
            Object::Closure(closure) => closure.upvalues[slot],
            _ => unreachable!("current frame holds a closure"),
          };
          let value = self.peek(0);
          let state = match self.heap[upvalue] {
            Object::Upvalue(state) => state,
            _ => unreachable!("captured variables are upvalues"),
          };
          match state {
            Upvalue::Open(stack_slot) => self.stack[stack_slot] = value,
            Upvalue::Closed(_) => self.heap[upvalue] = Object::Upvalue(Upvalue::Closed(value)),
          }
          ip += 2;
        }

        OpCode::GetProperty => {
          let key = self.constant_key(&function, ip + 1);
          let receiver = self.peek(0);
          let handle = match receiver {
            Value::Object(handle) => handle,
            _ => break Some("Only instances have properties.".to_string()),
          };
          let (class, field) = match &self.heap[handle] {
            Object::Instance(instance) => (instance.class, instance.fields.get(key)),
            _ => break Some("Only instances have properties.".to_string()),
          };

          if let Some(value) = field {
            self.pop();
            self.push(value);
          } else {
            let method = match &self.heap[class] {
              Object::Class(class) => class.methods.get(key),
              _ => unreachable!("instances belong to classes"),
            };
            match method {
              Some(Value::Object(method)) => {
                let bound = self
                  .heap
                  .allocate(Object::BoundMethod(BoundMethod { receiver, method }));
                self.pop();
                self.push(Value::Object(bound));
              }
              Some(_) => unreachable!("methods are closures"),
              None => {
                break Some(format!(
                  "Undefined property '{}'.",
                  self.heap[key.string].as_string().chars
                ));
              }
            }
          }
          ip += 2;
        }
        OpCode::SetProperty => {
          let key = self.constant_key(&function, ip + 1);
          let handle = match self.peek(1) {
            Value::Object(handle) => handle,
            _ => break Some("Only instances have fields.".to_string()),
          };
          let value = self.peek(0);
          match &mut self.heap[handle] {
            Object::Instance(instance) => {
              instance.fields.insert(key, value);
            }
            _ => break Some("Only instances have fields.".to_string()),
          }

          let value = self.pop();
          self.pop();
          self.push(value);
          ip += 2;
        }
        OpCode::GetSuper => {
          let key = self.constant_key(&function, ip + 1);
          let superclass = match self.pop() {
            Value::Object(handle) => handle,
            _ => unreachable!("superclass is checked by Inherit"),
          };
          let method = match &self.heap[superclass] {
            Object::Class(class) => class.methods.get(key),
            _ => unreachable!("superclass is checked by Inherit"),
          };

          match method {
            Some(Value::Object(method)) => {
              let receiver = self.pop();
              let bound = self
                .heap
                .allocate(Object::BoundMethod(BoundMethod { receiver, method }));
              self.push(Value::Object(bound));
            }
            Some(_) => unreachable!("methods are closures"),
            None => {
              break Some(format!(
                "Undefined property '{}'.",
                self.heap[key.string].as_string().chars
              ));
            }
          }
          ip += 2;
        }

        OpCode::Equal => {
          let (right, left) = (self.pop(), self.pop());
          self.push(Value::Boolean(left == right));
          ip += 1;
        }
        OpCode::Greater => {
          comparison_expression!(self, >);
          ip += 1;
        }
        OpCode::Less => {
          comparison_expression!(self, <);
          ip += 1;
        }

        OpCode::Add => {
          let (right, left) = (self.pop(), self.pop());
          match (left, right) {
            (Value::Number(left), Value::Number(right)) => {
              self.push(Value::Number(left + right));
            }
            (Value::Object(left), Value::Object(right)) => {
              let concatenated = match (&self.heap[left], &self.heap[right]) {
                (Object::String(left), Object::String(right)) => {
                  format!("{}{}", left.chars, right.chars)
                }
                _ => break Some("Operands must be two numbers or two strings.".to_string()),
              };
              let string = self.intern(&concatenated);
              self.push(Value::Object(string));
            }
            _ => break Some("Operands must be two numbers or two strings.".to_string()),
          }
          ip += 1;
        }
        OpCode::Subtract => {
          numeric_expression!(self, -);
          ip += 1;
        }
        OpCode::Multiply => {
          numeric_expression!(self, *);
          ip += 1;
        }
        OpCode::Divide => {
          numeric_expression!(self, /);
          ip += 1;
        }
        OpCode::Not => {
          let value = self.pop();
          self.push(Value::Boolean(value.is_falsy()));
          ip += 1;
        }
        OpCode::Negate => {
          let value = self.pop();
          if let Value::Number(number) = value {
            self.push(Value::Number(-number));
          } else {
            break Some("Operand must be a number.".to_string());
          }
          ip += 1;
        }

        OpCode::Print => {
          let value = self.pop();
          let message = value.display(&self.heap);
          self.context.print(&message);
          ip += 1;
        }

        OpCode::Jump => {
          let jump = function.chunk.get_long_value(ip + 1);
          ip += usize::from(jump) + 1;
        }
        OpCode::JumpIfFalse => {
          let jump = function.chunk.get_long_value(ip + 1);
          if self.peek(0).is_falsy() {
            ip += usize::from(jump) + 1;
          } else {
            ip += 3;
          }
        }
        OpCode::Loop => {
          let jump = function.chunk.get_long_value(ip + 1);
          ip -= usize::from(jump) - 1;
        }

        OpCode::Call => {
          let argument_count = usize::from(function.chunk.get_value(ip + 1));
          let return_ip = ip + 2;
          let callee = self.peek(argument_count);
          call_value!(self, closure, function, ip, offset, callee, argument_count, return_ip);
        }
        OpCode::Invoke => {
          let key = self.constant_key(&function, ip + 1);
          let argument_count = usize::from(function.chunk.get_value(ip + 2));
          let return_ip = ip + 3;

          let receiver = self.peek(argument_count);
          let handle = match receiver {
            Value::Object(handle) => handle,
            _ => break Some("Only instances have methods.".to_string()),
          };
          let (class, field) = match &self.heap[handle] {
            Object::Instance(instance) => (instance.class, instance.fields.get(key)),
            _ => break Some("Only instances have methods.".to_string()),
          };

          if let Some(field) = field {
            // a field shadowing a method: call whatever the field holds
            let slot = self.stack.len() - argument_count - 1;
            self.stack[slot] = field;
            call_value!(self, closure, function, ip, offset, field, argument_count, return_ip);
          } else {
            let method = match &self.heap[class] {
              Object::Class(class) => class.methods.get(key),
              _ => unreachable!("instances belong to classes"),
            };
            match method {
              Some(Value::Object(method)) => {
                begin_call!(self, closure, function, ip, offset, method, argument_count, return_ip);
              }
              Some(_) => unreachable!("methods are closures"),
              None => {
                break Some(format!(
                  "Undefined property '{}'.",
                  self.heap[key.string].as_string().chars
                ));
              }
            }
          }
        }
        OpCode::SuperInvoke => {
          let key = self.constant_key(&function, ip + 1);
          let argument_count = usize::from(function.chunk.get_value(ip + 2));
          let return_ip = ip + 3;

          let superclass = match self.pop() {
            Value::Object(handle) => handle,
            _ => unreachable!("superclass is checked by Inherit"),
          };
          let method = match &self.heap[superclass] {
            Object::Class(class) => class.methods.get(key),
            _ => unreachable!("superclass is checked by Inherit"),
          };
          match method {
            Some(Value::Object(method)) => {
              begin_call!(self, closure, function, ip, offset, method, argument_count, return_ip);
            }
            Some(_) => unreachable!("methods are closures"),
            None => {
              break Some(format!(
                "Undefined property '{}'.",
                self.heap[key.string].as_string().chars
              ));
            }
          }
        }

        OpCode::Closure => {
          let constant_position = function.chunk.get_value(ip + 1);
          let new_function = match function.chunk.get_constant(usize::from(constant_position)) {
            ConstantValue::Function(function) => function.clone(),
            _ => unreachable!("Closure takes a function constant"),
          };

          let mut upvalues = Vec::with_capacity(new_function.upvalue_count);
          let mut operand = ip + 2;
          for _ in 0..new_function.upvalue_count {
            let is_local = function.chunk.get_value(operand) == 1;
            let index = usize::from(function.chunk.get_value(operand + 1));
            operand += 2;

            if is_local {
              let upvalue = self.capture_upvalue(offset + index);
              upvalues.push(upvalue);
            } else {
              let upvalue = match &self.heap[closure] {
                Object::Closure(closure) => closure.upvalues[index],
                _ => unreachable!("current frame holds a closure"),
              };
              upvalues.push(upvalue);
            }
          }

          let new_closure = self.heap.allocate(Object::Closure(Closure {
            function: new_function,
            upvalues,
          }));
          self.push(Value::Object(new_closure));
          ip = operand;
        }
        OpCode::CloseUpvalue => {
          self.close_upvalues(self.stack.len() - 1);
          self.pop();
          ip += 1;
        }

        OpCode::Class => {
          let key = self.constant_key(&function, ip + 1);
          let class = self.heap.allocate(Object::Class(Class {
            name: key.string,
            methods: Table::new(),
          }));
          self.push(Value::Object(class));
          ip += 2;
        }
        OpCode::Inherit => {
          let superclass = match self.peek(1) {
            Value::Object(handle) => handle,
            _ => break Some("Superclass must be a class.".to_string()),
          };
          let methods: Vec<(StringKey, Value)> = match &self.heap[superclass] {
            Object::Class(class) => class.methods.iter().collect(),
            _ => break Some("Superclass must be a class.".to_string()),
          };

          let subclass = match self.peek(0) {
            Value::Object(handle) => handle,
            _ => unreachable!("subclass was created by the Class op"),
          };
          match &mut self.heap[subclass] {
            Object::Class(class) => {
              for (key, value) in methods {
                class.methods.insert(key, value);
              }
            }
            _ => unreachable!("subclass was created by the Class op"),
          }
          self.pop();
          ip += 1;
        }
        OpCode::Method => {
          let key = self.constant_key(&function, ip + 1);
          let method = self.peek(0);
          let class = match self.peek(1) {
            Value::Object(handle) => handle,
            _ => unreachable!("class is below the method on the stack"),
          };
          match &mut self.heap[class] {
            Object::Class(class) => {
              class.methods.insert(key, method);
            }
            _ => unreachable!("class is below the method on the stack"),
          }
          self.pop();
          ip += 2;
        }

        OpCode::Return => {
          let result = self.pop();
          self.close_upvalues(offset);

          match self.frames.pop() {
            Some(frame) => {
              self.stack.truncate(offset);
              self.push(result);

              closure = frame.closure;
              function = match &self.heap[closure] {
                Object::Closure(closure) => closure.function.clone(),
                _ => unreachable!("frames hold closures"),
              };
              ip = frame.ip;
              offset = frame.offset;
            }
            None => {
              self.pop(); // the script closure in slot 0
              break None;
            }
          }
        }
      }

      if self.heap.should_collect() {
        self.garbage_collect(closure);
      }
    };

    match error {
      None => Ok(()),
      Some(message) => {
        let mut traceback = vec![TraceLocation {
          line: function.chunk.get_line_number(ip),
          function: function.name.clone(),
        }];
        for frame in self.frames.iter().rev() {
          let frame_function = match &self.heap[frame.closure] {
            Object::Closure(closure) => &closure.function,
            _ => unreachable!("frames hold closures"),
          };
          traceback.push(TraceLocation {
            line: frame_function.chunk.get_line_number(frame.ip.saturating_sub(2)),
            function: frame_function.name.clone(),
          });
        }

        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();

        Err(RuntimeError { message, traceback })
      }
    }
  }
}

/// An error raised whilst executing bytecode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeError {
  pub message: String,
  traceback: Vec<TraceLocation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TraceLocation {
  line: LineNumber,
  function: SmartString,
}

impl RuntimeError {
  /// One line per active frame, innermost first
  pub fn stack_trace(&self) -> String {
    use std::fmt::Write;

    let mut trace = String::new();
    for location in &self.traceback {
      if location.function.is_empty() {
        writeln!(trace, "[line {}] in script", location.line).unwrap();
      } else {
        writeln!(trace, "[line {}] in {}()", location.line, location.function).unwrap();
      }
    }
    trace
  }

  pub fn trace_lines(&self) -> Vec<String> {
    self
      .stack_trace()
      .lines()
      .map(|line| line.to_string())
      .collect()
  }
}

impl fmt::Display for RuntimeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}
impl error::Error for RuntimeError {}
