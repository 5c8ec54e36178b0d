use crate::chunk::Chunk;
use crate::gc::{Handle, Heap};
use crate::table::Table;
use crate::value::Value;
use crate::vm::VM;

use smartstring::alias::String as SmartString;
use std::{fmt, mem, rc::Rc};

/// A compiled function: immutable output of the compiler, shared by `Rc`.
///
/// Functions are not collected objects; closures on the heap reference them,
/// and nested functions live in the constant pool of their enclosing chunk.
#[derive(Debug)]
pub struct Function {
  pub name: SmartString,
  pub arity: u8,
  pub upvalue_count: usize,
  pub chunk: Chunk,
}

impl fmt::Display for Function {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.name.is_empty() {
      write!(f, "<script>")
    } else {
      write!(f, "<fn {}>", self.name)
    }
  }
}

/// An interned string, with its hash cached for table probing
#[derive(Debug)]
pub struct GcString {
  pub chars: SmartString,
  pub hash: u32,
}

pub type NativeFn = for<'c> fn(&mut VM<'c>, &[Value]) -> Value;

/// A host function callable from Lox code
pub struct NativeFunction {
  pub name: &'static str,
  pub function: NativeFn,
}

/// A function paired with the upvalues it has captured
#[derive(Debug)]
pub struct Closure {
  pub function: Rc<Function>,
  pub upvalues: Vec<Handle>,
}

impl Closure {
  pub fn new(function: Rc<Function>) -> Self {
    Self {
      function,
      upvalues: Vec::new(),
    }
  }
}

/// A captured local: open whilst the stack slot is live, closed once the
/// value has been hoisted into the upvalue itself
#[derive(Clone, Copy, Debug)]
pub enum Upvalue {
  Open(usize),
  Closed(Value),
}

#[derive(Debug)]
pub struct Class {
  pub name: Handle,
  pub methods: Table,
}

#[derive(Debug)]
pub struct Instance {
  pub class: Handle,
  pub fields: Table,
}

#[derive(Clone, Copy, Debug)]
pub struct BoundMethod {
  pub receiver: Value,
  pub method: Handle,
}

pub enum Object {
  String(GcString),
  Closure(Closure),
  Upvalue(Upvalue),
  Native(NativeFunction),
  Class(Class),
  Instance(Instance),
  BoundMethod(BoundMethod),
}

impl Object {
  pub fn get_type(&self) -> &'static str {
    match self {
      Self::String(_) => "string",
      Self::Closure(_) | Self::Native(_) | Self::BoundMethod(_) => "function",
      Self::Upvalue(_) => "upvalue",
      Self::Class(_) => "class",
      Self::Instance(_) => "instance",
    }
  }

  pub fn as_string(&self) -> &GcString {
    match self {
      Self::String(string) => string,
      _ => unreachable!("expected a string object"),
    }
  }

  /// Approximate size of the object, for the collector's byte accounting
  pub fn size(&self) -> usize {
    let extra = match self {
      Self::String(string) => string.chars.len(),
      Self::Closure(closure) => closure.upvalues.len() * mem::size_of::<Handle>(),
      Self::Class(class) => class.methods.size_bytes(),
      Self::Instance(instance) => instance.fields.size_bytes(),
      Self::Upvalue(_) | Self::Native(_) | Self::BoundMethod(_) => 0,
    };

    mem::size_of::<Self>() + extra
  }

  pub fn display(&self, heap: &Heap) -> String {
    match self {
      Self::String(string) => string.chars.to_string(),
      Self::Closure(closure) => closure.function.to_string(),
      Self::Upvalue(_) => "<upvalue>".to_string(),
      Self::Native(_) => "<native>".to_string(),
      Self::Class(class) => format!("<class '{}'>", heap[class.name].as_string().chars),
      Self::Instance(instance) => {
        let class_name = match &heap[instance.class] {
          Object::Class(class) => &heap[class.name].as_string().chars,
          _ => unreachable!("instance of a non-class"),
        };
        format!("<'{class_name}' object>")
      }
      Self::BoundMethod(bound) => heap[bound.method].display(heap),
    }
  }
}

impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::String(string) => write!(f, "'{}'", string.chars),
      Self::Closure(closure) => write!(f, "{}", closure.function),
      Self::Upvalue(upvalue) => write!(f, "{upvalue:?}"),
      Self::Native(native) => write!(f, "<native {}>", native.name),
      Self::Class(_) => write!(f, "<class>"),
      Self::Instance(_) => write!(f, "<instance>"),
      Self::BoundMethod(_) => write!(f, "<bound method>"),
    }
  }
}
