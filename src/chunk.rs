use crate::object::Function;
use crate::scanner::LineNumber;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use smartstring::alias::String as SmartString;
use std::rc::Rc;

#[derive(FromPrimitive, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpCode {
  Constant,
  Nil,
  True,
  False,
  Pop,
  GetLocal,
  SetLocal,
  GetGlobal,
  DefineGlobal,
  SetGlobal,
  GetUpvalue,
  SetUpvalue,
  GetProperty,
  SetProperty,
  GetSuper,
  Equal,
  Greater,
  Less,
  Add,
  Subtract,
  Multiply,
  Divide,
  Not,
  Negate,
  Print,
  Jump,
  JumpIfFalse,
  Loop,
  Call,
  Invoke,
  SuperInvoke,
  Closure,
  CloseUpvalue,
  Class,
  Inherit,
  Method,
  Return,
}

/// A value produced by the compiler and stored in a chunk's constant pool.
///
/// Constants are plain compile output; the VM turns them into runtime values
/// when they are loaded (strings are interned at that point).
#[derive(Clone, Debug)]
pub enum ConstantValue {
  Number(f64),
  String(SmartString),
  Function(Rc<Function>),
}

impl PartialEq for ConstantValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Number(value), Self::Number(other)) => value.to_bits() == other.to_bits(),
      (Self::String(value), Self::String(other)) => value == other,
      (Self::Function(value), Self::Function(other)) => Rc::ptr_eq(value, other),
      _ => false,
    }
  }
}

impl std::fmt::Display for ConstantValue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Number(value) => write!(f, "{value}"),
      Self::String(value) => write!(f, "{value}"),
      Self::Function(value) => write!(f, "{value}"),
    }
  }
}

impl From<f64> for ConstantValue {
  fn from(value: f64) -> Self {
    Self::Number(value)
  }
}
impl From<&str> for ConstantValue {
  fn from(value: &str) -> Self {
    Self::String(value.into())
  }
}
impl From<Rc<Function>> for ConstantValue {
  fn from(value: Rc<Function>) -> Self {
    Self::Function(value)
  }
}

type TokensOnLine = u16;
type Line = (LineNumber, TokensOnLine);

struct LineInfoBuilder {
  lines: Vec<Line>,
  last: LineNumber,
  repeated: TokensOnLine,
}
impl LineInfoBuilder {
  fn new() -> Self {
    Self {
      lines: Vec::new(),
      last: 1,
      repeated: 0,
    }
  }

  fn add(&mut self, line: LineNumber) {
    if line == 0 || line == self.last {
      self.repeated += 1;
    } else {
      self.lines.push((self.last, self.repeated));
      self.last = line;
      self.repeated = 1;
    }
  }

  fn finalize(mut self) -> LineInfo {
    if self.repeated > 0 {
      self.lines.push((self.last, self.repeated));
    }
    LineInfo { lines: self.lines }
  }
}

#[derive(Clone, Debug)]
struct LineInfo {
  lines: Vec<Line>,
}
impl LineInfo {
  fn get(&self, opcode_position: usize) -> LineNumber {
    let mut count = 0;

    for &(line, repeated) in &self.lines {
      count += usize::from(repeated);

      if count > opcode_position {
        return line;
      }
    }

    self.lines.last().map(|(line, _)| *line).unwrap_or(0)
  }
}

pub struct Builder {
  code: Vec<u8>,
  constants: Vec<ConstantValue>,
  lines: LineInfoBuilder,
}
impl Builder {
  pub fn new() -> Self {
    Self {
      code: Vec::new(),
      constants: Vec::new(),
      lines: LineInfoBuilder::new(),
    }
  }

  pub fn length(&self) -> usize {
    self.code.len()
  }

  pub fn write_opcode(&mut self, code: OpCode, line: LineNumber) {
    self.write_value(code as u8, line);
  }

  pub fn write_value(&mut self, code: u8, line: LineNumber) {
    self.code.push(code);
    self.lines.add(line);
  }

  pub fn write_long_value(&mut self, code: u16, line: LineNumber) {
    let [a, b] = u16::to_be_bytes(code);
    self.code.push(a);
    self.lines.add(line);
    self.code.push(b);
    self.lines.add(line);
  }

  /// Adds a constant to the pool, reusing an existing slot for duplicates.
  pub fn add_constant(&mut self, value: ConstantValue) -> usize {
    self
      .constants
      .iter()
      .position(|x| value == *x)
      .unwrap_or_else(|| {
        self.constants.push(value);
        self.constants.len() - 1
      })
  }

  pub fn set_long_value(&mut self, offset: usize, value: u16) {
    let [first_byte, second_byte] = u16::to_be_bytes(value);
    self.code[offset] = first_byte;
    self.code[offset + 1] = second_byte;
  }

  pub fn finalize(self) -> Chunk {
    Chunk {
      code: self.code,
      constants: self.constants,
      lines: self.lines.finalize(),
    }
  }
}

#[derive(Clone, Debug)]
pub struct Chunk {
  code: Vec<u8>,
  constants: Vec<ConstantValue>,
  lines: LineInfo,
}
impl Chunk {
  pub fn get(&self, position: usize) -> Option<OpCode> {
    FromPrimitive::from_u8(*self.code.get(position)?)
  }

  pub fn get_value(&self, position: usize) -> u8 {
    self.code[position]
  }

  pub fn get_long_value(&self, position: usize) -> u16 {
    u16::from_be_bytes([self.get_value(position), self.get_value(position + 1)])
  }

  pub fn get_constant(&self, pointer: usize) -> &ConstantValue {
    &self.constants[pointer]
  }

  pub fn constants(&self) -> &[ConstantValue] {
    &self.constants
  }

  pub fn get_line_number(&self, opcode_position: usize) -> LineNumber {
    self.lines.get(opcode_position)
  }

  pub fn length(&self) -> usize {
    self.code.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_numbers_are_run_length_encoded() {
    let mut builder = Builder::new();
    builder.write_opcode(OpCode::Nil, 1);
    builder.write_opcode(OpCode::Nil, 1);
    builder.write_opcode(OpCode::Pop, 2);
    builder.write_opcode(OpCode::Print, 4);
    let chunk = builder.finalize();

    assert_eq!(chunk.get_line_number(0), 1);
    assert_eq!(chunk.get_line_number(1), 1);
    assert_eq!(chunk.get_line_number(2), 2);
    assert_eq!(chunk.get_line_number(3), 4);
  }

  #[test]
  fn constants_are_deduplicated() {
    let mut builder = Builder::new();
    let a = builder.add_constant(ConstantValue::Number(1.0));
    let b = builder.add_constant(ConstantValue::from("hello"));
    let c = builder.add_constant(ConstantValue::Number(1.0));
    let d = builder.add_constant(ConstantValue::from("hello"));

    assert_eq!(a, c);
    assert_eq!(b, d);
    assert_eq!(builder.finalize().constants().len(), 2);
  }

  #[test]
  fn long_values_round_trip() {
    let mut builder = Builder::new();
    builder.write_opcode(OpCode::Jump, 1);
    builder.write_long_value(u16::MAX, 1);
    builder.set_long_value(1, 513);
    let chunk = builder.finalize();

    assert_eq!(chunk.get(0), Some(OpCode::Jump));
    assert_eq!(chunk.get_long_value(1), 513);
  }

  #[test]
  fn invalid_bytes_are_not_opcodes() {
    let mut builder = Builder::new();
    builder.write_value(245, 1);
    let chunk = builder.finalize();

    assert_eq!(chunk.get(0), None);
  }
}
