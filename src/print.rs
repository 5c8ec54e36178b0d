use crate::chunk::{Chunk, ConstantValue, OpCode};
use crate::object::Function;

use std::fmt::Write;

/// Renders a function's bytecode as a listing, nested functions included
pub fn disassemble(function: &Function) -> String {
  let mut output = String::new();
  disassemble_function(function, &mut output);
  output
}

fn disassemble_function(function: &Function, output: &mut String) {
  writeln!(output, "          ╭─[{function}]").unwrap();

  let chunk = &function.chunk;
  let mut position = 0;
  let mut last_line_number = 0;

  while position < chunk.length() {
    let line_number = chunk.get_line_number(position);
    if line_number == last_line_number {
      write!(output, "     {position:0>4} │ ").unwrap();
    } else {
      write!(output, "{line_number:<4} {position:0>4} │ ").unwrap();
      last_line_number = line_number;
    }

    position = disassemble_instruction(chunk, position, output);
  }
  writeln!(output, "──────────╯").unwrap();

  for constant in chunk.constants() {
    if let ConstantValue::Function(nested) = constant {
      disassemble_function(nested, output);
    }
  }
}

/// Writes one instruction and returns the position of the next one
pub fn disassemble_instruction(chunk: &Chunk, position: usize, output: &mut String) -> usize {
  let Some(instruction) = chunk.get(position) else {
    writeln!(output, "Unknown OpCode").unwrap();
    return position + 1;
  };

  match instruction {
    OpCode::Nil => simple_instruction("Nil", position, output),
    OpCode::True => simple_instruction("True", position, output),
    OpCode::False => simple_instruction("False", position, output),
    OpCode::Pop => simple_instruction("Pop", position, output),
    OpCode::Equal => simple_instruction("Equal", position, output),
    OpCode::Greater => simple_instruction("Greater", position, output),
    OpCode::Less => simple_instruction("Less", position, output),
    OpCode::Add => simple_instruction("Add", position, output),
    OpCode::Subtract => simple_instruction("Subtract", position, output),
    OpCode::Multiply => simple_instruction("Multiply", position, output),
    OpCode::Divide => simple_instruction("Divide", position, output),
    OpCode::Not => simple_instruction("Not", position, output),
    OpCode::Negate => simple_instruction("Negate", position, output),
    OpCode::Print => simple_instruction("Print", position, output),
    OpCode::CloseUpvalue => simple_instruction("Close Upvalue", position, output),
    OpCode::Inherit => simple_instruction("Inherit", position, output),
    OpCode::Return => simple_instruction("Return", position, output),

    OpCode::Constant => constant_instruction("Constant", chunk, position, output),
    OpCode::GetGlobal => constant_instruction("Get Global", chunk, position, output),
    OpCode::DefineGlobal => constant_instruction("Define Global", chunk, position, output),
    OpCode::SetGlobal => constant_instruction("Set Global", chunk, position, output),
    OpCode::GetProperty => constant_instruction("Get Property", chunk, position, output),
    OpCode::SetProperty => constant_instruction("Set Property", chunk, position, output),
    OpCode::GetSuper => constant_instruction("Get Super", chunk, position, output),
    OpCode::Class => constant_instruction("Class", chunk, position, output),
    OpCode::Method => constant_instruction("Method", chunk, position, output),

    OpCode::GetLocal => byte_instruction("Get Local", chunk, position, output),
    OpCode::SetLocal => byte_instruction("Set Local", chunk, position, output),
    OpCode::GetUpvalue => byte_instruction("Get Upvalue", chunk, position, output),
    OpCode::SetUpvalue => byte_instruction("Set Upvalue", chunk, position, output),
    OpCode::Call => byte_instruction("Call", chunk, position, output),

    OpCode::Jump => jump_instruction("Jump", 1, chunk, position, output),
    OpCode::JumpIfFalse => jump_instruction("Jump If False", 1, chunk, position, output),
    OpCode::Loop => jump_instruction("Loop", -1, chunk, position, output),

    OpCode::Invoke => invoke_instruction("Invoke", chunk, position, output),
    OpCode::SuperInvoke => invoke_instruction("Super Invoke", chunk, position, output),

    OpCode::Closure => closure_instruction(chunk, position, output),
  }
}

fn simple_instruction(name: &str, position: usize, output: &mut String) -> usize {
  writeln!(output, "{name}").unwrap();
  position + 1
}

fn constant_instruction(name: &str, chunk: &Chunk, position: usize, output: &mut String) -> usize {
  let constant_location = chunk.get_value(position + 1);
  let constant = chunk.get_constant(usize::from(constant_location));

  writeln!(output, "{name} '{constant}' ({constant_location})").unwrap();
  position + 2
}

fn byte_instruction(name: &str, chunk: &Chunk, position: usize, output: &mut String) -> usize {
  let value = chunk.get_value(position + 1);
  writeln!(output, "{name} {value}").unwrap();
  position + 2
}

fn jump_instruction(
  name: &str,
  direction: i8,
  chunk: &Chunk,
  position: usize,
  output: &mut String,
) -> usize {
  let jump = chunk.get_long_value(position + 1);
  writeln!(output, "{name} {}", i32::from(jump) * i32::from(direction)).unwrap();
  position + 3
}

fn invoke_instruction(name: &str, chunk: &Chunk, position: usize, output: &mut String) -> usize {
  let constant_location = chunk.get_value(position + 1);
  let constant = chunk.get_constant(usize::from(constant_location));
  let argument_count = chunk.get_value(position + 2);

  writeln!(output, "{name} '{constant}' ({argument_count} args)").unwrap();
  position + 3
}

fn closure_instruction(chunk: &Chunk, position: usize, output: &mut String) -> usize {
  let constant_location = chunk.get_value(position + 1);
  let constant = chunk.get_constant(usize::from(constant_location));

  let upvalue_count = match constant {
    ConstantValue::Function(function) => function.upvalue_count,
    _ => 0,
  };
  writeln!(output, "Closure '{constant}' ({upvalue_count} upvalues)").unwrap();

  let mut operand = position + 2;
  for _ in 0..upvalue_count {
    let is_local = chunk.get_value(operand) == 1;
    let index = chunk.get_value(operand + 1);
    let kind = if is_local { "local" } else { "upvalue" };
    writeln!(output, "     {operand:0>4} │ │ capture {kind} {index}").unwrap();
    operand += 2;
  }

  operand
}
