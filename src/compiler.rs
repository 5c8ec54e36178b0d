use crate::chunk::{Builder, ConstantValue, OpCode};
use crate::diagnostic::Diagnostic;
use crate::object::Function;
use crate::scanner::{Scanner, Token, TokenType};

use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialOrd, PartialEq)]
enum Precedence {
  None = 1,
  Assignment, // =
  Or,         // or
  And,        // and
  Equality,   // == !=
  Comparison, // < > <= >=
  Term,       // + -
  Factor,     // * /
  Unary,      // ! -
  Call,       // . ()
  Primary,
}

impl Precedence {
  fn next(self) -> Self {
    match self {
      Self::None => Self::Assignment,
      Self::Assignment => Self::Or,
      Self::Or => Self::And,
      Self::And => Self::Equality,
      Self::Equality => Self::Comparison,
      Self::Comparison => Self::Term,
      Self::Term => Self::Factor,
      Self::Factor => Self::Unary,
      Self::Unary => Self::Call,
      Self::Call | Self::Primary => Self::Primary,
    }
  }

  fn from(token_type: TokenType) -> Self {
    match token_type {
      TokenType::Or => Self::Or,
      TokenType::And => Self::And,
      TokenType::BangEqual | TokenType::EqualEqual => Self::Equality,
      TokenType::Greater | TokenType::GreaterEqual | TokenType::Less | TokenType::LessEqual => {
        Self::Comparison
      }
      TokenType::Plus | TokenType::Minus => Self::Term,
      TokenType::Star | TokenType::Slash => Self::Factor,
      TokenType::LeftParen | TokenType::Dot => Self::Call,
      _ => Self::None,
    }
  }
}

struct Local<'source> {
  name: &'source str,
  // None until the initializer has run, so `var a = a;` can be caught
  depth: Option<u8>,
  captured: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct UpvalueRef {
  index: u8,
  is_local: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
  Script,
  Function,
  Method,
  Initializer,
}

struct FunctionContext<'source> {
  builder: Builder,
  kind: FunctionKind,
  name: SmartString,
  arity: usize,
  locals: Vec<Local<'source>>,
  upvalues: SmallVec<[UpvalueRef; 8]>,
  scope_depth: u8,
}

impl<'source> FunctionContext<'source> {
  fn new(kind: FunctionKind, name: SmartString) -> Self {
    // slot 0 belongs to the callee, or to `this` inside a method
    let slot_zero = Local {
      name: match kind {
        FunctionKind::Method | FunctionKind::Initializer => "this",
        FunctionKind::Script | FunctionKind::Function => "",
      },
      depth: Some(0),
      captured: false,
    };

    Self {
      builder: Builder::new(),
      kind,
      name,
      arity: 0,
      locals: vec![slot_zero],
      upvalues: SmallVec::new(),
      scope_depth: 0,
    }
  }
}

struct ClassContext {
  has_superclass: bool,
}

struct Compiler<'source> {
  scanner: Scanner<'source>,
  current: Token<'source>,
  previous: Token<'source>,

  functions: Vec<FunctionContext<'source>>,
  classes: Vec<ClassContext>,

  diagnostics: Vec<Diagnostic>,
  panic_mode: bool,
}

// Emit Bytecode
impl<'source> Compiler<'source> {
  fn current_function(&mut self) -> &mut FunctionContext<'source> {
    self.functions.last_mut().expect("function stack to have item")
  }

  fn emit_opcode(&mut self, code: OpCode) {
    let line = self.previous.line;
    self.current_function().builder.write_opcode(code, line);
  }

  fn emit_value(&mut self, value: u8) {
    let line = self.previous.line;
    self.current_function().builder.write_value(value, line);
  }

  fn emit_long_value(&mut self, value: u16) {
    let line = self.previous.line;
    self.current_function().builder.write_long_value(value, line);
  }

  fn make_constant(&mut self, value: ConstantValue) -> u8 {
    let constant_position = self.current_function().builder.add_constant(value);

    u8::try_from(constant_position).unwrap_or_else(|_| {
      self.error("Too many constants in one chunk.");
      0
    })
  }

  fn emit_constant(&mut self, value: ConstantValue) {
    let constant_position = self.make_constant(value);
    self.emit_opcode(OpCode::Constant);
    self.emit_value(constant_position);
  }

  fn identifier_constant(&mut self, name: &str) -> u8 {
    self.make_constant(ConstantValue::String(name.into()))
  }

  fn emit_jump(&mut self, instruction: OpCode) -> usize {
    self.emit_opcode(instruction);
    self.emit_long_value(u16::MAX);
    self.current_function().builder.length() - 2
  }

  fn patch_jump(&mut self, offset: usize) {
    let jump = self.current_function().builder.length() - offset;

    if let Ok(jump) = u16::try_from(jump) {
      self.current_function().builder.set_long_value(offset, jump);
    } else {
      self.error("Too much code to jump over.");
    }
  }

  fn emit_loop(&mut self, loop_start: usize) {
    self.emit_opcode(OpCode::Loop);
    let offset = self.current_function().builder.length() - loop_start;

    if let Ok(offset) = u16::try_from(offset) {
      self.emit_long_value(offset);
    } else {
      self.error("Loop body too large.");
    }
  }

  fn emit_return(&mut self) {
    if self.current_function().kind == FunctionKind::Initializer {
      self.emit_opcode(OpCode::GetLocal);
      self.emit_value(0);
    } else {
      self.emit_opcode(OpCode::Nil);
    }
    self.emit_opcode(OpCode::Return);
  }
}

// Token handling and error reporting
impl<'source> Compiler<'source> {
  fn new(source: &'source str) -> Self {
    let blank = Token {
      ttype: TokenType::EndOfFile,
      value: "",
      line: 0,
    };

    Self {
      scanner: Scanner::new(source),
      current: blank,
      previous: blank,
      functions: vec![FunctionContext::new(FunctionKind::Script, SmartString::new())],
      classes: Vec::new(),
      diagnostics: Vec::new(),
      panic_mode: false,
    }
  }

  fn advance(&mut self) {
    self.previous = self.current;

    loop {
      self.current = self.scanner.get_token();
      if self.current.ttype != TokenType::Error {
        break;
      }

      let token = self.current;
      self.error_at(token, token.value);
    }
  }

  fn check(&self, ttype: TokenType) -> bool {
    self.current.ttype == ttype
  }

  fn matches(&mut self, ttype: TokenType) -> bool {
    if self.check(ttype) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn consume(&mut self, ttype: TokenType, message: &str) {
    if self.check(ttype) {
      self.advance();
    } else {
      self.error_at_current(message);
    }
  }

  fn error(&mut self, message: &str) {
    let token = self.previous;
    self.error_at(token, message);
  }

  fn error_at_current(&mut self, message: &str) {
    let token = self.current;
    self.error_at(token, message);
  }

  fn error_at(&mut self, token: Token<'source>, message: &str) {
    if self.panic_mode {
      return;
    }
    self.panic_mode = true;

    let location = match token.ttype {
      TokenType::EndOfFile => "at end".to_string(),
      TokenType::Error => String::new(),
      _ => format!("at '{}'", token.value),
    };

    self.diagnostics.push(Diagnostic::new(token.line, location, message));
  }

  fn synchronize(&mut self) {
    self.panic_mode = false;

    while !self.check(TokenType::EndOfFile) {
      if self.previous.ttype == TokenType::Semicolon {
        return;
      }

      match self.current.ttype {
        TokenType::Class
        | TokenType::Fun
        | TokenType::Var
        | TokenType::For
        | TokenType::If
        | TokenType::While
        | TokenType::Print
        | TokenType::Return => return,
        _ => self.advance(),
      }
    }
  }
}

// Scopes and variable resolution
impl<'source> Compiler<'source> {
  fn begin_scope(&mut self) {
    self.current_function().scope_depth += 1;
  }

  fn end_scope(&mut self) {
    let function = self.current_function();
    function.scope_depth -= 1;
    let depth = function.scope_depth;

    let mut popped = Vec::new();
    while let Some(local) = function.locals.last() {
      if local.depth.unwrap_or(u8::MAX) <= depth {
        break;
      }
      popped.push(local.captured);
      function.locals.pop();
    }

    for captured in popped {
      if captured {
        self.emit_opcode(OpCode::CloseUpvalue);
      } else {
        self.emit_opcode(OpCode::Pop);
      }
    }
  }

  fn add_local(&mut self, name: &'source str) {
    if self.current_function().locals.len() >= 256 {
      self.error("Too many local variables in function.");
      return;
    }

    self.current_function().locals.push(Local {
      name,
      depth: None,
      captured: false,
    });
  }

  fn declare_variable(&mut self) {
    let name = self.previous.value;
    let function = self.current_function();
    if function.scope_depth == 0 {
      return;
    }

    let mut already_exists = false;
    for local in function.locals.iter().rev() {
      if let Some(depth) = local.depth {
        if depth < function.scope_depth {
          break;
        }
      }
      if local.name == name {
        already_exists = true;
        break;
      }
    }

    if already_exists {
      self.error("Already a variable with this name in this scope.");
    }
    self.add_local(name);
  }

  fn parse_variable(&mut self, message: &str) -> u8 {
    self.consume(TokenType::Identifier, message);
    self.declare_variable();

    if self.current_function().scope_depth > 0 {
      0
    } else {
      self.identifier_constant(self.previous.value)
    }
  }

  fn mark_initialized(&mut self) {
    let function = self.current_function();
    if function.scope_depth == 0 {
      return;
    }

    let depth = function.scope_depth;
    if let Some(local) = function.locals.last_mut() {
      local.depth = Some(depth);
    }
  }

  fn define_variable(&mut self, global: u8) {
    if self.current_function().scope_depth > 0 {
      self.mark_initialized();
    } else {
      self.emit_opcode(OpCode::DefineGlobal);
      self.emit_value(global);
    }
  }

  fn resolve_local(&mut self, function_index: usize, name: &str) -> Option<u8> {
    let mut uninitialized = false;
    let mut result = None;

    for (index, local) in self.functions[function_index].locals.iter().enumerate().rev() {
      if local.name == name {
        if local.depth.is_none() {
          uninitialized = true;
        }
        result = Some(index as u8);
        break;
      }
    }

    if uninitialized {
      self.error("Can't read local variable in its own initializer.");
    }
    result
  }

  fn resolve_upvalue(&mut self, function_index: usize, name: &str) -> Option<u8> {
    if function_index == 0 {
      return None;
    }
    let enclosing = function_index - 1;

    if let Some(local) = self.resolve_local(enclosing, name) {
      self.functions[enclosing].locals[usize::from(local)].captured = true;
      return Some(self.add_upvalue(function_index, local, true));
    }

    if let Some(upvalue) = self.resolve_upvalue(enclosing, name) {
      return Some(self.add_upvalue(function_index, upvalue, false));
    }

    None
  }

  fn add_upvalue(&mut self, function_index: usize, index: u8, is_local: bool) -> u8 {
    let upvalue = UpvalueRef { index, is_local };

    if let Some(existing) = self.functions[function_index]
      .upvalues
      .iter()
      .position(|x| *x == upvalue)
    {
      return existing as u8;
    }

    if self.functions[function_index].upvalues.len() >= 256 {
      self.error("Too many closure variables in function.");
      return 0;
    }

    self.functions[function_index].upvalues.push(upvalue);
    (self.functions[function_index].upvalues.len() - 1) as u8
  }

  fn named_variable(&mut self, name: &str, can_assign: bool) {
    let function_index = self.functions.len() - 1;

    let (get_op, set_op, argument) = if let Some(local) = self.resolve_local(function_index, name) {
      (OpCode::GetLocal, OpCode::SetLocal, local)
    } else if let Some(upvalue) = self.resolve_upvalue(function_index, name) {
      (OpCode::GetUpvalue, OpCode::SetUpvalue, upvalue)
    } else {
      let constant = self.identifier_constant(name);
      (OpCode::GetGlobal, OpCode::SetGlobal, constant)
    };

    if can_assign && self.matches(TokenType::Equal) {
      self.expression();
      self.emit_opcode(set_op);
    } else {
      self.emit_opcode(get_op);
    }
    self.emit_value(argument);
  }
}

// Declarations and statements
impl<'source> Compiler<'source> {
  fn declaration(&mut self) {
    if self.matches(TokenType::Class) {
      self.class_declaration();
    } else if self.matches(TokenType::Fun) {
      self.fun_declaration();
    } else if self.matches(TokenType::Var) {
      self.var_declaration();
    } else {
      self.statement();
    }

    if self.panic_mode {
      self.synchronize();
    }
  }

  fn class_declaration(&mut self) {
    self.consume(TokenType::Identifier, "Expect class name.");
    let class_name = self.previous.value;
    let name_constant = self.identifier_constant(class_name);
    self.declare_variable();

    self.emit_opcode(OpCode::Class);
    self.emit_value(name_constant);
    self.define_variable(name_constant);

    self.classes.push(ClassContext {
      has_superclass: false,
    });

    if self.matches(TokenType::Less) {
      self.consume(TokenType::Identifier, "Expect superclass name.");
      self.variable(false);

      if class_name == self.previous.value {
        self.error("A class can't inherit from itself.");
      }

      self.begin_scope();
      self.add_local("super");
      self.define_variable(0);

      self.named_variable(class_name, false);
      self.emit_opcode(OpCode::Inherit);
      self
        .classes
        .last_mut()
        .expect("class stack to have item")
        .has_superclass = true;
    }

    self.named_variable(class_name, false);
    self.consume(TokenType::LeftBrace, "Expect '{' before class body.");
    while !self.check(TokenType::RightBrace) && !self.check(TokenType::EndOfFile) {
      self.method();
    }
    self.consume(TokenType::RightBrace, "Expect '}' after class body.");
    self.emit_opcode(OpCode::Pop);

    if self
      .classes
      .pop()
      .expect("class stack to have item")
      .has_superclass
    {
      self.end_scope();
    }
  }

  fn method(&mut self) {
    self.consume(TokenType::Identifier, "Expect method name.");
    let constant = self.identifier_constant(self.previous.value);

    let kind = if self.previous.value == "init" {
      FunctionKind::Initializer
    } else {
      FunctionKind::Method
    };
    self.function(kind);

    self.emit_opcode(OpCode::Method);
    self.emit_value(constant);
  }

  fn fun_declaration(&mut self) {
    let global = self.parse_variable("Expect function name.");
    self.mark_initialized();
    self.function(FunctionKind::Function);
    self.define_variable(global);
  }

  fn function(&mut self, kind: FunctionKind) {
    let name: SmartString = self.previous.value.into();
    self.functions.push(FunctionContext::new(kind, name));
    self.begin_scope();

    self.consume(TokenType::LeftParen, "Expect '(' after function name.");
    if !self.check(TokenType::RightParen) {
      loop {
        self.current_function().arity += 1;
        if self.current_function().arity > 255 {
          self.error_at_current("Can't have more than 255 parameters.");
        }

        let constant = self.parse_variable("Expect parameter name.");
        self.define_variable(constant);

        if !self.matches(TokenType::Comma) {
          break;
        }
      }
    }
    self.consume(TokenType::RightParen, "Expect ')' after parameters.");
    self.consume(TokenType::LeftBrace, "Expect '{' before function body.");
    self.block();

    let (function, upvalues) = self.finish_function();
    let constant = self.make_constant(ConstantValue::Function(Rc::new(function)));
    self.emit_opcode(OpCode::Closure);
    self.emit_value(constant);
    for upvalue in upvalues {
      self.emit_value(u8::from(upvalue.is_local));
      self.emit_value(upvalue.index);
    }
  }

  fn finish_function(&mut self) -> (Function, SmallVec<[UpvalueRef; 8]>) {
    self.emit_return();

    let context = self.functions.pop().expect("function stack to have item");
    let function = Function {
      name: context.name,
      arity: context.arity as u8,
      upvalue_count: context.upvalues.len(),
      chunk: context.builder.finalize(),
    };

    (function, context.upvalues)
  }

  fn var_declaration(&mut self) {
    let global = self.parse_variable("Expect variable name.");

    if self.matches(TokenType::Equal) {
      self.expression();
    } else {
      self.emit_opcode(OpCode::Nil);
    }
    self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.");

    self.define_variable(global);
  }

  fn statement(&mut self) {
    if self.matches(TokenType::Print) {
      self.print_statement();
    } else if self.matches(TokenType::If) {
      self.if_statement();
    } else if self.matches(TokenType::Return) {
      self.return_statement();
    } else if self.matches(TokenType::While) {
      self.while_statement();
    } else if self.matches(TokenType::For) {
      self.for_statement();
    } else if self.matches(TokenType::LeftBrace) {
      self.begin_scope();
      self.block();
      self.end_scope();
    } else {
      self.expression_statement();
    }
  }

  fn block(&mut self) {
    while !self.check(TokenType::RightBrace) && !self.check(TokenType::EndOfFile) {
      self.declaration();
    }
    self.consume(TokenType::RightBrace, "Expect '}' after block.");
  }

  fn print_statement(&mut self) {
    self.expression();
    self.consume(TokenType::Semicolon, "Expect ';' after value.");
    self.emit_opcode(OpCode::Print);
  }

  fn expression_statement(&mut self) {
    self.expression();
    self.consume(TokenType::Semicolon, "Expect ';' after expression.");
    self.emit_opcode(OpCode::Pop);
  }

  fn if_statement(&mut self) {
    self.consume(TokenType::LeftParen, "Expect '(' after 'if'.");
    self.expression();
    self.consume(TokenType::RightParen, "Expect ')' after condition.");

    let then_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_opcode(OpCode::Pop);
    self.statement();
    let else_jump = self.emit_jump(OpCode::Jump);

    self.patch_jump(then_jump);
    self.emit_opcode(OpCode::Pop);

    if self.matches(TokenType::Else) {
      self.statement();
    }
    self.patch_jump(else_jump);
  }

  fn while_statement(&mut self) {
    let loop_start = self.current_function().builder.length();

    self.consume(TokenType::LeftParen, "Expect '(' after 'while'.");
    self.expression();
    self.consume(TokenType::RightParen, "Expect ')' after condition.");

    let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_opcode(OpCode::Pop);
    self.statement();
    self.emit_loop(loop_start);

    self.patch_jump(exit_jump);
    self.emit_opcode(OpCode::Pop);
  }

  fn for_statement(&mut self) {
    self.begin_scope();
    self.consume(TokenType::LeftParen, "Expect '(' after 'for'.");

    if self.matches(TokenType::Semicolon) {
      // no initializer
    } else if self.matches(TokenType::Var) {
      self.var_declaration();
    } else {
      self.expression_statement();
    }

    let mut loop_start = self.current_function().builder.length();

    let exit_jump = if self.matches(TokenType::Semicolon) {
      None
    } else {
      self.expression();
      self.consume(TokenType::Semicolon, "Expect ';' after loop condition.");

      let exit_jump = self.emit_jump(OpCode::JumpIfFalse);
      self.emit_opcode(OpCode::Pop);
      Some(exit_jump)
    };

    if !self.matches(TokenType::RightParen) {
      let body_jump = self.emit_jump(OpCode::Jump);
      let increment_start = self.current_function().builder.length();

      self.expression();
      self.emit_opcode(OpCode::Pop);
      self.consume(TokenType::RightParen, "Expect ')' after for clauses.");

      self.emit_loop(loop_start);
      loop_start = increment_start;
      self.patch_jump(body_jump);
    }

    self.statement();
    self.emit_loop(loop_start);

    if let Some(exit_jump) = exit_jump {
      self.patch_jump(exit_jump);
      self.emit_opcode(OpCode::Pop);
    }

    self.end_scope();
  }

  fn return_statement(&mut self) {
    if self.current_function().kind == FunctionKind::Script {
      self.error("Can't return from top-level code.");
    }

    if self.matches(TokenType::Semicolon) {
      self.emit_return();
    } else {
      if self.current_function().kind == FunctionKind::Initializer {
        self.error("Can't return a value from an initializer.");
      }

      self.expression();
      self.consume(TokenType::Semicolon, "Expect ';' after return value.");
      self.emit_opcode(OpCode::Return);
    }
  }
}

// Expressions
impl<'source> Compiler<'source> {
  fn expression(&mut self) {
    self.parse_precedence(Precedence::Assignment);
  }

  fn parse_precedence(&mut self, precedence: Precedence) {
    self.advance();

    let can_assign = precedence <= Precedence::Assignment;
    if !self.prefix_rule(self.previous.ttype, can_assign) {
      self.error("Expect expression.");
      return;
    }

    while precedence <= Precedence::from(self.current.ttype) {
      self.advance();
      self.infix_rule(self.previous.ttype, can_assign);
    }

    if can_assign && self.matches(TokenType::Equal) {
      self.error("Invalid assignment target.");
    }
  }

  fn prefix_rule(&mut self, token_type: TokenType, can_assign: bool) -> bool {
    match token_type {
      TokenType::LeftParen => self.grouping(),
      TokenType::Minus | TokenType::Bang => self.unary(),
      TokenType::Number => self.number(),
      TokenType::String => self.string(),
      TokenType::Nil | TokenType::True | TokenType::False => self.literal(),
      TokenType::Identifier => self.variable(can_assign),
      TokenType::This => self.this_(),
      TokenType::Super => self.super_(),
      _ => return false,
    }
    true
  }

  fn infix_rule(&mut self, token_type: TokenType, can_assign: bool) {
    match token_type {
      TokenType::LeftParen => self.call(),
      TokenType::Dot => self.dot(can_assign),
      TokenType::And => self.and_(),
      TokenType::Or => self.or_(),
      TokenType::Plus
      | TokenType::Minus
      | TokenType::Star
      | TokenType::Slash
      | TokenType::BangEqual
      | TokenType::EqualEqual
      | TokenType::Greater
      | TokenType::GreaterEqual
      | TokenType::Less
      | TokenType::LessEqual => self.binary(),
      _ => {}
    }
  }

  fn grouping(&mut self) {
    self.expression();
    self.consume(TokenType::RightParen, "Expect ')' after expression.");
  }

  fn unary(&mut self) {
    let operator = self.previous.ttype;
    self.parse_precedence(Precedence::Unary);

    match operator {
      TokenType::Minus => self.emit_opcode(OpCode::Negate),
      TokenType::Bang => self.emit_opcode(OpCode::Not),
      _ => unreachable!(),
    }
  }

  fn binary(&mut self) {
    let operator = self.previous.ttype;
    self.parse_precedence(Precedence::from(operator).next());

    match operator {
      TokenType::Plus => self.emit_opcode(OpCode::Add),
      TokenType::Minus => self.emit_opcode(OpCode::Subtract),
      TokenType::Star => self.emit_opcode(OpCode::Multiply),
      TokenType::Slash => self.emit_opcode(OpCode::Divide),
      TokenType::EqualEqual => self.emit_opcode(OpCode::Equal),
      TokenType::Greater => self.emit_opcode(OpCode::Greater),
      TokenType::Less => self.emit_opcode(OpCode::Less),
      TokenType::BangEqual => {
        self.emit_opcode(OpCode::Equal);
        self.emit_opcode(OpCode::Not);
      }
      TokenType::GreaterEqual => {
        self.emit_opcode(OpCode::Less);
        self.emit_opcode(OpCode::Not);
      }
      TokenType::LessEqual => {
        self.emit_opcode(OpCode::Greater);
        self.emit_opcode(OpCode::Not);
      }
      _ => unreachable!(),
    }
  }

  fn and_(&mut self) {
    let end_jump = self.emit_jump(OpCode::JumpIfFalse);
    self.emit_opcode(OpCode::Pop);
    self.parse_precedence(Precedence::And);
    self.patch_jump(end_jump);
  }

  fn or_(&mut self) {
    let else_jump = self.emit_jump(OpCode::JumpIfFalse);
    let end_jump = self.emit_jump(OpCode::Jump);

    self.patch_jump(else_jump);
    self.emit_opcode(OpCode::Pop);

    self.parse_precedence(Precedence::Or);
    self.patch_jump(end_jump);
  }

  fn number(&mut self) {
    let value: f64 = self.previous.value.parse().unwrap_or(0.0);
    self.emit_constant(ConstantValue::Number(value));
  }

  fn string(&mut self) {
    let lexeme = self.previous.value;
    let contents = &lexeme[1..lexeme.len() - 1];
    self.emit_constant(ConstantValue::String(contents.into()));
  }

  fn literal(&mut self) {
    match self.previous.ttype {
      TokenType::Nil => self.emit_opcode(OpCode::Nil),
      TokenType::True => self.emit_opcode(OpCode::True),
      TokenType::False => self.emit_opcode(OpCode::False),
      _ => unreachable!(),
    }
  }

  fn variable(&mut self, can_assign: bool) {
    self.named_variable(self.previous.value, can_assign);
  }

  fn this_(&mut self) {
    if self.classes.is_empty() {
      self.error("Can't use 'this' outside of a class.");
      return;
    }
    self.variable(false);
  }

  fn super_(&mut self) {
    match self.classes.last() {
      None => self.error("Can't use 'super' outside of a class."),
      Some(class) if !class.has_superclass => {
        self.error("Can't use 'super' in a class with no superclass.");
      }
      _ => {}
    }

    self.consume(TokenType::Dot, "Expect '.' after 'super'.");
    self.consume(TokenType::Identifier, "Expect superclass method name.");
    let name = self.identifier_constant(self.previous.value);

    self.named_variable("this", false);
    if self.matches(TokenType::LeftParen) {
      let argument_count = self.argument_list();
      self.named_variable("super", false);
      self.emit_opcode(OpCode::SuperInvoke);
      self.emit_value(name);
      self.emit_value(argument_count);
    } else {
      self.named_variable("super", false);
      self.emit_opcode(OpCode::GetSuper);
      self.emit_value(name);
    }
  }

  fn call(&mut self) {
    let argument_count = self.argument_list();
    self.emit_opcode(OpCode::Call);
    self.emit_value(argument_count);
  }

  fn dot(&mut self, can_assign: bool) {
    self.consume(TokenType::Identifier, "Expect property name after '.'.");
    let name = self.identifier_constant(self.previous.value);

    if can_assign && self.matches(TokenType::Equal) {
      self.expression();
      self.emit_opcode(OpCode::SetProperty);
      self.emit_value(name);
    } else if self.matches(TokenType::LeftParen) {
      let argument_count = self.argument_list();
      self.emit_opcode(OpCode::Invoke);
      self.emit_value(name);
      self.emit_value(argument_count);
    } else {
      self.emit_opcode(OpCode::GetProperty);
      self.emit_value(name);
    }
  }

  fn argument_list(&mut self) -> u8 {
    let mut count: usize = 0;

    if !self.check(TokenType::RightParen) {
      loop {
        self.expression();
        if count == 255 {
          self.error("Can't have more than 255 arguments.");
        }
        count += 1;

        if !self.matches(TokenType::Comma) {
          break;
        }
      }
    }
    self.consume(TokenType::RightParen, "Expect ')' after arguments.");

    u8::try_from(count).unwrap_or(255)
  }
}

/// Compiles a source string into the function for the top-level script.
///
/// All diagnostics found are returned together; at most one is reported per
/// statement, as the parser skips to a statement boundary after an error.
pub fn compile(source: &str) -> Result<Rc<Function>, Vec<Diagnostic>> {
  let mut compiler = Compiler::new(source);

  compiler.advance();
  while !compiler.matches(TokenType::EndOfFile) {
    compiler.declaration();
  }

  let (function, _) = compiler.finish_function();
  if compiler.diagnostics.is_empty() {
    Ok(Rc::new(function))
  } else {
    Err(compiler.diagnostics)
  }
}
