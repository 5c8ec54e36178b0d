use ansi_term::Colour::Red;
use clap::{Arg, ArgAction, Command};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lox::{compile, disassemble, Diagnostic, RuntimeError, StdContext, VM};
use std::{fs, process};

fn print_compile_errors(diagnostics: &[Diagnostic]) {
  for diagnostic in diagnostics {
    eprintln!("{}", Red.paint(diagnostic.to_string()));
  }
}

fn print_runtime_error(error: &RuntimeError) {
  eprintln!("{}", Red.paint(error.message.clone()));
  eprint!("{}", error.stack_trace());
}

fn run_file(filename: &str, bytecode: bool) {
  let source = match fs::read_to_string(filename) {
    Ok(source) => source,
    Err(_) => {
      eprintln!("{} problem reading file: {filename}", Red.paint("Error:"));
      process::exit(74);
    }
  };

  let function = match compile(&source) {
    Ok(function) => function,
    Err(diagnostics) => {
      print_compile_errors(&diagnostics);
      process::exit(65);
    }
  };

  if bytecode {
    print!("{}", disassemble(&function));
    return;
  }

  let context = StdContext;
  let mut vm = VM::new(&context);
  if let Err(error) = vm.run(&function) {
    print_runtime_error(&error);
    process::exit(70);
  }
}

fn repl() {
  let Ok(mut editor) = DefaultEditor::new() else {
    eprintln!("{} could not open a terminal", Red.paint("Error:"));
    process::exit(74);
  };

  let context = StdContext;
  let mut vm = VM::new(&context);

  loop {
    match editor.readline("> ") {
      Ok(line) => {
        let _ = editor.add_history_entry(&line);

        match compile(&line) {
          Ok(function) => {
            if let Err(error) = vm.run(&function) {
              print_runtime_error(&error);
            }
          }
          Err(diagnostics) => print_compile_errors(&diagnostics),
        }
      }
      Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
      Err(error) => {
        eprintln!("{} {error}", Red.paint("Error:"));
        break;
      }
    }
  }
}

fn main() {
  let command = Command::new("lox")
    .about("A bytecode interpreter for the Lox language")
    .arg(Arg::new("script").help("The script to run"))
    .arg(
      Arg::new("bytecode")
        .long("bytecode")
        .action(ArgAction::SetTrue)
        .help("Display the compiled bytecode instead of running"),
    );

  let matches = match command.try_get_matches() {
    Ok(matches) => matches,
    Err(_) => {
      eprintln!("Usage: lox [script]");
      process::exit(64);
    }
  };

  match matches.get_one::<String>("script") {
    Some(filename) => run_file(filename, matches.get_flag("bytecode")),
    None => repl(),
  }
}
