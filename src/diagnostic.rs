use crate::scanner::LineNumber;
use std::fmt;

/// An error found whilst compiling, pointing at the token which caused it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub line: LineNumber,
  pub location: String,
  pub message: String,
}

impl Diagnostic {
  pub fn new(line: LineNumber, location: String, message: &str) -> Self {
    Self {
      line,
      location,
      message: message.to_string(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.location.is_empty() {
      write!(f, "[line {}] Error: {}", self.line, self.message)
    } else {
      write!(f, "[line {}] Error {}: {}", self.line, self.location, self.message)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_line_and_location() {
    let diagnostic = Diagnostic::new(3, "at 'x'".to_string(), "Expect expression.");
    assert_eq!(
      diagnostic.to_string(),
      "[line 3] Error at 'x': Expect expression."
    );
  }

  #[test]
  fn scanner_errors_have_no_location() {
    let diagnostic = Diagnostic::new(1, String::new(), "Unterminated string.");
    assert_eq!(diagnostic.to_string(), "[line 1] Error: Unterminated string.");
  }

  #[test]
  fn end_of_file_reads_as_at_end() {
    let diagnostic = Diagnostic::new(7, "at end".to_string(), "Expect '}' after block.");
    assert_eq!(
      diagnostic.to_string(),
      "[line 7] Error at end: Expect '}' after block."
    );
  }
}
