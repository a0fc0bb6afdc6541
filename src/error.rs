//! Shared error utilities used across the compilation pipeline.
//!
//! Every stage stops at the first problem it finds. The error keeps enough of
//! the source around to print the offending line with a caret under the byte
//! where the problem was detected, in the spirit of chibicc's `error_at`.

use std::fmt;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Coarse classification of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Lexical,
  Syntax,
  Semantic,
}

/// A resolved source position together with the text of its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
  /// 1-based line number.
  pub line: usize,
  /// 1-based column, counted in characters.
  pub column: usize,
  line_text: String,
}

impl Position {
  /// Resolve a byte offset into `source`. Offsets past the end clamp to the
  /// end of input so "unexpected end of input" errors still point somewhere.
  pub fn locate(source: &str, offset: usize) -> Self {
    let mut safe = offset.min(source.len());
    while !source.is_char_boundary(safe) {
      safe -= 1;
    }
    let line_start = source[..safe].rfind('\n').map_or(0, |nl| nl + 1);
    let line_end = source[safe..]
      .find('\n')
      .map_or(source.len(), |nl| safe + nl);
    let line = source[..line_start].matches('\n').count() + 1;
    let column = source[line_start..safe].chars().count() + 1;
    Self {
      line,
      column,
      line_text: source[line_start..line_end].trim_end_matches('\r').to_string(),
    }
  }

  /// The offending line followed by a caret marker line.
  pub fn snippet(&self) -> String {
    let marker = format!("{}^", " ".repeat(self.column - 1));
    format!("    {}\n    {marker}", self.line_text)
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.column)
  }
}

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("lexical error at {at}: {message}\n{}", at.snippet()))]
  Lexical { at: Position, message: String },

  #[snafu(display("syntax error at {at}: {message}\n{}", at.snippet()))]
  Syntax { at: Position, message: String },

  #[snafu(display("semantic error at {at}: {message}\n{}", at.snippet()))]
  Semantic { at: Position, message: String },
}

impl CompileError {
  pub fn lexical(source: &str, loc: usize, message: impl Into<String>) -> Self {
    Self::Lexical {
      at: Position::locate(source, loc),
      message: message.into(),
    }
  }

  pub fn syntax(source: &str, loc: usize, message: impl Into<String>) -> Self {
    Self::Syntax {
      at: Position::locate(source, loc),
      message: message.into(),
    }
  }

  pub fn semantic(source: &str, loc: usize, message: impl Into<String>) -> Self {
    Self::Semantic {
      at: Position::locate(source, loc),
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Lexical { .. } => ErrorKind::Lexical,
      Self::Syntax { .. } => ErrorKind::Syntax,
      Self::Semantic { .. } => ErrorKind::Semantic,
    }
  }

  /// The bare diagnostic message, without position or snippet.
  pub fn message(&self) -> &str {
    match self {
      Self::Lexical { message, .. }
      | Self::Syntax { message, .. }
      | Self::Semantic { message, .. } => message,
    }
  }

  pub fn position(&self) -> &Position {
    match self {
      Self::Lexical { at, .. } | Self::Syntax { at, .. } | Self::Semantic { at, .. } => at,
    }
  }
}
