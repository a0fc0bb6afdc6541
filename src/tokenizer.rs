//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is a single left-to-right byte scan. Keywords are recognised
//! after an identifier run has been collected, and multi-character operators
//! are matched before single-character ones to avoid ambiguity.
//!
//! One layout rule lives here rather than in the parser: a newline may only
//! follow `;`, `{` or `}`. Anything else at the end of a line is rejected, so
//! every statement has to be finished before the line breaks.

use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  ExitKw,
  PrintKw,
  IfKw,
  ConstKw,
  Ident,
  IntLit,
  Semicolon,
  Assign,
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  Eq,
  Neq,
  Lt,
  Gt,
  Lte,
  Gte,
  LParen,
  RParen,
  LBrace,
  RBrace,
}

const KEYWORDS: [(&str, TokenKind); 4] = [
  ("exit", TokenKind::ExitKw),
  ("const", TokenKind::ConstKw),
  ("print", TokenKind::PrintKw),
  ("if", TokenKind::IfKw),
];

const COMPOUND_OPS: [(&str, TokenKind); 4] = [
  ("==", TokenKind::Eq),
  ("!=", TokenKind::Neq),
  ("<=", TokenKind::Lte),
  (">=", TokenKind::Gte),
];

impl TokenKind {
  /// Fixed source spelling of the kind. Identifiers and literals have no
  /// fixed spelling and return a placeholder.
  pub fn spelling(self) -> &'static str {
    match self {
      Self::ExitKw => "exit",
      Self::PrintKw => "print",
      Self::IfKw => "if",
      Self::ConstKw => "const",
      Self::Ident => "<identifier>",
      Self::IntLit => "<integer>",
      Self::Semicolon => ";",
      Self::Assign => "=",
      Self::Plus => "+",
      Self::Minus => "-",
      Self::Star => "*",
      Self::Slash => "/",
      Self::Percent => "%",
      Self::Eq => "==",
      Self::Neq => "!=",
      Self::Lt => "<",
      Self::Gt => ">",
      Self::Lte => "<=",
      Self::Gte => ">=",
      Self::LParen => "(",
      Self::RParen => ")",
      Self::LBrace => "{",
      Self::RBrace => "}",
    }
  }

  /// Name used by the token dump.
  pub fn name(self) -> &'static str {
    match self {
      Self::ExitKw => "exit_kw",
      Self::PrintKw => "print_kw",
      Self::IfKw => "if_kw",
      Self::ConstKw => "const_kw",
      Self::Ident => "ident",
      Self::IntLit => "int_lit",
      Self::Semicolon => "semicolon",
      Self::Assign => "assign",
      Self::Plus => "plus",
      Self::Minus => "minus",
      Self::Star => "star",
      Self::Slash => "slash",
      Self::Percent => "percent",
      Self::Eq => "eq",
      Self::Neq => "neq",
      Self::Lt => "lt",
      Self::Gt => "gt",
      Self::Lte => "lte",
      Self::Gte => "gte",
      Self::LParen => "lparen",
      Self::RParen => "rparen",
      Self::LBrace => "lbrace",
      Self::RBrace => "rbrace",
    }
  }

  fn from_byte(c: u8) -> Option<Self> {
    let kind = match c {
      b';' => Self::Semicolon,
      b'=' => Self::Assign,
      b'+' => Self::Plus,
      b'-' => Self::Minus,
      b'*' => Self::Star,
      b'/' => Self::Slash,
      b'%' => Self::Percent,
      b'<' => Self::Lt,
      b'>' => Self::Gt,
      b'(' => Self::LParen,
      b')' => Self::RParen,
      b'{' => Self::LBrace,
      b'}' => Self::RBrace,
      _ => return None,
    };
    Some(kind)
  }

  fn may_end_line(self) -> bool {
    matches!(self, Self::Semicolon | Self::LBrace | Self::RBrace)
  }
}

/// A lexed token. `text` is only present for identifiers and integer
/// literals; `loc` is the byte offset of the token in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: Option<String>,
  pub loc: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize) -> Self {
    Self {
      kind,
      text: None,
      loc,
    }
  }

  pub fn with_text(kind: TokenKind, loc: usize, text: impl Into<String>) -> Self {
    Self {
      kind,
      text: Some(text.into()),
      loc,
    }
  }

  /// Source text of the token: the payload for identifiers and literals,
  /// the fixed spelling for everything else.
  pub fn lexeme(&self) -> &str {
    self.text.as_deref().unwrap_or(self.kind.spelling())
  }
}

/// Lex the input into a flat vector of tokens. No end-of-input marker is
/// appended; the parser treats running out of tokens as the end.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens: Vec<Token> = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];

    if c.is_ascii_alphabetic() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
      }
      let word = &input[start..i];
      let token = match KEYWORDS.iter().find(|(kw, _)| *kw == word) {
        Some(&(_, kind)) => Token::new(kind, start),
        None => Token::with_text(TokenKind::Ident, start, word),
      };
      tokens.push(token);
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      if let Err(err) = text.parse::<i64>() {
        return Err(CompileError::lexical(input, start, format!("invalid number: {err}")));
      }
      tokens.push(Token::with_text(TokenKind::IntLit, start, text));
      continue;
    }

    if c.is_ascii_whitespace() {
      if c == b'\n'
        && let Some(prev) = tokens.last()
        && !prev.kind.may_end_line()
      {
        return Err(CompileError::lexical(
          input,
          i,
          format!(
            "unexpected newline after '{}'; expected ';', '{{' or '}}'",
            prev.lexeme()
          ),
        ));
      }
      i += 1;
      continue;
    }

    if let Some(&(op, kind)) = COMPOUND_OPS
      .iter()
      .find(|(op, _)| input[i..].starts_with(op))
    {
      tokens.push(Token::new(kind, i));
      i += op.len();
      continue;
    }

    if let Some(kind) = TokenKind::from_byte(c) {
      tokens.push(Token::new(kind, i));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lexical(
      input,
      i,
      format!("unknown character '{invalid_char}'"),
    ));
  }

  debug!(count = tokens.len(), "tokenized source");
  Ok(tokens)
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>) -> String {
  match token {
    Some(t) => format!("'{}'", t.lexeme()),
    None => "end of input".to_string(),
  }
}
