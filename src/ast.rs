//! Syntax tree produced by the parser.
//!
//! Every node lives in an [`Arena`](crate::arena::Arena) and children are
//! plain shared references into it, so the whole tree shares one lifetime
//! `'a`. The grammar only ever builds trees: a child is referenced by exactly
//! one parent.

use crate::tokenizer::TokenKind;

/// Token text copied into the arena along with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'a> {
  pub text: &'a str,
  pub loc: usize,
}

impl<'a> Lexeme<'a> {
  pub fn new(text: &'a str, loc: usize) -> Self {
    Self { text, loc }
  }
}

#[derive(Debug, Clone, Copy)]
pub enum Term<'a> {
  IntLit(Lexeme<'a>),
  Ident(Lexeme<'a>),
  Paren(&'a Expr<'a>),
}

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Mod,
  Eq,
  Neq,
  Lt,
  Gt,
  Lte,
  Gte,
}

impl BinaryOp {
  pub fn from_token(kind: TokenKind) -> Option<Self> {
    let op = match kind {
      TokenKind::Plus => Self::Add,
      TokenKind::Minus => Self::Sub,
      TokenKind::Star => Self::Mul,
      TokenKind::Slash => Self::Div,
      TokenKind::Percent => Self::Mod,
      TokenKind::Eq => Self::Eq,
      TokenKind::Neq => Self::Neq,
      TokenKind::Lt => Self::Lt,
      TokenKind::Gt => Self::Gt,
      TokenKind::Lte => Self::Lte,
      TokenKind::Gte => Self::Gte,
      _ => return None,
    };
    Some(op)
  }

  /// Binding strength; every level is left-associative.
  pub fn precedence(self) -> u8 {
    match self {
      Self::Eq | Self::Neq | Self::Lt | Self::Gt | Self::Lte | Self::Gte => 0,
      Self::Add | Self::Sub => 1,
      Self::Mul | Self::Div | Self::Mod => 2,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Mod => "%",
      Self::Eq => "==",
      Self::Neq => "!=",
      Self::Lt => "<",
      Self::Gt => ">",
      Self::Lte => "<=",
      Self::Gte => ">=",
    }
  }

  /// Whether both operand orders give the same result.
  pub fn is_commutative(self) -> bool {
    matches!(self, Self::Add | Self::Mul)
  }
}

#[derive(Debug, Clone, Copy)]
pub struct BinExpr<'a> {
  pub op: BinaryOp,
  pub lhs: &'a Expr<'a>,
  pub rhs: &'a Expr<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Expr<'a> {
  Term(Term<'a>),
  Bin(BinExpr<'a>),
}

/// A braced block; opens a new lexical scope.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
  pub stmts: &'a [Stmt<'a>],
}

#[derive(Debug, Clone, Copy)]
pub enum Stmt<'a> {
  Exit(Expr<'a>),
  ConstDecl { name: Lexeme<'a>, value: Expr<'a> },
  If { cond: Expr<'a>, body: Scope<'a> },
  Print(Expr<'a>),
  Scope(Scope<'a>),
}

/// Parse root: the top-level statements in source order.
#[derive(Debug, Clone, Copy)]
pub struct Program<'a> {
  pub stmts: &'a [Stmt<'a>],
}
