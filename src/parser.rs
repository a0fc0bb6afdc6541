//! Recursive-descent parser producing an arena-allocated statement tree.
//!
//! Statements are recognised by their leading token(s). Binary expressions
//! use precedence climbing instead of one function per precedence level:
//! parse a term, then keep folding operators whose precedence is at least the
//! current minimum, parsing each right-hand side one level tighter. That makes
//! every level left-associative.

use tracing::debug;

use crate::arena::Arena;
use crate::ast::{BinExpr, BinaryOp, Expr, Lexeme, Program, Scope, Stmt, Term};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token};

/// Parse a whole program. All nodes are allocated from `arena`.
pub fn parse<'a>(tokens: Vec<Token>, source: &str, arena: &'a Arena) -> CompileResult<Program<'a>> {
  let mut parser = Parser {
    stream: TokenStream::new(tokens, source),
    arena,
  };
  let program = parser.parse_program()?;
  debug!(
    statements = program.stmts.len(),
    arena_bytes = arena.allocated_bytes(),
    "parsed program"
  );
  Ok(program)
}

struct Parser<'a, 'src> {
  stream: TokenStream<'src>,
  arena: &'a Arena,
}

impl<'a> Parser<'a, '_> {
  fn parse_program(&mut self) -> CompileResult<Program<'a>> {
    let mut stmts = Vec::new();
    while !self.stream.is_eof() {
      stmts.push(self.parse_stmt()?);
    }
    Ok(Program {
      stmts: self.arena.alloc_stmts(stmts),
    })
  }

  fn parse_stmt(&mut self) -> CompileResult<Stmt<'a>> {
    match self.stream.peek_kind(0) {
      Some(TokenKind::ExitKw) => {
        self.stream.advance();
        let expr = self.parse_expr(0)?;
        self.stream.skip(TokenKind::Semicolon)?;
        Ok(Stmt::Exit(expr))
      }
      Some(TokenKind::PrintKw) => {
        self.stream.advance();
        let expr = self.parse_expr(0)?;
        self.stream.skip(TokenKind::Semicolon)?;
        Ok(Stmt::Print(expr))
      }
      Some(TokenKind::IfKw) => {
        self.stream.advance();
        let cond = self.parse_expr(0)?;
        let body = self.parse_scope()?;
        Ok(Stmt::If { cond, body })
      }
      // `const` only commits once the full `const <ident> =` prefix is present.
      Some(TokenKind::ConstKw)
        if self.stream.peek_kind(1) == Some(TokenKind::Ident)
          && self.stream.peek_kind(2) == Some(TokenKind::Assign) =>
      {
        self.stream.advance();
        let name = self.parse_lexeme();
        self.stream.advance();
        let value = self.parse_expr(0)?;
        self.stream.skip(TokenKind::Semicolon)?;
        Ok(Stmt::ConstDecl { name, value })
      }
      Some(TokenKind::LBrace) => Ok(Stmt::Scope(self.parse_scope()?)),
      _ => Err(self.stream.error_here("expected statement")),
    }
  }

  fn parse_scope(&mut self) -> CompileResult<Scope<'a>> {
    self.stream.skip(TokenKind::LBrace)?;
    let mut stmts = Vec::new();
    while !self.stream.is_eof() && self.stream.peek_kind(0) != Some(TokenKind::RBrace) {
      stmts.push(self.parse_stmt()?);
    }
    self.stream.skip(TokenKind::RBrace)?;
    Ok(Scope {
      stmts: self.arena.alloc_stmts(stmts),
    })
  }

  fn parse_expr(&mut self, min_prec: u8) -> CompileResult<Expr<'a>> {
    let mut lhs = Expr::Term(self.parse_term()?);

    loop {
      let Some(op) = self.stream.peek_kind(0).and_then(BinaryOp::from_token) else {
        break;
      };
      if op.precedence() < min_prec {
        break;
      }
      self.stream.advance();
      let rhs = self.parse_expr(op.precedence() + 1)?;
      lhs = Expr::Bin(BinExpr {
        op,
        lhs: self.arena.alloc_expr(lhs),
        rhs: self.arena.alloc_expr(rhs),
      });
    }

    Ok(lhs)
  }

  fn parse_term(&mut self) -> CompileResult<Term<'a>> {
    match self.stream.peek_kind(0) {
      Some(TokenKind::IntLit) => Ok(Term::IntLit(self.parse_lexeme())),
      Some(TokenKind::Ident) => Ok(Term::Ident(self.parse_lexeme())),
      Some(TokenKind::LParen) => {
        self.stream.advance();
        let inner = self.parse_expr(0)?;
        self.stream.skip(TokenKind::RParen)?;
        Ok(Term::Paren(self.arena.alloc_expr(inner)))
      }
      _ => Err(self.stream.error_here("expected expression")),
    }
  }

  /// Copy the current token's text into the arena and consume it. Callers
  /// have already checked the token kind.
  fn parse_lexeme(&mut self) -> Lexeme<'a> {
    let lexeme = match self.stream.peek() {
      Some(token) => Lexeme::new(self.arena.alloc_str(token.lexeme()), token.loc),
      None => Lexeme::new("", self.stream.source.len()),
    };
    self.stream.advance();
    lexeme
  }
}

/// Lightweight cursor over the token vector.
struct TokenStream<'src> {
  tokens: Vec<Token>,
  source: &'src str,
  pos: usize,
}

impl<'src> TokenStream<'src> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'src str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
    self.tokens.get(self.pos + offset).map(|token| token.kind)
  }

  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.peek_kind(0) == Some(kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.equal(kind) {
      Ok(())
    } else {
      Err(self.error_here(&format!("expected '{}'", kind.spelling())))
    }
  }

  /// Syntax error pointing at the current token, or at the end of input.
  fn error_here(&self, what: &str) -> CompileError {
    let loc = self.peek().map_or(self.source.len(), |token| token.loc);
    let got = describe_token(self.peek());
    CompileError::syntax(self.source, loc, format!("{what}, but got {got}"))
  }

  fn is_eof(&self) -> bool {
    self.pos >= self.tokens.len()
  }
}
