//! Bulk storage for AST nodes.
//!
//! The parser allocates every node of one compilation from a single arena and
//! hands out shared references tied to the arena's lifetime. Nothing is freed
//! individually; dropping the arena releases the whole tree at once. Nodes
//! only hold references and `&str`, so skipping their destructors is fine.

use bumpalo::Bump;

use crate::ast::{Expr, Stmt};

#[derive(Default)]
pub struct Arena {
  bump: Bump,
}

impl Arena {
  pub fn new() -> Self {
    Self { bump: Bump::new() }
  }

  pub fn alloc_expr<'a>(&'a self, expr: Expr<'a>) -> &'a Expr<'a> {
    self.bump.alloc(expr)
  }

  /// Move a finished statement list into the arena.
  pub fn alloc_stmts<'a>(&'a self, stmts: Vec<Stmt<'a>>) -> &'a [Stmt<'a>] {
    self.bump.alloc_slice_fill_iter(stmts)
  }

  /// Copy token text into the arena so the AST does not borrow the token vector.
  pub fn alloc_str(&self, text: &str) -> &str {
    self.bump.alloc_str(text)
  }

  pub fn allocated_bytes(&self) -> usize {
    self.bump.allocated_bytes()
  }
}
