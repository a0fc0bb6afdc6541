//! Debug renderings of the token stream and the syntax tree.
//!
//! Nothing in the pipeline depends on these; the driver prints them for
//! `--tokens` and `--ast`.

use std::fmt::Write as _;

use crate::ast::{Expr, Program, Stmt, Term};
use crate::tokenizer::Token;

/// One `Token(kind)` or `Token(kind, value="text")` line per token.
pub fn dump_tokens(tokens: &[Token]) -> String {
  let mut out = String::new();
  for token in tokens {
    match &token.text {
      Some(text) => {
        let _ = writeln!(out, "Token({}, value=\"{text}\")", token.kind.name());
      }
      None => {
        let _ = writeln!(out, "Token({})", token.kind.name());
      }
    }
  }
  out
}

/// Indented tree, two spaces per level.
pub fn dump_program(program: &Program) -> String {
  let mut printer = TreePrinter::default();
  printer.line(0, "Program:");
  for stmt in program.stmts {
    printer.stmt(stmt, 1);
  }
  printer.out
}

#[derive(Default)]
struct TreePrinter {
  out: String,
}

impl TreePrinter {
  fn line(&mut self, indent: usize, text: &str) {
    let _ = writeln!(self.out, "{}{text}", "  ".repeat(indent));
  }

  fn stmt(&mut self, stmt: &Stmt, indent: usize) {
    match stmt {
      Stmt::Exit(expr) => {
        self.line(indent, "Exit:");
        self.expr(expr, indent + 1);
      }
      Stmt::Print(expr) => {
        self.line(indent, "Print:");
        self.expr(expr, indent + 1);
      }
      Stmt::ConstDecl { name, value } => {
        self.line(indent, &format!("ConstDecl({}):", name.text));
        self.expr(value, indent + 1);
      }
      Stmt::If { cond, body } => {
        self.line(indent, "If:");
        self.expr(cond, indent + 1);
        self.line(indent + 1, "Scope:");
        for inner in body.stmts {
          self.stmt(inner, indent + 2);
        }
      }
      Stmt::Scope(scope) => {
        self.line(indent, "Scope:");
        for inner in scope.stmts {
          self.stmt(inner, indent + 1);
        }
      }
    }
  }

  fn expr(&mut self, expr: &Expr, indent: usize) {
    match expr {
      Expr::Term(Term::IntLit(lit)) => self.line(indent, &format!("IntLit({})", lit.text)),
      Expr::Term(Term::Ident(ident)) => self.line(indent, &format!("Ident({})", ident.text)),
      Expr::Term(Term::Paren(inner)) => {
        self.line(indent, "Paren:");
        self.expr(inner, indent + 1);
      }
      Expr::Bin(bin) => {
        self.line(indent, &format!("BinExpr({:?}):", bin.op));
        self.expr(bin.lhs, indent + 1);
        self.expr(bin.rhs, indent + 1);
      }
    }
  }
}
