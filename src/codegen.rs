//! Code generation: lower the parsed program into x86-64 NASM assembly.
//!
//! The emitter is a plain stack machine. Every expression leaves exactly one
//! 8-byte cell on the runtime stack, and `stack_size` mirrors how many cells
//! the emitted code has pushed at the current point. Locals are never given a
//! frame: a `const` simply claims the cell its initializer is pushed into, and
//! later reads address it relative to `rsp` using the current `stack_size`.
//!
//! Names resolve through one flat map plus a stack of undo frames. Declaring a
//! name records whatever binding it replaced in the innermost frame; leaving
//! the block replays those records, so shadowed outer bindings come back
//! exactly and names introduced inside the block disappear. A name may not be
//! declared twice in the same block. The one exception is a name a nested
//! block shadowed and then restored on exit: it may be bound once more.
//!
//! Emission stops after the first `exit` statement reached by the top-level
//! traversal. This follows traversal order only, not runtime reachability: an
//! `exit` nested in a block still ends lowering once that block is finished,
//! and an `exit` in an `if` body does the same even though the branch may be
//! skipped at runtime.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use tracing::{debug, trace};

use crate::ast::{BinExpr, BinaryOp, Expr, Lexeme, Program, Scope, Stmt, Term};
use crate::error::{CompileError, CompileResult};

/// Size of one operand-stack cell in bytes.
pub const CELL_SIZE: usize = 8;

/// Routine provided by the runtime that prints the integer in `rdi`.
pub const PRINT_ROUTINE: &str = "print_int";

/// Entry point symbol of the generated program.
pub const ENTRY_POINT: &str = "_start";

/// Emit assembly for a whole program. `source` is only used to render
/// diagnostics for semantic errors.
pub fn generate(program: &Program, source: &str) -> CompileResult<String> {
  let mut generator = Generator::new(source);
  generator.gen_program(program)?;
  debug!(
    bytes = generator.asm.len(),
    labels = generator.label_count,
    "generated assembly"
  );
  Ok(generator.asm)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Var {
  stack_slot: usize,
}

/// Undo record: the binding `name` had before the frame rebound it.
#[derive(Debug)]
struct ScopeEntry<'a> {
  name: &'a str,
  shadowed: Option<Var>,
}

#[derive(Debug, Default)]
struct Frame<'a> {
  entries: Vec<ScopeEntry<'a>>,
  /// Names a closed child frame shadowed and restored; one more declaration
  /// of each is allowed here.
  reopened: HashSet<&'a str>,
  /// `stack_size` when the frame was opened.
  base: usize,
}

struct Generator<'a, 'src> {
  source: &'src str,
  asm: String,
  stack_size: usize,
  label_count: usize,
  vars: HashMap<&'a str, Var>,
  scopes: Vec<Frame<'a>>,
  is_terminated: bool,
}

impl<'a, 'src> Generator<'a, 'src> {
  fn new(source: &'src str) -> Self {
    Self {
      source,
      asm: String::new(),
      stack_size: 0,
      label_count: 0,
      vars: HashMap::new(),
      // Top-level declarations live in an implicit outermost frame.
      scopes: vec![Frame::default()],
      is_terminated: false,
    }
  }

  fn gen_program(&mut self, program: &Program<'a>) -> CompileResult<()> {
    self.asm.push_str(&format!("extern {PRINT_ROUTINE}\n"));
    self.asm.push_str(&format!("global {ENTRY_POINT}\n"));
    self.asm.push_str("section .text\n");
    self.asm.push_str(&format!("{ENTRY_POINT}:\n"));

    for stmt in program.stmts {
      if self.is_terminated {
        break;
      }
      self.gen_stmt(stmt)?;
    }

    if !self.is_terminated {
      self.emit("mov rax, 0");
      self.push("rax");
      self.gen_exit();
    }
    Ok(())
  }

  fn gen_stmt(&mut self, stmt: &Stmt<'a>) -> CompileResult<()> {
    match stmt {
      Stmt::Exit(expr) => {
        self.gen_expr(expr)?;
        self.gen_exit();
      }
      Stmt::Print(expr) => {
        self.gen_expr(expr)?;
        self.pop("rdi");
        // Keep the call ABI-aligned; rbx is callee-saved so it survives the call.
        self.emit("mov rbx, rsp");
        self.emit("and rsp, -16");
        self.emit(&format!("call {PRINT_ROUTINE}"));
        self.emit("mov rsp, rbx");
      }
      Stmt::If { cond, body } => {
        self.gen_expr(cond)?;
        self.pop("rax");
        let label = self.create_label();
        self.emit("test rax, rax");
        self.emit(&format!("jz {label}"));
        self.gen_scope(body)?;
        self.asm.push_str(&format!("{label}:\n"));
      }
      Stmt::ConstDecl { name, value } => {
        if self.is_declared_in_scope(name.text) {
          return Err(CompileError::semantic(
            self.source,
            name.loc,
            format!("variable '{}' already declared in this scope", name.text),
          ));
        }
        // The slot is the cell the initializer's value will land in. The name
        // is bound afterwards so the initializer still sees any outer binding.
        let stack_slot = self.stack_size;
        self.gen_expr(value)?;
        self.declare_var(name.text, Var { stack_slot });
      }
      Stmt::Scope(scope) => self.gen_scope(scope)?,
    }
    Ok(())
  }

  fn gen_scope(&mut self, scope: &Scope<'a>) -> CompileResult<()> {
    self.enter_scope();
    for stmt in scope.stmts {
      self.gen_stmt(stmt)?;
    }
    self.exit_scope();
    Ok(())
  }

  fn gen_expr(&mut self, expr: &Expr<'a>) -> CompileResult<()> {
    match expr {
      Expr::Term(term) => self.gen_term(term),
      Expr::Bin(bin) => self.gen_bin_expr(bin),
    }
  }

  fn gen_term(&mut self, term: &Term<'a>) -> CompileResult<()> {
    match term {
      Term::IntLit(lit) => {
        self.emit(&format!("mov rax, {}", lit.text));
        self.push("rax");
      }
      Term::Ident(ident) => {
        let var = self.lookup(ident)?;
        let offset = (self.stack_size - var.stack_slot - 1) * CELL_SIZE;
        self.push(&format!("QWORD [rsp + {offset}]"));
      }
      Term::Paren(inner) => self.gen_expr(inner)?,
    }
    Ok(())
  }

  /// Operands are evaluated so that the left operand ends up on top of the
  /// stack and pops into `rax`, with the right operand in `rbx`. Commutative
  /// operators may evaluate left to right instead.
  fn gen_bin_expr(&mut self, bin: &BinExpr<'a>) -> CompileResult<()> {
    if bin.op.is_commutative() {
      self.gen_expr(bin.lhs)?;
      self.gen_expr(bin.rhs)?;
    } else {
      self.gen_expr(bin.rhs)?;
      self.gen_expr(bin.lhs)?;
    }
    self.pop("rax");
    self.pop("rbx");

    let result = match bin.op {
      BinaryOp::Add => {
        self.emit("add rax, rbx");
        "rax"
      }
      BinaryOp::Sub => {
        self.emit("sub rax, rbx");
        "rax"
      }
      BinaryOp::Mul => {
        self.emit("imul rax, rbx");
        "rax"
      }
      BinaryOp::Div | BinaryOp::Mod => {
        // rdx:rax / rbx -> quotient in rax, remainder in rdx
        self.emit("cqo");
        self.emit("idiv rbx");
        if bin.op == BinaryOp::Mod { "rdx" } else { "rax" }
      }
      BinaryOp::Eq => self.gen_compare("sete"),
      BinaryOp::Neq => self.gen_compare("setne"),
      BinaryOp::Lt => self.gen_compare("setl"),
      BinaryOp::Gt => self.gen_compare("setg"),
      BinaryOp::Lte => self.gen_compare("setle"),
      BinaryOp::Gte => self.gen_compare("setge"),
    };
    self.push(result);
    Ok(())
  }

  /// `rax <op> rbx` as 0 or 1 in `rax`.
  fn gen_compare(&mut self, set: &str) -> &'static str {
    self.emit("cmp rax, rbx");
    self.emit(&format!("{set} al"));
    self.emit("movzx rax, al");
    "rax"
  }

  /// Write a trailing newline to stdout, then exit with the status on top of
  /// the stack.
  fn gen_exit(&mut self) {
    self.emit("mov rax, 1");
    self.emit("mov rdi, 1");
    self.emit("lea rsi, [rsp - 1]");
    self.emit("mov byte [rsp - 1], 10");
    self.emit("mov rdx, 1");
    self.emit("syscall");
    self.emit("mov rax, 60");
    self.pop("rdi");
    self.emit("syscall");
    self.is_terminated = true;
  }

  fn emit(&mut self, instr: &str) {
    let _ = writeln!(self.asm, "    {instr}");
  }

  fn push(&mut self, operand: &str) {
    self.emit(&format!("push {operand}"));
    self.stack_size += 1;
  }

  fn pop(&mut self, reg: &str) {
    self.emit(&format!("pop {reg}"));
    self.stack_size -= 1;
  }

  fn create_label(&mut self) -> String {
    let label = format!("label{}", self.label_count);
    self.label_count += 1;
    label
  }

  fn lookup(&self, ident: &Lexeme<'a>) -> CompileResult<Var> {
    self.vars.get(ident.text).copied().ok_or_else(|| {
      CompileError::semantic(
        self.source,
        ident.loc,
        format!("variable '{}' not declared", ident.text),
      )
    })
  }

  fn enter_scope(&mut self) {
    trace!(depth = self.scopes.len(), stack_size = self.stack_size, "enter scope");
    self.scopes.push(Frame {
      entries: Vec::new(),
      reopened: HashSet::new(),
      base: self.stack_size,
    });
  }

  /// Undo every binding the innermost frame made and drop the cells its
  /// declarations pushed.
  fn exit_scope(&mut self) {
    let Some(frame) = self.scopes.pop() else {
      return;
    };
    let mut restored = Vec::new();
    for entry in frame.entries.into_iter().rev() {
      match entry.shadowed {
        Some(var) => {
          self.vars.insert(entry.name, var);
          restored.push(entry.name);
        }
        None => {
          self.vars.remove(entry.name);
        }
      }
    }

    if let Some(parent) = self.scopes.last_mut() {
      parent.reopened.extend(restored);
    }

    let pop_count = self.stack_size - frame.base;
    if pop_count > 0 {
      self.emit(&format!("add rsp, {}", pop_count * CELL_SIZE));
      self.stack_size = frame.base;
    }
    trace!(depth = self.scopes.len(), pop_count, "exit scope");
  }

  fn declare_var(&mut self, name: &'a str, var: Var) {
    let shadowed = self.vars.insert(name, var);
    trace!(name, slot = var.stack_slot, shadows = shadowed.is_some(), "declare variable");
    if let Some(frame) = self.scopes.last_mut() {
      frame.reopened.remove(name);
      frame.entries.push(ScopeEntry { name, shadowed });
    }
  }

  fn is_declared_in_scope(&self, name: &str) -> bool {
    self
      .scopes
      .last()
      .is_some_and(|frame| {
        !frame.reopened.contains(name) && frame.entries.iter().any(|entry| entry.name == name)
      })
  }
}
