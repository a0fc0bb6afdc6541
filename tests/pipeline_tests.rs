//! End-to-end tests. Programs are compiled in-process. The tests that also
//! assemble, link and run the result need `nasm` and `ld` on an x86-64 Linux
//! host; they are ignored by default and run with `cargo test -- --ignored`.

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstackc::link::{Toolchain, assemble_and_link};
use rstackc::{ErrorKind, generate_assembly};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

struct Run {
  status: Option<i32>,
  stdout: String,
}

fn scratch_dir() -> PathBuf {
  let dir = std::env::temp_dir().join(format!(
    "rstackc-test-{}-{}",
    std::process::id(),
    NEXT_DIR.fetch_add(1, Ordering::SeqCst)
  ));
  std::fs::create_dir_all(&dir).expect("create scratch dir");
  dir
}

fn toolchain() -> Toolchain {
  assert!(
    cfg!(all(target_os = "linux", target_arch = "x86_64")),
    "execution tests only run on x86-64 Linux"
  );
  Toolchain::locate("nasm", "ld").unwrap_or_else(|err| panic!("execution tests need nasm and ld: {err}"))
}

/// Build the test runtime that provides `print_int`.
fn runtime_object(toolchain: &Toolchain, dir: &std::path::Path) -> PathBuf {
  let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/print_int.asm");
  let obj = dir.join("print_int.o");
  let status = Command::new(&toolchain.assembler)
    .arg("-felf64")
    .arg(&fixture)
    .arg("-o")
    .arg(&obj)
    .status()
    .expect("run assembler on runtime");
  assert!(status.success(), "assembling runtime failed");
  obj
}

/// Compile, assemble, link and run `source`.
fn run(source: &str) -> Run {
  let asm = generate_assembly(source).unwrap_or_else(|err| panic!("{err}"));
  let toolchain = toolchain();
  let dir = scratch_dir();
  let runtime = vec![runtime_object(&toolchain, &dir)];
  let exe = dir.join("prog");
  assemble_and_link(&toolchain, &asm, &exe, &runtime).expect("assemble and link");
  let output = Command::new(&exe).output().expect("run compiled program");
  let _ = std::fs::remove_dir_all(&dir);
  Run {
    status: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
  }
}

fn assert_exit(source: &str, expected: i32) {
  assert_eq!(run(source).status, Some(expected), "{source}");
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn multiplication_binds_tighter() {
  assert_exit("exit 1 + 2 * 3;", 7);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn subtraction_is_left_associative() {
  assert_exit("exit 10 - 3 - 2;", 5);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn parentheses_override_precedence() {
  assert_exit("exit (1 + 2) * 3;", 9);
  assert_exit("exit 10 - (3 - 2);", 9);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn division_and_modulo() {
  assert_exit("exit 7 / 2;", 3);
  assert_exit("exit 7 % 2;", 1);
  assert_exit("exit 20 / 2 / 5;", 2);
  assert_exit("exit 17 % 10 % 4;", 3);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn comparisons_produce_zero_or_one() {
  assert_exit("exit 3 < 5;", 1);
  assert_exit("exit 3 > 5;", 0);
  assert_exit("exit 5 <= 5;", 1);
  assert_exit("exit 4 >= 5;", 0);
  assert_exit("exit 2 + 2 == 4;", 1);
  assert_exit("exit 2 != 2;", 0);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn inner_scope_shadows_outer_binding() {
  assert_exit("const x = 1;\n{\nconst x = 2;\nexit x;\n}", 2);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn outer_binding_is_restored_after_block() {
  assert_exit("const x = 1;\n{\nconst x = 2;\n}\nexit x;", 1);
  assert_exit("const x = 1;\n{\nconst x = 2;\n}\nconst y = x + 10;\nexit y;", 11);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn outer_name_may_be_declared_again_after_block() {
  assert_exit("const x = 1;\n{\nconst x = 2;\n}\nconst x = 3;\nexit x;", 3);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn variables_combine_with_temporaries() {
  assert_exit("const a = 6;\nconst b = 4;\nexit a * b - a / b;", 23);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn skipped_if_body_keeps_stack_consistent() {
  assert_exit("const a = 7;\nif 0 {\nconst b = 1;\nconst c = 2;\n}\nexit a;", 7);
  assert_exit("const a = 7;\nif 1 {\nconst b = 1;\n}\nexit a;", 7);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn taken_if_body_can_exit() {
  assert_exit("const x = 5;\nif x > 3 {\nexit x + 1;\n}", 6);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn falling_off_the_end_exits_with_zero() {
  assert_exit("const x = 5;", 0);
  assert_exit("", 0);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn print_writes_through_runtime() {
  let source = "const x = 3;\nprint x * 2;\nif x == 3 {\nprint 0 - 4;\n}\nexit 0;";
  let result = run(source);
  assert_eq!(result.status, Some(0));
  assert_eq!(result.stdout.lines().collect::<Vec<_>>(), vec!["6", "-4", ""]);
}

#[test]
fn code_after_exit_is_not_emitted() {
  let asm = generate_assembly("exit 4;\nprint 123;\nexit 5;").unwrap();
  assert!(!asm.contains("123"));
  assert!(!asm.contains("call print_int"));
  assert_eq!(asm.matches("mov rax, 60").count(), 1);
}

#[test]
#[ignore = "needs nasm and ld on x86-64 Linux"]
fn first_exit_decides_the_status() {
  assert_exit("exit 4;\nprint 123;\nexit 5;", 4);
}

#[test]
fn execution_programs_compile_without_a_toolchain() {
  for source in [
    "exit 1 + 2 * 3;",
    "exit 10 - (3 - 2);",
    "exit 17 % 10 % 4;",
    "exit 2 + 2 == 4;",
    "const x = 1;\n{\nconst x = 2;\n}\nconst x = 3;\nexit x;",
    "const a = 7;\nif 0 {\nconst b = 1;\nconst c = 2;\n}\nexit a;",
    "const x = 3;\nprint x * 2;\nif x == 3 {\nprint 0 - 4;\n}\nexit 0;",
    "",
  ] {
    let asm = generate_assembly(source).unwrap_or_else(|err| panic!("{source:?}: {err}"));
    assert!(asm.contains("global _start"), "{source:?}");
  }
}

#[test]
fn closing_an_empty_block_does_not_allow_redeclaration() {
  for source in [
    "const x = 1;\n{\n}\nconst x = 2;\nexit x;",
    "const x = 1;\nif 0 {\n}\nconst x = 2;\nexit x;",
  ] {
    let err = generate_assembly(source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Semantic, "{source:?}");
    assert!(err.message().contains("already declared"), "{source:?}");
  }
}

#[test]
fn redeclaration_in_same_block_fails() {
  let err = generate_assembly("const x = 1;\nconst x = 2;\nexit x;").unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Semantic);
  assert!(err.message().contains("already declared"));
}

#[test]
fn undeclared_variable_fails() {
  let err = generate_assembly("exit y;").unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Semantic);
  assert!(err.message().contains("not declared"));
}

#[test]
fn first_error_wins_across_stages() {
  // The lexical error on line 2 is reported even though line 1 would fail
  // semantic checks later.
  let err = generate_assembly("exit y;\nexit 1 $ 2;").unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Lexical);

  let err = generate_assembly("exit y;\nexit (1;").unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn diagnostics_point_at_the_offending_line() {
  let err = generate_assembly("const a = 1;\nexit a + b;").unwrap_err();
  let rendered = err.to_string();
  assert!(rendered.starts_with("semantic error at 2:10: variable 'b' not declared"));
  assert!(rendered.ends_with("    exit a + b;\n             ^"));
}
