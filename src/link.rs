//! Turn generated assembly into an executable with the external toolchain.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

/// Resolved assembler and linker programs.
#[derive(Debug, Clone)]
pub struct Toolchain {
  pub assembler: PathBuf,
  pub linker: PathBuf,
}

impl Toolchain {
  /// Look both programs up on `PATH`.
  pub fn locate(assembler: &str, linker: &str) -> Result<Self> {
    let assembler =
      which::which(assembler).with_context(|| format!("assembler '{assembler}' not found"))?;
    let linker = which::which(linker).with_context(|| format!("linker '{linker}' not found"))?;
    Ok(Self { assembler, linker })
  }
}

/// Write `asm` next to `out_exe`, assemble it as ELF64 and link it together
/// with `runtime` into `out_exe`.
pub fn assemble_and_link(
  toolchain: &Toolchain,
  asm: &str,
  out_exe: &Path,
  runtime: &[PathBuf],
) -> Result<()> {
  let asm_path = out_exe.with_extension("asm");
  let obj_path = out_exe.with_extension("o");

  std::fs::write(&asm_path, asm).with_context(|| format!("writing {}", asm_path.display()))?;

  info!(assembler = %toolchain.assembler.display(), input = %asm_path.display(), "assembling");
  let status = Command::new(&toolchain.assembler)
    .arg("-felf64")
    .arg(&asm_path)
    .arg("-o")
    .arg(&obj_path)
    .status()
    .with_context(|| format!("running {}", toolchain.assembler.display()))?;
  if !status.success() {
    bail!("assembler failed with {status}");
  }

  info!(linker = %toolchain.linker.display(), output = %out_exe.display(), "linking");
  let status = Command::new(&toolchain.linker)
    .arg("-o")
    .arg(out_exe)
    .arg(&obj_path)
    .args(runtime)
    .status()
    .with_context(|| format!("running {}", toolchain.linker.display()))?;
  if !status.success() {
    bail!("linker failed with {status}");
  }

  Ok(())
}
