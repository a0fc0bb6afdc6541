//! Driver configuration: command-line flags plus environment overrides.

use std::io;
use std::path::{Path, PathBuf};

use snafu::Snafu;

pub const ASSEMBLER_ENV: &str = "RSTACKC_AS";
pub const LINKER_ENV: &str = "RSTACKC_LD";
pub const LOG_ENV: &str = "RSTACKC_LOG";

const DEFAULT_ASSEMBLER: &str = "nasm";
const DEFAULT_LINKER: &str = "ld";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
  /// Print the token stream and stop.
  Tokens,
  /// Print the syntax tree and stop.
  Ast,
  /// Write the generated assembly and stop.
  Asm,
  /// Assemble and link an executable.
  #[default]
  Build,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CliError {
  #[snafu(display("no input file"))]
  NoInput,

  #[snafu(display("unknown option '{option}'"))]
  UnknownOption { option: String },

  #[snafu(display("option '{option}' requires a path"))]
  MissingValue { option: String },

  #[snafu(display("unexpected argument '{arg}'"))]
  UnexpectedArg { arg: String },

  #[snafu(display("help requested"))]
  HelpRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub mode: Mode,
  pub input_path: PathBuf,
  output_path: Option<PathBuf>,
  /// Extra objects handed to the linker, e.g. the `print_int` runtime.
  pub runtime: Vec<PathBuf>,
  pub assembler: String,
  pub linker: String,
}

impl Config {
  pub fn print_help(mut stream: impl io::Write) -> io::Result<()> {
    writeln!(stream, "Usage: rstackc [options] <input>")?;
    writeln!(stream, "Options:")?;
    writeln!(stream, "  --tokens         Print tokens and stop")?;
    writeln!(stream, "  --ast            Print the syntax tree and stop")?;
    writeln!(stream, "  -S               Write assembly only")?;
    writeln!(stream, "  -o <path>        Output file path")?;
    writeln!(stream, "  --runtime <obj>  Extra object to link (repeatable)")?;
    writeln!(stream, "  -h, --help       Print this help message")?;
    writeln!(stream, "Environment:")?;
    writeln!(stream, "  {ASSEMBLER_ENV}  assembler (default: {DEFAULT_ASSEMBLER})")?;
    writeln!(stream, "  {LINKER_ENV}  linker (default: {DEFAULT_LINKER})")?;
    writeln!(stream, "  {LOG_ENV} log filter (default: warn)")?;
    Ok(())
  }

  /// Build a config from the arguments after the executable name. `env`
  /// looks up environment variables so tests can supply their own.
  pub fn build(
    mut args: impl Iterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
  ) -> Result<Self, CliError> {
    let mut mode = Mode::default();
    let mut input_path = None;
    let mut output_path = None;
    let mut runtime = Vec::new();

    while let Some(arg) = args.next() {
      match arg.as_str() {
        "--tokens" => mode = Mode::Tokens,
        "--ast" => mode = Mode::Ast,
        "-S" => mode = Mode::Asm,
        "-o" => {
          let path = args.next().ok_or(CliError::MissingValue { option: arg })?;
          output_path = Some(PathBuf::from(path));
        }
        "--runtime" => {
          let path = args.next().ok_or(CliError::MissingValue { option: arg })?;
          runtime.push(PathBuf::from(path));
        }
        "-h" | "--help" => return Err(CliError::HelpRequested),
        _ if arg.starts_with('-') => return Err(CliError::UnknownOption { option: arg }),
        _ if input_path.is_none() => input_path = Some(PathBuf::from(arg)),
        _ => return Err(CliError::UnexpectedArg { arg }),
      }
    }

    let Some(input_path) = input_path else {
      return Err(CliError::NoInput);
    };

    Ok(Self {
      mode,
      input_path,
      output_path,
      runtime,
      assembler: env(ASSEMBLER_ENV).unwrap_or_else(|| DEFAULT_ASSEMBLER.to_string()),
      linker: env(LINKER_ENV).unwrap_or_else(|| DEFAULT_LINKER.to_string()),
    })
  }

  /// Where the output goes. `None` means stdout, which is the default for
  /// the dump modes.
  pub fn output_path(&self) -> Option<PathBuf> {
    if self.output_path.is_some() {
      return self.output_path.clone();
    }
    match self.mode {
      Mode::Tokens | Mode::Ast => None,
      Mode::Asm => Some(self.input_path.with_extension("asm")),
      Mode::Build => Some(default_executable(&self.input_path)),
    }
  }
}

fn default_executable(input: &Path) -> PathBuf {
  let exe = input.with_extension("");
  // `prog` with no extension would otherwise overwrite its own source.
  if exe == input {
    input.with_extension("out")
  } else {
    exe
  }
}
