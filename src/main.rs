use std::env;
use std::fs;
use std::io;
use std::process;

use anyhow::Context;
use rstackc::cli::{CliError, Config, LOG_ENV, Mode};
use rstackc::link::{Toolchain, assemble_and_link};
use rstackc::{Arena, CompileError, codegen, dump, parser, tokenizer};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let config = match Config::build(env::args().skip(1), |key| env::var(key).ok()) {
    Ok(config) => config,
    Err(CliError::HelpRequested) => {
      let _ = Config::print_help(io::stdout());
      return;
    }
    Err(err) => {
      eprintln!("rstackc: {err}");
      let _ = Config::print_help(io::stderr());
      process::exit(1);
    }
  };

  if let Err(err) = run(&config) {
    match err.downcast_ref::<CompileError>() {
      Some(compile_err) => eprintln!("{}: {compile_err}", config.input_path.display()),
      None => eprintln!("rstackc: {err:#}"),
    }
    process::exit(1);
  }
}

fn run(config: &Config) -> anyhow::Result<()> {
  let source = fs::read_to_string(&config.input_path)
    .with_context(|| format!("reading {}", config.input_path.display()))?;
  debug!(path = %config.input_path.display(), bytes = source.len(), "read source");

  let tokens = tokenizer::tokenize(&source)?;
  if config.mode == Mode::Tokens {
    return emit(config, &dump::dump_tokens(&tokens));
  }

  let arena = Arena::new();
  let program = parser::parse(tokens, &source, &arena)?;
  if config.mode == Mode::Ast {
    return emit(config, &dump::dump_program(&program));
  }

  let asm = codegen::generate(&program, &source)?;
  match (config.mode, config.output_path()) {
    (Mode::Build, Some(out_exe)) => {
      let toolchain = Toolchain::locate(&config.assembler, &config.linker)?;
      assemble_and_link(&toolchain, &asm, &out_exe, &config.runtime)
    }
    _ => emit(config, &asm),
  }
}

fn emit(config: &Config, text: &str) -> anyhow::Result<()> {
  match config.output_path() {
    Some(path) => {
      fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
    }
    None => {
      print!("{text}");
      Ok(())
    }
  }
}
