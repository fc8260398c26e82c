// solc-bridge CLI
//
// Compiles every Solidity file under a directory with an embedded solc-js release
// and writes one JSON artifact per contract.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use solc_bridge::{
  ArtifactLayout, ArtifactWriter, Compiler, CompilerConfigOptions, CompilerResponse,
  ContractBytecode, OptimizerOptions, SourceSet, DEFAULT_OUTPUT_DIR,
};

/// Compile Solidity contracts with solc-js running in an embedded V8 isolate
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
  /// Directory searched recursively for `.sol` files
  contracts_dir: PathBuf,

  /// Target EVM version (defaults to cancun)
  #[clap(long)]
  evm_version: Option<String>,

  /// Enable the optimizer
  #[clap(long)]
  optimize: bool,

  /// Optimizer runs
  #[clap(long)]
  optimizer_runs: Option<u32>,

  /// Path to an alternate soljson.js release
  #[clap(long = "solc-js")]
  solc_js: Option<PathBuf>,

  /// Directory artifacts are written to
  #[clap(long, default_value = DEFAULT_OUTPUT_DIR)]
  out_dir: PathBuf,

  /// Write the complete compiler output per contract instead of abi + bytecode
  #[clap(long)]
  full_artifacts: bool,

  /// Abort compilation after this many seconds
  #[clap(long)]
  timeout_secs: Option<u64>,

  /// JSON file with compiler options; flags take precedence
  #[clap(long)]
  config: Option<PathBuf>,
}

impl Cli {
  fn options(&self) -> Result<CompilerConfigOptions> {
    let base = match &self.config {
      Some(path) => CompilerConfigOptions::from_json_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
      None => CompilerConfigOptions::default(),
    };
    let optimizer = (self.optimize || self.optimizer_runs.is_some()).then(|| OptimizerOptions {
      enabled: self.optimize.then_some(true),
      runs: self.optimizer_runs,
    });
    let flags = CompilerConfigOptions {
      evm_version: self.evm_version.clone(),
      optimizer,
      module_path: self.solc_js.clone(),
      timeout_ms: self.timeout_secs.map(|secs| secs.saturating_mul(1000)),
    };
    Ok(base.overlay(flags))
  }

  fn layout(&self) -> ArtifactLayout {
    if self.full_artifacts {
      ArtifactLayout::Full
    } else {
      ArtifactLayout::Minimal
    }
  }
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  match run(&cli) {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::FAILURE,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

/// Returns `false` when solc reported at least one error.
fn run(cli: &Cli) -> Result<bool> {
  let compiler = Compiler::new(Some(cli.options()?)).context("Failed to set up the compiler")?;

  let sources = SourceSet::from_dir(&cli.contracts_dir).with_context(|| {
    format!(
      "Failed to collect sources from {}",
      cli.contracts_dir.display()
    )
  })?;
  if sources.is_empty() {
    log::warn!("no .sol files found under {}", cli.contracts_dir.display());
  }

  let response = compiler.compile(&sources).context("Compilation failed")?;
  report_diagnostics(&response);
  if response.has_compiler_errors() {
    return Ok(false);
  }

  log_bytecode_sizes(&response);
  let written = ArtifactWriter::new(&cli.out_dir)
    .layout(cli.layout())
    .write(&response)
    .context("Failed to write artifacts")?;
  println!(
    "Compiled {} contracts from {} files into {}",
    written.len(),
    sources.len(),
    cli.out_dir.display()
  );
  Ok(true)
}

fn report_diagnostics(response: &CompilerResponse) {
  for diagnostic in response.errors() {
    eprintln!("{diagnostic}");
  }
}

fn log_bytecode_sizes(response: &CompilerResponse) {
  for artifact in response.artifacts() {
    let Ok(object) = artifact.creation_bytecode() else {
      log::debug!("{} has no creation bytecode", artifact.name());
      continue;
    };
    match ContractBytecode::from_hex(artifact.name(), object) {
      Ok(bytecode) => log::info!("{}: {} bytes", artifact.name(), bytecode.len()),
      Err(err) => log::info!("{}: {err}", artifact.name()),
    }
  }
}
