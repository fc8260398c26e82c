use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::internal::config::{CompilerConfig, CompilerConfigOptions};
use crate::internal::errors::Result;
use crate::internal::module::{provider_for, CompilerModule};
use crate::sources::SourceSet;
pub use engine::{EngineBridge, TerminationHandle};
pub use input::build_request;
pub use lifecycle::{EnginePhase, EngineState};
pub use output::{decode_response, CompilerResponse};

pub(crate) mod artifacts;
pub mod engine;
pub mod input;
pub mod lifecycle;
pub mod output;


/// Compiler façade that pairs a resolved [`CompilerConfig`] with a loaded solc-js module.
/// Every compilation builds a fresh execution context, so a single instance can be shared
/// freely across threads.
#[derive(Clone, Debug)]
pub struct Compiler {
  config: CompilerConfig,
  module: CompilerModule,
}

impl Compiler {
  /// Create a compiler using the provided options merged on top of the defaults. The module is
  /// loaded from `module_path` when set, otherwise from the default module directory.
  pub fn new(options: Option<CompilerConfigOptions>) -> Result<Self> {
    let config = CompilerConfig::from_options(options)?;
    let module = provider_for(config.module_path.as_deref()).load()?;
    log::debug!("loaded {}", module.label());
    Ok(Self::with_module(config, module))
  }

  /// Use an already loaded module instead of consulting `config.module_path`.
  pub fn with_module(config: CompilerConfig, module: CompilerModule) -> Self {
    Self { config, module }
  }

  pub fn config(&self) -> &CompilerConfig {
    &self.config
  }

  /// Mutate the configuration used by subsequent compilations.
  pub fn config_mut(&mut self) -> &mut CompilerConfig {
    &mut self.config
  }

  pub fn module(&self) -> &CompilerModule {
    &self.module
  }

  /// Compile `sources` and decode the response envelope. Compiler diagnostics, including
  /// errors, are returned as data on the response.
  pub fn compile(&self, sources: &SourceSet) -> Result<CompilerResponse> {
    let raw = self.compile_raw(sources)?;
    decode_response(&raw)
  }

  /// Compile `sources` and return the response string exactly as solc-js produced it.
  pub fn compile_raw(&self, sources: &SourceSet) -> Result<String> {
    let request = build_request(sources, &self.config)?;
    log::debug!(
      "compiling {} sources with {} (evm {}, optimizer {})",
      sources.len(),
      self.module.label(),
      self.config.evm_version,
      self.config.optimizer.enabled
    );

    let bridge = EngineBridge::new();
    match self.config.timeout {
      Some(timeout) => with_deadline(bridge.termination_handle(), timeout, || {
        bridge.invoke(&self.module, &request)
      }),
      None => bridge.invoke(&self.module, &request),
    }
  }
}

// -----------------------------------------------------------------------------
// Deadline
// -----------------------------------------------------------------------------

/// Run `work` while a watchdog thread waits for it. If `timeout` elapses first the
/// watchdog terminates the execution context and `work` observes the termination.
fn with_deadline<T>(
  handle: TerminationHandle,
  timeout: Duration,
  work: impl FnOnce() -> Result<T>,
) -> Result<T> {
  let (done, finished) = mpsc::channel::<()>();
  let watchdog = thread::spawn(move || {
    if let Err(mpsc::RecvTimeoutError::Timeout) = finished.recv_timeout(timeout) {
      log::warn!("compilation exceeded {timeout:?}; terminating execution context");
      handle.terminate();
    }
  });

  let result = work();
  drop(done);
  if watchdog.join().is_err() {
    log::warn!("deadline watchdog panicked");
  }
  result
}
