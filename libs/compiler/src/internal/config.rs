use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::internal::errors::{Error, Result};
use crate::internal::settings::OptimizerSettings;

pub(crate) const DEFAULT_EVM_VERSION: &str = "cancun";

/// Optimizer switch forwarded verbatim to solc. `runs` is serialized even when the
/// optimizer is disabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerConfig {
  pub enabled: bool,
  pub runs: u32,
}

impl OptimizerConfig {
  pub fn new(enabled: bool, runs: u32) -> Self {
    Self { enabled, runs }
  }
}

impl From<OptimizerConfig> for OptimizerSettings {
  fn from(config: OptimizerConfig) -> Self {
    OptimizerSettings {
      enabled: config.enabled,
      runs: config.runs,
    }
  }
}

/// Finalised configuration consumed by the request builder and the compiler facade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerConfig {
  /// Target EVM version. Opaque here; only the embedded compiler validates it.
  pub evm_version: String,
  pub optimizer: OptimizerConfig,
  /// Alternate solc-js module. `None` selects the built-in default version.
  pub module_path: Option<PathBuf>,
  /// Deadline after which the host terminates the execution context.
  pub timeout: Option<Duration>,
}

impl Default for CompilerConfig {
  fn default() -> Self {
    CompilerConfig {
      evm_version: DEFAULT_EVM_VERSION.to_string(),
      optimizer: OptimizerConfig::default(),
      module_path: None,
      timeout: None,
    }
  }
}

impl CompilerConfig {
  pub fn new(evm_version: impl Into<String>, optimizer_enabled: bool, optimizer_runs: u32) -> Self {
    CompilerConfig {
      evm_version: evm_version.into(),
      optimizer: OptimizerConfig::new(optimizer_enabled, optimizer_runs),
      ..Default::default()
    }
  }

  pub fn from_options(options: Option<CompilerConfigOptions>) -> Result<Self> {
    let mut builder = CompilerConfigBuilder::from_defaults();
    if let Some(overrides) = options {
      builder = builder.apply_options(overrides);
    }
    builder.build()
  }

  pub fn merge_options(&self, options: Option<&CompilerConfigOptions>) -> Result<Self> {
    let mut builder = CompilerConfigBuilder::with_base(self.clone());
    if let Some(overrides) = options {
      builder = builder.apply_options(overrides.clone());
    }
    builder.build()
  }
}

/// Strongly-typed overrides that can be merged into a [`CompilerConfig`]. Also the
/// shape of JSON configuration files (camelCase keys).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompilerConfigOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub evm_version: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optimizer: Option<OptimizerOptions>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub module_path: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enabled: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub runs: Option<u32>,
}

impl CompilerConfigOptions {
  /// Read options from a JSON document on disk.
  pub fn from_json_file(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|err| Error::InvalidConfig {
      message: format!("failed to read {}: {err}", path.display()),
    })?;
    Self::from_json_str(&contents)
  }

  pub fn from_json_str(contents: &str) -> Result<Self> {
    serde_json::from_str(contents).map_err(|err| Error::InvalidConfig {
      message: format!("failed to parse compiler options: {err}"),
    })
  }

  /// Layer `other` on top of `self`; fields set in `other` win.
  pub fn overlay(mut self, other: CompilerConfigOptions) -> Self {
    if other.evm_version.is_some() {
      self.evm_version = other.evm_version;
    }
    self.optimizer = match (self.optimizer, other.optimizer) {
      (Some(base), Some(top)) => Some(OptimizerOptions {
        enabled: top.enabled.or(base.enabled),
        runs: top.runs.or(base.runs),
      }),
      (base, top) => top.or(base),
    };
    if other.module_path.is_some() {
      self.module_path = other.module_path;
    }
    if other.timeout_ms.is_some() {
      self.timeout_ms = other.timeout_ms;
    }
    self
  }
}

struct CompilerConfigBuilder {
  config: CompilerConfig,
}

impl CompilerConfigBuilder {
  fn from_defaults() -> Self {
    Self::with_base(CompilerConfig::default())
  }

  fn with_base(config: CompilerConfig) -> Self {
    Self { config }
  }

  fn apply_options(mut self, options: CompilerConfigOptions) -> Self {
    if let Some(evm_version) = options.evm_version {
      self.config.evm_version = evm_version;
    }
    if let Some(optimizer) = options.optimizer {
      if let Some(enabled) = optimizer.enabled {
        self.config.optimizer.enabled = enabled;
      }
      if let Some(runs) = optimizer.runs {
        self.config.optimizer.runs = runs;
      }
    }
    if let Some(path) = options.module_path {
      self.config.module_path = Some(path);
    }
    if let Some(timeout_ms) = options.timeout_ms {
      self.config.timeout = Some(Duration::from_millis(timeout_ms));
    }
    self
  }

  fn build(self) -> Result<CompilerConfig> {
    if self.config.timeout == Some(Duration::ZERO) {
      return Err(Error::InvalidConfig {
        message: "timeoutMs must be greater than zero".into(),
      });
    }
    Ok(self.config)
  }
}
