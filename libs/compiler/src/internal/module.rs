use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;

use crate::internal::errors::{Error, Result};
use crate::internal::solc;

/// Environment variable overriding the directory that holds solc-js releases.
pub const MODULE_HOME_ENV: &str = "SOLC_BRIDGE_HOME";

/// solc-js module code plus what is known about its release. Cloning shares the code.
#[derive(Clone)]
pub struct CompilerModule {
  label: String,
  version: Option<Version>,
  code: Arc<str>,
}

impl CompilerModule {
  pub fn new(label: impl Into<String>, code: impl Into<Arc<str>>) -> Self {
    Self {
      label: label.into(),
      version: None,
      code: code.into(),
    }
  }

  pub fn with_version(mut self, version: Option<Version>) -> Self {
    self.version = version;
    self
  }

  /// Human-readable origin of the module (file path or caller-chosen name).
  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn version(&self) -> Option<&Version> {
    self.version.as_ref()
  }

  pub fn code(&self) -> &str {
    &self.code
  }
}

impl fmt::Debug for CompilerModule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CompilerModule")
      .field("label", &self.label)
      .field("version", &self.version)
      .field("code_len", &self.code.len())
      .finish()
  }
}

/// Capability that yields the solc-js module to embed.
pub trait ModuleProvider {
  fn load(&self) -> Result<CompilerModule>;
}

impl ModuleProvider for CompilerModule {
  fn load(&self) -> Result<CompilerModule> {
    Ok(self.clone())
  }
}

/// Loads a module from an explicit path.
#[derive(Clone, Debug)]
pub struct FileModuleProvider {
  path: PathBuf,
}

impl FileModuleProvider {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl ModuleProvider for FileModuleProvider {
  fn load(&self) -> Result<CompilerModule> {
    let code = std::fs::read_to_string(&self.path).map_err(|source| Error::ModuleLoad {
      path: self.path.clone(),
      source,
    })?;
    log::debug!(
      "loaded compiler module {} ({} bytes)",
      self.path.display(),
      code.len()
    );
    Ok(
      CompilerModule::new(self.path.to_string_lossy(), code)
        .with_version(solc::version_from_file_name(&self.path)),
    )
  }
}

/// Resolves the built-in default release from the module directory.
#[derive(Clone, Debug)]
pub struct DefaultModuleProvider {
  dir: PathBuf,
  version: Version,
}

impl DefaultModuleProvider {
  pub fn new() -> Self {
    Self::in_dir(default_module_dir())
  }

  pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
    Self {
      dir: dir.into(),
      version: solc::default_version(),
    }
  }

  pub fn version(&self) -> &Version {
    &self.version
  }

  pub fn module_path(&self) -> PathBuf {
    self.dir.join(solc::module_file_name(&self.version))
  }
}

impl Default for DefaultModuleProvider {
  fn default() -> Self {
    Self::new()
  }
}

impl ModuleProvider for DefaultModuleProvider {
  fn load(&self) -> Result<CompilerModule> {
    let module = FileModuleProvider::new(self.module_path()).load()?;
    Ok(module.with_version(Some(self.version.clone())))
  }
}

/// `$SOLC_BRIDGE_HOME`, else `~/.solc-bridge/modules`, else `./.solc-bridge/modules`.
pub fn default_module_dir() -> PathBuf {
  if let Some(dir) = env::var_os(MODULE_HOME_ENV).filter(|value| !value.is_empty()) {
    return PathBuf::from(dir);
  }
  env::var_os("HOME")
    .or_else(|| env::var_os("USERPROFILE"))
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("."))
    .join(".solc-bridge")
    .join("modules")
}

/// Pick the provider for an optional configured path.
pub(crate) fn provider_for(path: Option<&Path>) -> Box<dyn ModuleProvider> {
  match path {
    Some(path) => Box::new(FileModuleProvider::new(path)),
    None => Box::new(DefaultModuleProvider::new()),
  }
}
