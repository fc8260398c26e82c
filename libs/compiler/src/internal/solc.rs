use std::path::Path;

use semver::Version;

/// solc-js release used when no alternate module is configured.
pub const DEFAULT_SOLC_VERSION: &str = "0.8.29";

pub(crate) fn parse_version(version: &str) -> Option<Version> {
  let trimmed = version.trim().trim_start_matches('v');
  let core = trimmed.split('+').next().unwrap_or(trimmed);
  Version::parse(core).ok()
}

pub(crate) fn default_version() -> Version {
  parse_version(DEFAULT_SOLC_VERSION).unwrap_or_else(|| Version::new(0, 8, 29))
}

/// Canonical file name of a solc-js release, e.g. `soljson-v0.8.29.js`.
pub(crate) fn module_file_name(version: &Version) -> String {
  format!("soljson-v{version}.js")
}

/// Infer the release from names such as `soljson-v0.8.29+commit.ab55807c.js`.
pub(crate) fn version_from_file_name(path: &Path) -> Option<Version> {
  let name = path.file_name()?.to_str()?;
  let stem = name.strip_suffix(".js").unwrap_or(name);
  let raw = stem.strip_prefix("soljson-")?;
  parse_version(raw)
}

/// Parse the string reported by `solidity_version()`, e.g. `0.8.29+commit.ab55807c.Emscripten.clang`.
pub(crate) fn version_from_banner(banner: &str) -> Option<Version> {
  parse_version(banner)
}
