use std::collections::BTreeMap;

use serde_json::Value;

use crate::internal::errors::{Error, Result};

pub(crate) const ABI: &[&str] = &["abi"];
pub(crate) const CREATION_OBJECT: &[&str] = &["evm", "bytecode", "object"];
pub(crate) const CREATION_SOURCE_MAP: &[&str] = &["evm", "bytecode", "sourceMap"];
pub(crate) const DEPLOYED_OBJECT: &[&str] = &["evm", "deployedBytecode", "object"];
pub(crate) const DEPLOYED_SOURCE_MAP: &[&str] = &["evm", "deployedBytecode", "sourceMap"];
pub(crate) const METHOD_IDENTIFIERS: &[&str] = &["evm", "methodIdentifiers"];

// -----------------------------------------------------------------------------
// Borrowed artifact view
// -----------------------------------------------------------------------------

/// Lazily validated view over one contract's raw output.
///
/// Every accessor navigates the raw JSON on demand and reports the first path
/// segment it could not resolve.
#[derive(Clone, Copy, Debug)]
pub struct ContractArtifact<'a> {
  file: &'a str,
  name: &'a str,
  value: &'a Value,
}

impl<'a> ContractArtifact<'a> {
  pub(crate) fn new(file: &'a str, name: &'a str, value: &'a Value) -> Self {
    Self { file, name, value }
  }

  pub fn file(&self) -> &'a str {
    self.file
  }

  pub fn name(&self) -> &'a str {
    self.name
  }

  pub fn raw(&self) -> &'a Value {
    self.value
  }

  pub fn abi(&self) -> Result<&'a Value> {
    self.lookup(ABI)
  }

  pub fn creation_bytecode(&self) -> Result<&'a str> {
    self.lookup_str(CREATION_OBJECT)
  }

  pub fn deployed_bytecode(&self) -> Result<&'a str> {
    self.lookup_str(DEPLOYED_OBJECT)
  }

  pub fn creation_source_map(&self) -> Result<&'a str> {
    self.lookup_str(CREATION_SOURCE_MAP)
  }

  pub fn deployed_source_map(&self) -> Result<&'a str> {
    self.lookup_str(DEPLOYED_SOURCE_MAP)
  }

  /// Function signature to 4-byte selector.
  pub fn method_identifiers(&self) -> Result<BTreeMap<&'a str, &'a str>> {
    let Value::Object(entries) = self.lookup(METHOD_IDENTIFIERS)? else {
      return Err(self.missing(METHOD_IDENTIFIERS.len(), METHOD_IDENTIFIERS));
    };
    entries
      .iter()
      .map(|(signature, selector)| match selector.as_str() {
        Some(selector) => Ok((signature.as_str(), selector)),
        None => Err(Error::MissingArtifactField {
          file: self.file.to_owned(),
          contract: self.name.to_owned(),
          path: format!("{}.{signature}", METHOD_IDENTIFIERS.join(".")),
        }),
      })
      .collect()
  }

  /// Tolerant navigation: `None` when any segment is absent.
  pub fn get(&self, path: &[&str]) -> Option<&'a Value> {
    path
      .iter()
      .try_fold(self.value, |current, segment| current.get(*segment))
  }

  /// Strict navigation: fails with the path prefix ending at the first segment that
  /// could not be resolved.
  pub fn lookup(&self, path: &[&str]) -> Result<&'a Value> {
    let mut current = self.value;
    for (depth, segment) in path.iter().enumerate() {
      current = current
        .get(*segment)
        .ok_or_else(|| self.missing(depth + 1, path))?;
    }
    Ok(current)
  }

  /// Strict navigation that also requires a string leaf.
  pub fn lookup_str(&self, path: &[&str]) -> Result<&'a str> {
    self
      .lookup(path)?
      .as_str()
      .ok_or_else(|| self.missing(path.len(), path))
  }

  fn missing(&self, depth: usize, path: &[&str]) -> Error {
    Error::MissingArtifactField {
      file: self.file.to_owned(),
      contract: self.name.to_owned(),
      path: path[..depth].join("."),
    }
  }
}

// -----------------------------------------------------------------------------
// Decoded bytecode
// -----------------------------------------------------------------------------

/// Bytecode decoded from a solc hex `object`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractBytecode {
  bytes: Vec<u8>,
}

impl ContractBytecode {
  /// Decode a hex object with or without `0x`. Unlinked library placeholders
  /// (`__$...$__`) cannot be decoded and are reported as such.
  pub fn from_hex(contract: &str, object: &str) -> Result<Self> {
    let digits = object.strip_prefix("0x").unwrap_or(object);
    if digits.contains("__") {
      return Err(Error::InvalidBytecode {
        contract: contract.to_owned(),
        reason: "contains unlinked library placeholders".into(),
      });
    }
    let bytes = hex::decode(digits).map_err(|err| Error::InvalidBytecode {
      contract: contract.to_owned(),
      reason: err.to_string(),
    })?;
    Ok(Self { bytes })
  }

  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn to_hex(&self) -> String {
    format!("0x{}", hex::encode(&self.bytes))
  }
}
