use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::compiler::artifacts;
use crate::contract::{ContractArtifact, ContractBytecode};
use crate::internal::errors::{Error, Result};

// -----------------------------------------------------------------------------
// Diagnostics
// -----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
  Error,
  Warning,
  Info,
  #[default]
  #[serde(other)]
  Unknown,
}

impl fmt::Display for SeverityLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SeverityLevel::Error => "error",
      SeverityLevel::Warning => "warning",
      SeverityLevel::Info => "info",
      SeverityLevel::Unknown => "unknown",
    };
    f.write_str(label)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
  pub file: String,
  pub start: i32,
  pub end: i32,
}

/// One entry of the response's `errors` array. Reported by solc, not raised locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerDiagnostic {
  #[serde(default)]
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub formatted_message: Option<String>,
  #[serde(default)]
  pub component: String,
  #[serde(default)]
  pub severity: SeverityLevel,
  #[serde(rename = "type", default)]
  pub error_type: String,
  #[serde(
    default,
    deserialize_with = "string_or_number",
    skip_serializing_if = "Option::is_none"
  )]
  pub error_code: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_location: Option<SourceLocation>,
}

impl CompilerDiagnostic {
  pub fn is_error(&self) -> bool {
    self.severity == SeverityLevel::Error
  }
}

impl fmt::Display for CompilerDiagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(formatted) = &self.formatted_message {
      return f.write_str(formatted.trim_end());
    }
    write!(f, "{} {}: {}", self.severity, self.error_type, self.message)?;
    if let Some(location) = &self.source_location {
      write!(f, " --> {}:{}:{}", location.file, location.start, location.end)?;
    }
    Ok(())
  }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(code)) => Ok(Some(code)),
    Some(Value::Number(code)) => Ok(Some(code.to_string())),
    Some(other) => Err(serde::de::Error::custom(format!(
      "expected error code string, found {other}"
    ))),
  }
}

// -----------------------------------------------------------------------------
// Response envelope
// -----------------------------------------------------------------------------

/// Decoded Standard JSON output.
///
/// Only the envelope is validated eagerly: `contracts` must be a mapping of
/// mappings, `errors` an array of diagnostic objects, `sources` a mapping of
/// objects. Individual contract artifacts stay raw until a query navigates them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompilerResponse {
  errors: Vec<CompilerDiagnostic>,
  contracts: BTreeMap<String, Map<String, Value>>,
  sources: BTreeMap<String, Map<String, Value>>,
  extra: Map<String, Value>,
}

impl CompilerResponse {
  pub fn errors(&self) -> &[CompilerDiagnostic] {
    &self.errors
  }

  pub fn has_compiler_errors(&self) -> bool {
    self.errors.iter().any(CompilerDiagnostic::is_error)
  }

  pub fn warnings(&self) -> impl Iterator<Item = &CompilerDiagnostic> {
    self
      .errors
      .iter()
      .filter(|diagnostic| diagnostic.severity == SeverityLevel::Warning)
  }

  /// Raw per-file contract mappings, keyed by source file.
  pub fn contracts(&self) -> &BTreeMap<String, Map<String, Value>> {
    &self.contracts
  }

  pub fn contract_count(&self) -> usize {
    self.contracts.values().map(Map::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.contract_count() == 0
  }

  pub fn contract(&self, file: &str, name: &str) -> Option<ContractArtifact<'_>> {
    let (file, contracts) = self.contracts.get_key_value(file)?;
    let (name, value) = contracts.get_key_value(name)?;
    Some(ContractArtifact::new(file, name, value))
  }

  /// File-level AST, when solc produced one.
  pub fn source_ast(&self, file: &str) -> Option<&Value> {
    self.sources.get(file)?.get("ast")
  }

  pub fn source_id(&self, file: &str) -> Option<u64> {
    self.sources.get(file)?.get("id")?.as_u64()
  }

  /// Top-level fields outside the protocol envelope, kept verbatim.
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.extra.get(name)
  }

  pub fn artifacts(&self) -> impl Iterator<Item = ContractArtifact<'_>> {
    artifacts::artifacts(self)
  }

  pub fn creation_bytecodes(&self) -> Result<BTreeMap<String, String>> {
    artifacts::creation_bytecodes(self)
  }

  pub fn deployed_bytecodes(&self) -> Result<BTreeMap<String, String>> {
    artifacts::deployed_bytecodes(self)
  }

  pub fn abis(&self) -> Result<BTreeMap<String, Value>> {
    artifacts::abis(self)
  }

  pub fn method_identifiers(&self) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
    artifacts::method_identifiers(self)
  }

  pub fn decoded_creation_bytecodes(&self) -> Result<BTreeMap<String, ContractBytecode>> {
    artifacts::decoded(artifacts::creation_bytecodes(self)?)
  }

  pub fn decoded_deployed_bytecodes(&self) -> Result<BTreeMap<String, ContractBytecode>> {
    artifacts::decoded(artifacts::deployed_bytecodes(self)?)
  }
}

/// Parse the raw compiler output and validate its envelope.
pub fn decode_response(raw: &str) -> Result<CompilerResponse> {
  let document: Value = serde_json::from_str(raw).map_err(|source| Error::MalformedJson { source })?;
  let Value::Object(mut root) = document else {
    return Err(Error::shape("$", "an object"));
  };

  let errors = match root.remove("errors") {
    None => Vec::new(),
    Some(Value::Array(items)) => decode_diagnostics(items)?,
    Some(_) => return Err(Error::shape("errors", "an array of diagnostics")),
  };
  let contracts = decode_nested("contracts", root.remove("contracts"), "a mapping of contract names")?;
  let sources = decode_nested("sources", root.remove("sources"), "a source object")?;

  let response = CompilerResponse {
    errors,
    contracts,
    sources,
    extra: root,
  };
  log::debug!(
    "decoded compiler response: {} files, {} contracts, {} diagnostics",
    response.contracts.len(),
    response.contract_count(),
    response.errors.len()
  );
  Ok(response)
}

fn decode_diagnostics(items: Vec<Value>) -> Result<Vec<CompilerDiagnostic>> {
  items
    .into_iter()
    .enumerate()
    .map(|(index, item)| {
      let field = format!("errors[{index}]");
      if !item.is_object() {
        return Err(Error::shape(field, "a diagnostic object"));
      }
      serde_path_to_error::deserialize(item).map_err(|err| {
        let path = err.path().to_string();
        let field = if path.is_empty() || path == "." {
          field
        } else {
          format!("{field}.{path}")
        };
        Error::shape_with_detail(field, "a diagnostic object", err.into_inner())
      })
    })
    .collect()
}

/// `field` must be absent or an object whose values are all objects.
fn decode_nested(
  field: &str,
  value: Option<Value>,
  inner: &'static str,
) -> Result<BTreeMap<String, Map<String, Value>>> {
  let entries = match value {
    None => return Ok(BTreeMap::new()),
    Some(Value::Object(entries)) => entries,
    Some(_) => return Err(Error::shape(field, "a mapping of source files")),
  };

  entries
    .into_iter()
    .map(|(file, value)| match value {
      Value::Object(map) => Ok((file, map)),
      _ => Err(Error::shape(format!("{field}.{file}"), inner)),
    })
    .collect()
}
