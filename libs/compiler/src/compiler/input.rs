use std::collections::BTreeMap;

use serde::Serialize;

use crate::internal::config::CompilerConfig;
use crate::internal::errors::{Error, Result};
use crate::internal::settings::{CompilerSettings, OutputSelection};
use crate::sources::SourceSet;

const LANGUAGE: &str = "Solidity";

/// Standard JSON request envelope. Field order is the serialized order.
#[derive(Debug, Serialize)]
struct CompilerRequest<'a> {
  language: &'static str,
  sources: BTreeMap<&'a str, SourceEntry<'a>>,
  settings: CompilerSettings<'a>,
}

#[derive(Debug, Serialize)]
struct SourceEntry<'a> {
  content: &'a str,
}

/// Serialize `sources` and `config` into a Standard JSON request.
///
/// Output is byte-identical for identical inputs: sources are emitted in sorted
/// key order and every struct serializes its fields in declaration order.
pub fn build_request(sources: &SourceSet, config: &CompilerConfig) -> Result<String> {
  let mut entries = BTreeMap::new();
  for (name, content) in sources.iter() {
    let content = std::str::from_utf8(content)
      .map_err(|err| Error::serialization(Some(name), format!("content is not valid UTF-8: {err}")))?;
    entries.insert(name, SourceEntry { content });
  }

  let request = CompilerRequest {
    language: LANGUAGE,
    sources: entries,
    settings: CompilerSettings {
      optimizer: config.optimizer.into(),
      evm_version: &config.evm_version,
      output_selection: OutputSelection::default(),
    },
  };

  let json = serde_json::to_string(&request).map_err(|err| Error::serialization(None, err))?;
  log::debug!(
    "built compiler request for {} sources ({} bytes)",
    sources.len(),
    json.len()
  );
  Ok(json)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;

  fn sample_sources() -> SourceSet {
    [
      ("b/B.sol", "contract B {}\n"),
      ("A.sol", "// \"quoted\" \\ back\n\tcontract A {}\u{0001}"),
    ]
    .into_iter()
    .collect()
  }

  #[test]
  fn request_is_deterministic() {
    let sources = sample_sources();
    let config = CompilerConfig::new("cancun", true, 200);
    let first = build_request(&sources, &config).expect("build");
    let second = build_request(&sources.clone(), &config.clone()).expect("build");
    assert_eq!(first, second);
  }

  #[test]
  fn request_has_protocol_layout() {
    let config = CompilerConfig::new("paris", false, 0);
    let json = build_request(&sample_sources(), &config).expect("build");
    assert!(json.starts_with(r#"{"language":"Solidity","sources":{"A.sol":"#));
    assert!(json.contains(
      r#""settings":{"optimizer":{"enabled":false,"runs":0},"evmVersion":"paris","outputSelection":{"*":{"*":["abi","#
    ));
    assert!(json.ends_with(r#""":["ast"]}}}}"#));
  }

  #[test]
  fn content_is_escaped_and_round_trips() {
    let sources = sample_sources();
    let json = build_request(&sources, &CompilerConfig::default()).expect("build");
    assert!(!json.contains('\n'));
    assert!(!json.contains('\t'));
    assert!(json.contains(r#"\"quoted\""#));
    assert!(json.contains(r"\u0001"));

    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(
      value["sources"]["A.sol"]["content"],
      "// \"quoted\" \\ back\n\tcontract A {}\u{0001}"
    );
    assert_eq!(value["sources"]["b/B.sol"]["content"], "contract B {}\n");
  }

  #[test]
  fn empty_source_set_is_valid() {
    let json = build_request(&SourceSet::new(), &CompilerConfig::default()).expect("build");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["sources"], serde_json::json!({}));
    assert_eq!(value["settings"]["evmVersion"], "cancun");
  }

  #[test]
  fn invalid_utf8_is_reported_not_truncated() {
    let mut sources = SourceSet::new();
    sources.insert("Bad.sol", vec![b'c', 0xff, 0xfe]);
    let err = build_request(&sources, &CompilerConfig::default()).unwrap_err();
    match err {
      Error::Serialization { file, .. } => assert_eq!(file.as_deref(), Some("Bad.sol")),
      other => panic!("unexpected error: {other}"),
    }
  }
}
