use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::compiler::output::CompilerResponse;
use crate::contract::ContractArtifact;
use crate::internal::errors::{Error, Result};

/// Directory artifacts are written to when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "solc-build";

/// What each `<contract>.json` file contains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArtifactLayout {
  /// `{ "abi": [...], "bytecode": "<hex>" }`.
  #[default]
  Minimal,
  /// The contract's raw output object as solc produced it.
  Full,
}

#[derive(Serialize)]
struct MinimalArtifact<'a> {
  abi: &'a Value,
  bytecode: &'a str,
}

/// Persists one JSON file per contract, named after the contract.
#[derive(Clone, Debug)]
pub struct ArtifactWriter {
  out_dir: PathBuf,
  layout: ArtifactLayout,
}

impl ArtifactWriter {
  pub fn new(out_dir: impl Into<PathBuf>) -> Self {
    Self {
      out_dir: out_dir.into(),
      layout: ArtifactLayout::default(),
    }
  }

  pub fn layout(mut self, layout: ArtifactLayout) -> Self {
    self.layout = layout;
    self
  }

  pub fn out_dir(&self) -> &Path {
    &self.out_dir
  }

  /// Write every contract in `response` and return the written paths in iteration
  /// order. A later contract with the same name overwrites the earlier file.
  ///
  /// Every artifact is rendered before anything touches the disk, so a contract that
  /// lacks a required field leaves `out_dir` untouched.
  pub fn write(&self, response: &CompilerResponse) -> Result<Vec<PathBuf>> {
    let rendered = response
      .artifacts()
      .map(|artifact| {
        let path = self.out_dir.join(format!("{}.json", artifact.name()));
        let contents = self.render(&artifact, &path)?;
        Ok((path, contents))
      })
      .collect::<Result<Vec<_>>>()?;

    fs::create_dir_all(&self.out_dir).map_err(|source| Error::ArtifactWrite {
      path: self.out_dir.clone(),
      source,
    })?;

    let mut written = Vec::with_capacity(rendered.len());
    for (path, contents) in rendered {
      fs::write(&path, contents).map_err(|source| Error::ArtifactWrite {
        path: path.clone(),
        source,
      })?;
      log::debug!("wrote {}", path.display());
      written.push(path);
    }
    Ok(written)
  }

  fn render(&self, artifact: &ContractArtifact<'_>, path: &Path) -> Result<String> {
    let rendered = match self.layout {
      ArtifactLayout::Minimal => serde_json::to_string_pretty(&MinimalArtifact {
        abi: artifact.abi()?,
        bytecode: artifact.creation_bytecode()?,
      }),
      ArtifactLayout::Full => serde_json::to_string_pretty(artifact.raw()),
    };
    rendered.map_err(|err| Error::ArtifactWrite {
      path: path.to_path_buf(),
      source: err.into(),
    })
  }
}

impl Default for ArtifactWriter {
  fn default() -> Self {
    Self::new(DEFAULT_OUTPUT_DIR)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::compiler::output::decode_response;
  use serde_json::json;

  fn response() -> CompilerResponse {
    let raw = json!({
      "contracts": {
        "A.sol": {
          "A": {
            "abi": [{"type": "function", "name": "f"}],
            "evm": {
              "bytecode": {"object": "6080", "sourceMap": "0:1:0"},
              "deployedBytecode": {"object": "60", "sourceMap": "0:1:0"}
            }
          }
        },
        "lib/B.sol": {
          "B": {"abi": [], "evm": {"bytecode": {"object": "00"}}}
        }
      }
    });
    decode_response(&raw.to_string()).expect("decode")
  }

  fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
  }

  #[test]
  fn minimal_layout_writes_abi_and_bytecode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("build");
    let written = ArtifactWriter::new(&out).write(&response()).expect("write");

    assert_eq!(written, vec![out.join("A.json"), out.join("B.json")]);
    let a = read_json(&written[0]);
    assert_eq!(a, json!({"abi": [{"type": "function", "name": "f"}], "bytecode": "6080"}));
  }

  #[test]
  fn full_layout_writes_raw_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let written = ArtifactWriter::new(dir.path())
      .layout(ArtifactLayout::Full)
      .write(&response())
      .expect("write");
    let a = read_json(&written[0]);
    assert_eq!(a["evm"]["deployedBytecode"]["object"], "60");
  }

  #[test]
  fn minimal_layout_requires_bytecode() {
    let raw = json!({"contracts": {"I.sol": {"I": {"abi": []}}}});
    let response = decode_response(&raw.to_string()).expect("decode");
    let dir = tempfile::tempdir().expect("tempdir");
    let err = ArtifactWriter::new(dir.path()).write(&response).unwrap_err();
    assert!(matches!(err, Error::MissingArtifactField { ref path, .. } if path == "evm"));
  }

  #[test]
  fn failing_contract_leaves_nothing_on_disk() {
    let raw = json!({
      "contracts": {
        "A.sol": {"A": {"abi": [], "evm": {"bytecode": {"object": "6080"}}}},
        "B.sol": {"B": {"abi": []}}
      }
    });
    let response = decode_response(&raw.to_string()).expect("decode");
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("build");
    let err = ArtifactWriter::new(&out).write(&response).unwrap_err();
    assert!(matches!(err, Error::MissingArtifactField { ref contract, .. } if contract == "B"));
    assert!(!out.join("A.json").exists());
    assert!(!out.exists());
  }

  #[test]
  fn unwritable_directory_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("file");
    fs::write(&blocker, "x").expect("write");
    let err = ArtifactWriter::new(blocker.join("out"))
      .write(&response())
      .unwrap_err();
    assert!(matches!(err, Error::ArtifactWrite { .. }));
    assert_eq!(err.stage(), "write");
  }

  #[test]
  fn default_writer_targets_solc_build() {
    assert_eq!(ArtifactWriter::default().out_dir(), Path::new(DEFAULT_OUTPUT_DIR));
  }
}
