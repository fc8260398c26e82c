//! Per-contract queries over a decoded [`CompilerResponse`].
//!
//! Every query walks files, then contracts, in sorted order and aborts the whole
//! batch on the first contract that lacks the requested field. Results are keyed
//! by bare contract name: when two files declare the same name the later file
//! wins.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::compiler::output::CompilerResponse;
use crate::contract::{ContractArtifact, ContractBytecode};
use crate::internal::errors::Result;

/// Every contract in the response as `(file, name)`-addressed views.
pub fn artifacts(response: &CompilerResponse) -> impl Iterator<Item = ContractArtifact<'_>> {
  response.contracts().iter().flat_map(|(file, contracts)| {
    contracts
      .iter()
      .map(move |(name, value)| ContractArtifact::new(file, name, value))
  })
}

/// `evm.bytecode.object` of every contract.
pub fn creation_bytecodes(response: &CompilerResponse) -> Result<BTreeMap<String, String>> {
  collect_by_name(response, |artifact| {
    artifact.creation_bytecode().map(str::to_owned)
  })
}

/// `evm.deployedBytecode.object` of every contract.
pub fn deployed_bytecodes(response: &CompilerResponse) -> Result<BTreeMap<String, String>> {
  collect_by_name(response, |artifact| {
    artifact.deployed_bytecode().map(str::to_owned)
  })
}

pub fn abis(response: &CompilerResponse) -> Result<BTreeMap<String, Value>> {
  collect_by_name(response, |artifact| artifact.abi().cloned())
}

pub fn method_identifiers(
  response: &CompilerResponse,
) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
  collect_by_name(response, |artifact| {
    let selectors = artifact.method_identifiers()?;
    Ok(
      selectors
        .into_iter()
        .map(|(signature, selector)| (signature.to_owned(), selector.to_owned()))
        .collect(),
    )
  })
}

/// Decode every hex object, failing on the first one that is not plain hex.
pub(crate) fn decoded(
  hex_by_name: BTreeMap<String, String>,
) -> Result<BTreeMap<String, ContractBytecode>> {
  hex_by_name
    .into_iter()
    .map(|(name, object)| {
      let bytecode = ContractBytecode::from_hex(&name, &object)?;
      Ok((name, bytecode))
    })
    .collect()
}

fn collect_by_name<'r, T>(
  response: &'r CompilerResponse,
  mut extract: impl FnMut(&ContractArtifact<'r>) -> Result<T>,
) -> Result<BTreeMap<String, T>> {
  let mut collected = BTreeMap::new();
  let mut origins: BTreeMap<&str, &str> = BTreeMap::new();

  for artifact in artifacts(response) {
    let value = extract(&artifact)?;
    if let Some(previous) = origins.insert(artifact.name(), artifact.file()) {
      log::warn!(
        "contract {} from {} replaces the one from {}",
        artifact.name(),
        artifact.file(),
        previous
      );
    }
    collected.insert(artifact.name().to_owned(), value);
  }

  Ok(collected)
}
