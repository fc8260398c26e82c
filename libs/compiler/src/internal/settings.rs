use serde::Serialize;

/// Per-contract outputs requested for every contract in every file.
pub(crate) const CONTRACT_OUTPUTS: [&str; 6] = [
  "abi",
  "evm.bytecode.object",
  "evm.bytecode.sourceMap",
  "evm.deployedBytecode.object",
  "evm.deployedBytecode.sourceMap",
  "evm.methodIdentifiers",
];

/// File-level outputs requested for every file.
pub(crate) const FILE_OUTPUTS: [&str; 1] = ["ast"];

/// `settings` block of a Standard JSON request. Field order is the serialized order.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompilerSettings<'a> {
  pub optimizer: OptimizerSettings,
  pub evm_version: &'a str,
  pub output_selection: OutputSelection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct OptimizerSettings {
  pub enabled: bool,
  pub runs: u32,
}

/// Fixed selector: `{"*": {"*": CONTRACT_OUTPUTS, "": FILE_OUTPUTS}}`.
#[derive(Clone, Debug, Default, Serialize)]
pub(crate) struct OutputSelection {
  #[serde(rename = "*")]
  all_files: FileOutputSelection,
}

#[derive(Clone, Debug, Serialize)]
struct FileOutputSelection {
  #[serde(rename = "*")]
  contracts: &'static [&'static str],
  #[serde(rename = "")]
  file: &'static [&'static str],
}

impl Default for FileOutputSelection {
  fn default() -> Self {
    Self {
      contracts: &CONTRACT_OUTPUTS,
      file: &FILE_OUTPUTS,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn output_selection_serializes_in_protocol_order() {
    let json = serde_json::to_string(&OutputSelection::default()).expect("serialize");
    assert_eq!(
      json,
      r#"{"*":{"*":["abi","evm.bytecode.object","evm.bytecode.sourceMap","evm.deployedBytecode.object","evm.deployedBytecode.sourceMap","evm.methodIdentifiers"],"":["ast"]}}"#
    );
  }

  #[test]
  fn settings_keep_runs_when_optimizer_disabled() {
    let settings = CompilerSettings {
      optimizer: OptimizerSettings {
        enabled: false,
        runs: 0,
      },
      evm_version: "cancun",
      output_selection: OutputSelection::default(),
    };
    let value = serde_json::to_value(&settings).expect("serialize");
    assert_eq!(value["optimizer"]["enabled"], false);
    assert_eq!(value["optimizer"]["runs"], 0);
    assert_eq!(value["evmVersion"], "cancun");
  }
}
