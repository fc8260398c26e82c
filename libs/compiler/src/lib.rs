//! Compile Solidity with an embedded solc-js release.
//!
//! A [`Compiler`] serialises a [`SourceSet`] into a Standard JSON request, hands it to a
//! solc-js module running in a fresh V8 isolate, and decodes the response. Contract
//! artifacts stay raw until they are queried through [`CompilerResponse`].

mod compiler;
mod contract;
mod internal;
mod sources;
mod writer;

#[cfg(test)]
mod test_utils;

pub use compiler::{
  artifacts::{abis, artifacts, creation_bytecodes, deployed_bytecodes, method_identifiers},
  build_request, decode_response,
  output::{CompilerDiagnostic, SeverityLevel, SourceLocation},
  Compiler, CompilerResponse, EngineBridge, EnginePhase, EngineState, TerminationHandle,
};
pub use contract::{ContractArtifact, ContractBytecode};
pub use internal::config::{CompilerConfig, CompilerConfigOptions, OptimizerConfig, OptimizerOptions};
pub use internal::errors::{Error, Result};
pub use internal::module::{
  default_module_dir, CompilerModule, DefaultModuleProvider, FileModuleProvider, ModuleProvider,
  MODULE_HOME_ENV,
};
pub use internal::solc::DEFAULT_SOLC_VERSION;
pub use sources::SourceSet;
pub use writer::{ArtifactLayout, ArtifactWriter, DEFAULT_OUTPUT_DIR};
