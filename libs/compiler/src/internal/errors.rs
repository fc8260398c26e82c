use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use thiserror::Error as ThisError;

use crate::compiler::lifecycle::EnginePhase;

/// Canonical error type shared by every stage of the compilation pipeline.
///
/// Diagnostics reported by solc itself are not errors; they live in
/// [`CompilerResponse::errors`](crate::CompilerResponse::errors).
#[derive(Debug, ThisError)]
pub enum Error {
  #[error("failed to read source {}: {source}", path.display())]
  SourceRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialise compiler request{}: {reason}", describe_file(file.as_deref()))]
  Serialization {
    file: Option<String>,
    reason: String,
  },

  #[error("failed to load compiler module {}: {source}", path.display())]
  ModuleLoad {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("compiler module threw during evaluation: {message}")]
  EngineEval { message: String },

  #[error("compiler module never became ready: {message}")]
  EngineInit { message: String },

  #[error("compile entry point threw: {message}")]
  EngineInvoke { message: String },

  #[error("execution context was terminated while {phase}")]
  EngineTerminated { phase: EnginePhase },

  #[error("compiler output is not valid JSON: {source}")]
  MalformedJson {
    #[source]
    source: serde_json::Error,
  },

  #[error(
    "compiler output has an unexpected shape at `{field}`: expected {expected}{}",
    describe_detail(detail.as_deref())
  )]
  InvalidOutputShape {
    field: String,
    expected: &'static str,
    detail: Option<String>,
  },

  #[error("contract {contract} in {file} is missing `{path}`")]
  MissingArtifactField {
    file: String,
    contract: String,
    path: String,
  },

  #[error("contract {contract} has undecodable bytecode: {reason}")]
  InvalidBytecode { contract: String, reason: String },

  #[error("failed to write artifact {}: {source}", path.display())]
  ArtifactWrite {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid configuration: {message}")]
  InvalidConfig { message: String },
}

impl Error {
  pub(crate) fn serialization(file: Option<&str>, reason: impl Display) -> Self {
    Error::Serialization {
      file: file.map(str::to_owned),
      reason: reason.to_string(),
    }
  }

  pub(crate) fn shape(field: impl Into<String>, expected: &'static str) -> Self {
    Error::InvalidOutputShape {
      field: field.into(),
      expected,
      detail: None,
    }
  }

  pub(crate) fn shape_with_detail(
    field: impl Into<String>,
    expected: &'static str,
    detail: impl Display,
  ) -> Self {
    Error::InvalidOutputShape {
      field: field.into(),
      expected,
      detail: Some(detail.to_string()),
    }
  }

  /// Name of the pipeline stage that produced this error.
  pub fn stage(&self) -> &'static str {
    match self {
      Error::SourceRead { .. } => "sources",
      Error::Serialization { .. } => "request",
      Error::ModuleLoad { .. } => "module",
      Error::EngineEval { .. }
      | Error::EngineInit { .. }
      | Error::EngineInvoke { .. }
      | Error::EngineTerminated { .. } => "engine",
      Error::MalformedJson { .. } | Error::InvalidOutputShape { .. } => "decode",
      Error::MissingArtifactField { .. } | Error::InvalidBytecode { .. } => "extract",
      Error::ArtifactWrite { .. } => "write",
      Error::InvalidConfig { .. } => "config",
    }
  }
}

fn describe_file(file: Option<&str>) -> String {
  file.map(|name| format!(" for {name}")).unwrap_or_default()
}

fn describe_detail(detail: Option<&str>) -> String {
  detail.map(|reason| format!(" ({reason})")).unwrap_or_default()
}

/// Result alias bound to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
