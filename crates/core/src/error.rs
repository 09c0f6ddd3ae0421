//! Error types for skiff-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fingerprinting a source tree or driving
/// the external compiler.
///
/// Every variant is fatal: fingerprints are never partial, builds are
/// never retried, and all failures propagate to the deployment driver.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  #[error("source directory does not exist: {0}")]
  SourceNotFound(PathBuf),

  #[error("no working directory resolved for local build of {0}")]
  MissingWorkingDir(PathBuf),

  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{program} exited with status {code:?}")]
  CompilerFailed { program: String, code: Option<i32> },
}
