//! Error types for skiff-cloud

use thiserror::Error;

/// Errors that can occur while assembling resource declarations.
#[derive(Debug, Error)]
pub enum CloudError {
  #[error("build cache error: {0}")]
  Build(#[from] skiff_core::BuildError),

  #[error("invalid resource path '{path}': {message}")]
  InvalidPath { path: String, message: String },

  #[error("custom domain '{host}' has no parent zone")]
  InvalidHost { host: String },

  #[error("custom domain requires both host and tls_arn, got host: {host:?}, tls_arn: {tls_arn:?}")]
  InvalidDomainConfig {
    host: Option<String>,
    tls_arn: Option<String>,
  },
}
