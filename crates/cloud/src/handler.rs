//! Lambda function declarations backed by content-addressed code assets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use skiff_core::{BuildConfig, BuildPlan, Fingerprint, fingerprint, plan_build};

use crate::Result;
use crate::stack::{Resource, Stack, kind};

/// A code asset: the source fingerprint is its identity, the build plan
/// tells the bundling pipeline how to produce the binary exactly once
/// per distinct fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCode {
  pub asset_hash: Fingerprint,
  pub plan: BuildPlan,
}

impl AssetCode {
  /// Fingerprint the source tree and plan its build.
  pub fn go(config: &BuildConfig, source_root: &Path, entry: &Path) -> Result<Self> {
    let asset_hash = fingerprint(source_root)?;
    let plan = plan_build(config, source_root, entry);
    Ok(Self { asset_hash, plan })
  }
}

/// Configuration for a compiled-language handler function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionProps {
  /// Root of the source package holding the function.
  pub source_root: PathBuf,

  /// Buildable sub-package within `source_root` holding the entry point.
  pub entry: PathBuf,

  /// Function name; defaults to `{stack}-{basename(entry)}`.
  pub function_name: Option<String>,

  pub timeout_secs: u64,

  pub log_retention_days: u32,

  pub memory_mb: Option<u32>,

  /// Runtime environment variables for the deployed function.
  pub environment: BTreeMap<String, String>,
}

impl FunctionProps {
  /// Go handler with the service defaults: one-minute timeout, five-day
  /// log retention.
  pub fn go(source_root: &Path, entry: &Path) -> Self {
    Self {
      source_root: source_root.to_path_buf(),
      entry: entry.to_path_buf(),
      function_name: None,
      timeout_secs: 60,
      log_retention_days: 5,
      memory_mb: None,
      environment: BTreeMap::new(),
    }
  }

  pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
    self.environment = environment;
    self
  }

  /// Resolved function name within the given stack.
  pub fn resolved_name(&self, stack_name: &str) -> String {
    self.function_name.clone().unwrap_or_else(|| {
      let unit = self.source_root.join(&self.entry);
      let base = unit
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "handler".to_string());
      format!("{stack_name}-{base}")
    })
  }
}

/// Register a Lambda function declaration and return its resource id.
pub(crate) fn register_function(
  stack: &mut Stack,
  config: &BuildConfig,
  props: &FunctionProps,
) -> Result<String> {
  let code = AssetCode::go(config, &props.source_root, &props.entry)?;
  let name = props.resolved_name(&stack.name);
  let function_id = format!("{name}-fn");

  stack.register(Resource {
    id: function_id.clone(),
    kind: kind::FUNCTION.to_string(),
    properties: json!({
      "functionName": name,
      "handler": "main",
      "runtime": "go1.x",
      "timeoutSeconds": props.timeout_secs,
      "logRetentionDays": props.log_retention_days,
      "memoryMb": props.memory_mb,
      "environment": props.environment,
      "code": code,
    }),
  });

  Ok(function_id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn source_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("app")).unwrap();
    fs::write(dir.path().join("go.mod"), "module example").unwrap();
    fs::write(dir.path().join("app/main.go"), "package main").unwrap();
    dir
  }

  #[test]
  fn function_name_derives_from_entry_basename() {
    let props = FunctionProps::go(Path::new("/src/example"), Path::new("app"));
    assert_eq!(props.resolved_name("orders"), "orders-app");
  }

  #[test]
  fn explicit_function_name_wins() {
    let mut props = FunctionProps::go(Path::new("/src/example"), Path::new("app"));
    props.function_name = Some("custom".to_string());
    assert_eq!(props.resolved_name("orders"), "custom");
  }

  #[test]
  fn handler_defaults() {
    let props = FunctionProps::go(Path::new("/src/example"), Path::new("app"));
    assert_eq!(props.timeout_secs, 60);
    assert_eq!(props.log_retention_days, 5);
    assert!(props.memory_mb.is_none());
  }

  #[test]
  fn registration_declares_function_with_asset_identity() {
    let tree = source_tree();
    let mut stack = Stack::new("test");
    let props = FunctionProps::go(tree.path(), Path::new("app"));

    register_function(&mut stack, &BuildConfig::default(), &props).unwrap();

    assert_eq!(stack.count_kind(kind::FUNCTION), 1);
    let function = &stack.resources()[0];
    assert_eq!(function.properties["handler"], "main");

    let hash = function.properties["code"]["asset_hash"].as_str().unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, fingerprint(tree.path()).unwrap().0);
  }

  #[test]
  fn asset_identity_tracks_source_edits() {
    let tree = source_tree();
    let config = BuildConfig::default();

    let before = AssetCode::go(&config, tree.path(), Path::new("app")).unwrap();
    fs::write(tree.path().join("app/main.go"), "package main // v2").unwrap();
    let after = AssetCode::go(&config, tree.path(), Path::new("app")).unwrap();

    assert_ne!(before.asset_hash, after.asset_hash);
  }
}
