//! Build planning: resolving compiler invocation parameters.
//!
//! A plan is computed once per deployable unit from explicit
//! configuration, then executed by [`crate::bundle`]. The only ambient
//! environment read happens in [`BuildConfig::from_env`]; everything
//! downstream sees plain values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fixed path where the host build root is mounted inside the build
/// container.
pub const CONTAINER_BUILD_ROOT: &str = "/go";

/// Directory inside the container where the orchestration engine expects
/// the artifact to be written.
pub const CONTAINER_OUTPUT_DIR: &str = "/asset-output";

/// Name of the compiled binary consumed by the deployment pipeline.
pub const OUTPUT_BINARY: &str = "main";

/// Explicit configuration for build planning and execution.
///
/// Constructed once at startup and threaded through calls; the planning
/// and bundling code never inspects the process environment itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Host directory holding the toolchain workspace. Sources under this
  /// root are rewritten to the container mount for containerized builds.
  pub build_root: PathBuf,

  /// Cross-compilation target OS.
  pub goos: String,

  /// Cross-compilation target architecture.
  pub goarch: String,

  /// Isolated build cache on the host, distinct from the user's own.
  pub cache_dir: PathBuf,

  /// Compiler program invoked for local builds.
  pub compiler: String,

  /// Container image carrying the toolchain for hermetic builds.
  pub container_image: String,

  /// Container runtime program (e.g. `docker`).
  pub container_runtime: String,

  /// Attempt the host toolchain before falling back to a container.
  pub prefer_local: bool,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      build_root: PathBuf::from("/go"),
      goos: "linux".to_string(),
      goarch: "amd64".to_string(),
      cache_dir: PathBuf::from("/tmp/go.amd64"),
      compiler: "go".to_string(),
      container_image: "golang".to_string(),
      container_runtime: "docker".to_string(),
      prefer_local: true,
    }
  }
}

impl BuildConfig {
  /// Build a configuration from the ambient environment.
  ///
  /// This is the single place the process environment is consulted:
  /// `GOPATH` overrides the default build root when set.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(root) = std::env::var("GOPATH") {
      if !root.is_empty() {
        config.build_root = PathBuf::from(root);
      }
    }
    config
  }
}

/// Parameters for the containerized build fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
  pub image: String,
  pub command: Vec<String>,
  pub user: String,
  pub env: BTreeMap<String, String>,
  /// Bind mounts, host path to container path.
  pub volumes: Vec<(PathBuf, PathBuf)>,
  pub working_dir: PathBuf,
}

/// The resolved set of parameters needed to invoke the external
/// compiler for one deployable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
  /// Absolute location of the buildable unit on the host.
  pub source: PathBuf,

  /// Working directory for the compiler, translated into its
  /// container-mount-relative form when the source lives under the
  /// build root. `None` means local execution cannot be attempted.
  pub working_dir: Option<PathBuf>,

  /// Environment for the local compiler invocation.
  pub env: BTreeMap<String, String>,

  /// Hermetic fallback invocation.
  pub container: ContainerSpec,
}

/// Resolve the build instruction set for one buildable unit.
///
/// `entry` selects the sub-package within `source_root` that holds the
/// function's entry point.
pub fn plan_build(config: &BuildConfig, source_root: &Path, entry: &Path) -> BuildPlan {
  let source = source_root.join(entry);
  let working_dir = translate_path(&config.build_root, &source);

  let mut env = BTreeMap::new();
  env.insert("GOCACHE".to_string(), config.cache_dir.display().to_string());
  env.insert("GOOS".to_string(), config.goos.clone());
  env.insert("GOARCH".to_string(), config.goarch.clone());

  let mut container_env = BTreeMap::new();
  container_env.insert(
    "GOCACHE".to_string(),
    format!("{CONTAINER_BUILD_ROOT}/cache"),
  );

  let container = ContainerSpec {
    image: config.container_image.clone(),
    command: vec![
      config.compiler.clone(),
      "build".to_string(),
      "-o".to_string(),
      format!("{CONTAINER_OUTPUT_DIR}/{OUTPUT_BINARY}"),
    ],
    user: "root".to_string(),
    env: container_env,
    volumes: vec![(
      config.build_root.join("src"),
      PathBuf::from(CONTAINER_BUILD_ROOT).join("src"),
    )],
    working_dir: working_dir.clone(),
  };

  BuildPlan {
    source,
    working_dir: Some(working_dir),
    env,
    container,
  }
}

/// Rewrite a source path under the host build root into its
/// container-mount-relative form. Paths outside the build root pass
/// through unchanged.
pub fn translate_path(build_root: &Path, source: &Path) -> PathBuf {
  match source.strip_prefix(build_root) {
    Ok(relative) => Path::new(CONTAINER_BUILD_ROOT).join(relative),
    Err(_) => source.to_path_buf(),
  }
}
