//! Compiler invocation: host toolchain with containerized fallback.
//!
//! The local strategy reuses a host-installed toolchain, which keeps
//! development deploys fast. The container strategy runs the same build
//! inside the toolchain image with the build root bind-mounted, giving CI
//! a hermetic, reproducible environment. Both strategies block until the
//! subprocess exits; failures surface as-is with no retry.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::plan::{BuildConfig, BuildPlan, CONTAINER_OUTPUT_DIR, OUTPUT_BINARY};
use crate::{BuildError, Result};

/// Which execution sandbox produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
  Local,
  Container,
}

/// Execute a build plan, writing the binary into `output_dir`.
///
/// When the configuration prefers local execution and the plan resolved
/// a working directory, the host toolchain is attempted first; on
/// failure the containerized build runs as fallback. A failing fallback
/// is fatal.
pub fn bundle(config: &BuildConfig, plan: &BuildPlan, output_dir: &Path) -> Result<BuildStrategy> {
  if config.prefer_local {
    match run_local(config, plan, output_dir) {
      Ok(()) => return Ok(BuildStrategy::Local),
      // Local execution was expected but the plan resolved no working
      // directory: a configuration error, fatal before any fallback.
      Err(err @ BuildError::MissingWorkingDir(_)) => return Err(err),
      Err(err) => {
        warn!(error = %err, "local build failed, falling back to container");
      }
    }
  }

  run_container(config, plan, output_dir)?;
  Ok(BuildStrategy::Container)
}

/// Invoke the compiler directly on the host:
/// `<compiler> build -o <output_dir>/main <working_dir>`.
///
/// Fails fast with a configuration error when the plan resolved no
/// working directory, before any subprocess is spawned.
pub fn run_local(config: &BuildConfig, plan: &BuildPlan, output_dir: &Path) -> Result<()> {
  let Some(working_dir) = &plan.working_dir else {
    return Err(BuildError::MissingWorkingDir(plan.source.clone()));
  };

  let started = Instant::now();
  let target = output_dir.join(OUTPUT_BINARY);

  let mut cmd = Command::new(&config.compiler);
  cmd.arg("build").arg("-o").arg(&target).arg(working_dir);
  for (key, value) in &plan.env {
    cmd.env(key, value);
  }

  debug!(compiler = %config.compiler, working_dir = %working_dir.display(), "spawning local build");
  run(cmd, &config.compiler)?;

  info!(source = %working_dir.display(), elapsed = ?started.elapsed(), "local build complete");
  Ok(())
}

/// Invoke the compiler inside the toolchain container image, mounting
/// the host build root sources and the output directory.
pub fn run_container(config: &BuildConfig, plan: &BuildPlan, output_dir: &Path) -> Result<()> {
  let started = Instant::now();
  let spec = &plan.container;

  let mut cmd = Command::new(&config.container_runtime);
  cmd.arg("run").arg("--rm");
  cmd.arg("-u").arg(&spec.user);
  for (host, container) in &spec.volumes {
    cmd.arg("-v").arg(format!("{}:{}", host.display(), container.display()));
  }
  cmd.arg("-v").arg(format!("{}:{}", output_dir.display(), CONTAINER_OUTPUT_DIR));
  for (key, value) in &spec.env {
    cmd.arg("-e").arg(format!("{key}={value}"));
  }
  cmd.arg("-w").arg(&spec.working_dir);
  cmd.arg(&spec.image);
  cmd.args(&spec.command);

  debug!(image = %spec.image, working_dir = %spec.working_dir.display(), "spawning containerized build");
  run(cmd, &config.container_runtime)?;

  info!(source = %spec.working_dir.display(), elapsed = ?started.elapsed(), "containerized build complete");
  Ok(())
}

/// Run a subprocess to completion, inheriting stdout/stderr so compiler
/// diagnostics stay visible to the operator.
fn run(mut cmd: Command, program: &str) -> Result<()> {
  let status = cmd.status().map_err(|source| BuildError::Spawn {
    program: program.to_string(),
    source,
  })?;

  if !status.success() {
    return Err(BuildError::CompilerFailed {
      program: program.to_string(),
      code: status.code(),
    });
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plan::plan_build;
  use std::fs;
  use std::path::PathBuf;
  use tempfile::TempDir;

  fn config_with(compiler: &str, runtime: &str) -> BuildConfig {
    BuildConfig {
      compiler: compiler.to_string(),
      container_runtime: runtime.to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn missing_working_dir_fails_before_spawning() {
    let config = config_with("go", "docker");
    let mut plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));
    plan.working_dir = None;

    let out = TempDir::new().unwrap();
    let err = run_local(&config, &plan, out.path()).unwrap_err();
    assert!(matches!(err, BuildError::MissingWorkingDir(_)));
  }

  #[cfg(unix)]
  #[test]
  fn compiler_failure_propagates_and_produces_no_binary() {
    // `false` ignores its arguments and exits 1, standing in for a
    // failing compiler; the container runtime is equally unavailable.
    let config = config_with("false", "false");
    let plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    let err = bundle(&config, &plan, out.path()).unwrap_err();
    assert!(matches!(err, BuildError::CompilerFailed { .. }));
    assert!(!out.path().join(OUTPUT_BINARY).exists());
  }

  #[cfg(unix)]
  #[test]
  fn missing_compiler_is_a_spawn_error() {
    let config = config_with("/nonexistent/compiler", "docker");
    let plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    let err = run_local(&config, &plan, out.path()).unwrap_err();
    assert!(matches!(err, BuildError::Spawn { .. }));
  }

  #[cfg(unix)]
  #[test]
  fn local_build_writes_binary_to_output_dir() {
    use std::os::unix::fs::PermissionsExt;

    // Stub compiler: `<stub> build -o <target> <dir>` touches <target>.
    let tools = TempDir::new().unwrap();
    let stub = tools.path().join("stubcc");
    fs::write(&stub, "#!/bin/sh\n: > \"$3\"\n").unwrap();
    fs::set_permissions(&stub, fs::Permissions::from_mode(0o755)).unwrap();

    let config = config_with(stub.to_str().unwrap(), "false");
    let plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    let strategy = bundle(&config, &plan, out.path()).unwrap();
    assert_eq!(strategy, BuildStrategy::Local);
    assert!(out.path().join(OUTPUT_BINARY).exists());
  }

  #[cfg(unix)]
  #[test]
  fn local_failure_falls_back_to_container() {
    use std::os::unix::fs::PermissionsExt;

    // Failing local compiler, succeeding stand-in container runtime.
    let tools = TempDir::new().unwrap();
    let runtime = tools.path().join("stubrt");
    fs::write(&runtime, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&runtime, fs::Permissions::from_mode(0o755)).unwrap();

    let config = config_with("false", runtime.to_str().unwrap());
    let plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    let strategy = bundle(&config, &plan, out.path()).unwrap();
    assert_eq!(strategy, BuildStrategy::Container);
  }

  #[cfg(unix)]
  #[test]
  fn container_invocation_carries_full_contract() {
    use std::os::unix::fs::PermissionsExt;

    // Stand-in runtime that records its argument vector, one per line.
    let tools = TempDir::new().unwrap();
    let argv_log = tools.path().join("argv");
    let runtime = tools.path().join("stubrt");
    fs::write(
      &runtime,
      format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > {}\n", argv_log.display()),
    )
    .unwrap();
    fs::set_permissions(&runtime, fs::Permissions::from_mode(0o755)).unwrap();

    let config = BuildConfig {
      build_root: PathBuf::from("/home/dev/go"),
      container_runtime: runtime.to_str().unwrap().to_string(),
      ..Default::default()
    };
    let plan = plan_build(&config, Path::new("/home/dev/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    run_container(&config, &plan, out.path()).unwrap();

    let recorded = fs::read_to_string(&argv_log).unwrap();
    let argv: Vec<&str> = recorded.lines().collect();
    let out_mount = format!("{}:/asset-output", out.path().display());
    assert_eq!(
      argv,
      vec![
        "run",
        "--rm",
        "-u",
        "root",
        "-v",
        "/home/dev/go/src:/go/src",
        "-v",
        out_mount.as_str(),
        "-e",
        "GOCACHE=/go/cache",
        "-w",
        "/go/src/example/app",
        "golang",
        "go",
        "build",
        "-o",
        "/asset-output/main",
      ]
    );
  }

  #[cfg(unix)]
  #[test]
  fn local_strategy_skipped_when_not_preferred() {
    use std::os::unix::fs::PermissionsExt;

    let tools = TempDir::new().unwrap();
    let runtime = tools.path().join("stubrt");
    fs::write(&runtime, "#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&runtime, fs::Permissions::from_mode(0o755)).unwrap();

    // A compiler that would blow up if invoked proves local was skipped.
    let config = BuildConfig {
      compiler: "/nonexistent/compiler".to_string(),
      container_runtime: runtime.to_str().unwrap().to_string(),
      prefer_local: false,
      ..Default::default()
    };
    let plan = plan_build(&config, Path::new("/go/src/example"), Path::new("app"));

    let out = TempDir::new().unwrap();
    let strategy = bundle(&config, &plan, out.path()).unwrap();
    assert_eq!(strategy, BuildStrategy::Container);
  }

  #[test]
  fn output_binary_path_is_stable() {
    assert_eq!(
      PathBuf::from("/out").join(OUTPUT_BINARY),
      PathBuf::from("/out/main")
    );
  }
}
