//! skiff-core: content-addressed build cache for serverless deployment artifacts
//!
//! This crate decides whether a Lambda deployment artifact needs to be
//! regenerated and drives the external compiler that produces it:
//! - `fingerprint`: deterministic identity hash over a source tree
//! - `plan_build`: resolves compiler invocation parameters, including the
//!   host-to-container path translation
//! - `bundle`: executes the plan with the host toolchain, falling back to a
//!   hermetic containerized build

mod bundle;
mod error;
mod fingerprint;
mod plan;

pub use bundle::{BuildStrategy, bundle, run_container, run_local};
pub use error::BuildError;
pub use fingerprint::{Fingerprint, fingerprint};
pub use plan::{
  BuildConfig, BuildPlan, CONTAINER_BUILD_ROOT, CONTAINER_OUTPUT_DIR, ContainerSpec,
  OUTPUT_BINARY, plan_build,
};

/// Result type for build cache operations
pub type Result<T> = std::result::Result<T, BuildError>;
