//! Source-tree fingerprinting for change detection.
//!
//! The fingerprint is the cache key handed to the orchestration engine:
//! two equal digests mean the deployed artifact is still current and no
//! rebuild is needed. The digest covers file content and relative paths,
//! so any edit, rename, or added source file produces a new identity.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use walkdir::WalkDir;

use crate::{BuildError, Result};

/// File name suffixes that participate in the fingerprint: source files
/// plus module and lock manifests.
const RELEVANT_SUFFIXES: &[&str] = &[".go", ".mod", ".sum"];

/// A 64-character lowercase hex SHA-256 digest identifying the exact
/// content of a source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl Fingerprint {
  /// First 8 characters, for log lines.
  pub fn short(&self) -> &str {
    &self.0[..8.min(self.0.len())]
  }
}

/// Compute the identity hash of a source tree.
///
/// Walks `source_root` recursively, collects every relevant file, sorts
/// the list by relative path, and feeds each file into a SHA-256
/// accumulator framed by `<file name=...>` / `</file>` markers. The
/// explicit sort makes the digest independent of filesystem enumeration
/// order. Directories are recursed into unconditionally; vendored or
/// generated subtrees are part of the identity.
///
/// The caller guarantees the tree is not mutated during the call. Any
/// I/O failure aborts the computation; a partial digest is never
/// returned.
pub fn fingerprint(source_root: &Path) -> Result<Fingerprint> {
  let started = Instant::now();

  if !source_root.is_dir() {
    return Err(BuildError::SourceNotFound(source_root.to_path_buf()));
  }

  let mut files = relevant_files(source_root)?;
  files.sort();

  let mut hasher = Sha256::new();
  for relative in &files {
    hash_file(&mut hasher, source_root, relative)?;
  }

  let digest = Fingerprint(hex::encode(hasher.finalize()));
  info!(
    checksum = %digest.short(),
    path = %source_root.display(),
    files = files.len(),
    elapsed = ?started.elapsed(),
    "computed source fingerprint"
  );

  Ok(digest)
}

/// Collect relevant files as paths relative to the tree root.
///
/// Relative paths keep the digest machine-independent: checking the same
/// tree out under a different prefix must not change its identity.
fn relevant_files(root: &Path) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();

  for entry in WalkDir::new(root) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }

    let name = entry.file_name().to_string_lossy();
    if !RELEVANT_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
      continue;
    }

    let relative = entry
      .path()
      .strip_prefix(root)
      .expect("walkdir yields paths under its root")
      .to_path_buf();
    files.push(relative);
  }

  Ok(files)
}

/// Feed one file into the accumulator: tagged opening marker with the
/// relative path, raw content, closing marker.
fn hash_file(hasher: &mut Sha256, root: &Path, relative: &Path) -> Result<()> {
  write!(hasher, "<file name={}>\n", relative.display())?;

  let file = File::open(root.join(relative))?;
  let mut reader = BufReader::new(file);
  let mut buffer = [0u8; 8192];
  loop {
    let bytes_read = reader.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  write!(hasher, "</file>\n")?;
  Ok(())
}
