//! Working-root containment for every filesystem and process operation.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::error::ContainmentError;
use crate::core::path::{is_within, normalize_lexical};

/// Dangling symlinks followed before a path is rejected, matching Linux `SYMLOOP_MAX`.
const MAX_SYMLINK_HOPS: usize = 40;

/// The single directory all sandboxed operations are confined to.
///
/// Canonicalized once at construction and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingRoot {
    root: PathBuf,
}

impl WorkingRoot {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = path
            .canonicalize()
            .with_context(|| format!("resolve working root {}", path.display()))?;
        if !root.is_dir() {
            return Err(anyhow!("working root {} is not a directory", root.display()));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied path and reject anything outside the root.
    ///
    /// An empty path or `.` resolves to the root itself. Existing ancestors are
    /// canonicalized so symlinks pointing outside the root are rejected too.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ContainmentError> {
        let reject = || ContainmentError {
            path: relative.to_string(),
        };

        let lexical = normalize_lexical(&self.root.join(relative));
        if !is_within(&self.root, &lexical) {
            debug!(path = relative, "rejected lexical escape");
            return Err(reject());
        }

        let resolved = canonicalize_existing_prefix(&lexical).map_err(|_| reject())?;
        if !is_within(&self.root, &resolved) {
            debug!(path = relative, resolved = %resolved.display(), "rejected symlink escape");
            return Err(reject());
        }
        Ok(resolved)
    }
}

/// Canonicalize the longest existing ancestor of `path`, then re-append the rest.
///
/// A dangling symlink on the way is followed to where it points, so the
/// caller checks the location a write would actually create.
fn canonicalize_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    resolve_prefix(path.to_path_buf(), 0)
}

fn resolve_prefix(mut existing: PathBuf, hops: usize) -> io::Result<PathBuf> {
    let mut tail: Vec<OsString> = Vec::new();
    loop {
        let err = match existing.canonicalize() {
            Ok(mut out) => {
                for name in tail.iter().rev() {
                    out.push(name);
                }
                return Ok(out);
            }
            Err(err) => err,
        };

        let is_symlink = fs::symlink_metadata(&existing)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if is_symlink {
            if hops >= MAX_SYMLINK_HOPS {
                return Err(io::Error::other("too many levels of symbolic links"));
            }
            let target = fs::read_link(&existing)?;
            let parent = existing
                .parent()
                .ok_or_else(|| io::Error::other("symlink without parent"))?
                .canonicalize()?;
            let mut next = parent.join(target);
            for name in tail.iter().rev() {
                next.push(name);
            }
            return resolve_prefix(next, hops + 1);
        }

        let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
            return Err(err);
        };
        tail.push(name);
        if !existing.pop() {
            return Err(err);
        }
    }
}

/// Limits applied by the operation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationLimits {
    /// Maximum characters returned by a file read.
    pub read_limit_chars: usize,
    /// Wall-clock limit for a script run.
    pub script_timeout: Duration,
    /// Per-stream cap on captured script output.
    pub output_limit_bytes: usize,
    /// Interpreter binary invoked with the script path as its only argument.
    pub interpreter: String,
    /// Required script file extension, without the dot.
    pub script_extension: String,
}

impl Default for OperationLimits {
    fn default() -> Self {
        Self {
            read_limit_chars: 10_000,
            script_timeout: Duration::from_secs(30),
            output_limit_bytes: 100_000,
            interpreter: "python3".to_string(),
            script_extension: "py".to_string(),
        }
    }
}

/// Everything an operation needs: the root plus its limits.
///
/// Passed explicitly into every call; nothing is read from process-global state.
#[derive(Debug, Clone)]
pub struct Sandbox {
    pub root: WorkingRoot,
    pub limits: OperationLimits,
}

impl Sandbox {
    pub fn new(root: WorkingRoot, limits: OperationLimits) -> Self {
        Self { root, limits }
    }
}
