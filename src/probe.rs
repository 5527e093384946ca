//! Readiness probes.
//!
//! "Ready" means a package actually works from the active environment, not
//! merely that its files exist on disk. The real probe spawns a Python
//! interpreter with a short import snippet and reports whether it ran
//! cleanly.

use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
pub trait Probe {
    /// Run a probe snippet. Any failure, including failure to spawn the
    /// interpreter at all, means "not ready".
    fn run(&self, code: &str) -> bool;
}

/// Probes by spawning a Python interpreter.
pub struct PythonProbe {
    python: PathBuf,
}

impl PythonProbe {
    pub fn new(python: PathBuf) -> Self {
        Self { python }
    }

    /// Probe with the active virtualenv's interpreter when `VIRTUAL_ENV` is
    /// set, otherwise with `fallback`.
    pub fn for_active_env<R: Runtime>(runtime: &R, fallback: &Path) -> Self {
        let python = match runtime.env_var("VIRTUAL_ENV") {
            Ok(root) if !root.is_empty() => Path::new(&root).join("bin").join("python"),
            _ => fallback.to_path_buf(),
        };
        Self { python }
    }
}

impl Probe for PythonProbe {
    #[tracing::instrument(skip(self))]
    fn run(&self, code: &str) -> bool {
        let output = match Command::new(&self.python).args(["-c", code]).output() {
            Ok(output) => output,
            Err(err) => {
                debug!("probe could not spawn {}: {}", self.python.display(), err);
                return false;
            }
        };

        if !output.status.success() {
            debug!(
                "probe `{}` failed via {}: {}",
                code,
                self.python.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        output.status.success()
    }
}
