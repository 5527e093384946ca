//! Interpreter introspection.
//!
//! Layout discovery and the virtualenv target directory both depend on
//! values only a Python interpreter can report (`sysconfig` paths and
//! build-configuration variables). The `Interpreter` trait keeps those
//! lookups injectable; the real implementation shells out to an interpreter
//! binary with one-line queries.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg_attr(test, mockall::automock)]
pub trait Interpreter {
    /// Directory holding the standard library of the system interpreter.
    fn stdlib_dir(&self) -> Result<PathBuf>;

    /// A `sysconfig` build-configuration variable; `None` when the
    /// interpreter reports it unset or empty.
    fn config_var(&self, name: &str) -> Result<Option<String>>;

    /// The site-packages directory of the environment rooted at `venv_root`.
    fn site_packages(&self, venv_root: &Path) -> Result<PathBuf>;
}

/// Queries a real interpreter binary, `python3` unless overridden.
pub struct SystemInterpreter {
    python: PathBuf,
}

impl SystemInterpreter {
    pub fn new(python: PathBuf) -> Self {
        Self { python }
    }
}

impl Interpreter for SystemInterpreter {
    fn stdlib_dir(&self) -> Result<PathBuf> {
        let out = query(
            &self.python,
            "import sysconfig; print(sysconfig.get_path('stdlib'))",
        )?;
        Ok(PathBuf::from(out))
    }

    fn config_var(&self, name: &str) -> Result<Option<String>> {
        let code = format!(
            "import sysconfig; print(sysconfig.get_config_var('{}') or '')",
            name
        );
        let out = query(&self.python, &code)?;
        Ok(if out.is_empty() { None } else { Some(out) })
    }

    fn site_packages(&self, venv_root: &Path) -> Result<PathBuf> {
        // Ask the venv's own interpreter; its purelib is inside the venv.
        let python = venv_root.join("bin").join("python");
        let out = query(
            &python,
            "import sysconfig; print(sysconfig.get_path('purelib'))",
        )?;
        Ok(PathBuf::from(out))
    }
}

/// Run `<python> -c <code>` and return its trimmed stdout.
#[tracing::instrument]
fn query(python: &Path, code: &str) -> Result<String> {
    let output = Command::new(python)
        .args(["-c", code])
        .output()
        .with_context(|| format!("Failed to run {}", python.display()))?;

    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            python.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
