//! Link the system packages into the active virtualenv.

use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use crate::interpreter::Interpreter;
use crate::layout::PackageRoots;
use crate::runtime::Runtime;

use super::{all_packages, diagnostic_lines};

/// What a link run produced: whether linking happened, and the lines to
/// print after the outcome is announced.
#[derive(Debug)]
pub struct LinkOutcome {
    pub linked: bool,
    pub lines: Vec<String>,
}

/// Link every package into the active virtualenv's site-packages.
///
/// Running outside a virtualenv is reported, not fatal. An unavailable
/// package is fatal and aborts immediately; links already made stay in
/// place, and rerunning after installing the package completes the set.
pub fn run<R: Runtime, I: Interpreter>(
    runtime: &R,
    interp: &I,
    verbose: bool,
) -> Result<LinkOutcome> {
    let mut lines = Vec::new();

    let venv_root = match runtime.env_var("VIRTUAL_ENV") {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => {
            lines.push("Error: not in a virtualenv.".to_string());
            return Ok(LinkOutcome {
                linked: false,
                lines,
            });
        }
    };

    let target_dir = interp
        .site_packages(&venv_root)
        .context("Couldn't determine the virtualenv's site-packages directory")?;
    info!("Linking into {}", target_dir.display());
    if verbose {
        lines.push(format!(
            "Virtualenv site-packages directory: {}",
            target_dir.display()
        ));
    }

    let roots = PackageRoots::discover(runtime, interp);
    let mut packages = all_packages(runtime, &roots);
    for package in &mut packages {
        package.link_into(&target_dir)?;
    }

    if verbose {
        lines.push("More information follows:".to_string());
        lines.extend(diagnostic_lines(&roots, &packages));
    }

    Ok(LinkOutcome {
        linked: true,
        lines,
    })
}
