//! Report each package's readiness.

use crate::interpreter::Interpreter;
use crate::layout::PackageRoots;
use crate::probe::Probe;
use crate::runtime::Runtime;

use super::{all_packages, diagnostic_lines};

/// One status line per package, plus the troubleshooting block when
/// `verbose` is set. A pure inspection: it cannot fail.
pub fn run<R: Runtime, I: Interpreter, P: Probe>(
    runtime: &R,
    interp: &I,
    probe: &P,
    verbose: bool,
) -> Vec<String> {
    let roots = PackageRoots::discover(runtime, interp);
    let mut packages = all_packages(runtime, &roots);

    let mut lines: Vec<String> = packages
        .iter_mut()
        .map(|package| package.status_line(probe))
        .collect();

    if verbose {
        lines.push("Troubleshooting messages follow:".to_string());
        lines.extend(diagnostic_lines(&roots, &packages));
    }
    lines
}
