//! The two user-facing operations: `status` and `link`.

pub mod link;
pub mod status;

use crate::layout::PackageRoots;
use crate::package::SystemPackage;
use crate::runtime::Runtime;

/// Label for the directory-discovery diagnostics in verbose output.
const PATHS_LABEL: &str = "paths";

/// The fixed set of packages this tool manages, in display order.
fn all_packages<'a, R: Runtime>(
    runtime: &'a R,
    roots: &'a PackageRoots,
) -> [SystemPackage<'a, R>; 3] {
    [
        SystemPackage::dbus(runtime, roots),
        SystemPackage::crypto(runtime, roots),
        SystemPackage::secretstorage(runtime, roots),
    ]
}

/// Flatten every component's diagnostics into indented display lines,
/// each prefixed with the component it came from.
fn diagnostic_lines<R: Runtime>(
    roots: &PackageRoots,
    packages: &[SystemPackage<'_, R>],
) -> Vec<String> {
    let mut lines = Vec::new();
    for message in &roots.messages {
        lines.push(format!("    {}: {}", PATHS_LABEL, message));
    }
    for package in packages {
        for message in package.messages() {
            lines.push(format!("    {}: {}", package.name(), message));
        }
    }
    lines
}
