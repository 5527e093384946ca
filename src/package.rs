//! The system packages this tool knows how to find and link.
//!
//! Each package is described by its importable name, the compiled shared
//! objects it ships (if any), and a probe snippet that proves it works from
//! the active environment. Everything noteworthy that happens while
//! resolving or linking is collected as a diagnostic message on the package.

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::layout::PackageRoots;
use crate::probe::Probe;
use crate::runtime::Runtime;

const DBUS_PROBE: &str = "import dbus, dbus.types";
const CRYPTO_PROBE: &str = "import Crypto";
// Exercise a real bus connection, not just the import.
const SECRETSTORAGE_PROBE: &str =
    "import secretstorage; bus = secretstorage.dbus_init(); list(secretstorage.get_all_collections(bus))";

/// Memoized result of locating a package's directory. `Missing` is terminal:
/// a failed search is never retried, and is distinct from "not searched yet".
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Unresolved,
    Found(PathBuf),
    Missing,
}

/// One system-installed package: where its files live under the system
/// python, whether the active environment can already use it, and how to
/// link it into a virtualenv.
pub struct SystemPackage<'a, R: Runtime> {
    runtime: &'a R,
    roots: &'a PackageRoots,
    name: &'static str,
    shared_objects: &'static [&'static str],
    probe_code: &'static str,
    resolved: Resolution,
    arch_tagged: bool,
    messages: Vec<String>,
}

impl<'a, R: Runtime> SystemPackage<'a, R> {
    pub fn dbus(runtime: &'a R, roots: &'a PackageRoots) -> Self {
        Self::new(
            runtime,
            roots,
            "dbus",
            &["_dbus_bindings", "_dbus_glib_bindings"],
            DBUS_PROBE,
        )
    }

    pub fn crypto(runtime: &'a R, roots: &'a PackageRoots) -> Self {
        Self::new(runtime, roots, "Crypto", &[], CRYPTO_PROBE)
    }

    pub fn secretstorage(runtime: &'a R, roots: &'a PackageRoots) -> Self {
        Self::new(runtime, roots, "secretstorage", &[], SECRETSTORAGE_PROBE)
    }

    fn new(
        runtime: &'a R,
        roots: &'a PackageRoots,
        name: &'static str,
        shared_objects: &'static [&'static str],
        probe_code: &'static str,
    ) -> Self {
        Self {
            runtime,
            roots,
            name,
            shared_objects,
            probe_code,
            resolved: Resolution::Unresolved,
            arch_tagged: false,
            messages: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Diagnostics collected so far, in the order they happened.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Search site-packages first, then dist-packages, for a directory entry
    /// named after this package. Finding it under a major-version-only
    /// dist-packages switches shared-object names to the platform-tagged
    /// form, when a tag is known.
    fn locate_package_directory(&mut self) -> Resolution {
        if let Some(site) = &self.roots.site_packages {
            if self.runtime.exists(&site.join(self.name)) {
                return Resolution::Found(site.clone());
            }
        }

        if let Some(dist) = &self.roots.dist_packages {
            if self.runtime.exists(&dist.path.join(self.name)) {
                if dist.major_only {
                    if self.roots.so_tag.is_some() {
                        self.arch_tagged = true;
                    } else {
                        let message =
                            "Platform .so tag unavailable, assuming plain .so filenames";
                        debug!("{}: {}", self.name, message);
                        self.messages.push(message.to_string());
                    }
                }
                return Resolution::Found(dist.path.clone());
            }
        }

        let message = format!(
            "Couldn't find the {} package in site-packages or dist-packages",
            self.name
        );
        debug!("{}", message);
        self.messages.push(message);
        Resolution::Missing
    }

    /// Memoized directory resolution; a negative result is cached too, so
    /// the filesystem is searched at most once per package.
    fn resolved_dir(&mut self) -> Option<PathBuf> {
        if self.resolved == Resolution::Unresolved {
            self.resolved = self.locate_package_directory();
        }
        match &self.resolved {
            Resolution::Found(dir) => Some(dir.clone()),
            _ => None,
        }
    }

    /// Filename of a compiled extension module, platform-tagged when the
    /// package was found under a layout that names them that way.
    fn shared_object_name(&self, identifier: &str) -> String {
        match (self.arch_tagged, &self.roots.so_tag) {
            (true, Some(tag)) => format!("{identifier}.{tag}.so"),
            _ => format!("{identifier}.so"),
        }
    }

    /// Every path this package needs: one per shared object, then the
    /// package directory itself. `None` when the directory wasn't found.
    fn filesystem_paths(&mut self) -> Option<Vec<PathBuf>> {
        let dir = self.resolved_dir()?;
        let mut paths = Vec::with_capacity(self.shared_objects.len() + 1);
        for identifier in self.shared_objects {
            paths.push(dir.join(self.shared_object_name(identifier)));
        }
        paths.push(dir.join(self.name));
        Some(paths)
    }

    /// Record a diagnostic for every path that doesn't exist; the whole list
    /// is checked even after the first miss.
    fn report_missing(&mut self, paths: &[PathBuf]) -> bool {
        let mut missing = false;
        for path in paths {
            if !self.runtime.exists(path) {
                let message = format!("Couldn't find system python file: {}", path.display());
                debug!("{}", message);
                self.messages.push(message);
                missing = true;
            }
        }
        missing
    }

    /// True only when every file this package needs exists system-wide.
    pub fn is_available(&mut self) -> bool {
        match self.filesystem_paths() {
            Some(paths) => !self.report_missing(&paths),
            None => false,
        }
    }

    /// True only when the live probe succeeds. Probe failures are recorded,
    /// never raised.
    pub fn is_ready<P: Probe>(&mut self, probe: &P) -> bool {
        if probe.run(self.probe_code) {
            return true;
        }
        let message = format!(
            "Readiness probe failed, {} is not usable from this python",
            self.name
        );
        debug!("{}", message);
        self.messages.push(message);
        false
    }

    /// One human-readable line: ready, linkable, or not installed.
    pub fn status_line<P: Probe>(&mut self, probe: &P) -> String {
        if self.is_ready(probe) {
            format!("{} package...ready", self.name)
        } else if self.is_available() {
            format!("{} package...needs linking into virtualenv", self.name)
        } else {
            format!("{} package...not installed for this python", self.name)
        }
    }

    /// Symlink every path this package needs into `target_dir`. Existing
    /// symlinks are replaced, dangling ones included; a non-symlink occupant
    /// is left alone and reported. Fails when the package isn't fully
    /// present system-wide.
    pub fn link_into(&mut self, target_dir: &Path) -> Result<()> {
        let Some(paths) = self.filesystem_paths() else {
            return Err(self.unavailable_error());
        };
        if self.report_missing(&paths) {
            return Err(self.unavailable_error());
        }

        for source in &paths {
            let basename = source
                .file_name()
                .with_context(|| format!("No file name in {}", source.display()))?;
            let target = target_dir.join(basename);

            if self.runtime.is_symlink(&target) {
                // refresh, it may point at a previous installation
                self.runtime.remove_symlink(&target)?;
            } else if self.runtime.exists(&target) {
                let message = format!(
                    "Target path exists but is not a symlink, leaving it in place: {}",
                    target.display()
                );
                warn!("{}", message);
                self.messages.push(message);
                continue;
            }

            self.runtime.symlink(source, &target)?;
            let message = format!("linked {} to {}", target.display(), source.display());
            debug!("{}", message);
            self.messages.push(message);
        }
        Ok(())
    }

    fn unavailable_error(&self) -> anyhow::Error {
        anyhow!(
            "Package {} is unavailable, run `ss-setup status -v` for more info.",
            self.name
        )
    }
}
