//! Discovery of the system interpreter's package directories.
//!
//! Three layouts are recognized: site-packages inside the stdlib directory,
//! Debian-style dist-packages beside it (possibly under a shared
//! major-version-only directory), and site-packages under the /usr/local
//! prefix. Discovery runs once per invocation; a directory that can't be
//! found is recorded as a diagnostic, never an error.

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::interpreter::Interpreter;
use crate::runtime::Runtime;

/// A dist-packages root, and whether it sits under a major-version-only
/// directory (`/usr/lib/python3` rather than `/usr/lib/python3.10`).
#[derive(Debug, Clone)]
pub struct DistPackages {
    pub path: PathBuf,
    pub major_only: bool,
}

/// The system-wide directories packages can live in, plus the platform tag
/// for architecture-tagged shared objects. Immutable after discovery.
#[derive(Debug, Default)]
pub struct PackageRoots {
    pub stdlib: Option<PathBuf>,
    pub dist_packages: Option<DistPackages>,
    pub site_packages: Option<PathBuf>,
    /// Combined `SOABI`-`MULTIARCH` tag, when the interpreter reports both.
    pub so_tag: Option<String>,
    pub messages: Vec<String>,
}

impl PackageRoots {
    pub fn discover<R: Runtime, I: Interpreter>(runtime: &R, interp: &I) -> Self {
        let mut roots = Self::default();

        let stdlib = match interp.stdlib_dir() {
            Ok(dir) => dir,
            Err(err) => {
                let message = format!(
                    "Couldn't determine the system python stdlib directory: {:#}",
                    err
                );
                warn!("{}", message);
                roots.messages.push(message);
                return roots;
            }
        };
        note(&mut roots.messages, format!("Found stdlib at {}", stdlib.display()));

        roots.dist_packages = find_dist_packages(runtime, &stdlib, &mut roots.messages);
        roots.site_packages = find_site_packages(runtime, &stdlib, &mut roots.messages);
        roots.so_tag = shared_object_tag(interp);
        roots.stdlib = Some(stdlib);
        roots
    }
}

fn note(messages: &mut Vec<String>, message: String) {
    debug!("{}", message);
    messages.push(message);
}

fn find_dist_packages<R: Runtime>(
    runtime: &R,
    stdlib: &Path,
    messages: &mut Vec<String>,
) -> Option<DistPackages> {
    let direct = stdlib.join("dist-packages");
    if runtime.is_dir(&direct) {
        note(messages, format!("Found dist-packages at {}", direct.display()));
        return Some(DistPackages {
            path: direct,
            major_only: false,
        });
    }

    // Debian shares one dist-packages across minor versions:
    // /usr/lib/python3.10 stdlib, /usr/lib/python3/dist-packages.
    let leaf = stdlib.file_name()?.to_str()?;
    let (major, _minor) = leaf.rsplit_once('.')?;
    let candidate = stdlib.parent()?.join(major).join("dist-packages");
    if runtime.is_dir(&candidate) {
        note(messages, format!("Found dist-packages at {}", candidate.display()));
        return Some(DistPackages {
            path: candidate,
            major_only: true,
        });
    }
    None
}

fn find_site_packages<R: Runtime>(
    runtime: &R,
    stdlib: &Path,
    messages: &mut Vec<String>,
) -> Option<PathBuf> {
    let direct = stdlib.join("site-packages");
    if runtime.is_dir(&direct) {
        note(messages, format!("Found site-packages at {}", direct.display()));
        return Some(direct);
    }

    // A /usr/lib stdlib can pair with site-packages under /usr/local/lib.
    let local = stdlib
        .to_str()
        .and_then(|s| s.strip_prefix("/usr/lib/"))
        .map(|rest| Path::new("/usr/local/lib").join(rest).join("site-packages"))?;
    if runtime.is_dir(&local) {
        note(messages, format!("Found site-packages at {}", local.display()));
        return Some(local);
    }
    None
}

fn shared_object_tag<I: Interpreter>(interp: &I) -> Option<String> {
    let soabi = config_var_or_log(interp, "SOABI")?;
    let multiarch = config_var_or_log(interp, "MULTIARCH")?;
    Some(format!("{soabi}-{multiarch}"))
}

fn config_var_or_log<I: Interpreter>(interp: &I, name: &str) -> Option<String> {
    match interp.config_var(name) {
        Ok(value) => value,
        Err(err) => {
            debug!("couldn't read config var {}: {:#}", name, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::MockInterpreter;
    use crate::runtime::MockRuntime;
    use anyhow::anyhow;
    use mockall::predicate::eq;

    fn interp_reporting(
        stdlib: &str,
        soabi: Option<&str>,
        multiarch: Option<&str>,
    ) -> MockInterpreter {
        let mut interp = MockInterpreter::new();
        let stdlib = PathBuf::from(stdlib);
        interp
            .expect_stdlib_dir()
            .returning(move || Ok(stdlib.clone()));
        let soabi = soabi.map(str::to_string);
        interp
            .expect_config_var()
            .with(eq("SOABI"))
            .returning(move |_| Ok(soabi.clone()));
        let multiarch = multiarch.map(str::to_string);
        interp
            .expect_config_var()
            .with(eq("MULTIARCH"))
            .returning(move |_| Ok(multiarch.clone()));
        interp
    }

    fn runtime_with_dirs(dirs: &[&str]) -> MockRuntime {
        let mut runtime = MockRuntime::new();
        let dirs: Vec<PathBuf> = dirs.iter().map(PathBuf::from).collect();
        runtime
            .expect_is_dir()
            .returning(move |path| dirs.iter().any(|dir| dir == path));
        runtime
    }

    #[test]
    fn test_dist_packages_directly_under_stdlib() {
        let interp = interp_reporting("/usr/lib/python3.10", None, None);
        let runtime = runtime_with_dirs(&["/usr/lib/python3.10/dist-packages"]);

        let roots = PackageRoots::discover(&runtime, &interp);

        let dist = roots.dist_packages.unwrap();
        assert_eq!(dist.path, PathBuf::from("/usr/lib/python3.10/dist-packages"));
        assert!(!dist.major_only);
        assert!(roots.site_packages.is_none());
    }

    #[test]
    fn test_dist_packages_under_major_version_directory() {
        let interp = interp_reporting("/usr/lib/python3.5", None, None);
        let runtime = runtime_with_dirs(&["/usr/lib/python3/dist-packages"]);

        let roots = PackageRoots::discover(&runtime, &interp);

        let dist = roots.dist_packages.unwrap();
        assert_eq!(dist.path, PathBuf::from("/usr/lib/python3/dist-packages"));
        assert!(dist.major_only);
    }

    #[test]
    fn test_no_dist_packages_anywhere() {
        let interp = interp_reporting("/usr/lib/python3.10", None, None);
        let runtime = runtime_with_dirs(&[]);

        let roots = PackageRoots::discover(&runtime, &interp);

        assert!(roots.dist_packages.is_none());
        assert!(!roots.messages.iter().any(|m| m.contains("dist-packages")));
    }

    #[test]
    fn test_stdlib_without_minor_version_suffix() {
        let interp = interp_reporting("/opt/python/lib", None, None);
        let runtime = runtime_with_dirs(&[]);

        let roots = PackageRoots::discover(&runtime, &interp);

        assert!(roots.dist_packages.is_none());
    }

    #[test]
    fn test_site_packages_under_stdlib() {
        let interp = interp_reporting("/usr/lib/python3.10", None, None);
        let runtime = runtime_with_dirs(&["/usr/lib/python3.10/site-packages"]);

        let roots = PackageRoots::discover(&runtime, &interp);

        assert_eq!(
            roots.site_packages,
            Some(PathBuf::from("/usr/lib/python3.10/site-packages"))
        );
    }

    #[test]
    fn test_site_packages_under_usr_local() {
        let interp = interp_reporting("/usr/lib/python3.10", None, None);
        let runtime = runtime_with_dirs(&["/usr/local/lib/python3.10/site-packages"]);

        let roots = PackageRoots::discover(&runtime, &interp);

        assert_eq!(
            roots.site_packages,
            Some(PathBuf::from("/usr/local/lib/python3.10/site-packages"))
        );
    }

    #[test]
    fn test_shared_object_tag_needs_both_variables() {
        let interp = interp_reporting(
            "/usr/lib/python3.10",
            Some("cpython-310"),
            Some("x86_64-linux-gnu"),
        );
        let runtime = runtime_with_dirs(&[]);

        let roots = PackageRoots::discover(&runtime, &interp);
        assert_eq!(roots.so_tag, Some("cpython-310-x86_64-linux-gnu".to_string()));

        let interp = interp_reporting("/usr/lib/python3.10", Some("cpython-310"), None);
        let roots = PackageRoots::discover(&runtime, &interp);
        assert_eq!(roots.so_tag, None);
    }

    #[test]
    fn test_undiscoverable_stdlib_leaves_everything_unset() {
        let mut interp = MockInterpreter::new();
        interp
            .expect_stdlib_dir()
            .returning(|| Err(anyhow!("no such interpreter")));
        let runtime = MockRuntime::new();

        let roots = PackageRoots::discover(&runtime, &interp);

        assert!(roots.stdlib.is_none());
        assert!(roots.dist_packages.is_none());
        assert!(roots.site_packages.is_none());
        assert!(roots.so_tag.is_none());
        assert!(
            roots.messages[0].contains("Couldn't determine the system python stdlib directory")
        );
    }

    #[test]
    fn test_discovery_messages_name_each_directory() {
        let interp = interp_reporting("/usr/lib/python3.10", None, None);
        let runtime = runtime_with_dirs(&[
            "/usr/lib/python3.10/dist-packages",
            "/usr/lib/python3.10/site-packages",
        ]);

        let roots = PackageRoots::discover(&runtime, &interp);

        assert_eq!(roots.messages[0], "Found stdlib at /usr/lib/python3.10");
        assert_eq!(
            roots.messages[1],
            "Found dist-packages at /usr/lib/python3.10/dist-packages"
        );
        assert_eq!(
            roots.messages[2],
            "Found site-packages at /usr/lib/python3.10/site-packages"
        );
    }
}
