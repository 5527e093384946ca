//! Symlink operations (create, remove, detect).

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        use std::os::unix::fs::symlink as unix_symlink;
        unix_symlink(original, link)
            .with_context(|| format!("Failed to create symlink at {}", link.display()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove symlink at {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[test]
    fn test_real_runtime_symlink_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();

        let link = dir.path().join("link");
        runtime.symlink(&target, &link).unwrap();
        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));
        assert_eq!(std::fs::read_link(&link).unwrap(), target);

        runtime.remove_symlink(&link).unwrap();
        assert!(!runtime.exists(&link));
    }

    #[test]
    fn test_dangling_symlink_is_still_a_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let target = dir.path().join("vanished");
        let link = dir.path().join("link");
        runtime.symlink(&target, &link).unwrap();

        // exists() follows the link, is_symlink() must not
        assert!(!runtime.exists(&link));
        assert!(runtime.is_symlink(&link));

        runtime.remove_symlink(&link).unwrap();
        assert!(!runtime.is_symlink(&link));
    }

    #[test]
    fn test_symlink_over_existing_path_fails() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let target = dir.path().join("target.txt");
        std::fs::write(&target, b"content").unwrap();
        let occupied = dir.path().join("occupied.txt");
        std::fs::write(&occupied, b"other").unwrap();

        assert!(runtime.symlink(&target, &occupied).is_err());
    }
}
