//! The slice of the host build orchestrator this addon consumes: input and
//! output roots, the ordered app list, and the shared file utilities
//! (`copy_one`, `maybe_timestamp`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::{BuildError, Result};

/// Site layout and build settings handed to the addon by the host.
#[derive(Debug, Clone)]
pub struct Manager {
    /// Input root containing author-provided files.
    pub lite_dir: PathBuf,
    /// Output root the build writes into.
    pub output_dir: PathBuf,
    /// Named build targets, in declaration order. The root scope is
    /// implicit and always comes first.
    pub apps: Vec<String>,
    /// When set, output mtimes are clamped to this epoch second for
    /// reproducible builds.
    pub source_date_epoch: Option<u64>,
}

impl Manager {
    pub fn new(
        lite_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        apps: Vec<String>,
    ) -> Self {
        Self {
            lite_dir: lite_dir.into(),
            output_dir: output_dir.into(),
            apps,
            source_date_epoch: None,
        }
    }

    pub fn with_source_date_epoch(mut self, epoch: Option<u64>) -> Self {
        self.source_date_epoch = epoch;
        self
    }

    /// Copy one file, creating destination parents as needed.
    pub fn copy_one(&self, src: &Path, dest: &Path) -> Result<()> {
        // fs::copy reports one error for both sides; attribute a missing
        // or unreadable source to the source path.
        fs::metadata(src).map_err(|e| BuildError::read(src, e))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::create_dir(parent, e))?;
        }
        fs::copy(src, dest).map_err(|e| BuildError::write(dest, e))?;
        self.maybe_timestamp(dest)
    }

    /// Clamp a file's mtime to `source_date_epoch`, if configured.
    /// No-op otherwise.
    pub fn maybe_timestamp(&self, path: &Path) -> Result<()> {
        let Some(epoch) = self.source_date_epoch else {
            return Ok(());
        };
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(epoch);
        let file = fs::OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|e| BuildError::write(path, e))?;
        let times = fs::FileTimes::new().set_modified(stamp);
        file.set_times(times).map_err(|e| BuildError::write(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_one_creates_parents() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("a.css");
        let dest = tmp.path().join("deep/nested/static/a.css");
        fs::write(&src, "body{}").expect("write src");

        let manager = Manager::new(tmp.path(), tmp.path(), vec![]);
        manager.copy_one(&src, &dest).expect("copy");

        assert_eq!(fs::read_to_string(&dest).expect("read dest"), "body{}");
    }

    #[test]
    fn copy_one_missing_src_reports_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let manager = Manager::new(tmp.path(), tmp.path(), vec![]);
        let missing = tmp.path().join("nope.css");
        let err = manager
            .copy_one(&missing, &tmp.path().join("out.css"))
            .unwrap_err();
        match err {
            BuildError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("expected read error for the source, got {other:?}"),
        }
    }

    #[test]
    fn maybe_timestamp_clamps_mtime() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("f.css");
        fs::write(&path, "x").expect("write");

        let manager =
            Manager::new(tmp.path(), tmp.path(), vec![]).with_source_date_epoch(Some(1_000_000));
        manager.maybe_timestamp(&path).expect("timestamp");

        let mtime = fs::metadata(&path)
            .expect("metadata")
            .modified()
            .expect("mtime");
        assert_eq!(
            mtime,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000)
        );
    }

    #[test]
    fn maybe_timestamp_noop_without_epoch() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("f.css");
        fs::write(&path, "x").expect("write");
        let before = fs::metadata(&path).expect("metadata").modified().expect("mtime");

        let manager = Manager::new(tmp.path(), tmp.path(), vec![]);
        manager.maybe_timestamp(&path).expect("timestamp");

        let after = fs::metadata(&path).expect("metadata").modified().expect("mtime");
        assert_eq!(before, after);
    }
}
