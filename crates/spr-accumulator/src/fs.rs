//! Filesystem artifact store
//!
//! Hand-authored files are probed under the source roots in order. Prior-pass
//! artifacts are read from, and final artifacts written to, the output root.
//! Writes go to a temp file in the target directory and are persisted with a
//! rename, so a failed write never leaves a truncated artifact behind.

use crate::error::StoreError;
use crate::store::ArtifactStore;
use spr_model::{ImplementationId, ResourcePath};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Extension of dependency-info files
pub const DEPINFO_SUFFIX: &str = ".deps";

/// Artifact store backed by directories
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    source_roots: Vec<PathBuf>,
    output_root: PathBuf,
    depinfo_root: Option<PathBuf>,
    atomic_writes: bool,
}

impl FsArtifactStore {
    /// Create store writing below `output_root`
    #[inline]
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_roots: Vec::new(),
            output_root: output_root.into(),
            depinfo_root: None,
            atomic_writes: true,
        }
    }

    /// Add a source root probed for hand-authored artifacts
    #[inline]
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    /// Write `<path>.deps` provenance files below `root`
    #[inline]
    #[must_use]
    pub fn with_depinfo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.depinfo_root = Some(root.into());
        self
    }

    /// Enable or disable temp-file-and-rename writes
    #[inline]
    #[must_use]
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }

    /// Output root
    #[inline]
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Filesystem location of the artifact for `path`
    #[inline]
    #[must_use]
    pub fn output_path(&self, path: &ResourcePath) -> PathBuf {
        path.to_path_under(&self.output_root)
    }

    /// Filesystem location of the provenance file for `path`, if enabled
    #[must_use]
    pub fn depinfo_path(&self, path: &ResourcePath) -> Option<PathBuf> {
        self.depinfo_root.as_ref().map(|root| {
            let target = path.to_path_under(root);
            target.with_file_name(format!("{}{DEPINFO_SUFFIX}", path.file_name()))
        })
    }

    fn write_file(&self, target: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let parent = target.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

        if !self.atomic_writes {
            return fs::write(target, contents).map_err(|e| StoreError::io(target, e));
        }

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
        temp.write_all(contents)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(target)
            .map_err(|e| StoreError::io(target, e.error))?;
        Ok(())
    }
}

impl ArtifactStore for FsArtifactStore {
    fn probe_source(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        for root in &self.source_roots {
            let candidate = path.to_path_under(root);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => return Ok(Some(candidate.display().to_string())),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(candidate, e)),
            }
        }
        Ok(None)
    }

    fn read_output(&self, path: &ResourcePath) -> Result<Option<String>, StoreError> {
        let target = self.output_path(path);
        match fs::read(&target) {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StoreError::Encoding { path: target }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(target, e)),
        }
    }

    fn write_output(
        &self,
        path: &ResourcePath,
        contents: &str,
        provenance: &[ImplementationId],
    ) -> Result<(), StoreError> {
        // The artifact goes last so a failed dep-info write leaves no output.
        if let Some(depinfo) = self.depinfo_path(path) {
            let mut listing = String::new();
            for declaration in provenance {
                listing.push_str(declaration.as_str());
                listing.push('\n');
            }
            self.write_file(&depinfo, listing.as_bytes())?;
        }

        self.write_file(&self.output_path(path), contents.as_bytes())?;

        tracing::debug!("Wrote {} ({} contributors)", path, provenance.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spr_test_utils::id;

    fn path() -> ResourcePath {
        "META-INF/services/org.acme.Codec".parse().unwrap()
    }

    #[test]
    fn probe_finds_hand_authored_file() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(out.path()).with_source_root(src.path());

        assert_eq!(store.probe_source(&path()).unwrap(), None);

        let file = path().to_path_under(src.path());
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "org.acme.Manual\n").unwrap();

        let found = store.probe_source(&path()).unwrap().unwrap();
        assert!(found.ends_with("org.acme.Codec"));
    }

    #[test]
    fn probe_ignores_directories() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(path().to_path_under(src.path())).unwrap();

        let store = FsArtifactStore::new(out.path()).with_source_root(src.path());
        assert_eq!(store.probe_source(&path()).unwrap(), None);
    }

    #[test]
    fn write_then_read_output() {
        let out = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(out.path());

        assert_eq!(store.read_output(&path()).unwrap(), None);
        store
            .write_output(&path(), "org.acme.Fast\n", &[id("org.acme.Fast")])
            .unwrap();
        assert_eq!(store.read_output(&path()).unwrap().as_deref(), Some("org.acme.Fast\n"));
    }

    #[test]
    fn non_atomic_write() {
        let out = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(out.path()).with_atomic_writes(false);
        store.write_output(&path(), "a.A\n", &[]).unwrap();
        assert_eq!(fs::read_to_string(store.output_path(&path())).unwrap(), "a.A\n");
    }

    #[test]
    fn writes_depinfo() {
        let out = tempfile::tempdir().unwrap();
        let deps = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(out.path()).with_depinfo_root(deps.path());

        store
            .write_output(&path(), "a.A\nb.B\n", &[id("a.A"), id("b.B")])
            .unwrap();

        let depinfo = store.depinfo_path(&path()).unwrap();
        assert!(depinfo.ends_with("META-INF/services/org.acme.Codec.deps"));
        assert_eq!(fs::read_to_string(depinfo).unwrap(), "a.A\nb.B\n");
    }

    #[test]
    fn depinfo_failure_produces_no_artifact() {
        let out = tempfile::tempdir().unwrap();
        let deps = tempfile::tempdir().unwrap();
        fs::create_dir_all(deps.path().join("META-INF")).unwrap();
        fs::write(deps.path().join("META-INF/services"), "not a directory").unwrap();
        let store = FsArtifactStore::new(out.path()).with_depinfo_root(deps.path());

        let err = store.write_output(&path(), "a.A\n", &[id("a.A")]).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!store.output_path(&path()).exists());
        assert_eq!(store.read_output(&path()).unwrap(), None);
    }

    #[test]
    fn read_rejects_invalid_utf8() {
        let out = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(out.path());
        let file = store.output_path(&path());
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            store.read_output(&path()),
            Err(StoreError::Encoding { .. })
        ));
    }
}
