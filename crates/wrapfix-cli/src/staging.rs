//! Outputs staged beside their destinations and renamed into place together.
//!
//! Every file an invocation produces is first written to a temp file in the
//! destination directory. Nothing at a destination path changes until
//! [`StagedOutputs::commit`]; dropping the set discards the temp files.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;
use wrapfix_spec::{ErrorKind, StageError};

/// Code for filesystem failures while staging or committing.
pub const STAGE_IO: &str = "STAGE_001";

/// Code for two outputs claiming the same destination.
pub const STAGE_CONFLICT: &str = "STAGE_002";

/// Pending output files.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    files: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `bytes` to a temp file next to `path`.
    ///
    /// Fails with a conflict if `path` is already staged.
    pub fn stage(&mut self, path: &Path, bytes: &[u8]) -> Result<(), StageError> {
        if self.files.iter().any(|(_, staged)| staged == path) {
            return Err(StageError::new(
                ErrorKind::Io,
                STAGE_CONFLICT,
                "two outputs would be written to the same file",
            )
            .with_subject(path.display().to_string()));
        }

        let io = |err: std::io::Error| io_error(path, err);
        let mut file = tempfile::Builder::new()
            .prefix(".wrapfix_")
            .suffix(".tmp")
            .tempfile_in(parent_dir(path))
            .map_err(io)?;
        file.write_all(bytes).map_err(io)?;
        file.flush().map_err(io)?;

        debug!("staged {} byte(s) for {}", bytes.len(), path.display());
        self.files.push((file, path.to_path_buf()));
        Ok(())
    }

    /// Destinations in staging order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(_, path)| path.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Renames every staged file over its destination, in staging order.
    pub fn commit(self) -> Result<Vec<PathBuf>, StageError> {
        let mut written = Vec::with_capacity(self.files.len());
        for (file, path) in self.files {
            file.persist(&path).map_err(|err| io_error(&path, err.error))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Directory a file at `path` lives in; `.` for bare file names.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StageError {
    StageError::new(ErrorKind::Io, STAGE_IO, err.to_string()).with_subject(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_commit_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.dae");
        std::fs::write(&b, b"old").unwrap();

        let mut staged = StagedOutputs::new();
        staged.stage(&a, b"atlas").unwrap();
        staged.stage(&b, b"new").unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(std::fs::read(&b).unwrap(), b"old");

        let written = staged.commit().unwrap();
        assert_eq!(written, vec![a.clone(), b.clone()]);
        assert_eq!(std::fs::read(&a).unwrap(), b"atlas");
        assert_eq!(std::fs::read(&b).unwrap(), b"new");
        assert_eq!(entries(dir.path()), vec!["a.png", "b.dae"]);
    }

    #[test]
    fn test_drop_leaves_destinations_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("scene.glb");
        std::fs::write(&target, b"original").unwrap();

        {
            let mut staged = StagedOutputs::new();
            staged.stage(&target, b"patched").unwrap();
            assert_eq!(staged.paths().count(), 1);
        }

        assert_eq!(std::fs::read(&target).unwrap(), b"original");
        assert_eq!(entries(dir.path()), vec!["scene.glb"]);
    }

    #[test]
    fn test_same_destination_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("tile_condensed.png");
        let mut staged = StagedOutputs::new();
        staged.stage(&target, b"one").unwrap();
        let err = staged.stage(&target, b"two").unwrap_err();
        assert_eq!(err.code, STAGE_CONFLICT);
        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.dae");
        let err = StagedOutputs::new().stage(&target, b"x").unwrap_err();
        assert_eq!(err.code, STAGE_IO);
        assert_eq!(err.subject, Some(target.display().to_string()));
    }

    #[test]
    fn test_parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("scene.dae")), Path::new("."));
        assert_eq!(parent_dir(Path::new("out/scene.dae")), Path::new("out"));
    }
}
