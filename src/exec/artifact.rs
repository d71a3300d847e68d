// src/exec/artifact.rs

//! Temporary script artifacts.
//!
//! Each invocation materializes its code as `<scratch>/<id>-<random>.<ext>`.
//! The random part keeps concurrent runs of the same plugin id on separate
//! paths. The file is removed when the artifact is dropped, so every exit
//! path of a run cleans up after itself.

use std::io::{self, Write};
use std::path::Path;

use tempfile::TempPath;

use crate::types::PluginId;

#[derive(Debug)]
pub struct ScriptArtifact {
    path: TempPath,
}

impl ScriptArtifact {
    /// Create the artifact under `dir` and write `code` to it verbatim.
    pub fn write(dir: &Path, id: PluginId, extension: &str, code: &str) -> io::Result<Self> {
        let prefix = format!("{id}-");
        let suffix = format!(".{extension}");

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix).rand_bytes(8);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o644));
        }

        let mut file = builder.tempfile_in(dir)?;
        file.write_all(code.as_bytes())?;
        file.flush()?;

        // Close our handle; the interpreter opens the path itself.
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the artifact now, reporting failure instead of ignoring it.
    pub fn remove(self) -> io::Result<()> {
        self.path.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_is_named_after_plugin_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();

        let artifact = ScriptArtifact::write(dir.path(), 42, "ts", "console.log('ok')").unwrap();
        let path = artifact.path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(name.starts_with("42-"), "unexpected name {name}");
        assert!(name.ends_with(".ts"), "unexpected name {name}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "console.log('ok')");

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn same_id_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();

        let a = ScriptArtifact::write(dir.path(), 1, "ts", "a").unwrap();
        let b = ScriptArtifact::write(dir.path(), 1, "ts", "b").unwrap();

        assert_ne!(a.path(), b.path());
        a.remove().unwrap();
        b.remove().unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_directory_fails_to_write() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");

        let err = ScriptArtifact::write(&gone, 1, "ts", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
