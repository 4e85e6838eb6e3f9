use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Request-scoped temporary copy of an upload.
///
/// The file is removed exactly once: by [`StagedUpload::release`] or, on any
/// early return, when the value is dropped.
pub struct StagedUpload {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl StagedUpload {
    /// Write `bytes` to a fresh, uniquely named file in `dir`.
    pub fn stage(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".jpg")
            .tempfile_in(dir)?;

        file.write_all(bytes)?;
        file.flush()?;

        let temp = file.into_temp_path();
        let path = temp.to_path_buf();

        tracing::debug!(path = %path.display(), size = bytes.len(), "Staged upload");

        Ok(Self {
            path,
            temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_on_disk(&self) -> io::Result<u64> {
        fs::metadata(&self.path).map(|m| m.len())
    }

    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };

        match temp.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Released staged upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged upload"
            ),
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.remove();
    }
}
