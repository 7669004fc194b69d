//! Per-run scratch workspace.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::TranscodeError;

const MAX_LABEL_LEN: usize = 48;

/// Local directory owned by exactly one run.
///
/// Holds the downloaded source and the encoder output. Call [`release`] on
/// every exit path; dropping an unreleased workspace removes it synchronously.
///
/// [`release`]: ScratchWorkspace::release
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    input_path: PathBuf,
    output_dir: PathBuf,
    released: bool,
}

impl ScratchWorkspace {
    /// Creates `{scratch_dir}/{label}-{unix millis}-{uuid}` with an `out/`
    /// subdirectory.
    pub async fn create(
        scratch_dir: &Path,
        base_name: &str,
        extension: Option<&str>,
    ) -> Result<Self, TranscodeError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let name = format!(
            "{}-{}-{}",
            sanitize_label(base_name),
            millis,
            Uuid::new_v4().simple()
        );
        let root = scratch_dir.join(name);
        let output_dir = root.join("out");

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| TranscodeError::Workspace {
                path: output_dir.clone(),
                source,
            })?;

        let input_name = match extension {
            Some(ext) => format!("source.{}", sanitize_label(ext)),
            None => "source".to_string(),
        };

        debug!(path = %root.display(), "Created scratch workspace");

        Ok(Self {
            input_path: root.join(input_name),
            output_dir,
            root,
            released: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the source is downloaded.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Where the encoder and manifest builder write.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Removes the workspace. A directory that is already gone counts as
    /// removed.
    pub async fn release(mut self) -> Result<(), std::io::Error> {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(path = %self.root.display(), "Removed scratch workspace");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.root.display(), error = %e, "Failed to remove abandoned scratch workspace");
            }
        }
    }
}

/// Reduces a filename to characters safe in a directory name.
fn sanitize_label(name: &str) -> String {
    let label: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_LABEL_LEN)
        .collect();
    if label.is_empty() {
        "source".to_string()
    } else {
        label
    }
}
