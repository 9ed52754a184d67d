//! Local file staging used to allocate scratch directories for deck bundles
//! and to copy finished bundles to a durable location.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to allocate staging directory `{path}`: {source}")]
    Allocate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy `{local}` to `{remote}`: {source}")]
    Put {
        local: PathBuf,
        remote: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid remote path `{remote}`: {reason}")]
    InvalidRemote { remote: String, reason: &'static str },
}

/// Narrow contract over the file-staging layer.
///
/// `random_local_directory` must return a directory that exists and that no
/// other caller has been handed.
pub trait FileStaging: Send + Sync {
    fn random_local_directory(&self) -> Result<PathBuf, StagingError>;

    fn put_data(&self, local_path: &Path, remote_path: &str) -> Result<(), StagingError>;
}

/// Staging backed by the local filesystem.
///
/// Scratch directories are uuid-named children of `root`. Remote paths are
/// resolved relative to `remote_root`, which stands in for object storage.
#[derive(Debug, Clone)]
pub struct LocalStaging {
    root: PathBuf,
    remote_root: PathBuf,
}

impl LocalStaging {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let remote_root = root.join("remote");
        Self { root, remote_root }
    }

    pub fn with_remote_root(mut self, remote_root: impl Into<PathBuf>) -> Self {
        self.remote_root = remote_root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote_root(&self) -> &Path {
        &self.remote_root
    }

    fn resolve_remote(&self, remote_path: &str) -> Result<PathBuf, StagingError> {
        let relative = remote_path
            .strip_prefix("file://")
            .unwrap_or(remote_path)
            .trim_start_matches('/');

        if relative.is_empty() {
            return Err(StagingError::InvalidRemote {
                remote: remote_path.to_string(),
                reason: "path is empty",
            });
        }
        if relative.split('/').any(|segment| segment == "..") {
            return Err(StagingError::InvalidRemote {
                remote: remote_path.to_string(),
                reason: "path escapes the remote root",
            });
        }

        Ok(self.remote_root.join(relative))
    }
}

impl FileStaging for LocalStaging {
    fn random_local_directory(&self) -> Result<PathBuf, StagingError> {
        let path = self.root.join(Uuid::new_v4().simple().to_string());
        fs::create_dir_all(&path).map_err(|source| StagingError::Allocate {
            path: path.clone(),
            source,
        })?;
        debug!(
            target = "infra::staging",
            path = %path.display(),
            "allocated local staging directory"
        );
        Ok(path)
    }

    fn put_data(&self, local_path: &Path, remote_path: &str) -> Result<(), StagingError> {
        let destination = self.resolve_remote(remote_path)?;
        let put_error = |source| StagingError::Put {
            local: local_path.to_path_buf(),
            remote: remote_path.to_string(),
            source,
        };

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(put_error)?;
        }
        fs::copy(local_path, &destination).map_err(put_error)?;
        Ok(())
    }
}
