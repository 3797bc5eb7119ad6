//! File hand-off: validate a path and open it for streaming.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::stream::{self, Stream};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use super::path::{classify_io, resolve};
use crate::error::ShellExecError;

/// Default streaming chunk size.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// File sender configuration.
#[derive(Debug, Clone)]
pub struct FileSenderConfig {
    /// Directory that requested paths must stay inside, if any.
    pub base_directory: Option<PathBuf>,
    /// Size of the chunks yielded by [`PreparedFile::into_stream`].
    pub chunk_size: usize,
}

impl Default for FileSenderConfig {
    fn default() -> Self {
        Self {
            base_directory: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Request to hand a file back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSendRequest {
    pub path: String,
}

impl FileSendRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// An opened regular file, exclusively owned by the caller.
///
/// Dropping it closes the file.
#[derive(Debug)]
pub struct PreparedFile {
    path: PathBuf,
    name: String,
    size: u64,
    chunk_size: usize,
    file: File,
}

impl PreparedFile {
    /// Resolved path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name suitable for an attachment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes at the time the file was opened.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Take the raw async reader.
    pub fn into_reader(self) -> File {
        self.file
    }

    /// Stream the file in chunks without buffering it whole.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Vec<u8>>> + Send {
        let chunk_size = self.chunk_size.max(1);
        stream::try_unfold(self.file, move |mut file| async move {
            let mut buf = vec![0u8; chunk_size];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.truncate(n);
            Ok::<_, io::Error>(Some((buf, file)))
        })
    }
}

/// Outcome of [`FileSender::prepare`].
#[derive(Debug)]
pub enum FileSendResult {
    /// The file is open and ready to be streamed.
    Ready(PreparedFile),
    /// The path could not be used; nothing was opened.
    Unavailable { path: PathBuf, error: ShellExecError },
}

impl FileSendResult {
    /// Whether the path resolved to a readable regular file.
    pub fn exists(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// File size, zero when unavailable.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Ready(file) => file.size(),
            Self::Unavailable { .. } => 0,
        }
    }

    pub fn error(&self) -> Option<&ShellExecError> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { error, .. } => Some(error),
        }
    }

    /// Convert into a `Result`, handing ownership of the file to the caller.
    pub fn into_result(self) -> Result<PreparedFile, ShellExecError> {
        match self {
            Self::Ready(file) => Ok(file),
            Self::Unavailable { error, .. } => Err(error),
        }
    }
}

/// Validates paths and opens files for transfer.
#[derive(Debug, Clone, Default)]
pub struct FileSender {
    config: FileSenderConfig,
}

impl FileSender {
    pub fn new(config: FileSenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FileSenderConfig {
        &self.config
    }

    /// Resolve, check and open the requested file.
    pub async fn prepare(&self, request: &FileSendRequest) -> FileSendResult {
        match self.open(&request.path).await {
            Ok(file) => {
                info!(path = %file.path.display(), size = file.size, "file prepared for sending");
                FileSendResult::Ready(file)
            }
            Err(error) => {
                debug!(path = %request.path, error = %error, "file unavailable");
                FileSendResult::Unavailable {
                    path: PathBuf::from(&request.path),
                    error,
                }
            }
        }
    }

    async fn open(&self, raw: &str) -> Result<PreparedFile, ShellExecError> {
        let path = resolve(raw, self.config.base_directory.as_deref()).await?;

        // Stat before opening so FIFOs and devices are never opened.
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| classify_io(e, &path))?;
        if !metadata.is_file() {
            return Err(ShellExecError::NotARegularFile(path));
        }

        let file = File::open(&path).await.map_err(|e| classify_io(e, &path))?;
        let metadata = file.metadata().await.map_err(|e| classify_io(e, &path))?;
        if !metadata.is_file() {
            return Err(ShellExecError::NotARegularFile(path));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Ok(PreparedFile {
            name,
            size: metadata.len(),
            chunk_size: self.config.chunk_size,
            path,
            file,
        })
    }
}
