use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use crate::content::ContentSource;

/// Extension given to uploads whose provider reports no name
pub const FALLBACK_EXTENSION: &str = "mp3";

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("failed to copy selected content: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-scoped copy of the selected content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableFile {
    pub path: PathBuf,
    pub name: String,
    pub len: u64,
}

impl UploadableFile {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Keep only the last path component of a provider-supplied name.
fn sanitize_file_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    Path::new(trimmed)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(|n| n.to_string())
}

pub fn derive_file_name(display_name: Option<&str>) -> String {
    display_name
        .and_then(sanitize_file_name)
        .unwrap_or_else(|| {
            format!(
                "upload_{}.{}",
                chrono::Utc::now().timestamp_millis(),
                FALLBACK_EXTENSION
            )
        })
}

/// Copy the referenced content into `uploads_dir`.
pub async fn materialize(
    source: &dyn ContentSource,
    uploads_dir: &Path,
) -> Result<UploadableFile, MaterializeError> {
    tokio::fs::create_dir_all(uploads_dir).await?;

    let mut reader = source.open().await?;
    let name = derive_file_name(source.display_name().as_deref());
    let path = uploads_dir.join(&name);

    match write_copy(&mut reader, &path).await {
        Ok(len) => Ok(UploadableFile { path, name, len }),
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial copy {}: {}", path.display(), remove_err);
                }
            }
            Err(e.into())
        }
    }
}

/// Stream `reader` into a new file at `path` and return its size on disk.
async fn write_copy<R>(reader: &mut R, path: &Path) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::create(path).await?;
    let copied = tokio::io::copy(reader, &mut file).await?;
    file.flush().await?;
    drop(file);
    debug!("Copied {} bytes into {}", copied, path.display());

    Ok(tokio::fs::metadata(path).await?.len())
}

/// Best-effort removal of an uploadable copy; failures are only logged.
pub async fn remove_uploadable(file: &UploadableFile) -> bool {
    match tokio::fs::remove_file(&file.path).await {
        Ok(()) => {
            debug!("Cleaned up temporary audio file: {}", file.name);
            true
        }
        Err(e) => {
            warn!("Failed to remove temporary audio file {}: {}", file.path.display(), e);
            false
        }
    }
}

/// Delete uploads left behind by a process that died mid-request.
pub async fn purge_stale_uploads(uploads_dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(uploads_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("Cannot scan upload cache {}: {}", uploads_dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Cannot scan upload cache {}: {}", uploads_dir.display(), e);
                break;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove stale upload {}: {}", path.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentReader, InMemorySource};
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    struct UnreadableSource;

    #[async_trait]
    impl ContentSource for UnreadableSource {
        fn display_name(&self) -> Option<String> {
            Some("locked.mp3".to_string())
        }

        async fn open(&self) -> std::io::Result<ContentReader> {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ))
        }
    }

    /// Yields some bytes, then fails mid-stream
    struct TruncatedSource;

    #[async_trait]
    impl ContentSource for TruncatedSource {
        fn display_name(&self) -> Option<String> {
            Some("cut.mp3".to_string())
        }

        async fn open(&self) -> std::io::Result<ContentReader> {
            let head: &'static [u8] = &[0xFF, 0xFB, 0x90, 0x64];
            Ok(Box::new(head.chain(FailingReader)))
        }
    }

    struct FailingReader;

    impl tokio::io::AsyncRead for FailingReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "provider went away",
            )))
        }
    }

    #[test]
    fn test_derive_file_name_keeps_display_name() {
        assert_eq!(derive_file_name(Some("speech.mp3")), "speech.mp3");
    }

    #[test]
    fn test_derive_file_name_strips_directories() {
        assert_eq!(derive_file_name(Some("../../etc/speech.mp3")), "speech.mp3");
    }

    #[test]
    fn test_derive_file_name_falls_back_to_timestamp() {
        for name in [None, Some(""), Some(".."), Some("   ")] {
            let derived = derive_file_name(name);
            assert!(derived.starts_with("upload_"), "{derived}");
            assert!(derived.ends_with(".mp3"), "{derived}");
            let millis = &derived["upload_".len()..derived.len() - ".mp3".len()];
            assert!(millis.parse::<i64>().is_ok(), "{derived}");
        }
    }

    #[tokio::test]
    async fn test_materialize_copies_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("uploads");
        let source = InMemorySource::new(Some("clip.mp3".to_string()), vec![7u8; 2048]);

        let file = materialize(&source, &uploads).await.unwrap();

        assert_eq!(file.name, "clip.mp3");
        assert_eq!(file.len, 2048);
        assert_eq!(file.path, uploads.join("clip.mp3"));
        assert_eq!(std::fs::read(&file.path).unwrap(), vec![7u8; 2048]);
    }

    #[tokio::test]
    async fn test_materialize_empty_content() {
        let temp_dir = TempDir::new().unwrap();
        let source = InMemorySource::new(None, Vec::new());

        let file = materialize(&source, temp_dir.path()).await.unwrap();

        assert!(file.is_empty());
        assert!(file.name.starts_with("upload_"));
    }

    #[tokio::test]
    async fn test_materialize_unreadable_source() {
        let temp_dir = TempDir::new().unwrap();
        let result = materialize(&UnreadableSource, temp_dir.path()).await;

        assert!(matches!(result, Err(MaterializeError::Io(_))));
        assert!(!temp_dir.path().join("locked.mp3").exists());
    }

    #[tokio::test]
    async fn test_materialize_removes_partial_copy_on_read_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = materialize(&TruncatedSource, temp_dir.path()).await;

        assert!(matches!(result, Err(MaterializeError::Io(_))));
        assert!(!temp_dir.path().join("cut.mp3").exists());
    }

    #[tokio::test]
    async fn test_remove_uploadable_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = UploadableFile {
            path: temp_dir.path().join("never-written.mp3"),
            name: "never-written.mp3".to_string(),
            len: 0,
        };
        assert!(!remove_uploadable(&file).await);
    }

    #[tokio::test]
    async fn test_purge_stale_uploads() {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("uploads");
        std::fs::create_dir_all(uploads.join("nested")).unwrap();
        std::fs::write(uploads.join("a.mp3"), b"a").unwrap();
        std::fs::write(uploads.join("upload_1700000000000.mp3"), b"b").unwrap();

        assert_eq!(purge_stale_uploads(&uploads).await, 2);
        assert!(!uploads.join("a.mp3").exists());
        assert!(uploads.join("nested").exists());
    }

    #[tokio::test]
    async fn test_purge_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(purge_stale_uploads(&temp_dir.path().join("absent")).await, 0);
    }
}
