use async_trait::async_trait;
use tokio::io::AsyncRead;

pub type ContentReader = Box<dyn AsyncRead + Send + Unpin>;

/// Opaque reference to user-selected content.
///
/// The workflow never interprets the reference beyond asking for a display
/// name and reading its bytes once.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Name reported by the provider, if it knows one
    fn display_name(&self) -> Option<String>;

    /// Open the referenced content for reading
    async fn open(&self) -> std::io::Result<ContentReader>;
}
