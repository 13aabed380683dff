use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::interface::{ContentReader, ContentSource};

/// Content reference backed by a file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContentSource for LocalFileSource {
    fn display_name(&self) -> Option<String> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
    }

    async fn open(&self) -> std::io::Result<ContentReader> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}
