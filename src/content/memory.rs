use async_trait::async_trait;
use std::io::Cursor;

use super::interface::{ContentReader, ContentSource};

/// Content reference over bytes already held in memory, e.g. handed over by
/// a platform picker that only exposes a stream.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl InMemorySource {
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }
}

#[async_trait]
impl ContentSource for InMemorySource {
    fn display_name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn open(&self) -> std::io::Result<ContentReader> {
        Ok(Box::new(Cursor::new(self.bytes.clone())))
    }
}
