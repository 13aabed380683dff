pub mod interface;
pub mod local;
pub mod memory;

pub use interface::{ContentReader, ContentSource};
pub use local::LocalFileSource;
pub use memory::InMemorySource;
