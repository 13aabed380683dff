pub mod types;
pub mod materialize;
pub mod handler;

pub use handler::LanguagePredictionWorkflow;
pub use materialize::{materialize, purge_stale_uploads, remove_uploadable, UploadableFile};
pub use types::WorkflowState;
