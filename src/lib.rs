//! Voice language prediction client.
//!
//! Materializes a user-selected audio file into a cache copy, uploads it to
//! the remote language-identification service and publishes the outcome
//! through a single observable state slot.

pub mod config;
pub mod content;
pub mod language_service;
pub mod predictor;
pub mod workflow;

pub use content::{ContentSource, InMemorySource, LocalFileSource};
pub use predictor::{LanguagePredictor, PredictionResult, PredictorClient};
pub use workflow::{LanguagePredictionWorkflow, UploadableFile, WorkflowState};
