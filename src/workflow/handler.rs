use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use super::materialize::{materialize, purge_stale_uploads, remove_uploadable};
use super::types::{
    WorkflowState, MATERIALIZE_FAILED_MESSAGE, NO_FILE_SELECTED_MESSAGE,
    UNKNOWN_API_ERROR_MESSAGE,
};
use crate::content::ContentSource;
use crate::predictor::LanguagePredictor;

/// Subdirectory of the cache that holds uploadable copies
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Drives one file selection at a time through materialize and upload, and
/// publishes every transition to a single watch slot.
#[derive(Clone)]
pub struct LanguagePredictionWorkflow {
    predictor: Arc<dyn LanguagePredictor>,
    uploads_dir: PathBuf,
    state_tx: Arc<watch::Sender<WorkflowState>>,
}

impl LanguagePredictionWorkflow {
    pub fn new(predictor: Arc<dyn LanguagePredictor>, cache_dir: impl AsRef<Path>) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::Idle);
        Self {
            predictor,
            uploads_dir: cache_dir.as_ref().join(UPLOADS_DIR_NAME),
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn state(&self) -> WorkflowState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_tx.subscribe()
    }

    /// Remove copies left in the upload cache by an earlier run.
    pub async fn purge_stale_uploads(&self) -> usize {
        let removed = purge_stale_uploads(&self.uploads_dir).await;
        if removed > 0 {
            info!("Removed {} stale upload(s) from {}", removed, self.uploads_dir.display());
        }
        removed
    }

    /// Handle a file selection from the picker.
    ///
    /// Returns the handle of the background task when processing started.
    /// A missing reference goes straight to `Error`. Selections are only
    /// taken in `Idle` or `Error`; anywhere else they are ignored.
    pub fn select_file(
        &self,
        reference: Option<Arc<dyn ContentSource>>,
    ) -> Option<JoinHandle<WorkflowState>> {
        let mut accepted = false;
        let selected = reference.is_some();
        self.state_tx.send_if_modified(|state| {
            if !state.accepts_selection() {
                return false;
            }
            *state = if selected {
                WorkflowState::Processing
            } else {
                WorkflowState::error(NO_FILE_SELECTED_MESSAGE)
            };
            accepted = true;
            true
        });

        if !accepted {
            warn!("Ignoring file selection in state {:?}", self.state());
            return None;
        }

        let source = reference?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("prediction", %request_id);
        let workflow = self.clone();
        Some(tokio::spawn(
            async move {
                let state = workflow.run_request(source.as_ref()).await;
                workflow.publish(state.clone());
                state
            }
            .instrument(span),
        ))
    }

    /// Same as [`select_file`](Self::select_file) but waits for the outcome.
    pub async fn predict_from_file(
        &self,
        reference: Option<Arc<dyn ContentSource>>,
    ) -> WorkflowState {
        let Some(handle) = self.select_file(reference) else {
            return self.state();
        };

        match handle.await {
            Ok(state) => state,
            Err(e) => {
                error!("Prediction task failed: {}", e);
                let state = WorkflowState::error(format!("Error processing file: {}", e));
                self.publish(state.clone());
                state
            }
        }
    }

    /// Return to `Idle` from `Success` or `Error`.
    ///
    /// No-op when already idle; ignored while a request is in flight so the
    /// pending result cannot land on top of a fresh `Idle`.
    pub fn reset(&self) {
        let mut busy = false;
        self.state_tx.send_if_modified(|state| {
            if !state.is_terminal() {
                busy = *state == WorkflowState::Processing;
                return false;
            }
            *state = WorkflowState::Idle;
            true
        });

        if busy {
            warn!("Ignoring reset while a prediction is in progress");
        }
    }

    fn publish(&self, state: WorkflowState) {
        self.state_tx.send_replace(state);
    }

    async fn run_request(&self, source: &dyn ContentSource) -> WorkflowState {
        let file = match materialize(source, &self.uploads_dir).await {
            Ok(file) if !file.is_empty() => file,
            Ok(file) => {
                error!("Selected content produced an empty file: {}", file.name);
                remove_uploadable(&file).await;
                return WorkflowState::error(MATERIALIZE_FAILED_MESSAGE);
            }
            Err(e) => {
                error!("Failed to create temp file from selection: {}", e);
                return WorkflowState::error(MATERIALIZE_FAILED_MESSAGE);
            }
        };

        info!(
            "File copied to cache. Processing file: {}, Size: {}",
            file.path.display(),
            file.len
        );

        // Run the call on its own task so a panicking predictor still lets
        // the copy be removed.
        let predictor = Arc::clone(&self.predictor);
        let upload = file.clone();
        let outcome = tokio::spawn(
            async move { predictor.predict(&upload).await }.in_current_span(),
        )
        .await;

        remove_uploadable(&file).await;

        match outcome {
            Ok(result) => match result.predicted_language {
                Some(language) => {
                    info!("Predicted language {} for {}", language, file.name);
                    WorkflowState::success(language, file.name)
                }
                None => {
                    let message = result
                        .error
                        .unwrap_or_else(|| UNKNOWN_API_ERROR_MESSAGE.to_string());
                    warn!("Prediction failed for {}: {}", file.name, message);
                    WorkflowState::error(message)
                }
            },
            Err(e) => {
                error!("Exception during file processing or API call: {}", e);
                WorkflowState::error(format!("Error processing file: {}", e))
            }
        }
    }
}
