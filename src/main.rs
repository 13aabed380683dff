use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use langid_predict::config::Config;
use langid_predict::{
    ContentSource, LanguagePredictionWorkflow, LocalFileSource, PredictorClient, WorkflowState,
};

#[derive(Parser, Debug)]
#[command(name = "langid-predict", version, about = "Predict the spoken language of MP3 files")]
struct Args {
    /// Configuration file (YAML, JSON or JSON-LD)
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// Override the cache directory from the configuration
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Print each final state as a JSON line
    #[arg(long)]
    json: bool,

    /// MP3 files to identify
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

/// First config that loads wins; built-in defaults otherwise.
fn load_config(explicit: Option<&str>) -> Result<(Config, Option<String>)> {
    if let Some(path) = explicit {
        return Ok((Config::load(path)?, Some(path.to_string())));
    }

    for path in ["conf.yaml", "conf.jsonld", "conf.json"] {
        if std::path::Path::new(path).exists() {
            return Ok((Config::load(path)?, Some(path.to_string())));
        }
    }

    Ok((Config::default(), None))
}

fn render(state: &WorkflowState, json: bool) -> String {
    if json {
        serde_json::to_string(state).unwrap_or_else(|_| state.to_string())
    } else {
        state.to_string()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, loaded_path) = load_config(args.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.system_config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &loaded_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => debug!("No configuration file found, using defaults"),
    }

    let cache_dir = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| config.system_config.cache_path());

    let workflow = LanguagePredictionWorkflow::new(Arc::new(PredictorClient::new()), &cache_dir);
    workflow.purge_stale_uploads().await;

    // Presentation side: observe the state slot on its own schedule.
    let mut state_rx = workflow.subscribe();
    let observer = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow_and_update().clone();
            debug!("State -> {:?}", state);
            if state == WorkflowState::Processing {
                info!("{}", state);
            }
        }
    });

    let total = args.files.len();
    let mut failed = 0;
    for path in &args.files {
        let reference: Option<Arc<dyn ContentSource>> = if path.is_file() {
            Some(Arc::new(LocalFileSource::new(path)))
        } else {
            warn!("Not a readable file: {}", path.display());
            None
        };

        let state = workflow.predict_from_file(reference).await;
        if matches!(state, WorkflowState::Error { .. }) {
            failed += 1;
        }
        println!("{}", render(&state, args.json));

        workflow.reset();
    }

    drop(workflow);
    let _ = observer.await;

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be identified", failed, total);
    }
    Ok(())
}
