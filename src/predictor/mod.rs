pub mod interface;
pub mod client;

pub use interface::{LanguagePredictor, PredictionResult};
pub use client::PredictorClient;
