//! One-shot prediction
//!
//! Reads an inference request (JSON) from a file or stdin, runs the decision
//! engine and prints the response JSON.
//!
//! Run with: cargo run --bin predict -- request.json
//!       or: echo '{"temperature_degree_c": 12, "season": "Spring"}' | cargo run --bin predict

use anyhow::Context;
use fishzone::config::ServerConfig;
use fishzone::request::PredictionRequest;
use fishzone::{DecisionEngine, ModelArtifacts};
use std::io::Read;

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    let body = match std::env::args().nth(1) {
        Some(path) => std::fs::read(&path).with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .with_context(|| "Failed to read stdin")?;
            buf
        }
    };

    let engine = DecisionEngine::from_artifacts(ModelArtifacts::load(&config.model_dir)?);

    let outcome = PredictionRequest::from_json(&body)
        .and_then(|req| req.into_reading())
        .and_then(|reading| engine.decide(&reading));

    match outcome {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            std::process::exit(1);
        }
    }
}
