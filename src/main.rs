mod auth;
mod classify;
mod config;
mod decode;
mod detect;
mod error;
mod firebase;
mod ocr;
mod roads;
mod server;
#[cfg(test)]
mod testing;
mod types;

use crate::auth::TokenSource;
use crate::config::Config;
use crate::detect::Detector;
use crate::firebase::FirebasePublisher;
use crate::ocr::OcrsExtractor;
use env_logger::Env;
use log::{error, info};
use std::process;
use std::sync::Arc;

#[macro_use]
extern crate failure;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting ambulance-flag");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    let detector = match build_detector(&config).await {
        Ok(detector) => detector,
        Err(e) => {
            error!("Startup failed: {}", e);
            process::exit(1);
        }
    };
    info!(
        "Writing flags for roads {} to {}",
        config.roads.ids().collect::<Vec<_>>().join(", "),
        config.database_url
    );

    server::run(detector, config.port, config.max_upload_bytes).await;
    info!("Exiting main");
}

async fn build_detector(config: &Config) -> Result<Detector, failure::Error> {
    let client = reqwest::Client::new();
    let tokens = TokenSource::new(config.service_account.clone(), client.clone())?;
    let publisher = FirebasePublisher::new(client, config.database_url.clone(), tokens);

    let detection = config.detection_model.clone();
    let recognition = config.recognition_model.clone();
    let extractor = tokio::task::spawn_blocking(move || OcrsExtractor::load(&detection, &recognition))
        .await
        .map_err(|e| format_err!("OCR model loader panicked: {}", e))??;

    Ok(Detector::new(
        config.roads.clone(),
        Arc::new(extractor),
        Arc::new(publisher),
    ))
}
