mod app;
mod charts;
mod form;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use app::ChurnApp;
use churnguard::config::DEFAULT_CONFIG_FILE;
use churnguard::{AppConfig, ChurnService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // An explicit path must exist; the default file is optional.
    let config = match std::env::args_os().nth(1) {
        Some(path) => AppConfig::load(&PathBuf::from(path)),
        None => AppConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE)),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let service = match ChurnService::load(&config) {
        Ok(service) => service,
        Err(e) => {
            error!("Cannot start churn form: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Starting form with {}", service.classifier_name());

    let native_options = eframe::NativeOptions::default();
    let result = eframe::run_native(
        "Customer Churn Prediction",
        native_options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(ChurnApp::new(service, config)))
        }),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Window closed with error: {e}");
            ExitCode::FAILURE
        }
    }
}
