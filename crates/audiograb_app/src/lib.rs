//! Audiograb app: effect runner, configuration, logging and the command line.
pub mod cli;
pub mod config;
pub mod controller;
pub mod logging;

pub use config::{AppConfig, API_BASE_URL_ENV, DEFAULT_CONFIG_FILE, PASSWORD_ENV};
pub use controller::Controller;
pub use logging::LogDestination;
