#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone report server.
//!
//! Reads the config from `SAFETY_MAP_CONFIG` (default `report.toml`) and
//! binds to `BIND_ADDR`:`PORT` (default `127.0.0.1:8080`).

use std::path::PathBuf;

use safety_map_pipeline::ReportConfig;
use safety_map_render::SvgChartRenderer;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config_path = std::env::var("SAFETY_MAP_CONFIG")
        .map_or_else(|_| PathBuf::from("report.toml"), PathBuf::from);

    log::info!("Loading config {}...", config_path.display());
    let config = ReportConfig::load(&config_path).map_err(std::io::Error::other)?;
    let pipeline = safety_map_server::shared_pipeline(config, Box::new(SvgChartRenderer))
        .map_err(std::io::Error::other)?;

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    safety_map_server::run_server(pipeline, &bind_addr, port).await
}
