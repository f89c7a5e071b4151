#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the district safety report.
//!
//! ```text
//! safety_map render --output report.html [--cctv] [--lamp] [--charts svg|table]
//! safety_map serve [--bind 127.0.0.1] [--port 8080]
//! safety_map zones
//! safety_map hourly
//! ```
//!
//! Every subcommand reads `--config` (default `report.toml`, or
//! `SAFETY_MAP_CONFIG`).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use safety_map_models::FacilityVisibility;
use safety_map_pipeline::{ReportConfig, ReportPipeline};
use safety_map_render::{ChartRenderer, PageMode, renderer_by_name};

#[derive(Parser)]
#[command(name = "safety_map", about = "Render and serve the district safety report")]
struct Cli {
    /// Report configuration file
    #[arg(long, global = true, env = "SAFETY_MAP_CONFIG", default_value = "report.toml")]
    config: PathBuf,

    /// Chart style
    #[arg(long, global = true, default_value = "svg", value_parser = ["svg", "table"])]
    charts: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the report to a static HTML file
    Render {
        /// Output file
        #[arg(long, short, default_value = "report.html")]
        output: PathBuf,
        /// Show CCTV locations on the map
        #[arg(long)]
        cctv: bool,
        /// Show streetlight locations on the map
        #[arg(long)]
        lamp: bool,
        /// URL prefix for intro images (defaults to the assets directory,
        /// relative to the output file)
        #[arg(long)]
        assets_base: Option<String>,
    },
    /// Serve the report over HTTP
    Serve {
        /// Address to bind
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
    /// Print the allow-listed zones ranked by risk grade
    Zones,
    /// Print crime counts per hour bucket
    Hourly,
}

fn renderer(name: &str) -> Result<Box<dyn ChartRenderer>, String> {
    renderer_by_name(name).ok_or_else(|| format!("Unknown chart style: {name}"))
}

/// URL prefix that reaches `assets_dir` from a page written to `output`.
fn default_assets_base(assets_dir: &Path, output: &Path) -> std::io::Result<String> {
    let assets_dir = std::path::absolute(assets_dir)?;
    let output = std::path::absolute(output)?;
    let output_dir = output.parent().unwrap_or(&output);

    let relative = pathdiff::diff_paths(&assets_dir, output_dir).unwrap_or(assets_dir);
    if relative.is_absolute() {
        return Ok(relative.display().to_string());
    }
    let segments: Vec<_> = relative.iter().map(|s| s.to_string_lossy()).collect();
    Ok(if segments.is_empty() {
        ".".to_owned()
    } else {
        segments.join("/")
    })
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = ReportConfig::load(&cli.config)?;
    let renderer = renderer(&cli.charts)?;

    match cli.command {
        Commands::Render {
            output,
            cctv,
            lamp,
            assets_base,
        } => {
            let assets_base = match assets_base {
                Some(base) => base,
                None => default_assets_base(&config.assets_dir, &output)?,
            };
            let pipeline = ReportPipeline::new(config.clone(), config.file_loader()?, renderer);
            let report = pipeline.render(
                FacilityVisibility { cctv, lamp },
                &assets_base,
                PageMode::Static,
            )?;

            std::fs::write(&output, &report.html)?;
            if let Some(banner) = &report.error_banner {
                log::warn!("Map data unavailable: {banner}");
            }
            println!(
                "Wrote {} ({} zones, {} markers)",
                output.display(),
                report.zones.len(),
                report.map.total_markers()
            );
        }
        Commands::Serve { bind, port } => {
            let pipeline = safety_map_server::shared_pipeline(config, renderer)?;
            safety_map_server::run_server(pipeline, &bind, port).await?;
        }
        Commands::Zones => {
            let pipeline = ReportPipeline::new(config.clone(), config.file_loader()?, renderer);
            let zones = pipeline.zones()?;

            if zones.is_empty() {
                println!("No zones matched the allow-list.");
                return Ok(());
            }

            println!("{:<6} {:<12} {:>8} {:>8} {:>8}", "RANK", "ZONE", "RISK", "CCTV", "LAMP");
            println!("{}", "-".repeat(48));
            for (i, zone) in zones.iter().enumerate() {
                println!(
                    "{:<6} {:<12} {:>8} {:>8} {:>8}",
                    i + 1,
                    zone.zone_name,
                    zone.risk_grade,
                    zone.cctv_count,
                    zone.lamp_count
                );
            }
        }
        Commands::Hourly => {
            let pipeline = ReportPipeline::new(config.clone(), config.file_loader()?, renderer);
            let hourly = pipeline.hourly()?;

            println!("{:<16} {:>8}", "HOURS", "CRIMES");
            println!("{}", "-".repeat(25));
            for record in &hourly {
                println!("{:<16} {:>8}", record.hour_bucket, record.count);
            }
            let total: u64 = hourly.iter().map(|r| r.count).sum();
            println!("\n{total} crime(s) total");
        }
    }

    Ok(())
}
