#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the district safety report.
//!
//! Serves the rendered report page, a small JSON API over the same
//! pipeline stages, and the static assets (intro images and marker icons).
//! Each page request renders a fresh map from its query flags; the input
//! tables themselves are loaded once per process by a [`CachedLoader`].

mod handlers;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use safety_map_loader::{CachedLoader, FileLoader};
use safety_map_pipeline::{ConfigError, ReportConfig, ReportPipeline};
use safety_map_render::ChartRenderer;

/// URL prefix the assets directory is served under.
pub const ASSETS_ROUTE: &str = "/assets";

/// The pipeline type shared by every worker.
pub type SharedPipeline = ReportPipeline<CachedLoader<FileLoader>, Box<dyn ChartRenderer>>;

/// Shared application state.
pub struct AppState {
    /// Report pipeline with its process-wide table cache.
    pub pipeline: Arc<SharedPipeline>,
}

/// Builds the shared pipeline for `config`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configured delimiter or encoding is
/// invalid.
pub fn shared_pipeline(
    config: ReportConfig,
    renderer: Box<dyn ChartRenderer>,
) -> Result<SharedPipeline, ConfigError> {
    let loader = CachedLoader::new(config.file_loader()?);
    Ok(ReportPipeline::new(config, loader, renderer))
}

/// Registers the page, API, and asset routes.
pub fn configure(cfg: &mut web::ServiceConfig, assets_dir: &Path) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/zones", web::get().to(handlers::zones))
            .route("/hourly", web::get().to(handlers::hourly))
            .route("/facilities.geojson", web::get().to(handlers::facilities)),
    )
    .service(Files::new(ASSETS_ROUTE, assets_dir))
    .route("/", web::get().to(handlers::page));
}

/// Starts the report server.
///
/// This is a regular async function; the caller provides the runtime (e.g.
/// via `#[actix_web::main]`) and initializes logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(pipeline: SharedPipeline, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let assets_dir: PathBuf = pipeline.config().assets_dir.clone();
    if !assets_dir.is_dir() {
        log::warn!(
            "Assets directory {} does not exist; intro images will be missing",
            assets_dir.display()
        );
    }

    let state = web::Data::new(AppState {
        pipeline: Arc::new(pipeline),
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let assets_dir = assets_dir.clone();
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(move |cfg| configure(cfg, &assets_dir))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use safety_map_render::SvgChartRenderer;
    use safety_map_server_models::{ApiHealth, ApiHourly, ApiZone};

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let files = [
            ("jinju_crime_grade.csv", "행정동,위험등급\n중앙동,7\n상봉동,9\n"),
            ("jinju_cctv_lamp.csv", "행정동,CCTV,가로등\n중앙동,120,1350\n상봉동,80,900\n"),
            ("crime_time.csv", "범죄분류,00-03,03-06\n절도,5,1\n폭력,4,0\n"),
            ("jinju_cctv.csv", "위도,경도\n35.18,128.10\n35.19,128.11\n"),
            ("jinju_lamp.csv", "위도,경도\n35.17,128.09\n"),
        ];
        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn state(dir: &Path) -> web::Data<AppState> {
        let config = ReportConfig {
            data_dir: dir.to_path_buf(),
            assets_dir: dir.to_path_buf(),
            ..ReportConfig::default()
        };
        let pipeline = shared_pipeline(config, Box::new(SvgChartRenderer)).unwrap();
        web::Data::new(AppState {
            pipeline: Arc::new(pipeline),
        })
    }

    macro_rules! app {
        ($dir:expr) => {{
            let dir: &Path = $dir;
            let assets = dir.to_path_buf();
            test::init_service(
                App::new()
                    .app_data(state(dir))
                    .configure(move |cfg| configure(cfg, &assets)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let dir = fixture();
        let app = app!(dir.path());
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let health: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(health.healthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn zones_are_ranked() {
        let dir = fixture();
        let app = app!(dir.path());
        let req = test::TestRequest::get().uri("/api/zones").to_request();
        let zones: Vec<ApiZone> = test::call_and_read_body_json(&app, req).await;
        let names: Vec<&str> = zones.iter().map(|z| z.zone_name.as_str()).collect();
        assert_eq!(names, ["상봉동", "중앙동"]);
        assert_eq!(zones[0].rank, 1);
    }

    #[actix_web::test]
    async fn hourly_totals() {
        let dir = fixture();
        let app = app!(dir.path());
        let req = test::TestRequest::get().uri("/api/hourly").to_request();
        let hourly: ApiHourly = test::call_and_read_body_json(&app, req).await;
        assert_eq!(hourly.total, 10);
        assert_eq!(hourly.buckets[0].hour_bucket, "00-03");
    }

    #[actix_web::test]
    async fn geojson_follows_query_flags() {
        let dir = fixture();
        let app = app!(dir.path());

        let req = test::TestRequest::get()
            .uri("/api/facilities.geojson?cctv=true")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/facilities.geojson")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["features"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn page_reflects_checkboxes() {
        let dir = fixture();
        let app = app!(dir.path());
        let req = test::TestRequest::get().uri("/?lamp=true").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains(r#"name="lamp" value="true" checked"#));
        assert!(html.contains(r#"name="cctv" value="true" onchange"#));
    }

    #[actix_web::test]
    async fn missing_zone_data_renders_error_page() {
        let dir = fixture();
        std::fs::remove_file(dir.path().join("jinju_crime_grade.csv")).unwrap();
        let app = app!(dir.path());

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains("jinju_crime_grade.csv"));

        let req = test::TestRequest::get().uri("/api/zones").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn assets_are_served() {
        let dir = fixture();
        std::fs::write(dir.path().join("crime_region.png"), b"png").unwrap();
        let app = app!(dir.path());
        let req = test::TestRequest::get()
            .uri("/assets/crime_region.png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
