#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report pipeline.
//!
//! [`ReportPipeline`] ties the loader, the analytics, and the renderers
//! together: load the input tables, join and filter the zones, aggregate
//! the hourly counts, build the facility map for the requested visibility,
//! and assemble the page. Nothing is cached here; memoization belongs to
//! the [`TableLoader`] the pipeline is constructed with.

pub mod config;

use chrono::Utc;
use safety_map_analytics::{AnalyticsError, aggregate_hourly, filter_and_sort, join_zones};
use safety_map_loader::{LoadError, TableLoader, records};
use safety_map_models::{FacilityKind, FacilityVisibility, HourlyCrimeRecord, MergedZoneRecord};
use safety_map_render::{
    ChartRenderer, FacilityLayers, FacilityMap, PageMode, ReportPage, build_map, render_page,
};

pub use config::{ChartSettings, ConfigError, InputFiles, ReportConfig, ZoneSettings};

/// DOM id of the map container on the rendered page.
pub const MAP_ELEMENT_ID: &str = "facility-map";

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An input table could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// The zone tables could not be joined.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

/// Output of one full render.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    /// Complete HTML document.
    pub html: String,
    /// Filtered, sorted zones shown in the risk chart.
    pub zones: Vec<MergedZoneRecord>,
    /// Aggregated hourly counts shown in the hourly chart.
    pub hourly: Vec<HourlyCrimeRecord>,
    /// The map as rendered. Empty when the location data failed to load.
    pub map: FacilityMap,
    /// Message shown in place of the map, if any.
    pub error_banner: Option<String>,
}

/// Load, join, and render pipeline.
#[derive(Debug)]
pub struct ReportPipeline<L, R> {
    config: ReportConfig,
    loader: L,
    renderer: R,
}

impl<L: TableLoader, R: ChartRenderer> ReportPipeline<L, R> {
    /// Creates a pipeline over `config`.
    pub const fn new(config: ReportConfig, loader: L, renderer: R) -> Self {
        Self {
            config,
            loader,
            renderer,
        }
    }

    /// The configuration this pipeline renders.
    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// The table loader.
    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// The chart renderer.
    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Joined, allow-listed zones sorted by risk grade, highest first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if either zone table fails to load or a
    /// duplicate zone is rejected.
    pub fn zones(&self) -> Result<Vec<MergedZoneRecord>, PipelineError> {
        let config = &self.config;
        let risk = records::load_zone_risk(
            &self.loader,
            &config.input_path(&config.inputs.risk),
            &config.columns,
        )?;
        let facilities = records::load_zone_facilities(
            &self.loader,
            &config.input_path(&config.inputs.facilities),
            &config.columns,
        )?;

        let merged = join_zones(&risk, &facilities, config.zones.duplicate_policy)?;
        Ok(filter_and_sort(&merged, &config.zones.allow_list))
    }

    /// Crime counts per hour bucket, summed over every category.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Load`] if the hourly table fails to load.
    pub fn hourly(&self) -> Result<Vec<HourlyCrimeRecord>, PipelineError> {
        let table = records::load_hourly_crime(
            &self.loader,
            &self.config.input_path(&self.config.inputs.hourly),
            &self.config.columns,
        )?;
        Ok(aggregate_hourly(&table, self.config.charts.hourly_order))
    }

    /// Loads the location tables of the visible kinds. Hidden kinds are
    /// not read at all.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if a visible kind's table fails to load.
    pub fn facility_layers(
        &self,
        visibility: FacilityVisibility,
    ) -> Result<FacilityLayers, LoadError> {
        let mut layers = FacilityLayers::new();
        for kind in visibility.visible_kinds() {
            let file = match kind {
                FacilityKind::Cctv => &self.config.inputs.cctv_locations,
                FacilityKind::Lamp => &self.config.inputs.lamp_locations,
            };
            let locations = records::load_facility_locations(
                &self.loader,
                &self.config.input_path(file),
                &self.config.columns,
                kind,
            )?;
            layers.insert(kind, locations);
        }
        Ok(layers)
    }

    /// Builds the facility map for `visibility`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Load`] if a visible kind's table fails to
    /// load.
    pub fn map(&self, visibility: FacilityVisibility) -> Result<FacilityMap, PipelineError> {
        let layers = self.facility_layers(visibility)?;
        Ok(build_map(&self.config.map, &layers, visibility))
    }

    /// Renders the full page for `visibility`. Intro images are linked
    /// under `assets_base`, and `mode` decides whether the checkboxes
    /// resubmit the page.
    ///
    /// A failure to load the location data does not abort the render: the
    /// page shows an error banner and an empty map instead.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the zone or hourly data cannot be
    /// produced.
    pub fn render(
        &self,
        visibility: FacilityVisibility,
        assets_base: &str,
        mode: PageMode,
    ) -> Result<RenderedReport, PipelineError> {
        let zones = self.zones()?;
        let hourly = self.hourly()?;
        let options = &self.config.charts.options;

        let (map, mut error_banner) = match self.map(visibility) {
            Ok(map) => (map, None),
            Err(e) => {
                log::error!("Failed to load map data: {e}");
                let empty = build_map(
                    &self.config.map,
                    &FacilityLayers::new(),
                    FacilityVisibility::default(),
                );
                (empty, Some(e.to_string()))
            }
        };

        let map_html = match map.to_leaflet_html(MAP_ELEMENT_ID) {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to serialize map data: {e}");
                error_banner.get_or_insert_with(|| e.to_string());
                String::new()
            }
        };

        let page = ReportPage {
            title: self.config.title.clone(),
            content: self.config.page.clone(),
            assets_base: assets_base.to_owned(),
            risk_chart: self.renderer.risk_facility_chart(&zones, options),
            hourly_chart: self.renderer.hourly_chart(&hourly, options),
            map_html,
            visibility,
            mode,
            cluster: self.config.map.cluster,
            error_banner: error_banner.clone(),
            generated_at: Utc::now(),
        };

        log::info!(
            "Rendered report with {} zones, {} hour buckets, {} markers ({} charts)",
            zones.len(),
            hourly.len(),
            map.total_markers(),
            self.renderer.name()
        );

        Ok(RenderedReport {
            html: render_page(&page),
            zones,
            hourly,
            map,
            error_banner,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use safety_map_loader::{CachedLoader, CsvLoader};
    use safety_map_render::{HtmlTableRenderer, SvgChartRenderer};

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, ReportConfig) {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "jinju_crime_grade.csv",
            "행정동,위험등급\n중앙동,7\n상봉동,9\n가좌동,10\n",
        );
        write(
            dir.path(),
            "jinju_cctv_lamp.csv",
            "행정동,CCTV,가로등\n중앙동,120,\"1,350\"\n상봉동,80,900\n신안동,40,300\n",
        );
        write(
            dir.path(),
            "crime_time.csv",
            "범죄분류,00-03,03-06,06-09\n절도,5,1,7\n폭력,4,0,2\n",
        );
        write(
            dir.path(),
            "jinju_cctv.csv",
            "위도,경도\n35.18,128.10\n35.19,128.11\n35.20,128.12\n",
        );
        write(dir.path(), "jinju_lamp.csv", "위도,경도\n35.17,128.09\n");

        let config = ReportConfig {
            data_dir: dir.path().to_path_buf(),
            ..ReportConfig::default()
        };
        (dir, config)
    }

    fn pipeline(config: ReportConfig) -> ReportPipeline<CsvLoader, SvgChartRenderer> {
        ReportPipeline::new(config, CsvLoader::new(), SvgChartRenderer)
    }

    #[test]
    fn zones_are_joined_filtered_and_sorted() {
        let (_dir, config) = fixture();
        let zones = pipeline(config).zones().unwrap();
        let names: Vec<&str> = zones.iter().map(|z| z.zone_name.as_str()).collect();
        assert_eq!(names, ["상봉동", "중앙동"]);
        assert_eq!(zones[1].lamp_count, 1350);
    }

    #[test]
    fn hourly_is_aggregated() {
        let (_dir, config) = fixture();
        let hourly = pipeline(config).hourly().unwrap();
        let pairs: Vec<(&str, u64)> = hourly
            .iter()
            .map(|r| (r.hour_bucket.as_str(), r.count))
            .collect();
        assert_eq!(pairs, [("00-03", 9), ("06-09", 9), ("03-06", 1)]);
    }

    #[test]
    fn map_has_one_marker_per_visible_row() {
        let (_dir, config) = fixture();
        let pipeline = pipeline(config);

        let map = pipeline.map(FacilityVisibility::ALL).unwrap();
        assert_eq!(map.marker_count(FacilityKind::Cctv), 3);
        assert_eq!(map.marker_count(FacilityKind::Lamp), 1);

        let map = pipeline
            .map(FacilityVisibility {
                cctv: false,
                lamp: true,
            })
            .unwrap();
        assert_eq!(map.marker_count(FacilityKind::Cctv), 0);
        assert_eq!(map.marker_count(FacilityKind::Lamp), 1);

        let hidden = pipeline.map(FacilityVisibility::default()).unwrap();
        assert_eq!(hidden.total_markers(), 0);
    }

    #[test]
    fn hidden_kinds_are_not_loaded() {
        let (dir, config) = fixture();
        std::fs::remove_file(dir.path().join("jinju_lamp.csv")).unwrap();
        let map = pipeline(config)
            .map(FacilityVisibility {
                cctv: true,
                lamp: false,
            })
            .unwrap();
        assert_eq!(map.total_markers(), 3);
    }

    #[test]
    fn render_produces_full_page() {
        let (_dir, config) = fixture();
        let report = pipeline(config)
            .render(FacilityVisibility::ALL, "/assets", PageMode::Served)
            .unwrap();
        assert!(report.error_banner.is_none());
        assert_eq!(report.zones.len(), 2);
        assert_eq!(report.map.total_markers(), 4);
        assert!(report.html.contains("<svg"));
        assert!(report.html.contains(MAP_ELEMENT_ID));
        assert!(report.html.contains("진주시 범죄"));
        assert!(report.html.contains("<form"));
    }

    #[test]
    fn static_render_has_no_form() {
        let (_dir, config) = fixture();
        let report = pipeline(config)
            .render(FacilityVisibility::ALL, "assets", PageMode::Static)
            .unwrap();
        assert!(!report.html.contains("<form"));
        assert!(report.html.contains("disabled"));
        assert!(report.html.contains(r#"src="assets/crime_region.png""#));
    }

    #[test]
    fn spreadsheet_inputs_are_read_by_extension() {
        let (dir, mut config) = fixture();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "행정동").unwrap();
        sheet.write_string(0, 1, "위험등급").unwrap();
        sheet.write_string(1, 0, "중앙동").unwrap();
        sheet.write_number(1, 1, 3).unwrap();
        sheet.write_string(2, 0, "상봉동").unwrap();
        sheet.write_number(2, 1, 4.5).unwrap();
        workbook.save(dir.path().join("grades.xlsx")).unwrap();
        config.inputs.risk = "grades.xlsx".into();

        let loader = config.file_loader().unwrap();
        let zones = ReportPipeline::new(config, loader, SvgChartRenderer)
            .zones()
            .unwrap();
        let grades: Vec<(&str, f64)> = zones
            .iter()
            .map(|z| (z.zone_name.as_str(), z.risk_grade))
            .collect();
        assert_eq!(grades, [("상봉동", 4.5), ("중앙동", 3.0)]);
    }

    #[test]
    fn map_load_failure_becomes_banner() {
        let (dir, config) = fixture();
        std::fs::remove_file(dir.path().join("jinju_cctv.csv")).unwrap();
        let report = pipeline(config)
            .render(FacilityVisibility::ALL, "/assets", PageMode::Served)
            .unwrap();
        let banner = report.error_banner.unwrap();
        assert!(banner.contains("jinju_cctv.csv"));
        assert_eq!(report.map.total_markers(), 0);
        assert!(report.html.contains(r#"role="alert""#));
        assert_eq!(report.zones.len(), 2);
    }

    #[test]
    fn zone_load_failure_aborts_render() {
        let (dir, config) = fixture();
        std::fs::remove_file(dir.path().join("jinju_crime_grade.csv")).unwrap();
        let err = pipeline(config)
            .render(FacilityVisibility::default(), "/assets", PageMode::Served)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn duplicate_zone_aborts_by_default() {
        let (dir, config) = fixture();
        write(
            dir.path(),
            "jinju_crime_grade.csv",
            "행정동,위험등급\n중앙동,7\n중앙동,8\n",
        );
        let err = pipeline(config).zones().unwrap_err();
        assert!(matches!(err, PipelineError::Analytics(_)));
    }

    #[test]
    fn cached_loader_reads_each_file_once() {
        let (dir, config) = fixture();
        let pipeline =
            ReportPipeline::new(config, CachedLoader::new(CsvLoader::new()), HtmlTableRenderer);
        pipeline
            .render(FacilityVisibility::ALL, "/assets", PageMode::Served)
            .unwrap();
        assert_eq!(pipeline.loader().len(), 5);

        // Served from memory after the first render.
        std::fs::remove_file(dir.path().join("crime_time.csv")).unwrap();
        let report = pipeline
            .render(FacilityVisibility::ALL, "/assets", PageMode::Served)
            .unwrap();
        assert!(report.html.contains("chart-table"));
        assert_eq!(report.hourly.len(), 3);
    }
}
