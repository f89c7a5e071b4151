//! HTTP handler functions for the safety map server.
//!
//! Every handler runs the pipeline on the blocking thread pool; input
//! tables are memoized by the shared loader, so only the first request
//! touches the disk.

use std::fmt::Display;

use actix_web::{HttpResponse, http::header::ContentType, web};
use safety_map_models::FacilityVisibility;
use safety_map_render::{PageMode, render_error_page};
use safety_map_server_models::{ApiError, ApiHealth, ApiHourly, ApiZone, FacilityQueryParams};

use crate::{ASSETS_ROUTE, AppState};

fn api_error(context: &str, e: impl Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError {
        error: format!("{context}: {e}"),
    })
}

/// `GET /`
///
/// Renders the full report for the `cctv`/`lamp` query flags.
pub async fn page(
    state: web::Data<AppState>,
    params: web::Query<FacilityQueryParams>,
) -> HttpResponse {
    let visibility: FacilityVisibility = params.into_inner().visibility();
    let pipeline = state.pipeline.clone();

    let render = move || pipeline.render(visibility, ASSETS_ROUTE, PageMode::Served);
    let message = match web::block(render).await {
        Ok(Ok(report)) => {
            return HttpResponse::Ok()
                .content_type(ContentType::html())
                .body(report.html);
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) => e.to_string(),
    };

    log::error!("Failed to render report: {message}");
    HttpResponse::InternalServerError()
        .content_type(ContentType::html())
        .body(render_error_page(&state.pipeline.config().title, &message))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/zones`
///
/// Allow-listed zones ranked by risk grade.
pub async fn zones(state: web::Data<AppState>) -> HttpResponse {
    let pipeline = state.pipeline.clone();
    match web::block(move || pipeline.zones()).await {
        Ok(Ok(zones)) => HttpResponse::Ok().json(ApiZone::ranked(zones)),
        Ok(Err(e)) => api_error("Failed to load zones", e),
        Err(e) => api_error("Failed to load zones", e),
    }
}

/// `GET /api/hourly`
pub async fn hourly(state: web::Data<AppState>) -> HttpResponse {
    let pipeline = state.pipeline.clone();
    match web::block(move || pipeline.hourly()).await {
        Ok(Ok(hourly)) => HttpResponse::Ok().json(ApiHourly::from(hourly)),
        Ok(Err(e)) => api_error("Failed to load hourly counts", e),
        Err(e) => api_error("Failed to load hourly counts", e),
    }
}

/// `GET /api/facilities.geojson`
///
/// Facility locations of the kinds selected by the query flags, as a
/// `GeoJSON` `FeatureCollection`.
pub async fn facilities(
    state: web::Data<AppState>,
    params: web::Query<FacilityQueryParams>,
) -> HttpResponse {
    let visibility = params.into_inner().visibility();
    let pipeline = state.pipeline.clone();

    let map = match web::block(move || pipeline.map(visibility)).await {
        Ok(Ok(map)) => map,
        Ok(Err(e)) => return api_error("Failed to load facility locations", e),
        Err(e) => return api_error("Failed to load facility locations", e),
    };

    match serde_json::to_string(&map.to_geojson()) {
        Ok(body) => HttpResponse::Ok()
            .content_type("application/geo+json")
            .body(body),
        Err(e) => api_error("Failed to serialize facility locations", e),
    }
}
