#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rendering for the district safety report.
//!
//! Charts are produced through the [`chart::ChartRenderer`] strategy so the
//! pipeline does not depend on one visualization style. The facility map is
//! built fresh for every render by [`map::build_map`] from explicit
//! visibility flags, and [`page::render_page`] assembles everything into a
//! single self-contained HTML document. All markup is written as leptos
//! components and rendered server-side to strings.

pub mod chart;
pub mod map;
pub mod page;

pub use chart::{
    ChartOptions, ChartRenderer, HtmlTableRenderer, SvgChartRenderer, renderer_by_name,
};
pub use map::{FacilityLayers, FacilityMap, MapOptions, build_map};
pub use page::{
    IntroImage, PageContent, PageMode, ReferenceLink, ReportPage, render_error_page, render_page,
};
