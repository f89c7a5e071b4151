//! HTML page assembly.
//!
//! The page follows the report's five sections: background, environmental
//! factors, zone statistics (charts), the facility map with its visibility
//! checkboxes, and proposed countermeasures. Everything except the map tiles
//! and the Leaflet scripts is inlined.
//!
//! Sections are leptos components rendered to a string. The chart and map
//! fragments arrive pre-rendered and are embedded as inner HTML.

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;
use safety_map_models::{FacilityKind, FacilityVisibility};
use serde::{Deserialize, Serialize};

/// A static introductory image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroImage {
    /// File name, resolved against the page's asset base.
    pub file: String,
    /// Caption shown under the image.
    pub caption: String,
}

/// An external reference link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceLink {
    /// Link text.
    pub label: String,
    /// Target URL.
    pub url: String,
}

/// Narrative text of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageContent {
    /// Bullet points of the background section.
    pub background: Vec<String>,
    /// Images shown in the background section.
    pub intro_images: Vec<IntroImage>,
    /// Bullet points of the environmental-factors section.
    pub theory: Vec<String>,
    /// Links shown under the environmental-factors section.
    pub references: Vec<ReferenceLink>,
    /// Observations shown under the charts.
    pub chart_notes: Vec<String>,
    /// Bullet points above the map.
    pub map_notes: Vec<String>,
    /// Proposed countermeasures.
    pub countermeasures: Vec<String>,
}

impl Default for PageContent {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        Self {
            background: owned(&[
                "경상남도 내 지역별 범죄 지수를 비교하면 진주시의 위치를 확인할 수 있습니다.",
                "진주시의 범죄는 연도별로 증가하는 추세를 보이고 있습니다.",
            ]),
            intro_images: vec![
                IntroImage {
                    file: "crime_region.png".to_owned(),
                    caption: "경상남도의 지역별 범죄지수".to_owned(),
                },
                IntroImage {
                    file: "crime_year.png".to_owned(),
                    caption: "연도별 진주시 범죄 지수".to_owned(),
                },
            ],
            theory: owned(&[
                "범죄 발생에는 시간적, 환경적 요인이 큰 영향을 미칩니다.",
                "CPTED(범죄예방 환경설계) 이론은 사람과 시간, 환경이 범죄 발생에 영향을 준다고 설명합니다.",
                "이 보고서는 그 중 시간적 요인과 환경적 요인에 중점을 둡니다.",
            ]),
            references: vec![
                ReferenceLink {
                    label: "생활안전지도".to_owned(),
                    url: "https://www.safemap.go.kr/".to_owned(),
                },
                ReferenceLink {
                    label: "CPTED 개념".to_owned(),
                    url: "http://www.cpted.kr/?r=home&c=02/0205/020501".to_owned(),
                },
                ReferenceLink {
                    label: "가로등과 범죄율의 관계".to_owned(),
                    url: "https://www.yna.co.kr/view/AKR20200108078300004".to_owned(),
                },
            ],
            chart_notes: Vec::new(),
            map_notes: owned(&[
                "지도는 CCTV 및 가로등 위치를 표시합니다.",
                "원하는 시설을 선택해서 볼 수 있습니다.",
            ]),
            countermeasures: owned(&[
                "부족한 지역에 CCTV 추가 설치",
                "가로등 설치 및 노후화된 시설 개선",
                "가로등 운영시간 연장 (심야 시간 포함)",
                "안심귀가 콜 서비스 활성화",
            ]),
        }
    }
}

/// How the page will be delivered, which decides what the checkboxes do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageMode {
    /// Served over HTTP: ticking a box resubmits the page with new
    /// `cctv`/`lamp` query flags.
    #[default]
    Served,
    /// Written to a file: the checkboxes only show the rendered state.
    Static,
}

/// Everything needed to render one report page.
#[derive(Debug, Clone)]
pub struct ReportPage {
    /// Page title.
    pub title: String,
    /// Narrative text.
    pub content: PageContent,
    /// URL prefix for intro images (e.g. `"/assets"`).
    pub assets_base: String,
    /// Risk/facility chart fragment.
    pub risk_chart: String,
    /// Hourly crime chart fragment.
    pub hourly_chart: String,
    /// Facility map fragment; empty when the map could not be built.
    pub map_html: String,
    /// Current checkbox state.
    pub visibility: FacilityVisibility,
    /// Whether the checkboxes resubmit the page.
    pub mode: PageMode,
    /// Load the clustering plugin.
    pub cluster: bool,
    /// Error shown in place of the map.
    pub error_banner: Option<String>,
    /// Render timestamp for the footer.
    pub generated_at: DateTime<Utc>,
}

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CLUSTER_CSS: &str = "https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css";
const CLUSTER_DEFAULT_CSS: &str =
    "https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css";
const CLUSTER_JS: &str =
    "https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js";

const CSS: &str = "body{font-family:sans-serif;margin:0 auto;max-width:1100px;padding:1rem;color:#1f2937}\
section{margin-bottom:2rem}figure{margin:1rem 0}figure img{max-width:100%}\
figcaption{color:#6b7280;font-size:.9rem}.links a{margin-right:1rem}\
.filters label{margin-right:1.5rem}.error-banner{background:#fee2e2;border:1px solid #f87171;\
color:#991b1b;padding:.75rem 1rem;border-radius:6px;margin:1rem 0}\
.chart-table{border-collapse:collapse}.chart-table td,.chart-table th{border:1px solid #e5e7eb;padding:.25rem .75rem}\
footer{color:#9ca3af;font-size:.8rem}";

#[component]
fn BulletList(items: Vec<String>) -> impl IntoView {
    (!items.is_empty()).then(|| {
        view! {
            <ul>
                {items.into_iter().map(|item| view! { <li>{item}</li> }).collect::<Vec<_>>()}
            </ul>
        }
    })
}

#[component]
fn BackgroundSection(
    bullets: Vec<String>,
    images: Vec<IntroImage>,
    assets_base: String,
) -> impl IntoView {
    let base = assets_base.trim_end_matches('/').to_owned();
    let figures = images
        .into_iter()
        .map(|image| {
            let src = format!("{base}/{}", image.file);
            let alt = image.caption.clone();
            view! {
                <figure>
                    <img src=src alt=alt/>
                    <figcaption>{image.caption}</figcaption>
                </figure>
            }
        })
        .collect::<Vec<_>>();

    view! {
        <section>
            <h2>"1. 주제 선정 배경"</h2>
            <BulletList items=bullets/>
            {figures}
        </section>
    }
}

#[component]
fn TheorySection(bullets: Vec<String>, references: Vec<ReferenceLink>) -> impl IntoView {
    let links = (!references.is_empty()).then(|| {
        let anchors = references
            .into_iter()
            .map(|link| {
                view! {
                    <a href=link.url target="_blank" rel="noopener">
                        {link.label}
                    </a>
                }
            })
            .collect::<Vec<_>>();
        view! { <p class="links">{anchors}</p> }
    });

    view! {
        <section>
            <h2>"2. 환경적 요인과 이론적 배경"</h2>
            <BulletList items=bullets/>
            {links}
        </section>
    }
}

#[component]
fn StatisticsSection(
    risk_chart: String,
    hourly_chart: String,
    notes: Vec<String>,
) -> impl IntoView {
    view! {
        <section>
            <h2>"3. 행정동별 위험도 및 방범 시설 비교"</h2>
            <h3>"위험등급과 CCTV · 가로등 수"</h3>
            <div class="chart" inner_html=risk_chart></div>
            <h3>"시간대별 범죄 발생 건수"</h3>
            <div class="chart" inner_html=hourly_chart></div>
            <BulletList items=notes/>
        </section>
    }
}

/// One visibility checkbox. Served pages submit the form on change; static
/// pages show a disabled box.
#[component]
fn FacilityCheckbox(kind: FacilityKind, checked: bool, mode: PageMode) -> impl IntoView {
    let label = format!(" {} 위치 보기", kind.label());
    let input = match mode {
        PageMode::Served => view! {
            <input
                type="checkbox"
                name=kind.to_string()
                value="true"
                checked=checked
                onchange="this.form.submit()"
            />
        }
        .into_any(),
        PageMode::Static => view! {
            <input type="checkbox" name=kind.to_string() value="true" checked=checked disabled=true/>
        }
        .into_any(),
    };

    view! {
        <label>
            {input}
            {label}
        </label>
    }
}

#[component]
fn MapSection(
    notes: Vec<String>,
    visibility: FacilityVisibility,
    mode: PageMode,
    error_banner: Option<String>,
    map_html: String,
) -> impl IntoView {
    let checkboxes = FacilityKind::all()
        .iter()
        .map(|kind| {
            view! { <FacilityCheckbox kind=*kind checked=visibility.is_visible(*kind) mode=mode/> }
        })
        .collect::<Vec<_>>();
    let filters = match mode {
        PageMode::Served => view! { <form method="get" class="filters">{checkboxes}</form> }.into_any(),
        PageMode::Static => view! { <div class="filters">{checkboxes}</div> }.into_any(),
    };

    view! {
        <section>
            <h2>"4. 지도 기반 시각화"</h2>
            <BulletList items=notes/>
            {filters}
            {error_banner.map(|message| view! {
                <div class="error-banner" role="alert">
                    {format!("지도 데이터를 불러오지 못했습니다: {message}")}
                </div>
            })}
            <div class="map" inner_html=map_html></div>
        </section>
    }
}

#[component]
fn CountermeasuresSection(items: Vec<String>) -> impl IntoView {
    view! {
        <section>
            <h2>"5. 해결 방안 제시"</h2>
            <BulletList items=items/>
        </section>
    }
}

/// The complete report document.
#[component]
fn ReportDocument(page: ReportPage) -> impl IntoView {
    let ReportPage {
        title,
        content,
        assets_base,
        risk_chart,
        hourly_chart,
        map_html,
        visibility,
        mode,
        cluster,
        error_banner,
        generated_at,
    } = page;
    let heading = title.clone();
    let generated = format!("생성 시각: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    view! {
        <html lang="ko">
            <head>
                <meta charset="UTF-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
                <title>{title}</title>
                <link rel="stylesheet" href=LEAFLET_CSS/>
                <script src=LEAFLET_JS></script>
                {cluster.then(|| view! {
                    <link rel="stylesheet" href=CLUSTER_CSS/>
                    <link rel="stylesheet" href=CLUSTER_DEFAULT_CSS/>
                    <script src=CLUSTER_JS></script>
                })}
                <style>{CSS}</style>
            </head>
            <body>
                <h1>{heading}</h1>
                <BackgroundSection
                    bullets=content.background
                    images=content.intro_images
                    assets_base=assets_base
                />
                <TheorySection bullets=content.theory references=content.references/>
                <StatisticsSection
                    risk_chart=risk_chart
                    hourly_chart=hourly_chart
                    notes=content.chart_notes
                />
                <MapSection
                    notes=content.map_notes
                    visibility=visibility
                    mode=mode
                    error_banner=error_banner
                    map_html=map_html
                />
                <CountermeasuresSection items=content.countermeasures/>
                <footer>{generated}</footer>
            </body>
        </html>
    }
}

/// Minimal document that only shows an error banner.
#[component]
fn ErrorDocument(title: String, message: String) -> impl IntoView {
    let heading = title.clone();
    view! {
        <html lang="ko">
            <head>
                <meta charset="UTF-8"/>
                <title>{title}</title>
                <style>{CSS}</style>
            </head>
            <body>
                <h1>{heading}</h1>
                <div class="error-banner" role="alert">
                    {format!("보고서를 생성하지 못했습니다: {message}")}
                </div>
            </body>
        </html>
    }
}

/// Renders the complete HTML document.
#[must_use]
pub fn render_page(page: &ReportPage) -> String {
    let html = view! { <ReportDocument page=page.clone()/> }.to_html();
    format!("<!DOCTYPE html>\n{html}")
}

/// Renders a minimal page that only shows `message` in an error banner.
#[must_use]
pub fn render_error_page(title: &str, message: &str) -> String {
    let html = view! { <ErrorDocument title=title.to_owned() message=message.to_owned()/> }
        .to_html();
    format!("<!DOCTYPE html>\n{html}")
}
