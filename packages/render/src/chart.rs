//! Chart rendering strategies.
//!
//! | Renderer | Output |
//! |----------|--------|
//! | [`SvgChartRenderer`] | Inline SVG: dual-axis risk/facility chart and hourly bar chart |
//! | [`HtmlTableRenderer`] | Plain HTML tables with the same data, for text-only output |
//!
//! Both are leptos components rendered to a string, so labels taken from
//! the input files are escaped on the way out.

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;
use safety_map_models::{FacilityKind, HourlyCrimeRecord, MergedZoneRecord};
use serde::{Deserialize, Serialize};

const CCTV_COLOR: &str = "#2563eb";
const LAMP_COLOR: &str = "#f59e0b";
const RISK_COLOR: &str = "#dc2626";
const HOURLY_COLOR: &str = "#6366f1";
const AXIS_COLOR: &str = "#9ca3af";
const TEXT_COLOR: &str = "#374151";
const NO_DATA: &str = "데이터 없음";

/// Chart dimensions and axis scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    /// Chart width in pixels.
    pub width: u32,
    /// Chart height in pixels.
    pub height: u32,
    /// Upper bound of the fixed risk-grade axis (lower bound is 0).
    pub risk_axis_max: f64,
    /// Facility counts are divided by this before plotting on the right
    /// axis.
    pub facility_divisor: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 420,
            risk_axis_max: 10.0,
            facility_divisor: 100.0,
        }
    }
}

impl ChartOptions {
    /// Risk axis maximum, falling back to the default for non-positive
    /// values.
    fn risk_max(&self) -> f64 {
        if self.risk_axis_max > 0.0 && self.risk_axis_max.is_finite() {
            self.risk_axis_max
        } else {
            Self::default().risk_axis_max
        }
    }

    /// Facility divisor, treating non-positive values as 1.
    fn divisor(&self) -> f64 {
        if self.facility_divisor > 0.0 && self.facility_divisor.is_finite() {
            self.facility_divisor
        } else {
            1.0
        }
    }
}

/// A visualization strategy for the two report charts.
///
/// Both methods return an HTML fragment ready to embed in the page.
pub trait ChartRenderer: Send + Sync {
    /// Short identifier (e.g. `"svg"`).
    fn name(&self) -> &'static str;

    /// Risk grade per zone against CCTV and streetlight counts. `zones` is
    /// drawn in the order given.
    fn risk_facility_chart(&self, zones: &[MergedZoneRecord], options: &ChartOptions) -> String;

    /// Crime counts per hour bucket, in the order given.
    fn hourly_chart(&self, hourly: &[HourlyCrimeRecord], options: &ChartOptions) -> String;
}

impl<T: ChartRenderer + ?Sized> ChartRenderer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn risk_facility_chart(&self, zones: &[MergedZoneRecord], options: &ChartOptions) -> String {
        (**self).risk_facility_chart(zones, options)
    }

    fn hourly_chart(&self, hourly: &[HourlyCrimeRecord], options: &ChartOptions) -> String {
        (**self).hourly_chart(hourly, options)
    }
}

/// Looks up a renderer by its [`ChartRenderer::name`].
#[must_use]
pub fn renderer_by_name(name: &str) -> Option<Box<dyn ChartRenderer>> {
    match name {
        "svg" => Some(Box::new(SvgChartRenderer)),
        "table" => Some(Box::new(HtmlTableRenderer)),
        _ => None,
    }
}

/// Rounds `value` up to 1, 2 or 5 times a power of ten. Non-positive input
/// yields 1.
#[must_use]
pub fn nice_ceiling(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 1.0;
    }
    let magnitude = 10_f64.powf(value.log10().floor());
    let fraction = value / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Formats an axis tick without trailing zeros.
fn format_tick(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// Plot area inside the chart margins.
#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn new(options: &ChartOptions, right_margin: f64) -> Self {
        let left = 60.0;
        let top = 50.0;
        let bottom = 60.0;
        Self {
            left,
            top,
            width: (f64::from(options.width) - left - right_margin).max(1.0),
            height: (f64::from(options.height) - top - bottom).max(1.0),
        }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// Y coordinate for `value` on an axis spanning `0..=max`.
    fn y(&self, value: f64, max: f64) -> f64 {
        self.bottom() - (value.clamp(0.0, max) / max) * self.height
    }
}

/// SVG coordinate with one decimal.
fn px(value: f64) -> String {
    format!("{value:.1}")
}

/// Outer `<svg>` element with a centered title.
#[component]
fn ChartSvg(options: ChartOptions, title: &'static str, children: Children) -> impl IntoView {
    let width = options.width.to_string();
    let height = options.height.to_string();
    view! {
        <svg
            xmlns="http://www.w3.org/2000/svg"
            class="chart"
            width=width.clone()
            height=height.clone()
            viewBox=format!("0 0 {width} {height}")
            role="img"
            aria-label=title
            style="background:white"
        >
            <text
                x={(options.width / 2).to_string()}
                y="24"
                text-anchor="middle"
                font-size="15"
                font-weight="600"
                fill=TEXT_COLOR
            >
                {title}
            </text>
            {children()}
        </svg>
    }
}

#[component]
fn NoData(frame: Frame) -> impl IntoView {
    view! {
        <text
            x=px(frame.center_x())
            y=px(frame.center_y())
            text-anchor="middle"
            font-size="13"
            fill=AXIS_COLOR
        >
            {NO_DATA}
        </text>
    }
}

#[component]
fn Axes(frame: Frame, #[prop(default = false)] right_axis: bool) -> impl IntoView {
    view! {
        <line
            x1=px(frame.left)
            y1=px(frame.bottom())
            x2=px(frame.right())
            y2=px(frame.bottom())
            stroke=AXIS_COLOR
        />
        <line x1=px(frame.left) y1=px(frame.top) x2=px(frame.left) y2=px(frame.bottom()) stroke=AXIS_COLOR/>
        {right_axis.then(|| view! {
            <line
                x1=px(frame.right())
                y1=px(frame.top)
                x2=px(frame.right())
                y2=px(frame.bottom())
                stroke=AXIS_COLOR
            />
        })}
    }
}

/// Five evenly spaced ticks from 0 to `max` on the left or right edge.
/// Left ticks also draw horizontal grid lines.
#[component]
fn Ticks(
    frame: Frame,
    max: f64,
    color: &'static str,
    #[prop(default = false)] right: bool,
) -> impl IntoView {
    let (x, anchor, dx) = if right {
        (frame.right(), "start", 6.0)
    } else {
        (frame.left, "end", -6.0)
    };

    (0..=5)
        .map(|i| {
            let value = max * f64::from(i) / 5.0;
            let y = frame.y(value, max);
            view! {
                <text
                    x=px(x + dx)
                    y=px(y + 4.0)
                    text-anchor=anchor
                    font-size="11"
                    fill=color
                >
                    {format_tick(value)}
                </text>
                {(!right && i > 0).then(|| view! {
                    <line x1=px(frame.left) y1=px(y) x2=px(frame.right()) y2=px(y) stroke="#f3f4f6"/>
                })}
            }
        })
        .collect::<Vec<_>>()
}

#[component]
fn XLabel(frame: Frame, x: f64, label: String) -> impl IntoView {
    view! {
        <text
            x=px(x)
            y=px(frame.bottom() + 18.0)
            text-anchor="middle"
            font-size="11"
            fill=TEXT_COLOR
        >
            {label}
        </text>
    }
}

#[component]
fn LegendItem(
    x: f64,
    y: f64,
    color: &'static str,
    label: &'static str,
    #[prop(default = false)] line: bool,
) -> impl IntoView {
    let swatch = if line {
        view! {
            <line x1=px(x) y1=px(y - 4.0) x2=px(x + 14.0) y2=px(y - 4.0) stroke=color stroke-width="2"/>
        }
        .into_any()
    } else {
        view! { <rect x=px(x) y=px(y - 9.0) width="14" height="10" fill=color/> }.into_any()
    };

    view! {
        {swatch}
        <text x=px(x + 18.0) y=px(y) font-size="11" fill=TEXT_COLOR>
            {label}
        </text>
    }
}

/// Dual-axis chart: risk grade line on the left axis, CCTV and streetlight
/// bars (divided by the facility divisor) on the right axis.
#[component]
#[allow(clippy::cast_precision_loss)]
fn RiskFacilityChart(zones: Vec<MergedZoneRecord>, options: ChartOptions) -> impl IntoView {
    let frame = Frame::new(&options, 70.0);
    let risk_max = options.risk_max();
    let divisor = options.divisor();

    let plot = if zones.is_empty() {
        view! { <NoData frame=frame/> }.into_any()
    } else {
        let facility_max = nice_ceiling(
            zones
                .iter()
                .map(|z| z.cctv_count.max(z.lamp_count) as f64 / divisor)
                .fold(0.0, f64::max),
        );
        let slot = frame.width / zones.len() as f64;
        let bar_width = slot * 0.35;
        let center = move |i: usize| frame.left + slot * (i as f64 + 0.5);

        let points = zones
            .iter()
            .enumerate()
            .map(|(i, zone)| {
                format!("{:.1},{:.1}", center(i), frame.y(zone.risk_grade, risk_max))
            })
            .collect::<Vec<_>>()
            .join(" ");

        let columns = zones
            .into_iter()
            .enumerate()
            .map(|(i, zone)| {
                let center = center(i);
                // CCTV left of center, streetlights right of it.
                let bars = [
                    (FacilityKind::Cctv, center - bar_width, CCTV_COLOR),
                    (FacilityKind::Lamp, center, LAMP_COLOR),
                ]
                .into_iter()
                .map(|(kind, x, color)| {
                    let count = zone.facility_count(kind);
                    let y = frame.y(count as f64 / divisor, facility_max);
                    view! {
                        <rect
                            x=px(x)
                            y=px(y)
                            width=px(bar_width)
                            height=px(frame.bottom() - y)
                            fill=color
                            opacity="0.8"
                        >
                            <title>{format!("{} {}: {count}", zone.zone_name, kind.label())}</title>
                        </rect>
                    }
                })
                .collect::<Vec<_>>();

                view! {
                    {bars}
                    <circle
                        cx=px(center)
                        cy=px(frame.y(zone.risk_grade, risk_max))
                        r="4"
                        fill=RISK_COLOR
                    >
                        <title>
                            {format!("{} 위험등급: {}", zone.zone_name, format_tick(zone.risk_grade))}
                        </title>
                    </circle>
                    <XLabel frame=frame x=center label=zone.zone_name.clone()/>
                }
            })
            .collect::<Vec<_>>();

        let mid_y = px(frame.center_y());
        let right_x = px(f64::from(options.width) - 14.0);
        let legend_y = f64::from(options.height) - 12.0;

        view! {
            <Ticks frame=frame max=risk_max color=RISK_COLOR/>
            <Ticks frame=frame max=facility_max color=TEXT_COLOR right=true/>
            {columns}
            <polyline points=points fill="none" stroke=RISK_COLOR stroke-width="2"/>
            <text
                x="16"
                y=mid_y.clone()
                text-anchor="middle"
                font-size="11"
                fill=RISK_COLOR
                transform=format!("rotate(-90, 16, {mid_y})")
            >
                "위험등급"
            </text>
            <text
                x=right_x.clone()
                y=mid_y.clone()
                text-anchor="middle"
                font-size="11"
                fill=TEXT_COLOR
                transform=format!("rotate(90, {right_x}, {mid_y})")
            >
                {format!("시설 수 (÷{})", format_tick(divisor))}
            </text>
            <LegendItem x=frame.left y=legend_y color=RISK_COLOR label="위험등급" line=true/>
            <LegendItem
                x={frame.left + 100.0}
                y=legend_y
                color=CCTV_COLOR
                label=FacilityKind::Cctv.label()
            />
            <LegendItem
                x={frame.left + 180.0}
                y=legend_y
                color=LAMP_COLOR
                label=FacilityKind::Lamp.label()
            />
        }
        .into_any()
    };

    view! {
        <ChartSvg options=options title="행정동별 위험등급 및 CCTV·가로등 수">
            <Axes frame=frame right_axis=true/>
            {plot}
        </ChartSvg>
    }
}

/// Bar chart of crime counts per hour bucket, drawn in the order given.
#[component]
#[allow(clippy::cast_precision_loss)]
fn HourlyChart(hourly: Vec<HourlyCrimeRecord>, options: ChartOptions) -> impl IntoView {
    let frame = Frame::new(&options, 20.0);

    let plot = if hourly.is_empty() {
        view! { <NoData frame=frame/> }.into_any()
    } else {
        let max = nice_ceiling(hourly.iter().map(|r| r.count).max().unwrap_or(0) as f64);
        let slot = frame.width / hourly.len() as f64;
        let bar_width = slot * 0.6;

        let bars = hourly
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                let center = frame.left + slot * (i as f64 + 0.5);
                let y = frame.y(record.count as f64, max);
                view! {
                    <rect
                        x=px(center - bar_width / 2.0)
                        y=px(y)
                        width=px(bar_width)
                        height=px(frame.bottom() - y)
                        fill=HOURLY_COLOR
                        opacity="0.85"
                    >
                        <title>{format!("{}: {}", record.hour_bucket, record.count)}</title>
                    </rect>
                    <text
                        x=px(center)
                        y=px(y - 4.0)
                        text-anchor="middle"
                        font-size="10"
                        fill=TEXT_COLOR
                    >
                        {record.count.to_string()}
                    </text>
                    <XLabel frame=frame x=center label=record.hour_bucket/>
                }
            })
            .collect::<Vec<_>>();

        view! {
            <Ticks frame=frame max=max color=TEXT_COLOR/>
            {bars}
        }
        .into_any()
    };

    view! {
        <ChartSvg options=options title="시간대별 범죄 발생 건수">
            <Axes frame=frame/>
            {plot}
        </ChartSvg>
    }
}

/// Renders charts as inline SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChartRenderer;

impl ChartRenderer for SvgChartRenderer {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn risk_facility_chart(&self, zones: &[MergedZoneRecord], options: &ChartOptions) -> String {
        view! { <RiskFacilityChart zones=zones.to_vec() options=options.clone()/> }.to_html()
    }

    fn hourly_chart(&self, hourly: &[HourlyCrimeRecord], options: &ChartOptions) -> String {
        view! { <HourlyChart hourly=hourly.to_vec() options=options.clone()/> }.to_html()
    }
}

/// Table body row shown when there is nothing to list.
#[component]
fn EmptyRow(columns: u8) -> impl IntoView {
    view! {
        <tr>
            <td colspan=columns.to_string()>{NO_DATA}</td>
        </tr>
    }
}

#[component]
#[allow(clippy::cast_precision_loss)]
fn RiskFacilityTable(zones: Vec<MergedZoneRecord>, divisor: f64) -> impl IntoView {
    let scaled = format!("(÷{})", format_tick(divisor));
    let empty = zones.is_empty();
    let rows = zones
        .into_iter()
        .map(|zone| {
            view! {
                <tr>
                    <td>{zone.zone_name}</td>
                    <td>{format_tick(zone.risk_grade)}</td>
                    <td>{zone.cctv_count.to_string()}</td>
                    <td>{zone.lamp_count.to_string()}</td>
                    <td>{format_tick(zone.cctv_count as f64 / divisor)}</td>
                    <td>{format_tick(zone.lamp_count as f64 / divisor)}</td>
                </tr>
            }
        })
        .collect::<Vec<_>>();

    view! {
        <table class="chart-table">
            <thead>
                <tr>
                    <th>"행정동"</th>
                    <th>"위험등급"</th>
                    <th>"CCTV"</th>
                    <th>"가로등"</th>
                    <th>{format!("CCTV {scaled}")}</th>
                    <th>{format!("가로등 {scaled}")}</th>
                </tr>
            </thead>
            <tbody>
                {empty.then(|| view! { <EmptyRow columns=6/> })}
                {rows}
            </tbody>
        </table>
    }
}

#[component]
fn HourlyTable(hourly: Vec<HourlyCrimeRecord>) -> impl IntoView {
    let empty = hourly.is_empty();
    let rows = hourly
        .into_iter()
        .map(|record| {
            view! {
                <tr>
                    <td>{record.hour_bucket}</td>
                    <td>{record.count.to_string()}</td>
                </tr>
            }
        })
        .collect::<Vec<_>>();

    view! {
        <table class="chart-table">
            <thead>
                <tr>
                    <th>"시간대"</th>
                    <th>"발생 건수"</th>
                </tr>
            </thead>
            <tbody>
                {empty.then(|| view! { <EmptyRow columns=2/> })}
                {rows}
            </tbody>
        </table>
    }
}

/// Renders the chart data as HTML tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTableRenderer;

impl ChartRenderer for HtmlTableRenderer {
    fn name(&self) -> &'static str {
        "table"
    }

    fn risk_facility_chart(&self, zones: &[MergedZoneRecord], options: &ChartOptions) -> String {
        view! { <RiskFacilityTable zones=zones.to_vec() divisor=options.divisor()/> }.to_html()
    }

    fn hourly_chart(&self, hourly: &[HourlyCrimeRecord], _options: &ChartOptions) -> String {
        view! { <HourlyTable hourly=hourly.to_vec()/> }.to_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(name: &str, grade: f64, cctv: u64, lamp: u64) -> MergedZoneRecord {
        MergedZoneRecord {
            zone_name: name.to_string(),
            risk_grade: grade,
            cctv_count: cctv,
            lamp_count: lamp,
        }
    }

    fn hour(bucket: &str, count: u64) -> HourlyCrimeRecord {
        HourlyCrimeRecord {
            hour_bucket: bucket.to_string(),
            count,
        }
    }

    #[test]
    fn nice_ceiling_rounds_up() {
        assert!((nice_ceiling(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((nice_ceiling(3.3) - 5.0).abs() < f64::EPSILON);
        assert!((nice_ceiling(12.04) - 20.0).abs() < 1e-9);
        assert!((nice_ceiling(100.0) - 100.0).abs() < 1e-9);
        assert!((nice_ceiling(0.07) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn ticks_drop_trailing_zeros() {
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(1.25), "1.25");
    }

    #[test]
    fn dual_axis_chart_has_two_bars_per_zone() {
        let zones = [zone("중앙동", 8.0, 120, 340), zone("상봉동", 6.0, 90, 0)];
        let svg = SvgChartRenderer.risk_facility_chart(&zones, &ChartOptions::default());

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 4 + 2); // bars + legend swatches
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("중앙동"));
        assert!(svg.contains("÷100"));
    }

    #[test]
    fn risk_points_use_fixed_axis() {
        let options = ChartOptions::default();
        let frame = Frame::new(&options, 70.0);
        let svg = SvgChartRenderer.risk_facility_chart(&[zone("A", 10.0, 0, 0)], &options);
        // A grade at the axis maximum sits on the top edge of the plot.
        assert!(svg.contains(&format!("cy=\"{:.1}\"", frame.top)));
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        let options = ChartOptions::default();
        let svg = SvgChartRenderer.risk_facility_chart(&[], &options);
        assert!(svg.contains(NO_DATA));
        assert!(!svg.contains("NaN"));

        let svg = SvgChartRenderer.hourly_chart(&[], &options);
        assert!(svg.contains(NO_DATA));
    }

    #[test]
    fn all_zero_values_do_not_produce_nan() {
        let options = ChartOptions::default();
        let svg = SvgChartRenderer.risk_facility_chart(&[zone("A", 0.0, 0, 0)], &options);
        assert!(!svg.contains("NaN"));
        let svg = SvgChartRenderer.hourly_chart(&[hour("00-03", 0), hour("03-06", 0)], &options);
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn degenerate_options_fall_back() {
        let options = ChartOptions {
            risk_axis_max: 0.0,
            facility_divisor: -5.0,
            ..ChartOptions::default()
        };
        let svg = SvgChartRenderer.risk_facility_chart(&[zone("A", 5.0, 10, 10)], &options);
        assert!(!svg.contains("NaN"));
        assert!(svg.contains("÷1)"));
    }

    #[test]
    fn hourly_chart_keeps_given_order() {
        let svg = SvgChartRenderer.hourly_chart(
            &[hour("21-24", 50), hour("00-03", 20)],
            &ChartOptions::default(),
        );
        let late = svg.find("21-24").unwrap();
        let early = svg.find("00-03").unwrap();
        assert!(late < early);
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn labels_are_escaped() {
        let svg =
            SvgChartRenderer.risk_facility_chart(&[zone("<A&B>", 1.0, 1, 1)], &ChartOptions::default());
        assert!(svg.contains("&lt;A&amp;B&gt;"));
        assert!(!svg.contains("<A&B>"));
    }

    #[test]
    fn table_renderer_lists_rows() {
        let html = HtmlTableRenderer.risk_facility_chart(
            &[zone("중앙동", 8.0, 250, 300)],
            &ChartOptions::default(),
        );
        assert!(html.contains("<td>중앙동</td><td>8</td><td>250</td><td>300</td><td>2.5</td><td>3</td>"));

        let html = HtmlTableRenderer.hourly_chart(&[], &ChartOptions::default());
        assert!(html.contains(NO_DATA));
    }

    #[test]
    fn renderers_are_found_by_name() {
        for name in ["svg", "table"] {
            assert_eq!(renderer_by_name(name).unwrap().name(), name);
        }
        assert!(renderer_by_name("png").is_none());
    }
}
