//! Facility map.
//!
//! [`build_map`] produces a fresh [`FacilityMap`] value for every render
//! from explicit [`FacilityVisibility`] flags. Hidden facility kinds are
//! never iterated, so they contribute no markers at all.

use std::collections::BTreeMap;

use leptos::prelude::*;
use leptos::tachys::view::RenderHtml;
use safety_map_models::{FacilityKind, FacilityLocation, FacilityVisibility};
use serde::{Deserialize, Serialize};

/// Draws a serialized [`FacilityMap`] into the element with the given id.
const LEAFLET_SCRIPT: &str = r#"function renderFacilityMap(id, data) {
  const map = L.map(id).setView(data.center, data.zoom);
  L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
    maxZoom: 19,
    attribution: "&copy; OpenStreetMap contributors"
  }).addTo(map);
  for (const layer of data.layers) {
    const group = data.cluster && L.markerClusterGroup ? L.markerClusterGroup() : L.layerGroup();
    const style = layer.style;
    for (const m of layer.markers) {
      const marker = style.iconUrl
        ? L.marker([m.lat, m.lng], { icon: L.icon({ iconUrl: style.iconUrl, iconSize: [16, 16] }) })
        : L.circleMarker([m.lat, m.lng], {
            radius: style.radius,
            color: style.color,
            fill: true,
            fillOpacity: style.fillOpacity
          });
      marker.bindTooltip(style.tooltip).addTo(group);
    }
    group.addTo(map);
  }
}"#;

/// Makes serialized JSON safe to embed inside a `<script>` element.
fn script_safe_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Map viewport and marker presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Initial center as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Group markers into a clustering layer.
    pub cluster: bool,
    /// Map height in pixels.
    pub height: u32,
    /// Icon URL for CCTV markers. Circle markers are drawn when unset.
    pub cctv_icon: Option<String>,
    /// Icon URL for streetlight markers. Circle markers are drawn when unset.
    pub lamp_icon: Option<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: [35.1802, 128.1076],
            zoom: 13,
            cluster: false,
            height: 600,
            cctv_icon: None,
            lamp_icon: None,
        }
    }
}

impl MapOptions {
    fn icon(&self, kind: FacilityKind) -> Option<&str> {
        match kind {
            FacilityKind::Cctv => self.cctv_icon.as_deref(),
            FacilityKind::Lamp => self.lamp_icon.as_deref(),
        }
    }
}

/// How markers of one facility kind are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Stroke and fill color.
    pub color: String,
    /// Circle radius in pixels.
    pub radius: f64,
    /// Fill opacity (0-1).
    pub fill_opacity: f64,
    /// Hover text.
    pub tooltip: String,
    /// Image marker URL, replacing the circle when set.
    pub icon_url: Option<String>,
}

impl MarkerStyle {
    /// Default circle style for `kind`.
    #[must_use]
    pub fn for_kind(kind: FacilityKind) -> Self {
        let (color, radius, fill_opacity) = match kind {
            FacilityKind::Cctv => ("blue", 3.0, 0.7),
            FacilityKind::Lamp => ("orange", 2.0, 0.6),
        };
        Self {
            color: color.to_owned(),
            radius,
            fill_opacity,
            tooltip: kind.label().to_owned(),
            icon_url: None,
        }
    }
}

/// A single map marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

/// All markers for one facility kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayer {
    /// Facility kind of every marker in this layer.
    pub kind: FacilityKind,
    /// Marker presentation.
    pub style: MarkerStyle,
    /// One marker per location row.
    pub markers: Vec<Marker>,
}

/// Loaded facility locations, keyed by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityLayers {
    locations: BTreeMap<FacilityKind, Vec<FacilityLocation>>,
}

impl FacilityLayers {
    /// Creates an empty set of layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the locations for `kind`, replacing any previous ones.
    pub fn insert(&mut self, kind: FacilityKind, locations: Vec<FacilityLocation>) {
        self.locations.insert(kind, locations);
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, kind: FacilityKind, locations: Vec<FacilityLocation>) -> Self {
        self.insert(kind, locations);
        self
    }

    /// Locations for `kind`; empty when none were loaded.
    #[must_use]
    pub fn get(&self, kind: FacilityKind) -> &[FacilityLocation] {
        self.locations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A renderable facility map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityMap {
    /// Initial center as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Whether markers are clustered.
    pub cluster: bool,
    /// Map height in pixels.
    pub height: u32,
    /// One layer per visible facility kind.
    pub layers: Vec<MarkerLayer>,
}

/// Builds the map for one render.
///
/// Each visible kind gets a layer with exactly one marker per location in
/// `layers`; hidden kinds get no layer.
#[must_use]
pub fn build_map(
    options: &MapOptions,
    layers: &FacilityLayers,
    visibility: FacilityVisibility,
) -> FacilityMap {
    let marker_layers: Vec<MarkerLayer> = visibility
        .visible_kinds()
        .into_iter()
        .map(|kind| {
            let mut style = MarkerStyle::for_kind(kind);
            style.icon_url = options.icon(kind).map(str::to_owned);
            let markers: Vec<Marker> = layers
                .get(kind)
                .iter()
                .map(|location| Marker {
                    lat: location.latitude,
                    lng: location.longitude,
                })
                .collect();
            log::debug!("Map layer {kind}: {} markers", markers.len());
            MarkerLayer {
                kind,
                style,
                markers,
            }
        })
        .collect();

    FacilityMap {
        center: options.center,
        zoom: options.zoom,
        cluster: options.cluster,
        height: options.height,
        layers: marker_layers,
    }
}

impl FacilityMap {
    /// Number of markers of `kind`.
    #[must_use]
    pub fn marker_count(&self, kind: FacilityKind) -> usize {
        self.layers
            .iter()
            .filter(|layer| layer.kind == kind)
            .map(|layer| layer.markers.len())
            .sum()
    }

    /// Number of markers across all layers.
    #[must_use]
    pub fn total_markers(&self) -> usize {
        self.layers.iter().map(|layer| layer.markers.len()).sum()
    }

    /// Exports every marker as a `GeoJSON` point feature with a `kind`
    /// property.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        let features = self
            .layers
            .iter()
            .flat_map(|layer| {
                layer.markers.iter().map(move |marker| {
                    let mut properties = geojson::JsonObject::new();
                    properties.insert(
                        "kind".to_owned(),
                        serde_json::Value::String(layer.kind.to_string()),
                    );
                    properties.insert(
                        "label".to_owned(),
                        serde_json::Value::String(layer.style.tooltip.clone()),
                    );
                    geojson::Feature {
                        bbox: None,
                        geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![
                            marker.lng, marker.lat,
                        ]))),
                        id: None,
                        properties: Some(properties),
                        foreign_members: None,
                    }
                })
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Renders a Leaflet map into a `<div>` with id `element_id`.
    ///
    /// Requires the Leaflet script (and `Leaflet.markercluster` when
    /// clustering) to be loaded by the page.
    ///
    /// # Errors
    ///
    /// Returns an error if the map data cannot be serialized.
    pub fn to_leaflet_html(&self, element_id: &str) -> Result<String, serde_json::Error> {
        let script = format!(
            "{LEAFLET_SCRIPT}\nrenderFacilityMap({id}, {data});",
            id = script_safe_json(&serde_json::to_string(element_id)?),
            data = script_safe_json(&serde_json::to_string(self)?),
        );

        Ok(view! {
            <div
                id=element_id.to_owned()
                class="facility-map"
                style=format!("height:{}px", self.height)
            ></div>
            <script>{script}</script>
        }
        .to_html())
    }
}
