use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::locale::Locale;
use crate::services::number_format::format_magnitude;

/// Visual encoding requested by the backend for a chart.
///
/// Anything other than `line`, `bar` or `area` is kept verbatim in
/// `Unsupported` so the renderer can name it in the notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
    Unsupported(String),
}

impl ChartKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Area => "area",
            ChartKind::Unsupported(other) => other,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ChartKind::Unsupported(_))
    }
}

impl From<String> for ChartKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "line" => ChartKind::Line,
            "bar" => ChartKind::Bar,
            "area" => ChartKind::Area,
            _ => ChartKind::Unsupported(s),
        }
    }
}

impl From<&str> for ChartKind {
    fn from(s: &str) -> Self {
        ChartKind::from(s.to_string())
    }
}

impl From<ChartKind> for String {
    fn from(kind: ChartKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart payload attached to an assistant reply.
///
/// Wire shape: `{type, title?, data: {labels, datasets}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpecification {
    #[serde(rename = "type")]
    pub kind: ChartKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// `None` when the backend sent no dataset; nothing is rendered then.
    #[serde(default)]
    pub data: Option<ChartDataset>,
}

/// Category labels plus the series aligned index-for-index with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub datasets: Vec<ChartSeries>,
}

/// One named numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,

    /// `null` entries on the wire become `None`.
    #[serde(default)]
    pub data: Vec<Option<f64>>,

    #[serde(rename = "borderColor", default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,

    #[serde(rename = "backgroundColor", default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data: data.into_iter().map(Some).collect(),
            border_color: None,
            background_color: None,
        }
    }

    pub fn with_colors(
        mut self,
        border_color: impl Into<String>,
        background_color: impl Into<String>,
    ) -> Self {
        self.border_color = Some(border_color.into());
        self.background_color = Some(background_color.into());
        self
    }
}

/// One row of pivoted chart data: the category label plus one field per series.
///
/// Serializes flat, e.g. `{"name": "Q1", "Revenue": 100.0}`. Series with no
/// value at this index are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableChartPoint {
    pub name: String,

    /// Series name → value, in series order.
    pub values: Vec<(String, Option<f64>)>,
}

impl RenderableChartPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Set a series field. A repeated series name overwrites the earlier
    /// value but keeps its original position.
    pub fn set(&mut self, series: &str, value: Option<f64>) {
        match self.values.iter_mut().find(|(name, _)| name == series) {
            Some(slot) => slot.1 = value,
            None => self.values.push((series.to_string(), value)),
        }
    }

    /// Value of the given series at this point, if any.
    #[must_use]
    pub fn value(&self, series: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == series)
            .and_then(|(_, v)| *v)
    }
}

impl Serialize for RenderableChartPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<(&String, f64)> = self
            .values
            .iter()
            .filter_map(|(name, v)| v.map(|v| (name, v)))
            .collect();
        let mut map = serializer.serialize_map(Some(present.len() + 1))?;
        map.serialize_entry("name", &self.name)?;
        for (name, value) in present {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// The visual encoding chosen for a chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartRenderer {
    Line(Vec<SeriesEncoding>),
    Bar(Vec<SeriesEncoding>),
    Area(Vec<SeriesEncoding>),
    /// Inline notice shown in place of the chart.
    Unsupported(String),
}

impl ChartRenderer {
    pub fn is_supported(&self) -> bool {
        !matches!(self, ChartRenderer::Unsupported(_))
    }

    /// Per-series encodings; empty for an unsupported kind.
    pub fn series(&self) -> &[SeriesEncoding] {
        match self {
            ChartRenderer::Line(s) | ChartRenderer::Bar(s) | ChartRenderer::Area(s) => s,
            ChartRenderer::Unsupported(_) => &[],
        }
    }
}

/// How one series is drawn: the point field it reads and its colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEncoding {
    pub data_key: String,
    pub stroke: Option<String>,
    pub fill: Option<String>,
}

/// Everything a charting surface needs to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub title: Option<String>,
    pub renderer: ChartRenderer,
    pub points: Vec<RenderableChartPoint>,
    pub locale: Locale,
}

impl ChartView {
    /// Axis tick / tooltip label for a value. Display only; never feed the
    /// result back into calculations.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        format_magnitude(value, self.locale)
    }
}
