use crate::models::chart::{
    ChartDataset, ChartKind, ChartRenderer, ChartSeries, ChartSpecification, ChartView,
    RenderableChartPoint, SeriesEncoding,
};
use crate::models::locale::Locale;

/// Default stroke for line and area series.
pub const DEFAULT_STROKE: &str = "#8884d8";
/// Default fill for bar series.
pub const DEFAULT_BAR_FILL: &str = "#82ca9d";
/// Default fill for area series.
pub const DEFAULT_AREA_FILL: &str = "#8884d8";

/// Turns backend chart specifications into chart-ready views.
///
/// The backend decides what to plot; this only reshapes the data and picks
/// the visual encoding. Nothing here fails: missing data renders no chart
/// and an unknown kind renders a notice.
pub struct ChartService {
    locale: Locale,
}

impl ChartService {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Build the view for an (optional) chart specification.
    ///
    /// Returns `None` when there is no specification or it carries no
    /// dataset.
    #[must_use]
    pub fn render(&self, spec: Option<&ChartSpecification>) -> Option<ChartView> {
        let spec = spec?;
        let dataset = spec.data.as_ref()?;

        let renderer = self.select_renderer(&spec.kind, &dataset.datasets);
        let points = if renderer.is_supported() {
            Self::pivot(dataset)
        } else {
            Vec::new()
        };

        Some(ChartView {
            title: spec.title.clone().filter(|t| !t.is_empty()),
            renderer,
            points,
            locale: self.locale,
        })
    }

    /// One point per label carrying every series' value at that index.
    ///
    /// A series shorter than the label list leaves the missing indices
    /// empty instead of failing.
    #[must_use]
    pub fn pivot(dataset: &ChartDataset) -> Vec<RenderableChartPoint> {
        dataset
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let mut point = RenderableChartPoint::new(label.clone());
                for series in &dataset.datasets {
                    point.set(&series.label, series.data.get(i).copied().flatten());
                }
                point
            })
            .collect()
    }

    /// Pick the visual encoding for a chart kind.
    ///
    /// Unknown kinds produce `ChartRenderer::Unsupported` with a localized
    /// notice naming the kind.
    #[must_use]
    pub fn select_renderer(&self, kind: &ChartKind, series: &[ChartSeries]) -> ChartRenderer {
        match kind {
            ChartKind::Line => ChartRenderer::Line(
                series
                    .iter()
                    .map(|s| SeriesEncoding {
                        data_key: s.label.clone(),
                        stroke: Some(color_or(&s.border_color, DEFAULT_STROKE)),
                        fill: None,
                    })
                    .collect(),
            ),
            ChartKind::Bar => ChartRenderer::Bar(
                series
                    .iter()
                    .map(|s| SeriesEncoding {
                        data_key: s.label.clone(),
                        stroke: None,
                        fill: Some(color_or(&s.background_color, DEFAULT_BAR_FILL)),
                    })
                    .collect(),
            ),
            ChartKind::Area => ChartRenderer::Area(
                series
                    .iter()
                    .map(|s| SeriesEncoding {
                        data_key: s.label.clone(),
                        stroke: Some(color_or(&s.border_color, DEFAULT_STROKE)),
                        fill: Some(color_or(&s.background_color, DEFAULT_AREA_FILL)),
                    })
                    .collect(),
            ),
            ChartKind::Unsupported(other) => {
                tracing::debug!(kind = %other, "Unsupported chart type");
                ChartRenderer::Unsupported(self.locale.unsupported_chart(other))
            }
        }
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

fn color_or(color: &Option<String>, default: &str) -> String {
    match color.as_deref() {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => default.to_string(),
    }
}
