use std::fmt::Write as _;

use super::types::{Payload, PayloadKind, RenderError, Renderer, Series};

const DEFAULT_WIDTH: u32 = 480;
const DEFAULT_HEIGHT: u32 = 320;
const MARGIN: f64 = 32.0;
const POINT_RADIUS: f64 = 3.0;

/// Renders a coordinate series as an inline SVG scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScatterRenderer {
    width: u32,
    height: u32,
}

impl Default for ScatterRenderer {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ScatterRenderer {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn render_series(&self, series: &Series) -> Result<String, RenderError> {
        if series.x.len() != series.y.len() {
            return Err(RenderError::malformed(
                PayloadKind::Series,
                format!(
                    "x has {} values but y has {}",
                    series.x.len(),
                    series.y.len()
                ),
            ));
        }
        if let Some(value) = series
            .x
            .iter()
            .chain(series.y.iter())
            .find(|value| !value.is_finite())
        {
            return Err(RenderError::malformed(
                PayloadKind::Series,
                format!("non-finite coordinate {value}"),
            ));
        }
        if f64::from(self.width) <= 2.0 * MARGIN || f64::from(self.height) <= 2.0 * MARGIN {
            return Err(RenderError::malformed(
                PayloadKind::Series,
                format!("plot area {}x{} is too small", self.width, self.height),
            ));
        }

        let width = f64::from(self.width);
        let height = f64::from(self.height);
        let x_scale = Scale::fit(&series.x, MARGIN, width - MARGIN);
        // SVG y grows downwards, so the range is flipped.
        let y_scale = Scale::fit(&series.y, height - MARGIN, MARGIN);

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            "<figure class=\"deck-scatter\">\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\">",
            w = self.width,
            h = self.height,
        );
        let _ = writeln!(
            svg,
            "<line class=\"axis\" x1=\"{m:.2}\" y1=\"{b:.2}\" x2=\"{r:.2}\" y2=\"{b:.2}\" stroke=\"#444\" />",
            m = MARGIN,
            b = height - MARGIN,
            r = width - MARGIN,
        );
        let _ = writeln!(
            svg,
            "<line class=\"axis\" x1=\"{m:.2}\" y1=\"{m:.2}\" x2=\"{m:.2}\" y2=\"{b:.2}\" stroke=\"#444\" />",
            m = MARGIN,
            b = height - MARGIN,
        );
        for (x, y) in series.x.iter().zip(series.y.iter()) {
            let _ = writeln!(
                svg,
                "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{POINT_RADIUS}\" fill=\"#3b6bd6\" />",
                x_scale.apply(*x),
                y_scale.apply(*y),
            );
        }
        svg.push_str("</svg>\n");
        if let Some(label) = series.label.as_deref() {
            let _ = writeln!(svg, "<figcaption>{}</figcaption>", ammonia::clean_text(label));
        }
        svg.push_str("</figure>");

        Ok(svg)
    }
}

impl Renderer for ScatterRenderer {
    fn name(&self) -> &'static str {
        "scatter"
    }

    fn render(&self, payload: &Payload) -> Result<String, RenderError> {
        match payload {
            Payload::Series(series) => self.render_series(series),
            other => Err(RenderError::unsupported(self.name(), other)),
        }
    }
}

/// Linear mapping from the data extent onto a pixel range.
///
/// Offsets are taken on halved values so that the extent of any finite data
/// stays finite.
struct Scale {
    half_min: f64,
    half_span: f64,
    start: f64,
    end: f64,
}

impl Scale {
    fn fit(values: &[f64], start: f64, end: f64) -> Self {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), value| {
                (lo.min(*value), hi.max(*value))
            });
        let half_span = max / 2.0 - min / 2.0;
        let (half_min, half_span) = if values.is_empty() {
            (0.0, 0.5)
        } else if half_span > 0.0 {
            (min / 2.0, half_span)
        } else {
            // Degenerate extent: centre every point.
            (min / 2.0 - 0.25, 0.5)
        };
        Self {
            half_min,
            half_span,
            start,
            end,
        }
    }

    fn apply(&self, value: f64) -> f64 {
        self.start + (value / 2.0 - self.half_min) / self.half_span * (self.end - self.start)
    }
}
