//! Scales
//! Linear value-to-pixel mapping for both axes, plus tick generation.

use crate::config::LayoutConfig;
use crate::data::{Bounds, Extent};

/// Domain used for an axis that has no data.
const EMPTY_DOMAIN: (f64, f64) = (0.0, 1.0);

/// Maps `domain` linearly onto `range`. Either may be inverted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Lower and upper domain ends, whichever order the domain runs in.
    pub fn domain_sorted(&self) -> (f64, f64) {
        let (a, b) = self.domain;
        (a.min(b), a.max(b))
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round tick values inside the domain, about `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.domain_sorted();
        let span = hi - lo;
        if count == 0 || !span.is_finite() || span <= 0.0 {
            return if lo.is_finite() { vec![lo] } else { Vec::new() };
        }

        let step = nice_step(span, count);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        // Multiplying the index avoids drift from repeated addition
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Step of 1, 2 or 5 times a power of ten giving roughly `target_steps` steps.
pub fn nice_step(range: f64, target_steps: usize) -> f64 {
    let raw_step = range / target_steps as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

/// Format a tick value without trailing zeros.
pub fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let formatted = format!("{:.2}", value);
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// The pair of scales a chart is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub x: LinearScale,
    pub y: LinearScale,
}

impl Scales {
    /// Pad the extents and map them onto the layout's plot area.
    ///
    /// Screen y grows downward, so the y domain runs from max to min.
    pub fn from_bounds(bounds: &Bounds, layout: &LayoutConfig) -> Self {
        let (x_min, x_max) = padded(bounds.x, layout.x_padding);
        let (y_min, y_max) = padded(bounds.y, layout.y_padding);

        Self {
            x: LinearScale::new((x_min, x_max), (layout.plot_left, layout.plot_right)),
            y: LinearScale::new((y_max, y_min), (layout.plot_top, layout.plot_bottom)),
        }
    }

    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.map(x), self.y.map(y))
    }
}

fn padded(extent: Option<Extent>, padding: f64) -> (f64, f64) {
    match extent {
        Some(e) => (e.min - padding, e.max + padding),
        None => EMPTY_DOMAIN,
    }
}
