//! Range Finder
//! Min/max over the x and y series, with optional per-bound overrides.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Closed interval covered by a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Extent of the finite values in `values`; `None` when there are none.
    pub fn of(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self::new(v, v)),
                Some(e) => Some(Self::new(e.min.min(v), e.max.max(v))),
            })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Fixed bounds that replace computed ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
}

/// Bounds of both axes. `None` on an axis means there was nothing to measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub x: Option<Extent>,
    pub y: Option<Extent>,
}

impl Bounds {
    pub fn x_min(&self) -> Option<f64> {
        self.x.map(|e| e.min)
    }

    pub fn x_max(&self) -> Option<f64> {
        self.x.map(|e| e.max)
    }

    pub fn y_min(&self) -> Option<f64> {
        self.y.map(|e| e.min)
    }

    pub fn y_max(&self) -> Option<f64> {
        self.y.map(|e| e.max)
    }
}

/// Compute x and y bounds, then apply `overrides`.
pub fn find_min_max(xs: &[f64], ys: &[f64], overrides: &RangeOverrides) -> Bounds {
    Bounds {
        x: apply_override("x", Extent::of(xs), overrides.x_min, overrides.x_max),
        y: apply_override("y", Extent::of(ys), overrides.y_min, overrides.y_max),
    }
}

fn apply_override(
    axis: &str,
    computed: Option<Extent>,
    min: Option<f64>,
    max: Option<f64>,
) -> Option<Extent> {
    let extent = match (computed, min, max) {
        (Some(e), min, max) => Extent::new(min.unwrap_or(e.min), max.unwrap_or(e.max)),
        (None, Some(min), Some(max)) => Extent::new(min, max),
        (None, _, _) => return None,
    };
    if extent.min > extent.max {
        warn!(
            "{}-axis override gives min {} above max {}",
            axis, extent.min, extent.max
        );
    }
    Some(extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max_of_both_series() {
        let bounds = find_min_max(&[3.0, 1.0, 7.0], &[10.0, 4.0], &RangeOverrides::default());
        assert_eq!(bounds.x, Some(Extent::new(1.0, 7.0)));
        assert_eq!(bounds.y_min(), Some(4.0));
        assert_eq!(bounds.y_max(), Some(10.0));
    }

    #[test]
    fn test_empty_series_gives_sentinel() {
        let bounds = find_min_max(&[], &[], &RangeOverrides::default());
        assert_eq!(bounds, Bounds { x: None, y: None });
        assert_eq!(bounds.x_min(), None);
    }

    #[test]
    fn test_nan_is_skipped() {
        assert_eq!(Extent::of(&[f64::NAN, 2.0, 5.0]), Some(Extent::new(2.0, 5.0)));
        assert_eq!(Extent::of(&[f64::NAN]), None);
    }

    #[test]
    fn test_y_min_override() {
        let overrides = RangeOverrides {
            y_min: Some(1026.0),
            ..Default::default()
        };
        let bounds = find_min_max(&[1.0, 2.0], &[1100.0, 1500.0], &overrides);
        assert_eq!(bounds.y, Some(Extent::new(1026.0, 1500.0)));
        assert_eq!(bounds.x, Some(Extent::new(1.0, 2.0)));
    }

    #[test]
    fn test_override_on_empty_series_needs_both_bounds() {
        let only_min = RangeOverrides {
            y_min: Some(1026.0),
            ..Default::default()
        };
        assert_eq!(find_min_max(&[], &[], &only_min).y, None);

        let both = RangeOverrides {
            x_min: Some(0.0),
            x_max: Some(10.0),
            ..Default::default()
        };
        assert_eq!(find_min_max(&[], &[], &both).x, Some(Extent::new(0.0, 10.0)));
    }
}
