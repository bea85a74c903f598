//! Plot pipeline
//! Turns the loaded dataset and a year choice into everything a chart needs.
//!
//! Both the static renderer and the viewer call [`build_plot`] whenever the
//! year or reduction changes; the result replaces the previous model.

use crate::charts::{Scales, ScatterSeries};
use crate::config::LayoutConfig;
use crate::data::{
    find_min_max, AggregateError, AggregateTable, Aggregator, Bounds, Dataset, GroupKeys,
    RangeOverrides, Reduction, RowFilter,
};
use tracing::debug;

/// What to group, how to reduce it, and how to bound the axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub keys: GroupKeys,
    pub reduction: Reduction,
    pub year_field: String,
    /// Second-level key plotted on x.
    pub x_key: String,
    /// Second-level key plotted on y.
    pub y_key: String,
    pub overrides: RangeOverrides,
    /// Bound the axes by every year rather than the selected one.
    pub fixed_axes: bool,
}

impl PlotSettings {
    fn aggregator(&self, year: Option<&str>) -> Aggregator {
        Aggregator::new(self.keys.clone(), self.reduction.clone())
            .with_optional_filter(year.map(|y| RowFilter::equals(&self.year_field, y)))
    }
}

/// One filter state, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotModel {
    /// `None` means all years.
    pub year: Option<String>,
    pub table: AggregateTable,
    pub series: ScatterSeries,
    pub bounds: Bounds,
    pub scales: Scales,
}

/// Aggregate `dataset` for `year`, find the bounds, and build the scales.
pub fn build_plot(
    dataset: &Dataset,
    settings: &PlotSettings,
    layout: &LayoutConfig,
    year: Option<&str>,
) -> Result<PlotModel, AggregateError> {
    let table = settings.aggregator(year).aggregate(dataset.records())?;
    let series = ScatterSeries::from_table(&table, &settings.x_key, &settings.y_key);

    // Axes over every year must not fail on rows the year filter excludes
    let bounds = if settings.fixed_axes && year.is_some() {
        let all_years = settings
            .aggregator(None)
            .skip_bad_rows()
            .aggregate(dataset.records())?;
        let axis_series = ScatterSeries::from_table(&all_years, &settings.x_key, &settings.y_key);
        find_min_max(&axis_series.xs(), &axis_series.ys(), &settings.overrides)
    } else {
        find_min_max(&series.xs(), &series.ys(), &settings.overrides)
    };
    let scales = Scales::from_bounds(&bounds, layout);

    debug!(
        "Built plot for {}: {} points, bounds {:?}",
        year.unwrap_or("all years"),
        series.len(),
        bounds
    );

    Ok(PlotModel {
        year: year.map(str::to_string),
        table,
        series,
        bounds,
        scales,
    })
}
