//! Scatter series built from an aggregate table.

use crate::data::AggregateTable;
use serde::Serialize;

/// One plotted point, labelled by its top-level group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub points: Vec<ScatterPoint>,
}

impl ScatterSeries {
    /// One point per table entry: x from the `x_key` bucket, y from `y_key`.
    /// A missing bucket counts as zero.
    pub fn from_table(table: &AggregateTable, x_key: &str, y_key: &str) -> Self {
        let points = table
            .entries()
            .iter()
            .map(|entry| ScatterPoint {
                label: entry.key.clone(),
                x: entry.value_for(x_key).unwrap_or(0.0),
                y: entry.value_for(y_key).unwrap_or(0.0),
            })
            .collect();
        Self { points }
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
