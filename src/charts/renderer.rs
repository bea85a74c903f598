//! Static Chart Renderer
//! Draws the district scatter plot with plotters, to SVG or PNG.
//!
//! Layout (all positions from [`LayoutConfig`]):
//! 1. Title, x-axis label, and a rotated y-axis label
//! 2. X axis along the bottom of the plot area, y axis along its left edge,
//!    both with round tick values
//! 3. One filled circle per district
//!
//! Points are placed with the [`Scales`] passed in; nothing here computes
//! domains, so the same scales give the same axes whatever is plotted.

use crate::charts::{format_tick, Scales, ScatterSeries};
use crate::config::LayoutConfig;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

const TICK_SIZE: i32 = 6;
const TICK_LABEL_SIZE: u32 = 10;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Invalid layout: {0}")]
    Layout(String),
    #[error("Cannot write chart: {0}")]
    Io(#[from] std::io::Error),
}

fn draw_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Svg,
    Png,
}

impl ChartFormat {
    /// Guess from the file extension; anything but `.png` is SVG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => ChartFormat::Png,
            _ => ChartFormat::Svg,
        }
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render to an in-memory SVG document.
    pub fn render_svg_string(
        series: &ScatterSeries,
        scales: &Scales,
        layout: &LayoutConfig,
    ) -> Result<String, RenderError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (layout.width, layout.height)).into_drawing_area();
            Self::draw(&root, series, scales, layout)?;
            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    /// Render to `path`. Returns the number of points drawn.
    pub fn render_to_file(
        series: &ScatterSeries,
        scales: &Scales,
        layout: &LayoutConfig,
        path: &Path,
        format: ChartFormat,
    ) -> Result<usize, RenderError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let size = (layout.width, layout.height);
        let drawn = match format {
            ChartFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                let drawn = Self::draw(&root, series, scales, layout)?;
                root.present().map_err(draw_err)?;
                drawn
            }
            ChartFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                let drawn = Self::draw(&root, series, scales, layout)?;
                root.present().map_err(draw_err)?;
                drawn
            }
        };
        debug!("Wrote {:?} chart to {}", format, path.display());
        Ok(drawn)
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        series: &ScatterSeries,
        scales: &Scales,
        layout: &LayoutConfig,
    ) -> Result<usize, RenderError> {
        let (r, g, b) = layout
            .point_rgb()
            .map_err(|e| RenderError::Layout(e.to_string()))?;
        let point_color = RGBColor(r, g, b);

        root.fill(&WHITE).map_err(draw_err)?;
        Self::draw_axes(root, scales, layout)?;
        Self::draw_labels(root, layout)?;

        let mut drawn = 0;
        for point in &series.points {
            let (cx, cy) = scales.map(point.x, point.y);
            if !cx.is_finite() || !cy.is_finite() {
                warn!("Skipping point '{}' with non-finite position", point.label);
                continue;
            }
            root.draw(&Circle::new(
                (cx.round() as i32, cy.round() as i32),
                layout.point_radius as i32,
                point_color.filled(),
            ))
            .map_err(draw_err)?;
            drawn += 1;
        }

        Ok(drawn)
    }

    fn draw_axes<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        scales: &Scales,
        layout: &LayoutConfig,
    ) -> Result<(), RenderError> {
        let left = layout.plot_left.round() as i32;
        let right = layout.plot_right.round() as i32;
        let top = layout.plot_top.round() as i32;
        let bottom = layout.plot_bottom.round() as i32;
        let axis_style = BLACK.stroke_width(1);

        // X axis
        root.draw(&PathElement::new(vec![(left, bottom), (right, bottom)], axis_style))
            .map_err(draw_err)?;
        let x_label_style = font(TICK_LABEL_SIZE)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for tick in scales.x.ticks(layout.tick_count) {
            let px = scales.x.map(tick).round() as i32;
            root.draw(&PathElement::new(
                vec![(px, bottom), (px, bottom + TICK_SIZE)],
                axis_style,
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(
                format_tick(tick),
                (px, bottom + TICK_SIZE + 3),
                x_label_style.clone(),
            ))
            .map_err(draw_err)?;
        }

        // Y axis
        root.draw(&PathElement::new(vec![(left, top), (left, bottom)], axis_style))
            .map_err(draw_err)?;
        let y_label_style = font(TICK_LABEL_SIZE)
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));
        for tick in scales.y.ticks(layout.tick_count) {
            let py = scales.y.map(tick).round() as i32;
            root.draw(&PathElement::new(
                vec![(left - TICK_SIZE, py), (left, py)],
                axis_style,
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(
                format_tick(tick),
                (left - TICK_SIZE - 3, py),
                y_label_style.clone(),
            ))
            .map_err(draw_err)?;
        }

        Ok(())
    }

    fn draw_labels<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        layout: &LayoutConfig,
    ) -> Result<(), RenderError> {
        root.draw(&Text::new(
            layout.title.as_str(),
            layout.title_pos,
            font(layout.title_size).color(&BLACK),
        ))
        .map_err(draw_err)?;

        root.draw(&Text::new(
            layout.x_label.as_str(),
            layout.x_label_pos,
            font(layout.label_size).color(&BLACK),
        ))
        .map_err(draw_err)?;

        root.draw(&Text::new(
            layout.y_label.as_str(),
            layout.y_label_pos,
            font(layout.label_size)
                .transform(FontTransform::Rotate270)
                .color(&BLACK),
        ))
        .map_err(draw_err)?;

        Ok(())
    }
}

fn font(size: u32) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, size as f64, FontStyle::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ScatterPoint;
    use crate::data::{Bounds, Extent};

    fn scales() -> Scales {
        let bounds = Bounds {
            x: Some(Extent::new(0.0, 10.0)),
            y: Some(Extent::new(0.0, 100.0)),
        };
        Scales::from_bounds(&bounds, &LayoutConfig::default())
    }

    fn series(n: usize) -> ScatterSeries {
        ScatterSeries {
            points: (0..n)
                .map(|i| ScatterPoint {
                    label: format!("D{}", i),
                    x: i as f64,
                    y: (i * 10) as f64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_one_circle_per_point() {
        let svg =
            StaticChartRenderer::render_svg_string(&series(3), &scales(), &LayoutConfig::default())
                .unwrap();
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("Shooting vs. Non-shooting Crimes by District"));
    }

    #[test]
    fn test_empty_series_draws_axes_only() {
        let svg = StaticChartRenderer::render_svg_string(
            &ScatterSeries::default(),
            &scales(),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(svg.matches("<circle").count(), 0);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Shooting Crime Frequency"));
    }

    #[test]
    fn test_bad_colour_is_a_layout_error() {
        let layout = LayoutConfig {
            point_color: "blue".to_string(),
            ..LayoutConfig::default()
        };
        let err = StaticChartRenderer::render_svg_string(&series(1), &scales(), &layout)
            .unwrap_err();
        assert!(matches!(err, RenderError::Layout(_)));
    }

    #[test]
    fn test_write_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("chart.svg");
        let drawn = StaticChartRenderer::render_to_file(
            &series(2),
            &scales(),
            &LayoutConfig::default(),
            &path,
            ChartFormat::from_path(&path),
        )
        .unwrap();
        assert_eq!(drawn, 2);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.matches("<circle").count(), 2);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ChartFormat::from_path(Path::new("a.PNG")), ChartFormat::Png);
        assert_eq!(ChartFormat::from_path(Path::new("a.svg")), ChartFormat::Svg);
        assert_eq!(ChartFormat::from_path(Path::new("a")), ChartFormat::Svg);
    }
}
