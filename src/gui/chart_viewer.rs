//! Chart Viewer Widget
//! Central panel: the district scatter drawn with egui_plot.

use crate::config::LayoutConfig;
use crate::pipeline::PlotModel;
use egui::{Align2, Color32, RichText};
use egui_plot::{Plot, PlotPoint, PlotPoints, Points, Text};

/// Fallback when the configured colour does not parse.
const DEFAULT_POINT_COLOR: Color32 = Color32::from_rgb(66, 134, 244);

/// Interactive scatter view of the current [`PlotModel`].
pub struct ChartViewer {
    point_color: Color32,
}

impl ChartViewer {
    pub fn new(layout: &LayoutConfig) -> Self {
        let point_color = layout
            .point_rgb()
            .map(|(r, g, b)| Color32::from_rgb(r, g, b))
            .unwrap_or(DEFAULT_POINT_COLOR);
        Self { point_color }
    }

    pub fn show(&self, ui: &mut egui::Ui, model: Option<&PlotModel>, layout: &LayoutConfig) {
        let Some(model) = model else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.vertical_centered(|ui| {
            ui.label(RichText::new(&layout.title).size(18.0).strong());
            let subtitle = match &model.year {
                Some(year) => format!("{} · {} districts", year, model.series.len()),
                None => format!("All years · {} districts", model.series.len()),
            };
            ui.label(RichText::new(subtitle).size(12.0).color(Color32::GRAY));
        });
        ui.add_space(8.0);

        // Axes come from the model's scales, so they stay put across years
        let (x_lo, x_hi) = model.scales.x.domain_sorted();
        let (y_lo, y_hi) = model.scales.y.domain_sorted();

        let points: PlotPoints = model.series.points.iter().map(|p| [p.x, p.y]).collect();
        let radius = layout.point_radius as f32;
        let color = self.point_color;

        Plot::new("district_scatter")
            .x_axis_label(layout.x_label.clone())
            .y_axis_label(layout.y_label.clone())
            .include_x(x_lo)
            .include_x(x_hi)
            .include_y(y_lo)
            .include_y(y_hi)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.points(Points::new(points).radius(radius).color(color).name("District"));

                for point in &model.series.points {
                    plot_ui.text(
                        Text::new(PlotPoint::new(point.x, point.y), &point.label)
                            .anchor(Align2::LEFT_BOTTOM)
                            .color(Color32::GRAY),
                    );
                }
            });
    }
}
