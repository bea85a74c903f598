//! District Scatter Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{ChartFormat, StaticChartRenderer};
use crate::config::Config;
use crate::data::{DataLoader, Dataset};
use crate::gui::control_panel::UserSettings;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::pipeline::{build_plot, PlotModel};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct ScatterApp {
    config: Config,
    dataset: Option<Dataset>,
    model: Option<PlotModel>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl ScatterApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config, year: Option<String>) -> Self {
        let settings = UserSettings {
            csv_path: Some(config.data.csv_path.clone()),
            year,
            mode: config.aggregate.mode,
            sum_field: config.aggregate.sum_field.clone(),
        };

        let mut app = Self {
            chart_viewer: ChartViewer::new(&config.layout),
            control_panel: ControlPanel::new(settings),
            config,
            dataset: None,
            model: None,
            load_rx: None,
            is_loading: false,
        };

        let initial = app.config.data.csv_path.clone();
        if initial.is_file() {
            app.start_load(initial);
        } else {
            app.control_panel.set_status("Browse for a crime CSV to begin");
        }
        app
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Load the CSV on a background thread. Failures are reported, not retried.
    fn start_load(&mut self, path: PathBuf) {
        self.dataset = None;
        self.model = None;
        self.control_panel.loaded = false;
        self.control_panel.settings.csv_path = Some(path.clone());
        self.control_panel.set_status("Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let required: Vec<String> = self
            .config
            .required_columns()
            .into_iter()
            .map(str::to_string)
            .collect();

        thread::spawn(move || {
            let required: Vec<&str> = required.iter().map(String::as_str).collect();
            let result = match DataLoader::load_with_columns(&path, &required) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(dataset)) => {
                info!("Viewer loaded {} rows", dataset.len());
                let years = self.offered_years(&dataset);
                self.control_panel.update_years(years);
                self.control_panel.loaded = true;
                self.dataset = Some(dataset);
                self.is_loading = false;
                self.rebuild_plot();
            }
            Ok(LoadResult::Error(message)) => {
                error!("CSV load failed: {}", message);
                self.control_panel.set_status(&format!("Error: {}", message));
                self.is_loading = false;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_status("Error: CSV loader stopped unexpectedly");
                self.is_loading = false;
            }
        }
    }

    /// Configured years, or the years present in the data when none are configured.
    fn offered_years(&self, dataset: &Dataset) -> Vec<String> {
        if self.config.data.years.is_empty() {
            dataset.distinct_values(&self.config.data.year_field)
        } else {
            self.config.data.years.iter().map(|y| y.to_string()).collect()
        }
    }

    /// Replace the plot model for the current filter and reduction.
    fn rebuild_plot(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };

        let user = &self.control_panel.settings;
        self.config.aggregate.mode = user.mode;
        self.config.aggregate.sum_field = user.sum_field.clone();
        let year = user.year.clone();

        match build_plot(
            dataset,
            &self.config.plot_settings(),
            &self.config.layout,
            year.as_deref(),
        ) {
            Ok(model) => {
                let status = if model.series.is_empty() {
                    "No records for this year".to_string()
                } else {
                    format!("Plotted {} districts", model.series.len())
                };
                self.control_panel.set_status(&status);
                self.model = Some(model);
            }
            Err(e) => {
                warn!("Aggregation failed: {}", e);
                self.control_panel.set_status(&format!("Error: {}", e));
                self.model = None;
            }
        }
    }

    /// Handle chart export to SVG or PNG
    fn handle_export_chart(&mut self) {
        let Some(model) = &self.model else {
            self.control_panel.set_status("No chart to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("SVG Image", &["svg"])
            .add_filter("PNG Image", &["png"])
            .set_file_name("crime_scatter.svg")
            .save_file()
        else {
            return;
        };

        let status = match StaticChartRenderer::render_to_file(
            &model.series,
            &model.scales,
            &self.config.layout,
            &path,
            ChartFormat::from_path(&path),
        ) {
            Ok(drawn) => format!("Exported {} points to {}", drawn, path.display()),
            Err(e) => format!("Error: {}", e),
        };
        self.control_panel.set_status(&status);
    }
}

impl eframe::App for ScatterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::FilterChanged => self.rebuild_plot(),
                        ControlPanelAction::ExportChart => self.handle_export_chart(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, self.model.as_ref(), &self.config.layout);
        });
    }
}
