//! Control Panel Widget
//! Left side panel: data source, year dropdown, reduction mode, export.

use crate::config::ReductionMode;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Label shown for the no-filter choice.
const ALL_YEARS: &str = "All years";

/// Choices the user can change.
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    /// `None` means all years.
    pub year: Option<String>,
    pub mode: ReductionMode,
    pub sum_field: String,
}

/// Left side control panel with file selection and filter controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub years: Vec<String>,
    pub status: String,
    pub loaded: bool,
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            years: Vec::new(),
            status: "Ready".to_string(),
            loaded: false,
        }
    }

    /// Replace the dropdown's years. Keeps the selection if it is still offered.
    pub fn update_years(&mut self, years: Vec<String>) {
        if let Some(selected) = &self.settings.year {
            if !years.contains(selected) {
                self.settings.year = years.first().cloned();
            }
        }
        self.years = years;
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("District Scatter")
                    .size(22.0)
                    .color(Color32::from_rgb(66, 134, 244)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    let path_color = if self.loaded {
                        ui.visuals().text_color()
                    } else {
                        Color32::GRAY
                    };
                    ui.label(RichText::new(&path_text).size(12.0).color(path_color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Filter Section =====
        ui.label(RichText::new("🔎 Filter").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 90.0;
        let combo_width = 150.0;

        ui.add_enabled_ui(self.loaded, |ui| {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Year:"));
                let selected = self.settings.year.as_deref().unwrap_or(ALL_YEARS).to_string();
                ComboBox::from_id_salt("year")
                    .width(combo_width)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for year in &self.years {
                            let is_selected = self.settings.year.as_deref() == Some(year.as_str());
                            if ui.selectable_label(is_selected, year).clicked() && !is_selected {
                                self.settings.year = Some(year.clone());
                                action = ControlPanelAction::FilterChanged;
                            }
                        }
                        let all_selected = self.settings.year.is_none();
                        if ui.selectable_label(all_selected, ALL_YEARS).clicked() && !all_selected
                        {
                            self.settings.year = None;
                            action = ControlPanelAction::FilterChanged;
                        }
                    });
            });

            ui.add_space(10.0);

            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Reduction:"));
                let before = self.settings.mode;
                ui.radio_value(&mut self.settings.mode, ReductionMode::Sum, "Sum");
                ui.radio_value(&mut self.settings.mode, ReductionMode::Count, "Count");
                if self.settings.mode != before {
                    action = ControlPanelAction::FilterChanged;
                }
            });

            if self.settings.mode == ReductionMode::Sum {
                ui.horizontal(|ui| {
                    ui.add_sized([label_width, 20.0], egui::Label::new("Sum field:"));
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.settings.sum_field)
                            .desired_width(combo_width),
                    );
                    if response.lost_focus() {
                        action = ControlPanelAction::FilterChanged;
                    }
                });
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.loaded, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export Chart").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportChart;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    FilterChanged,
    ExportChart,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(year: Option<&str>) -> ControlPanel {
        ControlPanel::new(UserSettings {
            csv_path: None,
            year: year.map(str::to_string),
            mode: ReductionMode::Sum,
            sum_field: "amount".to_string(),
        })
    }

    #[test]
    fn test_selection_kept_when_year_offered() {
        let mut panel = panel(Some("2017"));
        panel.update_years(vec!["2018".to_string(), "2017".to_string()]);
        assert_eq!(panel.settings.year.as_deref(), Some("2017"));
    }

    #[test]
    fn test_selection_falls_back_to_first_year() {
        let mut panel = panel(Some("1999"));
        panel.update_years(vec!["2018".to_string(), "2017".to_string()]);
        assert_eq!(panel.settings.year.as_deref(), Some("2018"));
    }

    #[test]
    fn test_all_years_selection_survives_update() {
        let mut panel = panel(None);
        panel.update_years(vec!["2018".to_string()]);
        assert_eq!(panel.settings.year, None);
    }
}
