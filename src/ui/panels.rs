use eframe::egui::{self, Color32, RichText, ScrollArea, Sense, Ui, vec2};

use crate::color::{color_for, legend_entries};
use crate::data::filter::FilterState;
use crate::export::{self, Snapshot};
use crate::insight::ChartId;
use crate::state::AppState;

use super::plot;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Widgets read a snapshot of the filter
/// taken before drawing; each change goes through the `AppState`
/// transition methods.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (Some(dataset), Some(current)) = (&state.dataset, &state.filters) else {
        ui.label("No dataset loaded.");
        return;
    };
    let metrics = dataset.metrics.clone();
    let filter = current.clone();

    // ---- Year range ----
    ui.strong("Years");
    let bounds = filter.bounds;
    let mut from = filter.year_min;
    let mut to = filter.year_max;
    if ui
        .add(egui::Slider::new(&mut from, bounds.first..=bounds.last).text("From"))
        .changed()
    {
        state.set_year_min(from);
    }
    if ui
        .add(egui::Slider::new(&mut to, bounds.first..=bounds.last).text("To"))
        .changed()
    {
        state.set_year_max(to);
    }
    ui.separator();

    // ---- Metric ----
    ui.strong("Metric");
    let mut chosen = None;
    egui::ComboBox::from_id_salt("metric")
        .selected_text(filter.metric.column_name())
        .show_ui(ui, |ui: &mut Ui| {
            for m in &metrics {
                if ui.selectable_label(filter.metric == *m, m.column_name()).clicked() {
                    chosen = Some(*m);
                }
            }
        });
    if let Some(metric) = chosen {
        state.set_metric(metric);
    }

    let mut show = filter.show_projection;
    let label = format!("Show {}-year projection", state.config.projection_years);
    if ui.checkbox(&mut show, label).changed() {
        state.set_projection(show);
    }
    ui.separator();

    // ---- Cancer types ----
    let header = format!(
        "Cancer types  ({}/{})",
        filter.selected_types.len(),
        filter.known_types().len()
    );
    ui.strong(header);
    ui.add(egui::TextEdit::singleline(&mut state.type_search).hint_text("Search…"));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all();
        }
        if ui.small_button("None").clicked() {
            state.select_none();
        }
    });

    let visible = state.visible_types();
    let mut toggled: Vec<String> = Vec::new();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if visible.is_empty() {
                ui.weak("No matching types");
            }
            for name in &visible {
                let mut checked = filter.selected_types.contains(name);
                let mut text = RichText::new(name);
                if let Some(i) = type_color_index(&filter, name) {
                    text = text.color(color_for(i));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    toggled.push(name.clone());
                }
            }
        });
    for name in &toggled {
        state.toggle_type(name);
    }
}

/// Color index of a selected type, matching the chart series.
fn type_color_index(filter: &FilterState, name: &str) -> Option<usize> {
    filter
        .indexed_types()
        .find(|(_, t)| *t == name)
        .map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Export", |ui: &mut Ui| {
            let ready = state.derived.is_some();
            if ui.add_enabled(ready, egui::Button::new("Image (PNG)…")).clicked() {
                request_screenshot(ui.ctx(), state);
                ui.close_menu();
            }
            if ui.add_enabled(ready, egui::Button::new("Data (JSON)…")).clicked() {
                export_json(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(derived)) = (&state.dataset, &state.derived) {
            ui.label(format!(
                "{} rows loaded, {} in view",
                ds.len(),
                derived.filtered_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// KPI strip and legend
// ---------------------------------------------------------------------------

pub fn kpi_strip(ui: &mut Ui, state: &AppState) {
    let (avg, top, top_value) = match &state.kpis {
        Some(k) => (
            k.avg_label(),
            k.top_type_label().to_string(),
            k.top_value_label(),
        ),
        None => ("–".into(), "–".into(), "–".into()),
    };

    ui.columns(3, |cols: &mut [Ui]| {
        kpi_card(&mut cols[0], "Average rate", &avg);
        kpi_card(&mut cols[1], "Highest type", &top);
        kpi_card(&mut cols[2], "Highest rate", &top_value);
    });
}

fn kpi_card(ui: &mut Ui, label: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.weak(label);
        ui.label(RichText::new(value).size(20.0).strong());
    });
}

pub fn legend(ui: &mut Ui, filter: &FilterState) {
    let entries = legend_entries(filter.selected_types.iter().map(String::as_str));
    if entries.is_empty() {
        return;
    }
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (name, color) in entries {
            let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
            ui.painter().rect_filled(rect, 2.0, color);
            ui.label(name);
            ui.add_space(6.0);
        }
    });
}

// ---------------------------------------------------------------------------
// Chart cards
// ---------------------------------------------------------------------------

/// Either the six-card grid or the single expanded card.
pub fn chart_area(ui: &mut Ui, state: &mut AppState) {
    let mut clicked: Option<ChartId> = None;

    {
        let (Some(derived), Some(filter)) = (&state.derived, &state.filters) else {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.weak("Nothing to show");
            });
            return;
        };
        let config = &state.config;

        match state.expanded {
            Some(chart) => {
                let insight_height = 90.0;
                let height = (ui.available_height() - insight_height - 40.0).max(200.0);
                egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
                    if card_header(ui, chart, true) {
                        clicked = Some(chart);
                    }
                    plot::draw_chart(ui, chart, derived, filter, config, height);
                });
                if let Some(insight) = &state.insight {
                    ui.add_space(6.0);
                    ui.strong(&insight.title);
                    ui.label(&insight.body);
                }
            }
            None => {
                let rows = ChartId::ALL.len().div_ceil(2) as f32;
                let height = ((ui.available_height() - rows * 48.0) / rows).max(140.0);
                ScrollArea::vertical().show(ui, |ui: &mut Ui| {
                    for pair in ChartId::ALL.chunks(2) {
                        ui.columns(2, |cols: &mut [Ui]| {
                            for (col, &chart) in cols.iter_mut().zip(pair) {
                                egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                                    if card_header(ui, chart, false) {
                                        clicked = Some(chart);
                                    }
                                    plot::draw_chart(ui, chart, derived, filter, config, height);
                                });
                            }
                        });
                    }
                });
            }
        }
    }

    if let Some(chart) = clicked {
        state.toggle_expand(chart);
    }
}

/// Title row with the expand / collapse toggle. Returns true on click.
fn card_header(ui: &mut Ui, chart: ChartId, expanded: bool) -> bool {
    let mut clicked = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(chart.title());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let (icon, hint) = if expanded {
                ("⊟", "Back to all charts")
            } else {
                ("⊞", "Expand")
            };
            clicked = ui.small_button(icon).on_hover_text(hint).clicked();
        });
    });
    clicked
}

/// Blocking screen shown when no dataset could be loaded.
pub fn fatal_screen(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.heading(RichText::new("Unable to load data").color(Color32::RED));
        ui.add_space(8.0);
        ui.label(message);
        ui.add_space(8.0);
        ui.weak("Use File → Open… to load another dataset.");
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open cancer statistics")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} rows, {} cancer types, from {}",
                    dataset.len(),
                    dataset.cancer_types.len(),
                    path.display()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

fn request_screenshot(ctx: &egui::Context, state: &mut AppState) {
    if let Some(path) = export::pick_png_path() {
        state.pending_screenshot = Some(path);
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(egui::UserData::default()));
    }
}

fn export_json(state: &mut AppState) {
    let Some(snapshot) = Snapshot::capture(state) else {
        return;
    };
    let Some(path) = export::pick_json_path() else {
        return;
    };
    if let Err(e) = export::write_json(&snapshot, &path) {
        log::error!("JSON export failed: {e:#}");
        state.status_message = Some(format!("Error: {e:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::filter::init_filter_state;
    use crate::data::loader::load_embedded;

    #[test]
    fn checkbox_colors_follow_selection_order() {
        let ds = load_embedded().unwrap();
        let filter = init_filter_state(&ds).with_types(["Lung", "Breast"]);
        assert_eq!(type_color_index(&filter, "Breast"), Some(0));
        assert_eq!(type_color_index(&filter, "Lung"), Some(1));
        assert_eq!(type_color_index(&filter, "Liver"), None);
    }

    #[test]
    fn side_panel_frame_without_input_keeps_filters() {
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(load_embedded().unwrap());
        let before = state.filters.clone();

        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::SidePanel::left("filters").show(ctx, |ui| side_panel(ui, &mut state));
        });
        assert_eq!(state.filters, before);
        assert!(state.derived.is_some());
    }
}
