use eframe::egui;

use crate::export;
use crate::state::AppState;
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Write the screenshot delivered for a pending PNG export.
    fn handle_screenshot(&mut self, ctx: &egui::Context) {
        if self.state.pending_screenshot.is_none() {
            return;
        }
        let image = ctx.input(|i| {
            i.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };
        let Some(path) = self.state.pending_screenshot.take() else {
            return;
        };
        if let Err(e) = export::save_png(&image, &path) {
            log::error!("PNG export failed: {e:#}");
            self.state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_screenshot(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        if let Some(message) = &self.state.fatal_error {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::fatal_screen(ui, message);
            });
            return;
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, legend, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::kpi_strip(ui, &self.state);
            if let Some(filter) = &self.state.filters {
                panels::legend(ui, filter);
            }
            ui.separator();
            panels::chart_area(ui, &mut self.state);
        });
    }
}
