use std::time::Instant;

use eframe::egui;
use lotmap::editor::Mode;
use lotmap::model::DocumentKind;
use lotmap::settings::ViewMode;

use super::MapApp;

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.expire_pulses(now);

        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.escape();
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong(match self.mode {
                    ViewMode::Public => "Mapa de lotes",
                    ViewMode::Edit(DocumentKind::Sections) => "Edición de secciones",
                    ViewMode::Edit(DocumentKind::Lots) => "Edición de lotes",
                });
                ui.separator();
                if ui.button("Abrir carpeta de datos…").clicked() {
                    self.pick_data_root();
                }
                if ui.button("Recargar").clicked() {
                    self.reload_data();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or("Listo"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(lots) = self.workspace.lots() {
                        ui.label(format!("Lotes: {}", lots.len()));
                        ui.separator();
                    }
                    ui.label(format!("Secciones: {}", self.workspace.sections().len()));
                    ui.separator();
                    ui.label(format!(
                        "Imagen: {}x{} (×{:.4})",
                        self.base.size.width,
                        self.base.size.height,
                        self.factors.sx()
                    ));
                });
            });
        });

        match self.mode {
            ViewMode::Public => self.public_panel(ctx, now),
            ViewMode::Edit(kind) => self.edit_panel(ctx, kind),
        }
        self.manual_copy_window(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas(ui, now));

        if let Some(due) = self.pulses.next_due() {
            ctx.request_repaint_after(due.saturating_duration_since(now));
        }
    }
}

impl MapApp {
    /// Escape clears drawn points, or cancels the current edit.
    fn escape(&mut self) {
        let Some(kind) = self.mode.edit_kind() else {
            return;
        };
        let result = match self.editor.mode() {
            Mode::Drawing(_) => self.editor.clear_draft(),
            Mode::Editing => {
                self.drag = None;
                match self.workspace.collection_mut(kind) {
                    Some(collection) => self.editor.cancel_edit(collection).map(|_| ()),
                    None => Ok(()),
                }
            }
            Mode::Idle => Ok(()),
        };
        match result {
            Ok(()) => self.refresh_display(),
            Err(err) => self.report(err),
        }
    }
}
