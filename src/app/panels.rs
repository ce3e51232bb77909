use std::time::Instant;

use eframe::egui;
use lotmap::bulk;
use lotmap::catalog::{LotStatus, PackageLookup};
use lotmap::export::{self, Clipboard, ClipboardError, ExportOutcome};
use lotmap::form::{CreateForm, LOT_STATUSES};
use lotmap::model::{DocumentKind, ShapeKind};
use lotmap::search::{self, SearchOutcome};

use super::{EditPanel, LotPanel, MapApp};

/// Hands exported text to the egui platform clipboard.
struct ContextClipboard<'a>(&'a egui::Context);

impl Clipboard for ContextClipboard<'_> {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.0.copy_text(text.to_string());
        Ok(())
    }
}

const SUGGESTION_LIMIT: usize = 6;

impl MapApp {
    pub(super) fn public_panel(&mut self, ctx: &egui::Context, now: Instant) {
        let mut back = false;
        let mut run_search = false;
        let mut picked = None;
        egui::SidePanel::right("lot_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                match self.workspace.current() {
                    Some(section) => {
                        ui.heading(format!("Sección {}", section.nombre));
                        if ui.button("← Volver a secciones").clicked() {
                            back = true;
                        }
                        ui.checkbox(&mut self.show_all_lots, "Mostrar todos los lotes");
                    }
                    None => {
                        ui.heading("Secciones");
                    }
                }
                ui.separator();
                ui.label("Buscar lote por id");
                ui.horizontal(|ui| {
                    let response = ui.text_edit_singleline(&mut self.search_query);
                    let enter =
                        response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Buscar").clicked() || enter {
                        run_search = true;
                    }
                });
                if let Some(lots) = self.workspace.lots() {
                    ui.horizontal_wrapped(|ui| {
                        for (r, id) in search::suggest(lots, &self.search_query, SUGGESTION_LIMIT) {
                            if ui.small_button(id.as_str()).clicked() {
                                picked = Some((r, id));
                            }
                        }
                    });
                }
                ui.separator();
                lot_panel_ui(ui, &self.lot_panel);
            });

        if back {
            self.back_to_sections();
        } else if let Some((r, id)) = picked {
            self.search_query = id;
            self.pin_lot(r, now);
        } else if run_search {
            self.run_search(now);
        }
    }

    fn run_search(&mut self, now: Instant) {
        match search::search_lot(self.workspace.lots(), &self.search_query) {
            SearchOutcome::EmptyQuery => {
                self.lot_panel = LotPanel::Hint("Escribe el id de un lote.".into());
            }
            SearchOutcome::NoSection => {
                self.lot_panel = LotPanel::Hint("Selecciona primero una sección.".into());
            }
            SearchOutcome::NotFound(q) => {
                self.lot_panel =
                    LotPanel::Hint(format!("No se encontró el lote {q} en esta sección."));
            }
            SearchOutcome::Found(r) => self.pin_lot(r, now),
        }
    }

    pub(super) fn edit_panel(&mut self, ctx: &egui::Context, kind: DocumentKind) {
        let mut next_panel = None;
        let mut chosen_section = None;
        let mut copy = false;
        egui::SidePanel::right("edit_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading(match kind {
                    DocumentKind::Sections => "Editor de secciones",
                    DocumentKind::Lots => "Editor de lotes",
                });
                if kind == DocumentKind::Lots {
                    chosen_section = self.section_picker(ui);
                }
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| match self.edit_panel {
                    EditPanel::Menu => {
                        if ui.button("Editar existente").clicked() {
                            next_panel = Some(EditPanel::Edit);
                        }
                        if ui.button("Crear nuevo").clicked() {
                            next_panel = Some(EditPanel::Create);
                        }
                        if ui.button("Lista masiva").clicked() {
                            next_panel = Some(EditPanel::Bulk);
                        }
                        if ui.button("Copiar GeoJSON").clicked() {
                            copy = true;
                        }
                        ui.separator();
                        ui.label("Tipo de figura");
                        for shape in [ShapeKind::Polygon, ShapeKind::Circle] {
                            ui.radio_value(&mut self.shape_kind, shape, shape.label());
                        }
                        ui.separator();
                        ui.small(self.queues.get(kind).status_line());
                    }
                    EditPanel::Edit => {
                        copy = self.edit_existing_ui(ui, kind);
                        if ui.button("Volver al menú").clicked() {
                            next_panel = Some(EditPanel::Menu);
                        }
                    }
                    EditPanel::Create => {
                        self.create_ui(ui, kind);
                        if ui.button("Volver al menú").clicked() {
                            next_panel = Some(EditPanel::Menu);
                        }
                    }
                    EditPanel::Bulk => {
                        self.bulk_ui(ui, kind);
                        if ui.button("Volver al menú").clicked() {
                            next_panel = Some(EditPanel::Menu);
                        }
                    }
                });
            });

        if let Some(id) = chosen_section {
            self.leave_editor();
            self.edit_panel = EditPanel::Menu;
            self.open_section(&id);
        }
        if copy {
            self.copy_geojson(ctx, kind);
        }
        if let Some(panel) = next_panel {
            self.enter_panel(panel, kind);
        }
    }

    fn section_picker(&self, ui: &mut egui::Ui) -> Option<String> {
        let current = self.workspace.current();
        let selected_text = current
            .map(|s| format!("{} — {}", s.id, s.nombre))
            .unwrap_or_else(|| "(elige una sección)".to_string());
        let mut chosen = None;
        egui::ComboBox::from_id_salt("section_picker")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (id, name) in self.workspace.section_options() {
                    let is_current = current.is_some_and(|s| s.id == id);
                    if ui
                        .selectable_label(is_current, format!("{id} — {name}"))
                        .clicked()
                        && !is_current
                    {
                        chosen = Some(id);
                    }
                }
            });
        chosen
    }

    /// Returns whether a copy was requested.
    fn edit_existing_ui(&mut self, ui: &mut egui::Ui, kind: DocumentKind) -> bool {
        let Some(target) = self.editor.selection().map(|s| s.target()) else {
            ui.label("Haz clic en una figura para editarla.");
            return false;
        };
        let name = self
            .workspace
            .collection(kind)
            .and_then(|c| c.get(target))
            .map(|f| f.display_name().to_string())
            .unwrap_or_default();
        ui.label(format!("Editando: {name}"));
        ui.small("Arrastra los puntos para cambiar la forma.");
        let mut copy = false;
        ui.horizontal(|ui| {
            if ui.button("Guardar").clicked() {
                let result = match self.workspace.collection_mut(kind) {
                    Some(collection) => Some(self.editor.save_edit(collection)),
                    None => None,
                };
                match result {
                    Some(Ok(_)) => self.status = Some(format!("Guardado {name}")),
                    Some(Err(err)) => self.report(err),
                    None => {}
                }
                self.refresh_display();
            }
            if ui.button("Cancelar").clicked() {
                let result = match self.workspace.collection_mut(kind) {
                    Some(collection) => Some(self.editor.cancel_edit(collection)),
                    None => None,
                };
                match result {
                    Some(Ok(_)) => self.status = Some(format!("Cambios descartados en {name}")),
                    Some(Err(err)) => self.report(err),
                    None => {}
                }
                self.refresh_display();
            }
            if ui.button("Copiar").clicked() {
                copy = true;
            }
        });
        copy
    }

    fn create_ui(&mut self, ui: &mut egui::Ui, kind: DocumentKind) {
        let points = self.editor.draft().map_or(0, |d| d.point_count());
        ui.label(format!("{} — puntos: {points}", self.shape_kind.label()));
        ui.small(match self.shape_kind {
            ShapeKind::Polygon => "Haz clic para agregar vértices (mínimo 3).",
            ShapeKind::Circle => "Primer clic: centro. Siguiente clic: radio.",
        });
        ui.separator();

        egui::Grid::new("create_form").num_columns(2).show(ui, |ui| {
            ui.label("Id");
            ui.text_edit_singleline(&mut self.form.id);
            ui.end_row();
            match kind {
                DocumentKind::Sections => {
                    ui.label("Nombre");
                    ui.text_edit_singleline(&mut self.form.nombre);
                    ui.end_row();
                }
                DocumentKind::Lots => {
                    ui.label("Estatus");
                    egui::ComboBox::from_id_salt("lot_status")
                        .selected_text(self.form.estatus.clone())
                        .show_ui(ui, |ui| {
                            for status in LOT_STATUSES {
                                ui.selectable_value(&mut self.form.estatus, status.to_string(), status);
                            }
                        });
                    ui.end_row();
                    ui.label("Paquete");
                    ui.text_edit_singleline(&mut self.form.paquete);
                    ui.end_row();
                }
            }
        });

        let queue = self.queues.get(kind);
        let mut skip = false;
        if let Some(next) = queue.prefill() {
            ui.small(format!("Siguiente de la lista: {}", next.summary()));
            skip = ui.small_button("Saltar").clicked();
        }
        if skip {
            self.queues.get_mut(kind).skip();
            self.prefill_form(kind);
        }

        ui.horizontal(|ui| {
            if ui.button("Guardar nuevo").clicked() {
                self.commit_new(kind);
            }
            if ui.button("Limpiar puntos").clicked() {
                if let Err(err) = self.editor.clear_draft() {
                    self.report(err);
                }
            }
        });
    }

    fn bulk_ui(&mut self, ui: &mut egui::Ui, kind: DocumentKind) {
        ui.label(match kind {
            DocumentKind::Sections => "Pega filas: id, nombre",
            DocumentKind::Lots => "Pega filas: id, estatus, paquete",
        });
        ui.add(
            egui::TextEdit::multiline(&mut self.bulk_text)
                .desired_rows(8)
                .code_editor()
                .desired_width(f32::INFINITY),
        );
        ui.horizontal(|ui| {
            if ui.button("Cargar lista").clicked() {
                let records = bulk::parse(&self.bulk_text, kind);
                let count = records.len();
                self.queues.get_mut(kind).load(records);
                self.status = Some(format!("Lista cargada: {count} registros"));
            }
            if ui.button("Saltar siguiente").clicked() {
                self.queues.get_mut(kind).skip();
            }
            if ui.button("Limpiar lista").clicked() {
                self.queues.get_mut(kind).clear();
                self.bulk_text.clear();
            }
        });
        let queue = self.queues.get_mut(kind);
        let mut enabled = queue.is_enabled();
        if ui.checkbox(&mut enabled, "Usar al crear").changed() {
            queue.set_enabled(enabled);
        }
        ui.small(queue.status_line());
    }

    fn prefill_form(&mut self, kind: DocumentKind) {
        let mut form = CreateForm::blank(kind);
        if let Some(record) = self.queues.get(kind).prefill() {
            form.fill_from(record);
        }
        self.form = form;
    }

    fn commit_new(&mut self, kind: DocumentKind) {
        let Some(collection) = self.workspace.collection_mut(kind) else {
            self.status = Some("Selecciona primero una sección.".into());
            return;
        };
        let result = self
            .editor
            .commit_draft(collection, &self.form, Some(self.queues.get_mut(kind)));
        match result {
            Ok(_) => {
                self.status = Some(format!("Creado {}", self.form.id.trim()));
                self.refresh_display();
                self.editor.begin_draw(self.shape_kind);
                self.prefill_form(kind);
            }
            Err(err) => self.report(err),
        }
    }

    /// Drops any drawing or edit in progress without restoring anything.
    fn leave_editor(&mut self) {
        if self.editor.cancel_draw().is_err() {
            self.editor.stop_editing();
        }
        self.drag = None;
    }

    fn enter_panel(&mut self, panel: EditPanel, kind: DocumentKind) {
        self.leave_editor();
        if panel == EditPanel::Create {
            if kind == DocumentKind::Lots && self.workspace.lots().is_none() {
                self.status = Some("Selecciona primero una sección con archivo de lotes.".into());
                return;
            }
            self.editor.begin_draw(self.shape_kind);
            self.prefill_form(kind);
        }
        self.edit_panel = panel;
    }

    fn copy_geojson(&mut self, ctx: &egui::Context, kind: DocumentKind) {
        let Some(collection) = self.workspace.collection(kind) else {
            self.status = Some("No hay documento de lotes cargado.".into());
            return;
        };
        match export::export_to_clipboard(collection, &mut ContextClipboard(ctx)) {
            Ok(ExportOutcome::Copied { .. }) => {
                self.status = Some(format!("GeoJSON copiado ({} figuras)", collection.len()));
            }
            Ok(ExportOutcome::Manual(text)) => self.manual_copy = Some(text),
            Err(err) => {
                log::error!("{err}");
                self.status = Some(err.to_string());
            }
        }
    }

    pub(super) fn manual_copy_window(&mut self, ctx: &egui::Context) {
        let Some(text) = &mut self.manual_copy else {
            return;
        };
        let mut open = true;
        egui::Window::new("Copia manual")
            .open(&mut open)
            .default_size([520.0, 380.0])
            .show(ctx, |ui| {
                ui.label("No se pudo usar el portapapeles. Selecciona el texto y cópialo.");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(text)
                            .code_editor()
                            .desired_width(f32::INFINITY),
                    );
                });
            });
        if !open {
            self.manual_copy = None;
        }
    }
}

fn lot_panel_ui(ui: &mut egui::Ui, panel: &LotPanel) {
    let summary = match panel {
        LotPanel::Hint(text) => {
            ui.label(text.as_str());
            return;
        }
        LotPanel::Summary(summary) => summary,
    };
    ui.heading(format!("Lote {}", summary.id));
    ui.label(format!("Estatus: {}", summary.estatus));
    match &summary.package {
        None => {}
        Some(PackageLookup::Unassigned) => {
            ui.label("Paquete: sin asignar");
        }
        Some(PackageLookup::NotDefined(key)) => {
            ui.label(format!("Paquete {key}: no está definido"));
        }
        Some(PackageLookup::Found(package)) => {
            ui.label(format!("Paquete: {}", package.nombre));
            for item in &package.items {
                ui.label(format!("• {item}"));
            }
        }
    }
    if summary.status == LotStatus::Ocupado {
        ui.label("La consulta de saldo estará disponible próximamente.");
    }
}
