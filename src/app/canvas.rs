use std::time::Instant;

use eframe::egui;
use lotmap::catalog::{self, LotStatus};
use lotmap::editor::Mode;
use lotmap::geometry;
use lotmap::model::{DocumentKind, FeatureRef, Point};
use lotmap::scale::Scale;
use lotmap::settings::ViewMode;

use super::render::{self, Emphasis};
use super::{EditPanel, MapApp, View};

impl MapApp {
    pub(super) fn canvas(&mut self, ui: &mut egui::Ui, now: Instant) {
        let (rect, response) =
            ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.view = View::fit(rect, self.base.size);
        let painter = ui.painter_at(rect);
        render::draw_base(&painter, rect, &self.view, &self.base);
        match self.mode {
            ViewMode::Public => {
                self.public_input(&response, now);
                self.draw_public(&painter, now);
            }
            ViewMode::Edit(kind) => {
                self.edit_input(&response, kind);
                self.draw_edit(&painter, kind);
            }
        }
    }

    fn public_hit(&self, p: Point, tolerance: f64) -> Option<(DocumentKind, FeatureRef)> {
        if let Some(r) = self
            .display_lots
            .as_ref()
            .and_then(|lots| geometry::topmost_hit(lots, p, tolerance))
        {
            return Some((DocumentKind::Lots, r));
        }
        geometry::topmost_hit(&self.display_sections, p, tolerance)
            .map(|r| (DocumentKind::Sections, r))
    }

    fn public_input(&mut self, response: &egui::Response, now: Instant) {
        let tolerance = self.display_tolerance(self.settings.hit_tolerance);
        self.hovered = response
            .hover_pos()
            .map(|s| self.view.screen_to_display(s))
            .and_then(|p| self.public_hit(p, tolerance));
        if !response.clicked() {
            return;
        }
        let Some(p) = response
            .interact_pointer_pos()
            .map(|s| self.view.screen_to_display(s))
        else {
            return;
        };
        match self.public_hit(p, tolerance) {
            Some((DocumentKind::Lots, r)) => self.pin_lot(r, now),
            Some((DocumentKind::Sections, r)) => self.pin_section(r, now),
            None => {}
        }
    }

    fn edit_input(&mut self, response: &egui::Response, kind: DocumentKind) {
        let Some(screen) = response.interact_pointer_pos().or(response.hover_pos()) else {
            return;
        };
        let p = self.to_reference(screen);

        if response.drag_started() {
            let tolerance = self.reference_tolerance(self.settings.handle_pick_radius);
            self.drag = self.editor.handle_at(p, tolerance);
        }
        if let Some(handle) = self.drag {
            if response.dragged() {
                if let Err(err) = self.editor.drag(handle, p) {
                    self.drag = None;
                    self.report(err);
                }
            }
            if response.drag_stopped() {
                self.drag = None;
                let result = match self.workspace.collection_mut(kind) {
                    Some(collection) => self.editor.drag_end(collection, handle),
                    None => Ok(()),
                };
                if let Err(err) = result {
                    self.report(err);
                }
                self.refresh_display();
            }
            return;
        }

        if !response.clicked() {
            return;
        }
        match self.editor.mode() {
            Mode::Drawing(_) => match self.editor.point_input(p) {
                Ok(count) => self.status = Some(format!("Puntos: {count}")),
                Err(err) => self.report(err),
            },
            _ if self.edit_panel == EditPanel::Edit => {
                let tolerance = self.reference_tolerance(self.settings.hit_tolerance);
                let Some(collection) = self.workspace.collection(kind) else {
                    return;
                };
                let Some(target) = geometry::topmost_hit(collection, p, tolerance) else {
                    return;
                };
                let name = collection
                    .get(target)
                    .map(|f| f.display_name().to_string())
                    .unwrap_or_default();
                match self.editor.select(collection, target) {
                    Ok(()) => self.status = Some(format!("Editando {name}")),
                    Err(err) => self.report(err),
                }
            }
            _ => {}
        }
    }

    fn draw_public(&self, painter: &egui::Painter, now: Instant) {
        let hovered = |kind, r| self.hovered == Some((kind, r));
        for (r, feature) in self.display_sections.entries() {
            let pinned = self.pinned_section == Some(r);
            if !(pinned || hovered(DocumentKind::Sections, r)) {
                continue;
            }
            let emphasis = Emphasis {
                hovered: hovered(DocumentKind::Sections, r),
                pinned,
                pulsing: self.is_pulsing(DocumentKind::Sections, r, now),
            };
            render::draw_section(painter, &self.view, &feature.shape, emphasis);
        }
        let (Some(lots), Some(source)) = (&self.display_lots, self.workspace.lots()) else {
            return;
        };
        for (r, feature) in lots.entries() {
            let pinned = self.pinned_lot == Some(r);
            if !(self.show_all_lots || pinned || hovered(DocumentKind::Lots, r)) {
                continue;
            }
            let status = source
                .get(r)
                .map(|f| LotStatus::parse(catalog::resolve_estatus(f, &self.lot_catalog)))
                .unwrap_or_default();
            let emphasis = Emphasis {
                hovered: hovered(DocumentKind::Lots, r),
                pinned,
                pulsing: self.is_pulsing(DocumentKind::Lots, r, now),
            };
            render::draw_lot(painter, &self.view, &feature.shape, status, emphasis);
        }
    }

    fn draw_edit(&self, painter: &egui::Painter, kind: DocumentKind) {
        let selection = self.editor.selection();
        if kind == DocumentKind::Lots {
            for feature in self.display_sections.iter() {
                if self.workspace.current().is_some_and(|s| s.id == feature.id) {
                    render::draw_section(painter, &self.view, &feature.shape, Emphasis::default());
                }
            }
        }
        if let Some(collection) = self.display_collection(kind) {
            for (r, feature) in collection.entries() {
                if selection.is_some_and(|s| s.target() == r) {
                    continue;
                }
                match kind {
                    DocumentKind::Sections => render::draw_section(
                        painter,
                        &self.view,
                        &feature.shape,
                        Emphasis {
                            pinned: true,
                            ..Emphasis::default()
                        },
                    ),
                    DocumentKind::Lots => render::draw_lot(
                        painter,
                        &self.view,
                        &feature.shape,
                        LotStatus::parse(feature.attr_str("estatus").unwrap_or_default()),
                        Emphasis::default(),
                    ),
                }
            }
        }
        if let Some(selection) = selection {
            let live = selection.live_shape().scaled(self.factors);
            render::draw_selected(painter, &self.view, &live);
            let handles: Vec<_> = selection
                .handles()
                .positions()
                .into_iter()
                .map(|(h, p)| (h, p.scaled(self.factors)))
                .collect();
            render::draw_handles(painter, &self.view, &handles, selection.dragging());
        }
        if let Some(preview) = self.editor.preview() {
            render::draw_preview(painter, &self.view, &preview, self.factors);
        }
    }
}
