use std::path::Path;
use std::time::Instant;

use eframe::egui;
use lotmap::bulk::BulkQueue;
use lotmap::catalog::{self, LotCatalog, LotSummary, PackageCatalog};
use lotmap::editor::{Editor, EditorError, Handle};
use lotmap::form::CreateForm;
use lotmap::highlight::{PulseScheduler, PulseTarget};
use lotmap::loader::{self, FsSource};
use lotmap::model::{DocumentKind, FeatureCollection, FeatureRef, Point, ShapeKind};
use lotmap::scale::{ImageSize, Scale, ScaleFactors};
use lotmap::settings::{AppSettings, ViewMode};
use lotmap::workspace::{SectionLoad, Workspace};

mod canvas;
mod panels;
mod render;
mod update;

/// Places the base image inside the canvas. Maps display-image pixels to
/// screen points; there is no user pan or zoom.
#[derive(Clone, Copy, Debug)]
struct View {
    origin: egui::Pos2,
    zoom: f32,
}

impl Default for View {
    fn default() -> Self {
        Self {
            origin: egui::Pos2::ZERO,
            zoom: 1.0,
        }
    }
}

impl View {
    fn fit(rect: egui::Rect, display: ImageSize) -> Self {
        let size = egui::vec2(display.width.max(1) as f32, display.height.max(1) as f32);
        let zoom = (rect.width() / size.x).min(rect.height() / size.y).max(f32::EPSILON);
        Self {
            origin: rect.center() - size * zoom * 0.5,
            zoom,
        }
    }

    fn display_to_screen(&self, p: Point) -> egui::Pos2 {
        self.origin + egui::vec2(p.x as f32, p.y as f32) * self.zoom
    }

    fn screen_to_display(&self, screen: egui::Pos2) -> Point {
        let v = (screen - self.origin) / self.zoom;
        Point::new(f64::from(v.x), f64::from(v.y))
    }

    fn image_rect(&self, display: ImageSize) -> egui::Rect {
        egui::Rect::from_min_size(
            self.origin,
            egui::vec2(display.width as f32, display.height as f32) * self.zoom,
        )
    }
}

struct BaseImage {
    texture: Option<egui::TextureHandle>,
    /// Full pixel size of the image file, even when the texture was shrunk.
    size: ImageSize,
}

impl BaseImage {
    fn load(ctx: &egui::Context, path: &Path, fallback: ImageSize) -> Self {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(err) => {
                log::warn!("could not open base image {}: {err}", path.display());
                return Self {
                    texture: None,
                    size: fallback,
                };
            }
        };
        let size = ImageSize::new(img.width(), img.height());
        let max_side = u32::try_from(ctx.input(|i| i.max_texture_side)).unwrap_or(u32::MAX);
        let img = if img.width() > max_side || img.height() > max_side {
            img.thumbnail(max_side, max_side)
        } else {
            img
        };
        let rgba = img.to_rgba8();
        let pixels = egui::ColorImage::from_rgba_unmultiplied(
            [rgba.width() as usize, rgba.height() as usize],
            rgba.as_raw(),
        );
        log::info!(
            "base image {} is {}x{}",
            path.display(),
            size.width,
            size.height
        );
        Self {
            texture: Some(ctx.load_texture("base-image", pixels, egui::TextureOptions::LINEAR)),
            size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditPanel {
    Menu,
    Edit,
    Create,
    Bulk,
}

enum LotPanel {
    Hint(String),
    Summary(LotSummary),
}

#[derive(Default)]
struct BulkQueues {
    sections: BulkQueue,
    lots: BulkQueue,
}

impl BulkQueues {
    fn get(&self, kind: DocumentKind) -> &BulkQueue {
        match kind {
            DocumentKind::Sections => &self.sections,
            DocumentKind::Lots => &self.lots,
        }
    }

    fn get_mut(&mut self, kind: DocumentKind) -> &mut BulkQueue {
        match kind {
            DocumentKind::Sections => &mut self.sections,
            DocumentKind::Lots => &mut self.lots,
        }
    }
}

const SECTIONS_HINT: &str = "Selecciona una sección en el mapa.";

pub struct MapApp {
    settings: AppSettings,
    mode: ViewMode,
    source: FsSource,
    workspace: Workspace,
    lot_catalog: LotCatalog,
    packages: PackageCatalog,
    base: BaseImage,
    /// Reference space to display-image pixels.
    factors: ScaleFactors,
    view: View,
    display_sections: FeatureCollection,
    display_lots: Option<FeatureCollection>,
    editor: Editor,
    edit_panel: EditPanel,
    shape_kind: ShapeKind,
    form: CreateForm,
    queues: BulkQueues,
    bulk_text: String,
    drag: Option<Handle>,
    pulses: PulseScheduler,
    hovered: Option<(DocumentKind, FeatureRef)>,
    pinned_section: Option<FeatureRef>,
    pinned_lot: Option<FeatureRef>,
    show_all_lots: bool,
    search_query: String,
    lot_panel: LotPanel,
    manual_copy: Option<String>,
    status: Option<String>,
}

impl MapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings, mode: ViewMode) -> Self {
        let source = FsSource::new(settings.data_root.clone());
        let base = BaseImage::load(
            &cc.egui_ctx,
            &source.resolve(settings.base_image(mode)),
            settings.reference_size,
        );
        let factors = ScaleFactors::between(settings.reference_size, base.size).unwrap_or_else(|err| {
            log::warn!("{err}; drawing at reference scale");
            ScaleFactors::IDENTITY
        });
        let kind = mode.edit_kind().unwrap_or_default();
        let mut app = Self {
            pulses: PulseScheduler::new(settings.pulse()),
            workspace: Workspace::default(),
            lot_catalog: LotCatalog::default(),
            packages: PackageCatalog::default(),
            settings,
            mode,
            source,
            base,
            factors,
            view: View::default(),
            display_sections: FeatureCollection::new(),
            display_lots: None,
            editor: Editor::new(),
            edit_panel: EditPanel::Menu,
            shape_kind: ShapeKind::Polygon,
            form: CreateForm::blank(kind),
            queues: BulkQueues::default(),
            bulk_text: String::new(),
            drag: None,
            hovered: None,
            pinned_section: None,
            pinned_lot: None,
            show_all_lots: false,
            search_query: String::new(),
            lot_panel: LotPanel::Hint(SECTIONS_HINT.to_string()),
            manual_copy: None,
            status: None,
        };
        app.reload_data();
        app
    }

    /// Reads every document again from the data root and drops session state.
    fn reload_data(&mut self) {
        self.workspace = Workspace::load(&self.source, &self.settings.sections_file);
        if self.mode == ViewMode::Public {
            self.lot_catalog = loader::load_or_default(&self.source, &self.settings.lot_catalog);
            self.packages = loader::load_or_default(&self.source, &self.settings.package_catalog);
        }
        self.editor = Editor::new();
        self.drag = None;
        self.edit_panel = EditPanel::Menu;
        self.reset_public_state();
        self.refresh_display();
        self.status = Some(format!(
            "{} secciones cargadas de {}",
            self.workspace.sections().len(),
            self.source.root().display()
        ));
    }

    fn reset_public_state(&mut self) {
        self.hovered = None;
        self.pinned_section = None;
        self.pinned_lot = None;
        self.search_query.clear();
        self.lot_panel = LotPanel::Hint(SECTIONS_HINT.to_string());
        self.pulses.cancel_all();
    }

    /// Re-derives the display copies from the authoritative documents.
    fn refresh_display(&mut self) {
        self.display_sections = self.workspace.sections().scaled(self.factors);
        self.display_lots = self.workspace.lots().map(|lots| lots.scaled(self.factors));
    }

    fn display_collection(&self, kind: DocumentKind) -> Option<&FeatureCollection> {
        match kind {
            DocumentKind::Sections => Some(&self.display_sections),
            DocumentKind::Lots => self.display_lots.as_ref(),
        }
    }

    fn to_reference(&self, screen: egui::Pos2) -> Point {
        self.view
            .screen_to_display(screen)
            .scaled(self.factors.inverse())
    }

    /// A distance in screen points expressed in reference units.
    fn reference_tolerance(&self, screen: f32) -> f64 {
        f64::from(screen / self.view.zoom) / self.factors.radius_factor()
    }

    fn display_tolerance(&self, screen: f32) -> f64 {
        f64::from(screen / self.view.zoom)
    }

    fn report(&mut self, err: EditorError) {
        log::warn!("{err}");
        self.status = Some(err.to_string());
    }

    fn pulse(&mut self, kind: DocumentKind, feature: FeatureRef, now: Instant) {
        self.pulses.schedule(
            PulseTarget {
                kind,
                generation: self.workspace.generation(),
                feature,
            },
            now,
        );
    }

    fn is_pulsing(&self, kind: DocumentKind, feature: FeatureRef, now: Instant) -> bool {
        self.pulses.is_pulsing(
            &PulseTarget {
                kind,
                generation: self.workspace.generation(),
                feature,
            },
            now,
        )
    }

    fn expire_pulses(&mut self, now: Instant) {
        let generation = self.workspace.generation();
        let sections = &self.display_sections;
        let lots = self.display_lots.as_ref();
        self.pulses.fire_due(now, |t| {
            t.generation == generation
                && match t.kind {
                    DocumentKind::Sections => sections.contains(t.feature),
                    DocumentKind::Lots => lots.is_some_and(|l| l.contains(t.feature)),
                }
        });
    }

    /// Loads the lots of `section_id` and makes it the current section.
    fn open_section(&mut self, section_id: &str) -> bool {
        let outcome = self.workspace.select_section(&self.source, section_id);
        self.pinned_lot = None;
        self.refresh_display();
        match outcome {
            Ok(SectionLoad::Loaded { lots }) => {
                self.status = Some(format!("Sección {section_id}: {lots} lotes"));
                self.lot_panel = LotPanel::Hint("Haz clic en un lote o búscalo por id.".into());
                true
            }
            Ok(SectionLoad::NoLotsFile) => {
                self.lot_panel = LotPanel::Hint(format!(
                    "Sección sin archivo de lotes configurado ({section_id})."
                ));
                true
            }
            Err(err) => {
                log::warn!("{err}");
                self.status = Some(err.to_string());
                false
            }
        }
    }

    fn pin_section(&mut self, target: FeatureRef, now: Instant) {
        let Some(id) = self.display_sections.get(target).map(|f| f.id.clone()) else {
            return;
        };
        if self.open_section(&id) {
            self.pinned_section = Some(target);
            self.search_query.clear();
            self.pulse(DocumentKind::Sections, target, now);
        }
    }

    fn pin_lot(&mut self, target: FeatureRef, now: Instant) {
        let Some(feature) = self.workspace.lots().and_then(|lots| lots.get(target)) else {
            return;
        };
        let summary = catalog::summarize_lot(feature, &self.lot_catalog, &self.packages);
        self.lot_panel = LotPanel::Summary(summary);
        self.pinned_lot = Some(target);
        self.pulse(DocumentKind::Lots, target, now);
    }

    fn back_to_sections(&mut self) {
        self.workspace.clear_section();
        self.reset_public_state();
        self.refresh_display();
    }

    fn pick_data_root(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(self.source.root())
            .pick_folder()
        {
            log::info!("data root is now {}", dir.display());
            self.settings.data_root = dir.clone();
            self.source = FsSource::new(dir);
            self.reload_data();
        }
    }
}
