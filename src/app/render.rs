use eframe::egui;
use lotmap::catalog::LotStatus;
use lotmap::editor::{DraftPreview, Handle, Outline};
use lotmap::model::{Point, Shape};
use lotmap::scale::{Scale, ScaleFactors};

use super::{BaseImage, View};

const SECTION_STROKE: egui::Color32 = egui::Color32::from_rgb(40, 110, 200);
const SELECTED_STROKE: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);
const DRAFT_STROKE: egui::Color32 = egui::Color32::from_rgb(255, 140, 0);
const HANDLE_FILL: egui::Color32 = egui::Color32::WHITE;

#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Emphasis {
    pub hovered: bool,
    pub pinned: bool,
    pub pulsing: bool,
}

impl Emphasis {
    fn stroke_width(self) -> f32 {
        match (self.pulsing, self.hovered || self.pinned) {
            (true, _) => 5.0,
            (false, true) => 2.5,
            (false, false) => 1.5,
        }
    }
}

fn status_colors(status: LotStatus) -> (egui::Color32, egui::Color32) {
    match status {
        LotStatus::Disponible => (
            egui::Color32::from_rgb(46, 160, 67),
            egui::Color32::from_rgba_unmultiplied(46, 160, 67, 70),
        ),
        LotStatus::Ocupado => (
            egui::Color32::from_rgb(200, 50, 50),
            egui::Color32::from_rgba_unmultiplied(200, 50, 50, 70),
        ),
        LotStatus::PorConstruir => (
            egui::Color32::from_rgb(220, 160, 20),
            egui::Color32::from_rgba_unmultiplied(220, 160, 20, 50),
        ),
        LotStatus::Other => (
            egui::Color32::from_gray(140),
            egui::Color32::from_rgba_unmultiplied(140, 140, 140, 50),
        ),
    }
}

pub(super) fn draw_base(painter: &egui::Painter, rect: egui::Rect, view: &View, base: &BaseImage) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
    let image_rect = view.image_rect(base.size);
    match &base.texture {
        Some(texture) => {
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            painter.rect_stroke(
                image_rect,
                0.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(90)),
                egui::StrokeKind::Middle,
            );
        }
    }
}

fn ring_to_screen(view: &View, ring: &[Point]) -> Vec<egui::Pos2> {
    ring.iter().map(|p| view.display_to_screen(*p)).collect()
}

fn draw_shape(
    painter: &egui::Painter,
    view: &View,
    shape: &Shape,
    fill: egui::Color32,
    stroke: egui::Stroke,
    dashed: bool,
) {
    match shape {
        Shape::Polygon { ring } => {
            let points = ring_to_screen(view, ring);
            if points.len() < 3 {
                return;
            }
            if dashed {
                painter.add(egui::Shape::convex_polygon(
                    points.clone(),
                    fill,
                    egui::Stroke::NONE,
                ));
                for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
                    draw_dashed_line(painter, *a, *b, stroke, 8.0, 5.0);
                }
            } else {
                painter.add(egui::Shape::convex_polygon(points, fill, stroke));
            }
        }
        Shape::Circle { center, radius } => {
            let c = view.display_to_screen(*center);
            let r = *radius as f32 * view.zoom;
            painter.circle_filled(c, r, fill);
            if dashed {
                let steps = 48;
                let pts: Vec<_> = (0..steps)
                    .map(|i| {
                        let t = i as f32 / steps as f32 * std::f32::consts::TAU;
                        c + egui::vec2(t.cos(), t.sin()) * r
                    })
                    .collect();
                for (a, b) in pts.iter().zip(pts.iter().cycle().skip(1)) {
                    draw_dashed_line(painter, *a, *b, stroke, 8.0, 5.0);
                }
            } else {
                painter.circle_stroke(c, r, stroke);
            }
        }
    }
}

pub(super) fn draw_section(painter: &egui::Painter, view: &View, shape: &Shape, emphasis: Emphasis) {
    let fill = if emphasis.pinned || emphasis.hovered {
        egui::Color32::from_rgba_unmultiplied(40, 110, 200, 40)
    } else {
        egui::Color32::TRANSPARENT
    };
    let stroke = egui::Stroke::new(emphasis.stroke_width(), SECTION_STROKE);
    draw_shape(painter, view, shape, fill, stroke, false);
}

pub(super) fn draw_lot(
    painter: &egui::Painter,
    view: &View,
    shape: &Shape,
    status: LotStatus,
    emphasis: Emphasis,
) {
    let (line, fill) = status_colors(status);
    let stroke = egui::Stroke::new(emphasis.stroke_width(), line);
    draw_shape(painter, view, shape, fill, stroke, status.is_dashed());
}

pub(super) fn draw_selected(painter: &egui::Painter, view: &View, shape: &Shape) {
    let fill = egui::Color32::from_rgba_unmultiplied(90, 160, 255, 50);
    draw_shape(
        painter,
        view,
        shape,
        fill,
        egui::Stroke::new(2.0, SELECTED_STROKE),
        false,
    );
}

pub(super) fn draw_handles(
    painter: &egui::Painter,
    view: &View,
    handles: &[(Handle, Point)],
    active: Option<Handle>,
) {
    for (handle, p) in handles {
        let c = view.display_to_screen(*p);
        let radius = if active == Some(*handle) { 6.0 } else { 4.5 };
        let outline = match handle {
            Handle::Radius => DRAFT_STROKE,
            Handle::Vertex(_) | Handle::Center => SELECTED_STROKE,
        };
        painter.circle(c, radius, HANDLE_FILL, egui::Stroke::new(1.5, outline));
    }
}

/// `preview` is in reference space and is mapped through `factors` first.
pub(super) fn draw_preview(
    painter: &egui::Painter,
    view: &View,
    preview: &DraftPreview,
    factors: ScaleFactors,
) {
    let stroke = egui::Stroke::new(2.0, DRAFT_STROKE);
    let to_screen = |p: &Point| view.display_to_screen(p.scaled(factors));
    match &preview.outline {
        Some(Outline::Polyline(points)) => {
            painter.add(egui::Shape::line(points.iter().map(to_screen).collect(), stroke));
        }
        Some(Outline::Polygon(points)) => {
            painter.add(egui::Shape::closed_line(
                points.iter().map(to_screen).collect(),
                stroke,
            ));
        }
        Some(Outline::Circle { center, radius }) => {
            let r = (*radius * factors.radius_factor()) as f32 * view.zoom;
            painter.circle_stroke(to_screen(center), r, stroke);
        }
        None => {}
    }
    for p in &preview.markers {
        painter.circle_filled(to_screen(p), 3.5, DRAFT_STROKE);
    }
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let next = (pos + if drawing { dash_len } else { gap_len }).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next], stroke);
        }
        pos = next;
        drawing = !drawing;
    }
}
