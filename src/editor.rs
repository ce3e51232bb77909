//! Interactive creation and editing of polygon and circle features.
//!
//! The editor owns only transient state: the shape being drawn, or the
//! selected feature with its backup and drag handles. The collection being
//! edited is passed into every operation that reads or writes it, and the
//! selection refers to its feature by `FeatureRef` rather than by borrowing.
//!
//! ```text
//! Idle ──begin_draw──▶ Drawing ──commit_draft──▶ Idle
//!   │                     └──cancel_draw───────▶ Idle
//!   └──select──▶ Editing ──save_edit / cancel_edit / stop_editing──▶ Idle
//!                  └──select(other)──▶ Editing(other)
//! ```

use thiserror::Error;

use crate::bulk::BulkQueue;
use crate::form::CreateForm;
use crate::geometry;
use crate::model::{
    Feature, FeatureCollection, FeatureRef, MIN_POLYGON_VERTICES, Point, Shape, ShapeKind,
    open_ring,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditorError {
    #[error("a polygon needs at least 3 points, it has {0}")]
    TooFewVertices(usize),
    #[error("the circle has no center yet")]
    MissingCenter,
    #[error("the circle has no radius yet")]
    MissingRadius,
    #[error("radius must be finite and non-negative, got {0}")]
    InvalidRadius(f64),
    #[error("the identifier is missing")]
    MissingId,
    #[error("no shape is being drawn")]
    NotDrawing,
    #[error("no feature is being edited")]
    NotEditing,
    #[error("finish or clear the current drawing before selecting a feature")]
    Busy,
    #[error("feature #{} does not exist", .0.index())]
    UnknownFeature(FeatureRef),
    #[error("handle {0:?} does not belong to the selected shape")]
    UnknownHandle(Handle),
}

/// A shape under construction, in the coordinate space of the points fed in.
#[derive(Clone, Debug, PartialEq)]
pub enum Draft {
    Polygon {
        ring: Vec<Point>,
    },
    Circle {
        center: Option<Point>,
        radius: Option<f64>,
    },
}

impl Draft {
    pub fn new(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Polygon => Draft::Polygon { ring: Vec::new() },
            ShapeKind::Circle => Draft::Circle {
                center: None,
                radius: None,
            },
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Draft::Polygon { .. } => ShapeKind::Polygon,
            Draft::Circle { .. } => ShapeKind::Circle,
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            Draft::Polygon { ring } => ring.len(),
            Draft::Circle { center, radius } => {
                usize::from(center.is_some()) + usize::from(radius.is_some())
            }
        }
    }

    fn push(&mut self, p: Point) {
        match self {
            Draft::Polygon { ring } => ring.push(p),
            Draft::Circle { center, radius } => match *center {
                None => *center = Some(p),
                // Later points only resize; the center stays where it was put.
                Some(c) => *radius = Some(c.distance_to(p)),
            },
        }
    }

    fn to_shape(&self) -> Result<Shape, EditorError> {
        match self {
            Draft::Polygon { ring } => {
                // A last click back on the first point does not count as a vertex.
                let ring = open_ring(ring);
                if ring.len() < MIN_POLYGON_VERTICES {
                    Err(EditorError::TooFewVertices(ring.len()))
                } else {
                    Ok(Shape::Polygon { ring })
                }
            }
            Draft::Circle { center: None, .. } => Err(EditorError::MissingCenter),
            Draft::Circle { radius: None, .. } => Err(EditorError::MissingRadius),
            Draft::Circle {
                center: Some(center),
                radius: Some(radius),
            } => {
                if radius.is_finite() && *radius >= 0.0 {
                    Ok(Shape::circle(*center, *radius))
                } else {
                    Err(EditorError::InvalidRadius(*radius))
                }
            }
        }
    }

    fn preview(&self) -> DraftPreview {
        match self {
            Draft::Polygon { ring } => DraftPreview {
                markers: ring.clone(),
                outline: match ring.len() {
                    0 | 1 => None,
                    2 => Some(Outline::Polyline(ring.clone())),
                    _ => Some(Outline::Polygon(ring.clone())),
                },
            },
            Draft::Circle { center, radius } => DraftPreview {
                markers: center.iter().copied().collect(),
                outline: center
                    .zip(*radius)
                    .map(|(center, radius)| Outline::Circle { center, radius }),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outline {
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Circle { center: Point, radius: f64 },
}

/// What to show while drawing: one marker per placed point and, once there
/// are enough points, an outline.
#[derive(Clone, Debug, PartialEq)]
pub struct DraftPreview {
    pub markers: Vec<Point>,
    pub outline: Option<Outline>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Vertex(usize),
    Center,
    Radius,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Handles {
    Vertices(Vec<Point>),
    /// The radius handle sits at `center + (radius, 0)` when editing starts.
    Circle { center: Point, radius: Point },
}

impl Handles {
    fn for_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Polygon { ring } => Handles::Vertices(ring.clone()),
            Shape::Circle { center, radius } => Handles::Circle {
                center: *center,
                radius: center.offset(*radius, 0.0),
            },
        }
    }

    pub fn positions(&self) -> Vec<(Handle, Point)> {
        match self {
            Handles::Vertices(points) => points
                .iter()
                .enumerate()
                .map(|(i, p)| (Handle::Vertex(i), *p))
                .collect(),
            Handles::Circle { center, radius } => {
                vec![(Handle::Center, *center), (Handle::Radius, *radius)]
            }
        }
    }

    fn shape(&self) -> Shape {
        match self {
            Handles::Vertices(points) => Shape::Polygon {
                ring: points.clone(),
            },
            Handles::Circle { center, radius } => {
                Shape::circle(*center, center.distance_to(*radius))
            }
        }
    }

    fn move_handle(&mut self, handle: Handle, to: Point) -> Result<(), EditorError> {
        match (self, handle) {
            (Handles::Vertices(points), Handle::Vertex(i)) => {
                let p = points.get_mut(i).ok_or(EditorError::UnknownHandle(handle))?;
                *p = to;
            }
            (Handles::Circle { center, radius }, Handle::Center) => {
                *radius = radius.offset(to.x - center.x, to.y - center.y);
                *center = to;
            }
            (Handles::Circle { radius, .. }, Handle::Radius) => *radius = to,
            _ => return Err(EditorError::UnknownHandle(handle)),
        }
        Ok(())
    }

    fn owns(&self, handle: Handle) -> bool {
        match (self, handle) {
            (Handles::Vertices(points), Handle::Vertex(i)) => i < points.len(),
            (Handles::Circle { .. }, Handle::Center | Handle::Radius) => true,
            _ => false,
        }
    }
}

/// The feature being edited. `backup` is an owned copy taken when editing
/// started and is the only thing cancel restores from.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    target: FeatureRef,
    backup: Shape,
    handles: Handles,
    dragging: Option<Handle>,
}

impl Selection {
    pub fn target(&self) -> FeatureRef {
        self.target
    }

    pub fn backup(&self) -> &Shape {
        &self.backup
    }

    pub fn handles(&self) -> &Handles {
        &self.handles
    }

    pub fn dragging(&self) -> Option<Handle> {
        self.dragging
    }

    pub fn live_shape(&self) -> Shape {
        self.handles.shape()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditorState {
    #[default]
    Idle,
    Drawing(Draft),
    Editing(Selection),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Drawing(ShapeKind),
    Editing,
}

#[derive(Clone, Debug, Default)]
pub struct Editor {
    state: EditorState,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        match &self.state {
            EditorState::Idle => Mode::Idle,
            EditorState::Drawing(draft) => Mode::Drawing(draft.kind()),
            EditorState::Editing(_) => Mode::Editing,
        }
    }

    pub fn draft(&self) -> Option<&Draft> {
        match &self.state {
            EditorState::Drawing(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match &self.state {
            EditorState::Editing(selection) => Some(selection),
            _ => None,
        }
    }

    /// Starts a fresh draft. Any edit in progress is left as it stands.
    pub fn begin_draw(&mut self, kind: ShapeKind) {
        if let Some(target) = self.stop_editing() {
            log::debug!("left edit of #{} to start drawing", target.index());
        }
        self.state = EditorState::Drawing(Draft::new(kind));
    }

    pub fn point_input(&mut self, p: Point) -> Result<usize, EditorError> {
        let EditorState::Drawing(draft) = &mut self.state else {
            return Err(EditorError::NotDrawing);
        };
        draft.push(p);
        Ok(draft.point_count())
    }

    /// Throws away the placed points but keeps drawing the same kind.
    pub fn clear_draft(&mut self) -> Result<(), EditorError> {
        let EditorState::Drawing(draft) = &mut self.state else {
            return Err(EditorError::NotDrawing);
        };
        *draft = Draft::new(draft.kind());
        Ok(())
    }

    pub fn cancel_draw(&mut self) -> Result<(), EditorError> {
        match self.state {
            EditorState::Drawing(_) => {
                self.state = EditorState::Idle;
                Ok(())
            }
            _ => Err(EditorError::NotDrawing),
        }
    }

    pub fn preview(&self) -> Option<DraftPreview> {
        self.draft().map(Draft::preview)
    }

    /// Validates the draft and the form, then appends the new feature. On
    /// any rejection nothing changes and the operator can keep going.
    pub fn commit_draft(
        &mut self,
        collection: &mut FeatureCollection,
        form: &CreateForm,
        queue: Option<&mut BulkQueue>,
    ) -> Result<FeatureRef, EditorError> {
        let EditorState::Drawing(draft) = &self.state else {
            return Err(EditorError::NotDrawing);
        };
        let shape = draft.to_shape()?;
        let id = form.trimmed_id().ok_or(EditorError::MissingId)?;
        let kind = shape.kind();
        let target = collection.append(Feature::new(id, shape, form.attributes()));
        self.state = EditorState::Idle;
        if let Some(queue) = queue {
            queue.consume();
        }
        log::info!("created {:?} {} as #{}", kind, id, target.index());
        Ok(target)
    }

    /// Enters editing for `target`. Switching from another feature first
    /// stops that edit, keeping whatever its drags already applied.
    pub fn select(
        &mut self,
        collection: &FeatureCollection,
        target: FeatureRef,
    ) -> Result<(), EditorError> {
        if matches!(self.state, EditorState::Drawing(_)) {
            return Err(EditorError::Busy);
        }
        let feature = collection
            .get(target)
            .ok_or(EditorError::UnknownFeature(target))?;
        if let Some(previous) = self.stop_editing() {
            log::debug!("switching edit from #{} to #{}", previous.index(), target.index());
        }
        self.state = EditorState::Editing(Selection {
            target,
            backup: feature.shape.clone(),
            handles: Handles::for_shape(&feature.shape),
            dragging: None,
        });
        log::debug!("editing {} (#{})", feature.id, target.index());
        Ok(())
    }

    /// Leaves editing without saving or restoring; the backup is dropped.
    pub fn stop_editing(&mut self) -> Option<FeatureRef> {
        self.take_selection().ok().map(|s| s.target)
    }

    pub fn handle_at(&self, p: Point, tolerance: f64) -> Option<Handle> {
        let positions = self.selection()?.handles.positions();
        let i = geometry::nearest_within(positions.iter().map(|(_, q)| *q), p, tolerance)?;
        Some(positions[i].0)
    }

    /// Moves a handle for live feedback. The stored feature is not touched
    /// until the drag ends.
    pub fn drag(&mut self, handle: Handle, to: Point) -> Result<(), EditorError> {
        let EditorState::Editing(selection) = &mut self.state else {
            return Err(EditorError::NotEditing);
        };
        selection.handles.move_handle(handle, to)?;
        selection.dragging = Some(handle);
        Ok(())
    }

    /// Recomputes the stored geometry from the current handle positions.
    pub fn drag_end(
        &mut self,
        collection: &mut FeatureCollection,
        handle: Handle,
    ) -> Result<(), EditorError> {
        let EditorState::Editing(selection) = &mut self.state else {
            return Err(EditorError::NotEditing);
        };
        if !selection.handles.owns(handle) {
            return Err(EditorError::UnknownHandle(handle));
        }
        selection.dragging = None;
        let shape = selection.live_shape();
        collection
            .replace_shape(selection.target, shape)
            .ok_or(EditorError::UnknownFeature(selection.target))?;
        log::debug!("applied {:?} drag to #{}", handle, selection.target.index());
        Ok(())
    }

    pub fn save_edit(
        &mut self,
        collection: &mut FeatureCollection,
    ) -> Result<FeatureRef, EditorError> {
        let selection = self.take_selection()?;
        collection
            .replace_shape(selection.target, selection.live_shape())
            .ok_or(EditorError::UnknownFeature(selection.target))?;
        log::info!("saved edit of #{}", selection.target.index());
        Ok(selection.target)
    }

    /// Puts the backup back, however many drags were applied since `select`.
    pub fn cancel_edit(
        &mut self,
        collection: &mut FeatureCollection,
    ) -> Result<FeatureRef, EditorError> {
        let selection = self.take_selection()?;
        collection
            .replace_shape(selection.target, selection.backup)
            .ok_or(EditorError::UnknownFeature(selection.target))?;
        log::info!("cancelled edit of #{}", selection.target.index());
        Ok(selection.target)
    }

    fn take_selection(&mut self) -> Result<Selection, EditorError> {
        match std::mem::take(&mut self.state) {
            EditorState::Editing(selection) => Ok(selection),
            other => {
                self.state = other;
                Err(EditorError::NotEditing)
            }
        }
    }
}
