use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form feature properties as they appear in the GeoJSON document.
pub type Attributes = Map<String, Value>;

/// Distance under which the last ring point counts as a repeat of the first.
pub const RING_TOLERANCE: f64 = 1e-9;

pub const MIN_POLYGON_VERTICES: usize = 3;

pub const ID_KEY: &str = "id";
const SHAPE_KEY: &str = "shape";
const CIRCLE_TAG: &str = "circle";
const RADIUS_KEY: &str = "radius";

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn approx_eq(self, other: Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    fn to_pair(self) -> [f64; 2] {
        [self.x, self.y]
    }

    fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Self::new(*x, *y)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    #[default]
    Polygon,
    Circle,
}

impl ShapeKind {
    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Polygon => "Polígono",
            ShapeKind::Circle => "Círculo",
        }
    }
}

/// Geometry of one feature. Polygon rings are kept open in memory: the first
/// point is never repeated at the end.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Polygon { ring: Vec<Point> },
    Circle { center: Point, radius: f64 },
}

impl Shape {
    pub fn polygon(ring: Vec<Point>) -> Self {
        Shape::Polygon {
            ring: open_ring(&ring),
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Circle { .. } => ShapeKind::Circle,
        }
    }

    fn normalized(self) -> Self {
        match self {
            Shape::Polygon { ring } => Shape::polygon(ring),
            circle => circle,
        }
    }
}

/// Appends a copy of the first point, as the serialized form requires.
pub fn close_ring(ring: &[Point]) -> Vec<Point> {
    let mut closed = ring.to_vec();
    if let Some(first) = ring.first() {
        closed.push(*first);
    }
    closed
}

/// Drops a trailing repeat of the first point, if there is one.
pub fn open_ring(ring: &[Point]) -> Vec<Point> {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last))
            if ring.len() >= 2 && first.approx_eq(*last, RING_TOLERANCE) =>
        {
            ring[..ring.len() - 1].to_vec()
        }
        _ => ring.to_vec(),
    }
}

/// Which document a collection belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[default]
    Sections,
    Lots,
}

impl DocumentKind {
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Sections => "Sección",
            DocumentKind::Lots => "Lote",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: String,
    pub shape: Shape,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: impl Into<String>, shape: Shape, mut attributes: Attributes) -> Self {
        let id = id.into();
        attributes.insert(ID_KEY.to_string(), Value::String(id.clone()));
        if matches!(shape, Shape::Circle { .. }) {
            attributes.remove(SHAPE_KEY);
            attributes.remove(RADIUS_KEY);
        }
        Self {
            id,
            shape: shape.normalized(),
            attributes,
        }
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// `nombre` when present, otherwise the id.
    pub fn display_name(&self) -> &str {
        self.attr_str("nombre")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// Position of a feature inside its collection. Collections are append-only,
/// so a reference stays valid for the lifetime of the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureRef(usize);

impl FeatureRef {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, target: FeatureRef) -> bool {
        target.0 < self.features.len()
    }

    pub fn get(&self, target: FeatureRef) -> Option<&Feature> {
        self.features.get(target.0)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = (FeatureRef, &Feature)> {
        self.features
            .iter()
            .enumerate()
            .map(|(i, f)| (FeatureRef(i), f))
    }

    pub fn append(&mut self, feature: Feature) -> FeatureRef {
        self.features.push(feature);
        FeatureRef(self.features.len() - 1)
    }

    /// Swaps in new geometry and hands back the old one. The ring is stored
    /// as given, so coincident vertices stay distinct.
    pub fn replace_shape(&mut self, target: FeatureRef, shape: Shape) -> Option<Shape> {
        let feature = self.features.get_mut(target.0)?;
        Some(std::mem::replace(&mut feature.shape, shape))
    }

    pub fn find_by_id(&self, id: &str) -> Option<FeatureRef> {
        self.features
            .iter()
            .position(|f| f.id == id)
            .map(FeatureRef)
    }

    pub(crate) fn map_features(&self, f: impl Fn(&Feature) -> Feature) -> Self {
        Self {
            features: self.features.iter().map(f).collect(),
        }
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

// GeoJSON wire form.

#[derive(Serialize)]
struct OutCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<OutFeature>,
}

#[derive(Serialize)]
struct OutFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: OutGeometry,
    properties: Attributes,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum OutGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    Point { coordinates: [f64; 2] },
}

#[derive(Deserialize)]
struct InCollection {
    #[serde(default)]
    features: Vec<InFeature>,
}

#[derive(Deserialize)]
struct InFeature {
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Attributes>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum InGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    Point { coordinates: Vec<f64> },
}

impl From<&Feature> for OutFeature {
    fn from(feature: &Feature) -> Self {
        let mut properties = feature.attributes.clone();
        if !properties.contains_key(ID_KEY) && !feature.id.is_empty() {
            properties.insert(ID_KEY.to_string(), Value::String(feature.id.clone()));
        }
        let geometry = match &feature.shape {
            Shape::Polygon { ring } => OutGeometry::Polygon {
                coordinates: vec![close_ring(ring).into_iter().map(Point::to_pair).collect()],
            },
            Shape::Circle { center, radius } => {
                properties.insert(SHAPE_KEY.to_string(), Value::from(CIRCLE_TAG));
                properties.insert(RADIUS_KEY.to_string(), Value::from(*radius));
                OutGeometry::Point {
                    coordinates: center.to_pair(),
                }
            }
        };
        Self {
            kind: "Feature",
            geometry,
            properties,
        }
    }
}

fn id_from_properties(properties: &Attributes) -> String {
    match properties.get(ID_KEY) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn feature_from_wire(raw: InFeature) -> Result<Feature, String> {
    let properties = raw.properties.unwrap_or_default();
    let geometry = raw.geometry.ok_or("missing geometry")?;
    let geometry: InGeometry =
        serde_json::from_value(geometry).map_err(|e| format!("unsupported geometry: {e}"))?;
    let shape = match geometry {
        InGeometry::Polygon { coordinates } => {
            let outer = coordinates.first().ok_or("polygon without rings")?;
            let ring = outer
                .iter()
                .map(|p| Point::from_position(p))
                .collect::<Option<Vec<_>>>()
                .ok_or("invalid polygon position")?;
            Shape::polygon(ring)
        }
        InGeometry::Point { coordinates } => {
            if properties.get(SHAPE_KEY).and_then(Value::as_str) != Some(CIRCLE_TAG) {
                return Err("point geometry without circle marker".to_string());
            }
            let center = Point::from_position(&coordinates).ok_or("invalid circle center")?;
            let radius = properties
                .get(RADIUS_KEY)
                .and_then(Value::as_f64)
                .filter(|r| r.is_finite() && *r >= 0.0)
                .ok_or("circle without a valid radius")?;
            Shape::circle(center, radius)
        }
    };
    let id = id_from_properties(&properties);
    let written_id = properties.get(ID_KEY).cloned();
    let mut feature = Feature::new(id, shape, properties);
    // Keep non-string ids exactly as they were written.
    if let Some(original) = written_id {
        feature.attributes.insert(ID_KEY.to_string(), original);
    }
    Ok(feature)
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        OutCollection {
            kind: "FeatureCollection",
            features: self.features.iter().map(OutFeature::from).collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = InCollection::deserialize(deserializer)?;
        let mut features = Vec::with_capacity(raw.features.len());
        for (index, feature) in raw.features.into_iter().enumerate() {
            match feature_from_wire(feature) {
                Ok(feature) => features.push(feature),
                Err(reason) => log::warn!("skipping feature #{index}: {reason}"),
            }
        }
        Ok(Self { features })
    }
}
