//! Mapping geometry between the reference space and display spaces.
//!
//! Documents are authored against one fixed, very large raster (the reference
//! space). Any other image of the same map gets its own per-axis factors, and
//! a scaled copy of the document is derived for it; the source document is
//! never touched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Feature, FeatureCollection, Point, Shape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScaleError {
    #[error("scale factors must be finite and positive, got ({sx}, {sy})")]
    InvalidFactors { sx: f64, sy: f64 },
    #[error("image size {width}x{height} has a zero dimension")]
    EmptyImage { width: u32, height: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    sx: f64,
    sy: f64,
}

impl ScaleFactors {
    pub const IDENTITY: ScaleFactors = ScaleFactors { sx: 1.0, sy: 1.0 };

    pub fn new(sx: f64, sy: f64) -> Result<Self, ScaleError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(sx) && valid(sy) {
            Ok(Self { sx, sy })
        } else {
            Err(ScaleError::InvalidFactors { sx, sy })
        }
    }

    /// Factors taking coordinates in `reference` pixels to `display` pixels.
    pub fn between(reference: ImageSize, display: ImageSize) -> Result<Self, ScaleError> {
        for size in [reference, display] {
            if size.width == 0 || size.height == 0 {
                return Err(ScaleError::EmptyImage {
                    width: size.width,
                    height: size.height,
                });
            }
        }
        Self::new(
            f64::from(display.width) / f64::from(reference.width),
            f64::from(display.height) / f64::from(reference.height),
        )
    }

    pub fn sx(self) -> f64 {
        self.sx
    }

    pub fn sy(self) -> f64 {
        self.sy
    }

    pub fn inverse(self) -> Self {
        Self {
            sx: 1.0 / self.sx,
            sy: 1.0 / self.sy,
        }
    }

    /// A circle keeps a single radius, so non-uniform factors are averaged.
    /// This distorts circles whenever `sx != sy`.
    pub fn radius_factor(self) -> f64 {
        (self.sx + self.sy) * 0.5
    }

    pub fn is_uniform(self) -> bool {
        (self.sx - self.sy).abs() <= f64::EPSILON * self.sx.max(self.sy)
    }
}

/// Produces a copy of `self` with every coordinate multiplied by the factors.
pub trait Scale {
    fn scaled(&self, factors: ScaleFactors) -> Self;
}

pub fn scale<T: Scale>(value: &T, sx: f64, sy: f64) -> Result<T, ScaleError> {
    Ok(value.scaled(ScaleFactors::new(sx, sy)?))
}

impl Scale for Point {
    fn scaled(&self, factors: ScaleFactors) -> Self {
        Point::new(self.x * factors.sx, self.y * factors.sy)
    }
}

impl Scale for Shape {
    fn scaled(&self, factors: ScaleFactors) -> Self {
        match self {
            Shape::Polygon { ring } => Shape::Polygon {
                ring: ring.iter().map(|p| p.scaled(factors)).collect(),
            },
            Shape::Circle { center, radius } => Shape::Circle {
                center: center.scaled(factors),
                radius: radius * factors.radius_factor(),
            },
        }
    }
}

impl Scale for Feature {
    fn scaled(&self, factors: ScaleFactors) -> Self {
        Feature {
            id: self.id.clone(),
            shape: self.shape.scaled(factors),
            attributes: self.attributes.clone(),
        }
    }
}

impl Scale for FeatureCollection {
    fn scaled(&self, factors: ScaleFactors) -> Self {
        self.map_features(|f| f.scaled(factors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attributes;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn point_round_trip_through_inverse() {
        let cases = [(0.1, 0.1), (2.0, 4.0), (0.37, 13.0), (1e-3, 7.5)];
        let p = Point::new(12345.678, -987.25);
        for (sx, sy) in cases {
            let f = ScaleFactors::new(sx, sy).unwrap();
            let back = p.scaled(f).scaled(f.inverse());
            assert!(close(back.x, p.x) && close(back.y, p.y), "{sx},{sy}: {back:?}");
        }
    }

    #[test]
    fn circle_radius_uses_mean_factor() {
        let c = Shape::circle(Point::new(0.0, 0.0), 500.0);
        assert_eq!(
            scale(&c, 2.0, 2.0).unwrap(),
            Shape::circle(Point::new(0.0, 0.0), 1000.0)
        );
        assert_eq!(
            scale(&c, 2.0, 4.0).unwrap(),
            Shape::circle(Point::new(0.0, 0.0), 1500.0)
        );
    }

    #[test]
    fn reference_to_display_end_to_end() {
        let f = ScaleFactors::between(ImageSize::new(21600, 14400), ImageSize::new(2160, 1440))
            .unwrap();
        assert!(close(f.sx(), 0.1) && close(f.sy(), 0.1));
        assert!(f.is_uniform());

        let stored = Shape::circle(Point::new(10800.0, 7200.0), 500.0);
        let Shape::Circle { center, radius } = stored.scaled(f) else {
            panic!("circle stays a circle");
        };
        assert!(close(center.x, 1080.0) && close(center.y, 720.0));
        assert!(close(radius, 50.0));
    }

    #[test]
    fn scaling_a_collection_leaves_the_source_alone() {
        let mut source = FeatureCollection::new();
        source.append(Feature::new(
            "L-1",
            Shape::polygon(vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
            ]),
            Attributes::new(),
        ));
        let before = source.clone();
        let scaled = source.scaled(ScaleFactors::new(0.5, 2.0).unwrap());
        assert_eq!(source, before);
        let feature = scaled.iter().next().unwrap();
        assert_eq!(feature.id, "L-1");
        assert_eq!(
            feature.shape,
            Shape::polygon(vec![
                Point::new(0.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(50.0, 100.0),
            ])
        );
    }

    #[test]
    fn rejects_degenerate_factors() {
        assert!(ScaleFactors::new(0.0, 1.0).is_err());
        assert!(ScaleFactors::new(1.0, f64::NAN).is_err());
        assert!(ScaleFactors::new(-2.0, 1.0).is_err());
        assert_eq!(
            ScaleFactors::between(ImageSize::new(0, 10), ImageSize::new(10, 10)),
            Err(ScaleError::EmptyImage { width: 0, height: 10 })
        );
    }
}
