use crate::model::{FeatureCollection, FeatureRef, Point, Shape};

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let ab_len2 = abx * abx + aby * aby;
    if ab_len2 <= f64::EPSILON {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / ab_len2).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + abx * t, a.y + aby * t))
}

/// Even-odd test against an open ring; the closing edge is implied.
pub fn ring_contains(ring: &[Point], p: Point) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn distance_to_ring(ring: &[Point], p: Point) -> f64 {
    match ring {
        [] => f64::INFINITY,
        [only] => p.distance_to(*only),
        _ => ring
            .iter()
            .zip(ring.iter().cycle().skip(1))
            .map(|(a, b)| distance_to_segment(p, *a, *b))
            .fold(f64::INFINITY, f64::min),
    }
}

pub fn hit_test_shape(shape: &Shape, p: Point, tolerance: f64) -> bool {
    match shape {
        Shape::Polygon { ring } => {
            ring_contains(ring, p) || distance_to_ring(ring, p) <= tolerance
        }
        Shape::Circle { center, radius } => p.distance_to(*center) <= radius + tolerance,
    }
}

/// Last feature in drawing order under `p`.
pub fn topmost_hit(collection: &FeatureCollection, p: Point, tolerance: f64) -> Option<FeatureRef> {
    collection
        .entries()
        .rev()
        .find(|(_, f)| hit_test_shape(&f.shape, p, tolerance))
        .map(|(r, _)| r)
}

/// Index of the closest point no further than `max_distance` from `p`.
pub fn nearest_within(
    points: impl IntoIterator<Item = Point>,
    p: Point,
    max_distance: f64,
) -> Option<usize> {
    points
        .into_iter()
        .enumerate()
        .map(|(i, q)| (i, q.distance_to(p)))
        .filter(|(_, d)| *d <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Feature};

    fn square(size: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Point::new(13.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Point::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn concave_ring_containment() {
        // U shape opening upwards
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
            Point::new(20.0, 30.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 30.0),
            Point::new(0.0, 30.0),
        ];
        assert!(ring_contains(&ring, Point::new(5.0, 20.0)));
        assert!(!ring_contains(&ring, Point::new(15.0, 20.0)));
        assert!(ring_contains(&ring, Point::new(15.0, 5.0)));
    }

    #[test]
    fn closing_edge_counts_for_distance() {
        let ring = square(10.0);
        assert!((distance_to_ring(&ring, Point::new(-2.0, 5.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn topmost_hit_prefers_later_features() {
        let mut c = FeatureCollection::new();
        let below = c.append(Feature::new("A", Shape::polygon(square(20.0)), Attributes::new()));
        let above = c.append(Feature::new(
            "B",
            Shape::circle(Point::new(5.0, 5.0), 3.0),
            Attributes::new(),
        ));
        assert_eq!(topmost_hit(&c, Point::new(5.0, 6.0), 0.0), Some(above));
        assert_eq!(topmost_hit(&c, Point::new(15.0, 15.0), 0.0), Some(below));
        assert_eq!(topmost_hit(&c, Point::new(21.0, 21.0), 0.5), None);
        assert_eq!(topmost_hit(&c, Point::new(20.5, 10.0), 1.0), Some(below));
    }

    #[test]
    fn nearest_within_picks_closest_in_range() {
        let pts = square(10.0);
        assert_eq!(nearest_within(pts.clone(), Point::new(9.0, 9.5), 2.0), Some(2));
        assert_eq!(nearest_within(pts, Point::new(5.0, 5.0), 2.0), None);
    }
}
