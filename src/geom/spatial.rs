//! Segment intersection and polyline queries used to build lane/lane-link
//! geometry and to enumerate crosses.

use crate::geom::point::{Point, EPS};

/// The point at which two segments cross, plus the interpolation parameter
/// along each segment (both in `[0, 1]`) at that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection {
    pub point: Point,
    pub t_a: f64,
    pub t_b: f64,
}

/// Tests whether segment `a0->a1` crosses segment `b0->b1` within both
/// segments' extents (using [`EPS`] as the on-segment tolerance), and if so
/// returns the crossing point and the two interpolation parameters.
pub fn segment_intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<SegmentIntersection> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.cross(&s);
    if denom.abs() < EPS {
        // Parallel or collinear: not modeled as a cross.
        return None;
    }
    let qp = b0 - a0;
    let t = qp.cross(&s) / denom;
    let u = qp.cross(&r) / denom;
    if t < -EPS || t > 1.0 + EPS || u < -EPS || u > 1.0 + EPS {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    let u = u.clamp(0.0, 1.0);
    Some(SegmentIntersection {
        point: a0 + r * t,
        t_a: t,
        t_b: u,
    })
}

/// Total length of a polyline given as an ordered list of points.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// Cumulative length up to (and including) vertex `points[idx]`.
pub fn polyline_length_up_to(points: &[Point], idx: usize) -> f64 {
    if idx == 0 || points.is_empty() {
        return 0.0;
    }
    polyline_length(&points[..=idx.min(points.len() - 1)])
}

/// The point and unit tangent direction at arc-length `distance` along a
/// polyline, clamped to the polyline's extent.
pub fn point_at_distance(points: &[Point], distance: f64) -> (Point, Point) {
    if points.is_empty() {
        return (Point::zero(), Point::zero());
    }
    if points.len() == 1 {
        return (points[0], Point::zero());
    }
    if distance <= 0.0 {
        let dir = (points[1] - points[0]).unit();
        return (points[0], dir);
    }
    let mut remaining = distance;
    for w in points.windows(2) {
        let seg_len = w[0].distance_to(&w[1]);
        if seg_len < EPS {
            continue;
        }
        if remaining <= seg_len {
            let t = remaining / seg_len;
            let dir = (w[1] - w[0]).unit();
            return (w[0].lerp(&w[1], t), dir);
        }
        remaining -= seg_len;
    }
    let last = points.len() - 1;
    let dir = (points[last] - points[last - 1]).unit();
    (points[last], dir)
}

/// Offsets a polyline to one side by a constant distance, using the bisector
/// of adjacent segment unit vectors at interior vertices.
pub fn offset_polyline(points: &[Point], distance: f64) -> Vec<Point> {
    if points.len() < 2 || distance.abs() < EPS {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        let normal = if i == 0 {
            (points[1] - points[0]).unit().normal()
        } else if i == points.len() - 1 {
            (points[i] - points[i - 1]).unit().normal()
        } else {
            let n_prev = (points[i] - points[i - 1]).unit().normal();
            let n_next = (points[i + 1] - points[i]).unit().normal();
            let bisector = n_prev + n_next;
            if bisector.is_zero() {
                n_prev
            } else {
                let half_angle_cos = bisector.unit().dot(&n_prev).max(EPS);
                bisector.unit().scaled(1.0 / half_angle_cos)
            }
        };
        out.push(points[i] + normal.unit().scaled(distance));
    }
    out
}

/// A cubic-Bezier-like interpolation between two endpoints, using control
/// points placed along the incoming/outgoing tangents at half the endpoint
/// distance, with a minimum control-point gap.
pub fn bezier_lane_link_polyline(
    start: Point,
    start_tangent: Point,
    end: Point,
    end_tangent: Point,
    samples: usize,
    min_control_gap: f64,
) -> Vec<Point> {
    let dist = start.distance_to(&end);
    let handle_len = (dist / 2.0).max(min_control_gap);
    let c0 = start + start_tangent.unit().scaled(handle_len);
    let c1 = end - end_tangent.unit().scaled(handle_len);
    let n = samples.max(2);
    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            cubic_bezier(start, c0, c1, end, t)
        })
        .collect()
}

fn cubic_bezier(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    p0.scaled(u * u * u) + p1.scaled(3.0 * u * u * t) + p2.scaled(3.0 * u * t * t) + p3.scaled(t * t * t)
}

/// Bearing from `pt1` to `pt2`, measured clockwise from the local +y axis,
/// in degrees. Used for replay-log heading output.
pub fn get_bearing(pt1: Point, pt2: Point) -> f64 {
    let delta = pt2 - pt1;
    delta.x.atan2(delta.y).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perpendicular_crossing() {
        let a0 = Point::new(-1.0, 0.0);
        let a1 = Point::new(1.0, 0.0);
        let b0 = Point::new(0.0, -1.0);
        let b1 = Point::new(0.0, 1.0);
        let hit = segment_intersection(a0, a1, b0, b1).expect("segments cross");
        assert!(hit.point.distance_to(&Point::zero()) < 1e-9);
        assert!((hit.t_a - 0.5).abs() < 1e-9);
        assert!((hit.t_b - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_segments_do_not_cross() {
        let a0 = Point::new(0.0, 0.0);
        let a1 = Point::new(1.0, 0.0);
        let b0 = Point::new(0.0, 1.0);
        let b1 = Point::new(1.0, 1.0);
        assert!(segment_intersection(a0, a1, b0, b1).is_none());
    }

    #[test]
    fn test_disjoint_segments_do_not_cross() {
        let a0 = Point::new(0.0, 0.0);
        let a1 = Point::new(1.0, 0.0);
        let b0 = Point::new(5.0, -1.0);
        let b1 = Point::new(5.0, 1.0);
        assert!(segment_intersection(a0, a1, b0, b1).is_none());
    }

    #[test]
    fn test_polyline_length() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(3.0, 0.0), Point::new(3.0, 4.0)];
        assert!((polyline_length(&pts) - 7.0).abs() < EPS);
    }

    #[test]
    fn test_point_at_distance_midsegment() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let (p, dir) = point_at_distance(&pts, 4.0);
        assert!((p.x - 4.0).abs() < EPS);
        assert!((dir.x - 1.0).abs() < EPS);
    }

    #[test]
    fn test_point_at_distance_clamped_to_end() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let (p, _) = point_at_distance(&pts, 99.0);
        assert!((p.x - 10.0).abs() < EPS);
    }

    #[test]
    fn test_bezier_endpoints_match() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 10.0);
        let curve = bezier_lane_link_polyline(start, Point::new(1.0, 0.0), end, Point::new(0.0, 1.0), 8, 5.0);
        assert_eq!(curve.len(), 8);
        assert!(curve[0].distance_to(&start) < EPS);
        assert!(curve[curve.len() - 1].distance_to(&end) < EPS);
    }
}
