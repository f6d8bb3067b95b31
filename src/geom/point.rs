//! This module provides the Point structure and its methods.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Floor for all geometric comparisons (segment intersection, zero-length
/// checks, lane-change offset caps).
pub const EPS: f64 = 1e-8;

/// A 2-D Euclidean point, also used as a free vector.
///
/// # Example
///
/// ```
/// use kinetic_traffic_kernel::geom::Point;
/// let point = Point::new(35.90434, 56.89028);
/// println!("{}", point);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn zero() -> Self {
        Point { x: 0.0, y: 0.0 }
    }

    /// Euclidean length of this point treated as a vector from the origin.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z-component of the 3-D cross product of the two 2-D vectors.
    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the direction of this vector. Returns the zero vector
    /// if the length is below [`EPS`].
    pub fn unit(&self) -> Point {
        let len = self.length();
        if len < EPS {
            return Point::zero();
        }
        Point::new(self.x / len, self.y / len)
    }

    /// The left-hand normal of this vector (rotated +90 degrees), not
    /// normalized.
    pub fn normal(&self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// Angle of this vector from the positive x-axis, in radians, in (-pi, pi].
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Angle between this vector and another, in radians, in [0, pi].
    pub fn angle_to(&self, other: &Point) -> f64 {
        let denom = self.length() * other.length();
        if denom < EPS {
            return 0.0;
        }
        let cos_a = (self.dot(other) / denom).clamp(-1.0, 1.0);
        cos_a.acos()
    }

    pub fn is_zero(&self) -> bool {
        self.length() < EPS
    }

    /// Linear interpolation between self and `other` at parameter `t` in [0, 1].
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn scaled(&self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[x: {:.5} y: {:.5}]", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_and_length() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < EPS);
        assert!((b.length() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_unit_vector() {
        let v = Point::new(0.0, 5.0);
        let u = v.unit();
        assert!((u.x - 0.0).abs() < 1e-9);
        assert!((u.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_of_zero_vector() {
        let v = Point::zero();
        assert!(v.unit().is_zero());
    }

    #[test]
    fn test_normal_is_perpendicular() {
        let v = Point::new(1.0, 0.0);
        let n = v.normal();
        assert!(v.dot(&n).abs() < EPS);
    }

    #[test]
    fn test_angle_to() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        let angle = a.angle_to(&b);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 10.0);
        let mid = a.lerp(&b, 0.5);
        assert!((mid.x - 5.0).abs() < EPS);
        assert!((mid.y - 5.0).abs() < EPS);
    }
}
