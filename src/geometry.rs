//! Geometric primitives shared by every tessellation stage.
//!
//! All fuzzy predicates share one tolerance rule: an absolute floor
//! [`EPSILON`] plus [`RELATIVE_EPSILON`] times the magnitude of the compared
//! values. The stages must agree on what "on the plane" or "touching" means,
//! otherwise a face accepted by one stage can be rejected by the next.

use std::f64::consts::TAU;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};

/// Absolute floor of every fuzzy comparison in the engine.
pub const EPSILON: f64 = 1e-10;

/// Tolerance added per unit of magnitude of the compared values.
pub const RELATIVE_EPSILON: f64 = 1e-12;

/// Fuzzy comparisons with an absolute plus relative tolerance.
pub mod fuzzy {
    use super::{EPSILON, RELATIVE_EPSILON};

    /// Tolerance for values computed from quantities of size `scale`.
    #[inline]
    pub fn tolerance(scale: f64) -> f64 {
        RELATIVE_EPSILON.mul_add(scale.abs(), EPSILON)
    }

    #[inline]
    fn between(a: f64, b: f64) -> f64 {
        tolerance(a.abs().max(b.abs()))
    }

    #[inline]
    pub fn eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= between(a, b)
    }

    #[inline]
    pub fn eq_within(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    /// Whether `value`, derived from quantities of size `scale`, is zero.
    #[inline]
    pub fn is_zero(value: f64, scale: f64) -> bool {
        value.abs() <= tolerance(scale)
    }

    #[inline]
    pub fn less(a: f64, b: f64) -> bool {
        a + between(a, b) < b
    }

    #[inline]
    pub fn greater(a: f64, b: f64) -> bool {
        a - between(a, b) > b
    }

    #[inline]
    pub fn less_eq(a: f64, b: f64) -> bool {
        less(a, b) || eq(a, b)
    }

    #[inline]
    pub fn greater_eq(a: f64, b: f64) -> bool {
        greater(a, b) || eq(a, b)
    }
}

/// Sphere with an effective (probe-inflated) radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub r: f64,
}

impl Sphere {
    pub const fn new(center: Point3<f64>, r: f64) -> Self {
        Self { center, r }
    }

    #[cfg(test)]
    pub const fn at(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self::new(Point3::new(x, y, z), r)
    }

    /// Strict overlap: tangent spheres do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        fuzzy::less((other.center - self.center).norm(), self.r + other.r)
    }

    /// Whether `other` lies entirely inside `self` (touching from inside counts).
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        fuzzy::greater_eq(self.r, other.r)
            && fuzzy::less_eq((other.center - self.center).norm(), self.r - other.r)
    }

    #[inline]
    pub fn coincides_with(&self, other: &Self) -> bool {
        fuzzy::eq(self.r, other.r)
            && fuzzy::eq(self.center.x, other.center.x)
            && fuzzy::eq(self.center.y, other.center.y)
            && fuzzy::eq(self.center.z, other.center.z)
    }

    pub fn surface_area(&self) -> f64 {
        2.0 * TAU * self.r * self.r
    }

    pub fn volume(&self) -> f64 {
        2.0 * TAU / 3.0 * self.r * self.r * self.r
    }

    /// Signed offset of the radical plane with `other` from this centre,
    /// measured along the centre-to-centre direction.
    pub fn radical_offset(&self, other: &Self) -> f64 {
        let d = (other.center - self.center).norm();
        if d < EPSILON {
            return 0.0;
        }
        other.r.mul_add(-other.r, self.r.mul_add(self.r, d * d)) / (2.0 * d)
    }

    /// Point where the radical plane with `other` crosses the centre line.
    pub fn radical_point(&self, other: &Self) -> Point3<f64> {
        let axis = other.center - self.center;
        let d = axis.norm();
        if d < EPSILON {
            return self.center;
        }
        self.center + axis * (self.radical_offset(other) / d)
    }

    /// Circle where the two sphere surfaces meet (radius 0 when they do not).
    pub fn intersection_circle(&self, other: &Self) -> Circle {
        let axis = other.center - self.center;
        let d = axis.norm();
        if d < EPSILON || self.r <= 0.0 {
            return Circle::new(self.center, 0.0);
        }
        let offset = self.radical_offset(other);
        let cos_g = offset / self.r;
        let sin_g = cos_g.mul_add(-cos_g, 1.0).max(0.0).sqrt();
        Circle::new(self.center + axis * (offset / d), self.r * sin_g)
    }
}

/// Circle lying in a radical plane; only centre and radius are needed
/// because the plane orientation always comes from the sphere pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl Circle {
    pub const fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// The ball spanned by the circle, used for reachability tests.
    pub const fn ball(&self) -> Sphere {
        Sphere::new(self.center, self.radius)
    }

    pub fn area(&self) -> f64 {
        0.5 * TAU * self.radius * self.radius
    }

    pub fn contains_point(&self, p: &Point3<f64>) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }
}

/// Which side of a plane a point is on, with slack scaled to the coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    On,
    Above,
}

/// Oriented plane with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Plane {
    pub fn new(point: Point3<f64>, normal: &Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    #[inline]
    pub fn signed_distance(&self, x: &Point3<f64>) -> f64 {
        self.normal.dot(&(x - self.point))
    }

    #[inline]
    pub fn side(&self, x: &Point3<f64>) -> Side {
        let sd = self.signed_distance(x);
        if fuzzy::is_zero(sd, x.coords.amax().max(self.point.coords.amax())) {
            Side::On
        } else if sd > 0.0 {
            Side::Above
        } else {
            Side::Below
        }
    }

    /// Crossing point of segment `ab` with the plane; `a` when the segment
    /// runs parallel to it.
    pub fn cross_segment(&self, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
        let da = self.signed_distance(a);
        let db = self.signed_distance(b);
        if da == db {
            *a
        } else {
            a + (b - a) * (da / (da - db))
        }
    }
}

#[inline]
pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Unsigned angle at `o` between rays `oa` and `ob`.
pub fn angle_at(o: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - o)
        .normalize()
        .dot(&(b - o).normalize())
        .clamp(-1.0, 1.0)
        .acos()
}

/// Angle from ray `oa` to ray `ob` measured counter-clockwise around the
/// direction `o -> up`, in `[0, 2π)`.
pub fn directed_angle(o: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>, up: &Point3<f64>) -> f64 {
    let angle = angle_at(o, a, b);
    let turn = (a - o).normalize().cross(&(b - o).normalize());
    if (up - o).dot(&turn) >= 0.0 {
        angle
    } else {
        TAU - angle
    }
}

/// Angle between the half-planes through the line `oa` containing `b1` and `b2`.
pub fn dihedral_angle(o: &Point3<f64>, a: &Point3<f64>, b1: &Point3<f64>, b2: &Point3<f64>) -> f64 {
    let axis = (a - o).normalize();
    let foot = |p: &Point3<f64>| o + axis * axis.dot(&(p - o));
    let d1 = b1 - foot(b1);
    let d2 = b2 - foot(b2);
    d1.normalize().dot(&d2.normalize()).clamp(-1.0, 1.0).acos()
}

/// Some unit vector orthogonal to `v`.
pub fn orthogonal_unit(v: &Vector3<f64>) -> Vector3<f64> {
    let zero_x = fuzzy::eq(v.x, 0.0);
    let zero_y = fuzzy::eq(v.y, 0.0);
    let zero_z = fuzzy::eq(v.z, 0.0);
    if !zero_x && (!zero_y || !zero_z) {
        v.cross(&Vector3::new(-v.x, v.y, v.z)).normalize()
    } else if !zero_y && (!zero_x || !zero_z) {
        v.cross(&Vector3::new(v.x, -v.y, v.z)).normalize()
    } else if !zero_x {
        Vector3::y()
    } else {
        Vector3::x()
    }
}

pub fn rotate_about(axis: &Vector3<f64>, angle: f64, v: &Vector3<f64>) -> Vector3<f64> {
    if axis.norm_squared() <= 0.0 {
        return *v;
    }
    UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle) * v
}

/// Foot of the perpendicular from `o` onto segment `ab`, if it falls inside.
pub fn project_onto_segment(o: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Option<Point3<f64>> {
    let dir = (b - a).normalize();
    let along = dir.dot(&(o - a));
    (along > 0.0 && along * along <= (b - a).norm_squared()).then(|| a + dir * along)
}

/// Point where the segment from `outside` towards `inside` enters the circle.
pub fn enter_circle(circle: &Circle, inside: &Point3<f64>, outside: &Point3<f64>) -> Option<Point3<f64>> {
    let length = (inside - outside).norm();
    if length <= 0.0 {
        return None;
    }
    let dir = (inside - outside) / length;
    let closest = outside + dir * dir.dot(&(circle.center - outside));
    let half_chord_sq = circle
        .radius
        .mul_add(circle.radius, -(circle.center - closest).norm_squared());
    (half_chord_sq >= 0.0).then(|| closest - dir * half_chord_sq.sqrt())
}
