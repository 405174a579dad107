//! Closed-form measures of faces and cells.

use std::f64::consts::{PI, TAU};

use nalgebra::{Point3, Vector3};

use crate::clipper::{ClippedFace, ContourPoint, Outline};
use crate::error::GeometryDefect;
use crate::geometry::{Sphere, dihedral_angle, fuzzy, triangle_area};

/// Faces smaller than this fraction of their disc are dropped.
const COLLAPSE_FRACTION: f64 = 1e-12;

/// Slack for the face-inside-disc check.
const DISC_SLACK: f64 = 1e-6;

#[allow(clippy::cast_precision_loss)]
fn barycenter(points: &[ContourPoint]) -> Point3<f64> {
    let sum: Vector3<f64> = points.iter().map(|cp| cp.p.coords).sum();
    Point3::from(sum / points.len() as f64)
}

/// Planar area of the face: a fan of triangles around the vertex barycenter
/// plus a circular segment for every arc.
pub fn face_area(face: &ClippedFace) -> f64 {
    let points = match &face.outline {
        Outline::Disc => return face.circle.area(),
        Outline::Contour(points) => points,
    };
    let center = barycenter(points);
    let r2 = face.circle.radius * face.circle.radius;
    let n = points.len();
    (0..n)
        .map(|i| {
            let (p1, p2) = (&points[i], &points[(i + 1) % n]);
            let segment = if p1.has_arc() {
                r2 * (p1.angle - p1.angle.sin()) * 0.5
            } else {
                0.0
            };
            triangle_area(&center, &p1.p, &p2.p) + segment
        })
        .sum()
}

/// Signed solid angle under which `a` sees the face it shares with `b`.
///
/// Computed from the total geodesic turning of the face boundary projected
/// onto the unit sphere around `a` (Gauss-Bonnet): `2π` minus the turn.
/// Negative when the face lies behind `a`, i.e. when `a` is on the same
/// side of the face as `b` but nearer to it.
pub fn solid_angle(a: &Sphere, b: &Sphere, face: &ClippedFace) -> f64 {
    let ic = &face.circle.center;
    let height_ratio = (ic - a.center).norm() / a.r;
    let ab = b.center - a.center;

    let turn = match &face.outline {
        Outline::Disc => TAU * height_ratio,
        Outline::Contour(points) => {
            let n = points.len();
            (0..n)
                .map(|i| {
                    let pr0 = &points[(i + n - 1) % n];
                    let pr1 = &points[i];
                    let pr2 = &points[(i + 1) % n];
                    // Tangent of the circle at `pr1`, oriented along the arc.
                    let tangent = |arc: &ContourPoint, towards: &Point3<f64>| {
                        let d = ab.cross(&(pr1.p - ic));
                        let along = d.dot(&(towards - pr1.p));
                        if (arc.angle < PI && along < 0.0) || (arc.angle > PI && along > 0.0) {
                            pr1.p - d
                        } else {
                            pr1.p + d
                        }
                    };
                    if pr0.has_arc() {
                        PI - dihedral_angle(&a.center, &pr1.p, &tangent(pr0, &pr0.p), &pr2.p)
                    } else if pr1.has_arc() {
                        PI - dihedral_angle(&a.center, &pr1.p, &pr0.p, &tangent(pr1, &pr2.p))
                            + pr1.angle * height_ratio
                    } else {
                        PI - dihedral_angle(&a.center, &pr1.p, &pr0.p, &pr2.p)
                    }
                })
                .sum()
        }
    };

    let omega = TAU - turn;
    let to_a = ic - a.center;
    let to_b = ic - b.center;
    if to_a.dot(&to_b) > 0.0 && to_a.norm_squared() < to_b.norm_squared() {
        -omega
    } else {
        omega
    }
}

/// Whether the face contains the foot of the centre-to-centre line, which
/// is the centre of the intersection circle. The contour winds
/// counter-clockwise around the axis, so the foot must lie left of every
/// straight edge; arcs never exclude the circle centre.
pub fn is_central(face: &ClippedFace) -> bool {
    let points = match &face.outline {
        Outline::Disc => return true,
        Outline::Contour(points) => points,
    };
    let foot = &face.circle.center;
    let n = points.len();
    (0..n).filter(|&i| !points[i].has_arc()).all(|i| {
        let p1 = &points[i].p;
        let p2 = &points[(i + 1) % n].p;
        let left = (p2 - p1).cross(&(foot - p1)).dot(&face.axis);
        fuzzy::greater_eq(left, 0.0)
    })
}

/// Everything measured on one face, from both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMeasure {
    pub area: f64,
    pub arc_length: f64,
    pub distance: f64,
    pub solid_angle_a: f64,
    pub solid_angle_b: f64,
    pub pyramid_volume_a: f64,
    pub pyramid_volume_b: f64,
    pub central: bool,
}

impl FaceMeasure {
    /// The same face seen with the roles of `a` and `b` exchanged.
    #[must_use]
    pub const fn swapped(self) -> Self {
        Self {
            solid_angle_a: self.solid_angle_b,
            solid_angle_b: self.solid_angle_a,
            pyramid_volume_a: self.pyramid_volume_b,
            pyramid_volume_b: self.pyramid_volume_a,
            ..self
        }
    }
}

fn pyramid(apex: &Sphere, face: &ClippedFace, area: f64, omega: f64) -> f64 {
    let height = (face.circle.center - apex.center).norm();
    let v = height * area / 3.0;
    if omega < 0.0 { -v } else { v }
}

/// Measures `face` between `a` and `b`; `Ok(None)` when it collapses.
pub fn measure_face(
    a: &Sphere,
    b: &Sphere,
    face: &ClippedFace,
) -> Result<Option<FaceMeasure>, GeometryDefect> {
    let disc = face.circle.area();
    let area = face_area(face);
    if !area.is_finite() {
        return Err(GeometryDefect::NonFiniteMeasure);
    }
    if area > disc.mul_add(DISC_SLACK, disc) {
        return Err(GeometryDefect::AreaExceedsDisc);
    }
    if area <= COLLAPSE_FRACTION * disc {
        return Ok(None);
    }

    let solid_angle_a = solid_angle(a, b, face);
    let solid_angle_b = solid_angle(b, a, face);
    let m = FaceMeasure {
        area,
        arc_length: face.arc_length(),
        distance: (b.center - a.center).norm(),
        solid_angle_a,
        solid_angle_b,
        pyramid_volume_a: pyramid(a, face, area, solid_angle_a),
        pyramid_volume_b: pyramid(b, face, area, solid_angle_b),
        central: is_central(face),
    };
    let finite = [
        m.arc_length,
        m.solid_angle_a,
        m.solid_angle_b,
        m.pyramid_volume_a,
        m.pyramid_volume_b,
    ]
    .iter()
    .all(|x| x.is_finite());
    if finite { Ok(Some(m)) } else { Err(GeometryDefect::NonFiniteMeasure) }
}

/// Cell totals gathered from the faces seen by one sphere.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellAccumulator {
    pub faces: usize,
    pub arc_length: f64,
    solid_angle_positive: f64,
    solid_angle_negative: f64,
    pyramid_positive: f64,
    pyramid_negative: f64,
}

/// Exposed surface and volume of a closed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMeasure {
    pub sas_area: f64,
    pub volume: f64,
}

impl CellAccumulator {
    /// Adds a face as seen from this cell's sphere.
    pub fn add(&mut self, solid_angle: f64, pyramid_volume: f64, arc_length: f64) {
        self.faces += 1;
        self.arc_length += arc_length;
        self.solid_angle_positive += solid_angle.max(0.0);
        self.solid_angle_negative -= solid_angle.min(0.0);
        self.pyramid_positive += pyramid_volume.max(0.0);
        self.pyramid_negative -= pyramid_volume.min(0.0);
    }

    pub const fn is_empty(&self) -> bool {
        self.faces == 0
    }

    /// Exposed surface is the solid angle not covered by faces; volume is
    /// the cone over it plus the face pyramids.
    pub fn finish(&self, sphere: &Sphere) -> CellMeasure {
        let r = sphere.r;
        let r2 = r * r;
        let pyramids = self.pyramid_positive - self.pyramid_negative;
        let (pos, neg) = (self.solid_angle_positive, self.solid_angle_negative);

        if self.arc_length <= 0.0 || fuzzy::eq(pos, neg) {
            return CellMeasure {
                sas_area: 0.0,
                volume: pyramids,
            };
        }

        let sas_area = if pos > neg {
            (2.0 * TAU - (pos - neg)) * r2
        } else {
            (neg - pos) * r2
        };
        let volume = sas_area * r / 3.0 + pyramids;
        if volume > sphere.volume() {
            CellMeasure {
                sas_area: 0.0,
                volume: pyramids,
            }
        } else {
            CellMeasure { sas_area, volume }
        }
    }
}
