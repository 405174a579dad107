//! Construction of a single contact face.
//!
//! The face between spheres `a` and `b` lives in their radical plane and is
//! bounded by the circle where the two sphere surfaces meet. Starting from a
//! hexagon around that circle, every other radical plane of `a` that reaches
//! the circle cuts the polygon; the result is finally intersected with the
//! circle itself, turning some polygon edges into circular arcs.

use std::f64::consts::{FRAC_PI_3, TAU};

use nalgebra::{Point3, Vector3};

use crate::error::GeometryDefect;
use crate::geometry::{
    Circle, Plane, Side, Sphere, directed_angle, enter_circle, fuzzy, orthogonal_unit,
    project_onto_segment, rotate_about,
};
use crate::power_diagram::PowerCell;

/// Circumradius factor of the seed hexagon; its edges stay outside the circle.
const SEED_SCALE: f64 = 1.19;

/// Summed arcs this close to a full turn close the circle.
const FULL_TURN_TOLERANCE: f64 = 1e-3;

/// Cosine above which two radical planes through the same point are one plane.
const COINCIDENT_COS: f64 = 1.0 - 1e-12;

/// What bounds the contour between two consecutive vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// The intersection circle (or the untouched seed polygon).
    Circle,
    /// The radical plane to the given neighbour.
    Cut(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct ContourPoint {
    pub p: Point3<f64>,
    /// Edge arriving at this vertex.
    pub left: Edge,
    /// Edge leaving this vertex.
    pub right: Edge,
    /// Angle of the circular arc leaving this vertex, zero for straight edges.
    pub angle: f64,
    outside: bool,
}

impl ContourPoint {
    const fn new(p: Point3<f64>, left: Edge, right: Edge) -> Self {
        Self {
            p,
            left,
            right,
            angle: 0.0,
            outside: false,
        }
    }

    fn is_cut_by(&self, id: usize) -> bool {
        self.left == Edge::Cut(id) && self.right == Edge::Cut(id)
    }

    pub const fn has_arc(&self) -> bool {
        self.angle > 0.0
    }
}

/// Outline of a face in the radical plane.
#[derive(Debug, Clone)]
pub enum Outline {
    /// The whole intersection disc.
    Disc,
    /// Vertices in order around the circle axis.
    Contour(Vec<ContourPoint>),
}

/// A non-empty face, ready to be measured.
#[derive(Debug, Clone)]
pub struct ClippedFace {
    pub circle: Circle,
    /// Unit direction from `a` to `b`.
    pub axis: Vector3<f64>,
    pub outline: Outline,
    /// Total angle of the arcs on the boundary.
    pub arc_angle: f64,
}

impl ClippedFace {
    pub fn arc_length(&self) -> f64 {
        self.arc_angle * self.circle.radius
    }

    #[cfg(test)]
    pub fn contour(&self) -> &[ContourPoint] {
        match &self.outline {
            Outline::Disc => &[],
            Outline::Contour(points) => points,
        }
    }
}

/// Working polygon while planes are applied.
struct Contour {
    points: Vec<ContourPoint>,
}

impl Contour {
    fn seed(circle: &Circle, axis: &Vector3<f64>) -> Self {
        let first = orthogonal_unit(axis) * (circle.radius * SEED_SCALE);
        let points = (0..6)
            .map(|k| {
                let offset = if k == 0 {
                    first
                } else {
                    rotate_about(axis, FRAC_PI_3 * f64::from(k), &first)
                };
                ContourPoint::new(circle.center + offset, Edge::Circle, Edge::Circle)
            })
            .collect();
        Self { points }
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether a plane at signed distance `offset` from `origin`, or any
    /// farther one, can still reach a vertex. Planes behind the origin
    /// always can.
    fn reachable(&self, origin: &Point3<f64>, offset: f64) -> bool {
        let threshold = offset * offset;
        offset <= 0.0
            || self
                .points
                .iter()
                .any(|cp| (cp.p - origin).norm_squared() >= threshold)
    }

    /// Removes the part of the polygon on or above `plane`.
    fn cut(&mut self, plane: &Plane, id: usize) {
        let mut marked = 0;
        for cp in &mut self.points {
            if plane.side(&cp.p) != Side::Below {
                cp.left = Edge::Cut(id);
                cp.right = Edge::Cut(id);
                marked += 1;
            }
        }
        if marked == 0 {
            return;
        }
        if marked == self.points.len() {
            self.points.clear();
            return;
        }
        self.splice(plane, id);
    }

    /// Replaces the run of marked vertices by the two crossing points.
    fn splice(&mut self, plane: &Plane, id: usize) {
        let pts = &mut self.points;
        if pts.len() < 3 {
            return;
        }
        let last = pts.len() - 1;
        let Some(mut first_cut) = pts.iter().position(|cp| cp.is_cut_by(id)) else {
            return;
        };
        let mut last_cut = pts.iter().rposition(|cp| cp.is_cut_by(id)).unwrap_or(first_cut);

        if first_cut == 0 && last_cut == last {
            // The marked run wraps around the end of the vector.
            last_cut = 0;
            while last_cut < last && pts[last_cut + 1].is_cut_by(id) {
                last_cut += 1;
            }
            first_cut = last;
            while first_cut > 0 && pts[first_cut - 1].is_cut_by(id) {
                first_cut -= 1;
            }
        }

        if first_cut == last_cut {
            let twin = pts[first_cut];
            pts.insert(first_cut, twin);
            last_cut = first_cut + 1;
        } else if first_cut < last_cut {
            pts.drain(first_cut + 1..last_cut);
            last_cut = first_cut + 1;
        } else {
            pts.truncate(first_cut + 1);
            pts.drain(..last_cut);
            first_cut = pts.len() - 1;
            last_cut = 0;
        }

        let n = pts.len();
        let before = if first_cut == 0 { n - 1 } else { first_cut - 1 };
        let (cut, prev) = (pts[first_cut], pts[before]);
        pts[first_cut] =
            ContourPoint::new(plane.cross_segment(&cut.p, &prev.p), prev.right, cut.left);
        let after = if last_cut + 1 == n { 0 } else { last_cut + 1 };
        let (cut, next) = (pts[last_cut], pts[after]);
        pts[last_cut] =
            ContourPoint::new(plane.cross_segment(&cut.p, &next.p), cut.right, next.left);

        let scale = pts[first_cut].p.coords.amax();
        if fuzzy::is_zero((pts[last_cut].p - pts[first_cut].p).norm(), scale) {
            pts[first_cut].right = pts[last_cut].right;
            pts.remove(last_cut);
        }
    }

    /// Intersects the polygon with the disc and returns the summed arc angle,
    /// or `None` when the arcs close the full circle.
    fn restrict_to(&mut self, circle: &Circle, axis: &Vector3<f64>) -> Option<f64> {
        let mut outsiders = 0;
        for cp in &mut self.points {
            cp.outside = !circle.contains_point(&cp.p);
            outsiders += usize::from(cp.outside);
        }
        if outsiders == 0 {
            return Some(0.0);
        }

        let pts = &mut self.points;
        let mut insertions = 0;
        let mut i = 0;
        while i < pts.len() {
            let j = (i + 1) % pts.len();
            let (p1, p2) = (pts[i], pts[j]);
            match (p1.outside, p2.outside) {
                (true, true) => {
                    if let Some(mid) = project_onto_segment(&circle.center, &p1.p, &p2.p)
                        && circle.contains_point(&mid)
                        && let (Some(enter), Some(leave)) = (
                            enter_circle(circle, &mid, &p1.p),
                            enter_circle(circle, &mid, &p2.p),
                        )
                    {
                        pts.insert(i + 1, ContourPoint::new(enter, Edge::Circle, p1.right));
                        pts.insert(i + 2, ContourPoint::new(leave, p2.left, Edge::Circle));
                        insertions += 2;
                        i += 2;
                    }
                }
                (true, false) => {
                    if let Some(enter) = enter_circle(circle, &p2.p, &p1.p) {
                        pts.insert(i + 1, ContourPoint::new(enter, Edge::Circle, p1.right));
                        insertions += 1;
                        i += 1;
                    } else {
                        pts[j].left = Edge::Circle;
                        pts[j].right = p1.right;
                    }
                }
                (false, true) => {
                    if let Some(leave) = enter_circle(circle, &p1.p, &p2.p) {
                        pts.insert(i + 1, ContourPoint::new(leave, p2.left, Edge::Circle));
                        insertions += 1;
                        i += 1;
                    } else {
                        pts[i].left = p2.left;
                        pts[i].right = Edge::Circle;
                    }
                }
                (false, false) => {}
            }
            i += 1;
        }

        if insertions == 0 {
            pts.clear();
            return Some(0.0);
        }
        pts.retain(|cp| !cp.outside);
        if pts.len() < 2 {
            pts.clear();
            return Some(0.0);
        }

        let up = circle.center + axis;
        let n = pts.len();
        let mut sum = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            if pts[i].right == Edge::Circle && pts[j].left == Edge::Circle {
                let angle = directed_angle(&circle.center, &pts[i].p, &pts[j].p, &up);
                pts[i].angle = angle;
                sum += angle;
            }
        }

        let closes = fuzzy::greater_eq(sum, TAU)
            || (n > 2 && fuzzy::eq_within(sum, TAU, FULL_TURN_TOLERANCE));
        (!closes).then_some(sum)
    }
}

/// Builds the face between the cell's sphere and neighbour `b` using the
/// cell's other radical planes. `Ok(None)` means the pair has no face.
pub fn clip_face(
    spheres: &[Sphere],
    cell: &PowerCell,
    b_id: usize,
) -> Result<Option<ClippedFace>, GeometryDefect> {
    let a = &spheres[cell.index];
    let b = &spheres[b_id];
    if !a.intersects(b) || a.contains(b) || b.contains(a) {
        return Ok(None);
    }

    let circle = a.intersection_circle(b);
    if !circle.radius.is_finite() || !circle.center.iter().all(|c| c.is_finite()) {
        return Err(GeometryDefect::NonFiniteCircle);
    }
    if circle.radius <= 0.0 {
        return Ok(None);
    }
    let axis = (b.center - a.center).normalize();
    let towards_circle = (circle.center - a.center).normalize();
    let reach = circle.ball();

    let mut contour: Option<Contour> = None;

    for rp in &cell.planes {
        let c_id = rp.neighbor;
        if c_id == b_id {
            continue;
        }
        let c = &spheres[c_id];
        if !reach.intersects(c) || !b.intersects(c) {
            continue;
        }
        if c.contains(a) || c.contains(b) {
            return Ok(None);
        }

        let plane = &rp.plane;
        let cos = towards_circle.dot(&(plane.point - a.center).normalize());
        let circle_side = plane.side(&circle.center);

        if cos > COINCIDENT_COS && circle_side == Side::On {
            // Same plane reached through two neighbours: the lower index owns it.
            if c_id < b_id {
                return Ok(None);
            }
            continue;
        }

        if cos.abs() < 1.0 {
            let gap = plane.signed_distance(&circle.center).abs();
            let reach_in_plane = gap / cos.mul_add(-cos, 1.0).sqrt();
            if reach_in_plane >= circle.radius {
                if circle_side != Side::Below {
                    return Ok(None);
                }
                continue;
            }
            let fresh = contour.is_none();
            let polygon = contour.get_or_insert_with(|| Contour::seed(&circle, &axis));
            if !fresh && !polygon.reachable(&a.center, rp.offset) {
                break;
            }
            polygon.cut(plane, c_id);
            if polygon.is_empty() {
                return Ok(None);
            }
        } else if circle_side == Side::Above {
            return Ok(None);
        }
    }

    let Some(mut polygon) = contour else {
        return Ok(Some(ClippedFace {
            circle,
            axis,
            outline: Outline::Disc,
            arc_angle: TAU,
        }));
    };

    let arc_angle = polygon.restrict_to(&circle, &axis);
    if polygon
        .points
        .iter()
        .any(|cp| !cp.p.iter().all(|x| x.is_finite()))
    {
        return Err(GeometryDefect::NonFiniteContour);
    }
    match arc_angle {
        None => Ok(Some(ClippedFace {
            circle,
            axis,
            outline: Outline::Disc,
            arc_angle: TAU,
        })),
        Some(sum) if !sum.is_finite() => Err(GeometryDefect::NonFiniteArcs),
        Some(_) if polygon.points.is_empty() => Ok(None),
        Some(sum) => Ok(Some(ClippedFace {
            circle,
            axis,
            outline: Outline::Contour(polygon.points),
            arc_angle: sum,
        })),
    }
}
