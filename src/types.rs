use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::CellIssue;
use crate::geometry::Sphere;

/// Input ball (center + radius)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl Ball {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }

    /// The probe-inflated sphere the engine works with.
    pub(crate) fn inflate(&self, probe: f64) -> Sphere {
        Sphere::new(Point3::new(self.x, self.y, self.z), self.r + probe)
    }
}

/// Periodic boundary box defined by three shift vectors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodicBox {
    pub shift_a: Vector3<f64>,
    pub shift_b: Vector3<f64>,
    pub shift_c: Vector3<f64>,
}

impl PeriodicBox {
    /// Axis-aligned box spanned by two opposite corners (in any order).
    #[must_use]
    pub fn from_corners(a: (f64, f64, f64), b: (f64, f64, f64)) -> Self {
        Self {
            shift_a: Vector3::new((b.0 - a.0).abs(), 0.0, 0.0),
            shift_b: Vector3::new(0.0, (b.1 - a.1).abs(), 0.0),
            shift_c: Vector3::new(0.0, 0.0, (b.2 - a.2).abs()),
        }
    }

    /// Box from three shift vectors (for non-orthogonal cells).
    #[must_use]
    pub const fn from_vectors(a: (f64, f64, f64), b: (f64, f64, f64), c: (f64, f64, f64)) -> Self {
        Self {
            shift_a: Vector3::new(a.0, a.1, a.2),
            shift_b: Vector3::new(b.0, b.1, b.2),
            shift_c: Vector3::new(c.0, c.1, c.2),
        }
    }
}

/// Global parameters of one tessellation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TessellationParameters {
    /// Solvent probe radius added to every ball radius.
    pub probe: f64,
    /// Optional periodic boundary conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic_box: Option<PeriodicBox>,
    /// Optional group id per ball. Contacts between balls of the same group
    /// are not reported; cells are measured as usual.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Vec<i32>>,
}

impl TessellationParameters {
    #[must_use]
    pub const fn new(probe: f64) -> Self {
        Self {
            probe,
            periodic_box: None,
            grouping: None,
        }
    }

    #[must_use]
    pub fn with_periodic_box(mut self, periodic_box: PeriodicBox) -> Self {
        self.periodic_box = Some(periodic_box);
        self
    }

    /// Reports only contacts between balls with different group ids, e.g.
    /// one id per chain for interface contacts.
    #[must_use]
    pub fn with_grouping(mut self, grouping: Vec<i32>) -> Self {
        self.grouping = Some(grouping);
        self
    }
}

/// Shared boundary face between the cells of two balls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub index_a: usize,
    pub index_b: usize,
    /// Area of the planar face.
    pub area: f64,
    /// Length of the face boundary lying on the sphere surfaces.
    pub arc_length: f64,
    /// Distance between the two centers.
    pub distance: f64,
    /// Signed solid angle of the face seen from center `a`.
    pub solid_angle_a: f64,
    /// Signed solid angle of the face seen from center `b`.
    pub solid_angle_b: f64,
    pub pyramid_volume_a: f64,
    pub pyramid_volume_b: f64,
    /// Whether the face contains the foot of the center-to-center line.
    pub central: bool,
}

impl Contact {
    /// Area of the surface patch of ball `a` (radius `r_a`, probe included)
    /// that the face covers.
    #[must_use]
    pub fn patch_area_a(&self, r_a: f64) -> f64 {
        self.solid_angle_a * r_a * r_a
    }

    #[must_use]
    pub fn patch_area_b(&self, r_b: f64) -> f64 {
        self.solid_angle_b * r_b * r_b
    }
}

/// How a cell is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellBoundary {
    /// Closed by contact faces and the exposed sphere surface.
    Bounded,
    /// No neighbor bounds the cell.
    Unbounded,
    /// The ball lies inside another ball (or duplicates it) and owns no space.
    Hidden { by: usize },
    /// An internal consistency check failed for this ball.
    Inconsistent,
}

/// Per-ball cell record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub index: usize,
    /// Exposed (solvent accessible) surface area.
    pub sas_area: f64,
    /// Volume of the cell within the probe-inflated sphere.
    pub volume: f64,
    pub included: bool,
    pub boundary: CellBoundary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<CellIssue>,
}

/// Aggregate numbers of one run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TessellationSummary {
    pub balls: usize,
    pub contacts: usize,
    pub included_cells: usize,
    pub hidden_cells: usize,
    pub inconsistent_cells: usize,
    pub total_contact_area: f64,
    pub total_arc_length: f64,
    pub total_sas_area: f64,
    pub total_volume: f64,
}

/// Tessellation result containing contacts and cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TessellationResult {
    /// Sorted by `index_a`, then `index_b`, with `index_a < index_b`.
    pub contacts: Vec<Contact>,
    /// One per input ball, in input order.
    pub cells: Vec<Cell>,
}

impl TessellationResult {
    #[must_use]
    pub fn total_contact_area(&self) -> f64 {
        self.contacts.iter().map(|c| c.area).sum()
    }

    #[must_use]
    pub fn total_arc_length(&self) -> f64 {
        self.contacts.iter().map(|c| c.arc_length).sum()
    }

    #[must_use]
    pub fn total_sas_area(&self) -> f64 {
        self.cells.iter().map(|c| c.sas_area).sum()
    }

    /// Sum of volumes of included cells.
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.cells
            .iter()
            .filter(|c| c.included)
            .map(|c| c.volume)
            .sum()
    }

    #[must_use]
    pub fn sas_areas(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.sas_area).collect()
    }

    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.volume).collect()
    }

    /// Contact between `i` and `j` in either order, if present.
    #[must_use]
    pub fn contact(&self, i: usize, j: usize) -> Option<&Contact> {
        let key = (i.min(j), i.max(j));
        self.contacts
            .binary_search_by(|c| (c.index_a, c.index_b).cmp(&key))
            .ok()
            .map(|pos| &self.contacts[pos])
    }

    /// Contacts that involve ball `i`.
    pub fn contacts_of(&self, i: usize) -> impl Iterator<Item = &Contact> + '_ {
        self.contacts
            .iter()
            .filter(move |c| c.index_a == i || c.index_b == i)
    }

    #[must_use]
    pub fn summary(&self) -> TessellationSummary {
        let count = |pred: fn(&Cell) -> bool| self.cells.iter().filter(|c| pred(c)).count();
        TessellationSummary {
            balls: self.cells.len(),
            contacts: self.contacts.len(),
            included_cells: count(|c| c.included),
            hidden_cells: count(|c| matches!(c.boundary, CellBoundary::Hidden { .. })),
            inconsistent_cells: count(|c| c.boundary == CellBoundary::Inconsistent),
            total_contact_area: self.total_contact_area(),
            total_arc_length: self.total_arc_length(),
            total_sas_area: self.total_sas_area(),
            total_volume: self.total_volume(),
        }
    }
}
