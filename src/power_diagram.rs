//! Per-sphere sets of bounding radical planes.

use rayon::prelude::*;

use crate::geometry::{Plane, Sphere};
use crate::spatial_index::Neighborhood;

/// Radical plane between a cell's sphere and one neighbour. The normal
/// points towards the neighbour, so the cell lies on the `Below` side.
#[derive(Debug, Clone, Copy)]
pub struct RadicalPlane {
    pub neighbor: usize,
    /// Signed distance of the plane from the cell's centre.
    pub offset: f64,
    pub plane: Plane,
}

impl RadicalPlane {
    pub fn between(a: &Sphere, c: &Sphere, neighbor: usize, offset: f64) -> Self {
        Self {
            neighbor,
            offset,
            plane: Plane::new(a.radical_point(c), &(c.center - a.center)),
        }
    }
}

/// The half-spaces that can bound the cell of sphere `index`, nearest first.
#[derive(Debug, Clone, Default)]
pub struct PowerCell {
    pub index: usize,
    pub planes: Vec<RadicalPlane>,
}

impl PowerCell {
    /// `excluded` tells whether a populated index belongs to a sphere that
    /// owns no space; such spheres never bound anything.
    pub fn build(
        spheres: &[Sphere],
        index: usize,
        hood: &Neighborhood,
        excluded: impl Fn(usize) -> bool,
    ) -> Self {
        if hood.occluded_by.is_some() {
            return Self {
                index,
                planes: Vec::new(),
            };
        }
        let a = &spheres[index];
        let planes = hood
            .neighbors
            .iter()
            .filter(|n| !excluded(n.index))
            .map(|n| RadicalPlane::between(a, &spheres[n.index], n.index, n.offset))
            .collect();
        Self { index, planes }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    #[cfg(test)]
    pub fn plane_to(&self, neighbor: usize) -> Option<&RadicalPlane> {
        self.planes.iter().find(|p| p.neighbor == neighbor)
    }
}

/// One cell per neighbourhood, in order.
pub fn build_power_cells<F>(spheres: &[Sphere], hoods: &[Neighborhood], excluded: F) -> Vec<PowerCell>
where
    F: Fn(usize) -> bool + Sync,
{
    hoods
        .par_iter()
        .enumerate()
        .map(|(i, hood)| PowerCell::build(spheres, i, hood, &excluded))
        .collect()
}
