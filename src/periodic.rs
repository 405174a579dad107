//! Periodic boundary conditions.
//!
//! Every input sphere is replicated into the 26 neighbouring copies of the
//! box. Image `g` of sphere `i` is stored at `g * n + i`, with `g == 0`
//! being the sphere itself, so the canonical sphere of any populated index
//! is `index % n`.

use nalgebra::Vector3;

use crate::error::{Result, TessellationError};
use crate::geometry::{EPSILON, Sphere};
use crate::types::PeriodicBox;

pub const IMAGE_COUNT: usize = 27;

/// Lattice step of each image; entry 0 is the identity.
const fn lattice_steps() -> [[i8; 3]; IMAGE_COUNT] {
    let mut steps = [[0_i8; 3]; IMAGE_COUNT];
    let mut g = 1;
    let mut sx = -1;
    while sx <= 1 {
        let mut sy = -1;
        while sy <= 1 {
            let mut sz = -1;
            while sz <= 1 {
                if sx != 0 || sy != 0 || sz != 0 {
                    steps[g] = [sx, sy, sz];
                    g += 1;
                }
                sz += 1;
            }
            sy += 1;
        }
        sx += 1;
    }
    steps
}

const STEPS: [[i8; 3]; IMAGE_COUNT] = lattice_steps();

impl PeriodicBox {
    /// Rejects boxes whose shifts are non-finite, vanishing or coplanar.
    pub fn validate(&self) -> Result<()> {
        let shifts = [&self.shift_a, &self.shift_b, &self.shift_c];
        if shifts.iter().any(|v| v.iter().any(|c| !c.is_finite())) {
            return Err(TessellationError::InvalidPeriodicBox {
                reason: "shift vectors must be finite".into(),
            });
        }
        if shifts.iter().any(|v| v.norm() <= EPSILON) {
            return Err(TessellationError::InvalidPeriodicBox {
                reason: "shift vectors must have non-zero length".into(),
            });
        }
        if self.volume() <= EPSILON {
            return Err(TessellationError::InvalidPeriodicBox {
                reason: "shift vectors must not be coplanar".into(),
            });
        }
        Ok(())
    }

    pub fn volume(&self) -> f64 {
        self.shift_a.dot(&self.shift_b.cross(&self.shift_c)).abs()
    }

    /// Smallest distance between opposite box faces.
    pub fn min_width(&self) -> f64 {
        let volume = self.volume();
        [
            self.shift_b.cross(&self.shift_c).norm(),
            self.shift_c.cross(&self.shift_a).norm(),
            self.shift_a.cross(&self.shift_b).norm(),
        ]
        .into_iter()
        .map(|face| volume / face)
        .fold(f64::INFINITY, f64::min)
    }

    fn translation(&self, g: usize) -> Vector3<f64> {
        let [sx, sy, sz] = STEPS[g];
        self.shift_a * f64::from(sx) + self.shift_b * f64::from(sy) + self.shift_c * f64::from(sz)
    }
}

/// Index arithmetic over a populated sphere set.
#[derive(Debug, Clone, Copy)]
pub struct ImageSet {
    canonical: usize,
}

impl ImageSet {
    pub const fn new(canonical: usize) -> Self {
        Self { canonical }
    }

    /// The 27 copies of `spheres`, canonical ones first.
    pub fn populate(&self, spheres: &[Sphere], pbox: &PeriodicBox) -> Vec<Sphere> {
        debug_assert_eq!(spheres.len(), self.canonical);
        (0..IMAGE_COUNT)
            .flat_map(|g| {
                let t = pbox.translation(g);
                spheres.iter().map(move |s| Sphere::new(s.center + t, s.r))
            })
            .collect()
    }

    #[inline]
    pub const fn canonical_of(&self, index: usize) -> usize {
        index % self.canonical
    }

    #[inline]
    pub const fn image_of(&self, index: usize) -> usize {
        index / self.canonical
    }
}
