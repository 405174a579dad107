use log::{debug, info, warn};
use rayon::prelude::*;

use crate::assembler::{Assembler, FaceRecord};
use crate::clipper::clip_face;
use crate::error::{GeometryDefect, Result, TessellationError};
use crate::geometry::Sphere;
use crate::measure::{FaceMeasure, measure_face};
use crate::periodic::ImageSet;
use crate::power_diagram::{PowerCell, build_power_cells};
use crate::spatial_index::{Neighborhood, Occlusion, SpatialIndex};
use crate::types::{Ball, TessellationParameters, TessellationResult};

/// Main entry point: compute radical tessellation contacts and cells.
///
/// Contacts come sorted by `(index_a, index_b)` with `index_a < index_b`;
/// there is one cell per ball, in input order.
///
/// # Errors
///
/// Fails before any geometry work when the input is empty, a ball or the
/// probe is not finite, a radius is negative, the grouping does not match
/// the balls, or the periodic box is degenerate. Geometric problems inside one cell are reported on that
/// cell instead.
pub fn compute_tessellation(
    balls: &[Ball],
    params: &TessellationParameters,
) -> Result<TessellationResult> {
    validate(balls, params)?;
    let prepared = Prepared::new(balls, params);

    let faces: Vec<FaceRecord> = prepared
        .face_tasks()
        .into_par_iter()
        .map(|(a, b)| FaceRecord {
            owner: a,
            other: b,
            outcome: face_between(&prepared.populated, &prepared.cells[a], b),
        })
        .collect();
    debug!("built {} faces", faces.len());

    let result = Assembler::new(&prepared.canonical, &prepared.occlusions)
        .with_groups(params.grouping.as_deref())
        .assemble(&faces);
    info!(
        "Tessellated {} balls: {} contacts, total SAS area {:.4}, total volume {:.4}",
        balls.len(),
        result.contacts.len(),
        result.total_sas_area(),
        result.total_volume()
    );
    Ok(result)
}

fn validate(balls: &[Ball], params: &TessellationParameters) -> Result<()> {
    if balls.is_empty() {
        return Err(TessellationError::EmptyInput);
    }
    if !params.probe.is_finite() || params.probe < 0.0 {
        return Err(TessellationError::InvalidProbe(params.probe));
    }
    for (index, ball) in balls.iter().enumerate() {
        if ![ball.x, ball.y, ball.z, ball.r].iter().all(|v| v.is_finite()) {
            return Err(TessellationError::InvalidBall {
                index,
                reason: "coordinates and radius must be finite".into(),
            });
        }
        if ball.r < 0.0 {
            return Err(TessellationError::InvalidBall {
                index,
                reason: format!("negative radius {}", ball.r),
            });
        }
    }
    if let Some(groups) = &params.grouping
        && groups.len() != balls.len()
    {
        return Err(TessellationError::GroupingMismatch {
            expected: balls.len(),
            found: groups.len(),
        });
    }
    if let Some(pbox) = &params.periodic_box {
        pbox.validate()?;
        let widest = balls.iter().map(|b| b.r + params.probe).fold(0.0, f64::max);
        if pbox.min_width() < 2.0 * widest {
            warn!(
                "periodic box width {:.3} is below the largest sphere diameter {:.3}",
                pbox.min_width(),
                2.0 * widest
            );
        }
    }
    Ok(())
}

/// Everything computed before faces are built.
struct Prepared {
    canonical: Vec<Sphere>,
    populated: Vec<Sphere>,
    occlusions: Vec<Option<Occlusion>>,
    cells: Vec<PowerCell>,
}

impl Prepared {
    fn new(balls: &[Ball], params: &TessellationParameters) -> Self {
        let canonical: Vec<Sphere> = balls.iter().map(|b| b.inflate(params.probe)).collect();
        let n = canonical.len();
        let images = ImageSet::new(n);
        let populated = match &params.periodic_box {
            Some(pbox) => images.populate(&canonical, pbox),
            None => canonical.clone(),
        };

        let index = SpatialIndex::new(&populated, images);
        debug!(
            "indexed {} spheres into {} buckets",
            populated.len(),
            index.bucket_count()
        );

        let hoods: Vec<Neighborhood> = (0..n).into_par_iter().map(|i| index.query(i)).collect();
        let occlusions: Vec<Option<Occlusion>> = hoods.iter().map(|h| h.occluded_by).collect();
        let hidden = occlusions.iter().filter(|o| o.is_some()).count();
        if hidden > 0 {
            debug!("{hidden} spheres are hidden");
        }

        let cells = build_power_cells(&populated, &hoods, |j| occlusions[j % n].is_some());
        Self {
            canonical,
            populated,
            occlusions,
            cells,
        }
    }

    /// Pairs `(owner, other)` to build: canonical pairs once from the lower
    /// index, image pairs from every canonical side.
    fn face_tasks(&self) -> Vec<(usize, usize)> {
        let n = self.canonical.len();
        self.cells
            .iter()
            .flat_map(|cell| cell.planes.iter().map(move |p| (cell.index, p.neighbor)))
            .filter(|&(a, b)| b >= n || a < b)
            .collect()
    }
}

fn face_between(
    spheres: &[Sphere],
    cell: &PowerCell,
    b: usize,
) -> std::result::Result<Option<FaceMeasure>, GeometryDefect> {
    let Some(face) = clip_face(spheres, cell, b)? else {
        return Ok(None);
    };
    measure_face(&spheres[cell.index], &spheres[b], &face)
}
