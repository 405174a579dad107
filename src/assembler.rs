use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::{CellIssue, GeometryDefect};
use crate::geometry::Sphere;
use crate::measure::{CellAccumulator, FaceMeasure};
use crate::periodic::ImageSet;
use crate::spatial_index::Occlusion;
use crate::types::{Cell, CellBoundary, Contact, TessellationResult};

/// Outcome of building one face from the side of its owner.
#[derive(Debug, Clone)]
pub struct FaceRecord {
    /// Canonical sphere that computed the face.
    pub owner: usize,
    /// Populated index of the other sphere (an image when periodic).
    pub other: usize,
    pub outcome: Result<Option<FaceMeasure>, GeometryDefect>,
}

/// Turns face records into the public result.
///
/// Canonical pairs are owned by their lower index and feed both cells.
/// Faces to periodic images feed only their owner; the face is reported as
/// a contact once, from the side of the lower canonical index, and faces
/// between the same canonical pair through different images are summed.
/// Faces inside one group still shape both cells but are not reported.
pub struct Assembler<'a> {
    spheres: &'a [Sphere],
    occlusions: &'a [Option<Occlusion>],
    images: ImageSet,
    groups: Option<&'a [i32]>,
}

impl<'a> Assembler<'a> {
    /// `spheres` are the canonical (probe-inflated) spheres.
    pub const fn new(spheres: &'a [Sphere], occlusions: &'a [Option<Occlusion>]) -> Self {
        Self {
            spheres,
            occlusions,
            images: ImageSet::new(spheres.len()),
            groups: None,
        }
    }

    /// One group id per canonical sphere.
    #[must_use]
    pub const fn with_groups(mut self, groups: Option<&'a [i32]>) -> Self {
        self.groups = groups;
        self
    }

    const fn canonical(&self, index: usize) -> usize {
        self.images.canonical_of(index)
    }

    fn separated(&self, a: usize, b: usize) -> bool {
        self.groups.is_none_or(|g| g[a] != g[b])
    }

    /// First sphere up the occlusion chain from `by` that is not hidden.
    fn visible_container(&self, by: usize) -> usize {
        let mut by = self.canonical(by);
        for _ in 0..self.spheres.len() {
            match self.occlusions[by] {
                Some(Occlusion::Inside(next) | Occlusion::Duplicate(next)) => {
                    by = self.canonical(next);
                }
                None => break,
            }
        }
        by
    }

    pub fn assemble(&self, faces: &[FaceRecord]) -> TessellationResult {
        let n = self.spheres.len();

        let mut issues: Vec<Option<CellIssue>> = vec![None; n];
        for face in faces {
            if let Err(defect) = face.outcome {
                let other = self.canonical(face.other);
                warn!("cell {} is inconsistent at face with {other}: {defect}", face.owner);
                issues[face.owner].get_or_insert(CellIssue::inconsistent(other, defect));
            }
        }

        let mut accumulators = vec![CellAccumulator::default(); n];
        let mut contacts: BTreeMap<(usize, usize), Contact> = BTreeMap::new();

        for face in faces {
            let Ok(Some(m)) = face.outcome else {
                continue;
            };
            let (a, b) = (face.owner, self.canonical(face.other));
            if issues[a].is_some() || issues[b].is_some() {
                continue;
            }
            accumulators[a].add(m.solid_angle_a, m.pyramid_volume_a, m.arc_length);
            let image = self.images.image_of(face.other) != 0;
            if !image {
                accumulators[b].add(m.solid_angle_b, m.pyramid_volume_b, m.arc_length);
            }
            if !self.separated(a, b) {
                continue;
            }
            if a < b {
                merge_contact(&mut contacts, a, b, &m);
            } else if a > b && !image {
                merge_contact(&mut contacts, b, a, &m.swapped());
            }
        }

        let contacts: Vec<Contact> = contacts.into_values().collect();
        let cells: Vec<Cell> = (0..n)
            .map(|i| self.cell(i, &accumulators[i], issues[i].take()))
            .collect();

        debug!(
            "assembled {} contacts from {} faces over {n} cells",
            contacts.len(),
            faces.len()
        );
        TessellationResult { contacts, cells }
    }

    fn cell(&self, index: usize, acc: &CellAccumulator, issue: Option<CellIssue>) -> Cell {
        let empty = |boundary, issue| Cell {
            index,
            sas_area: 0.0,
            volume: 0.0,
            included: false,
            boundary,
            issue,
        };

        match self.occlusions[index] {
            Some(Occlusion::Inside(by)) => {
                return empty(CellBoundary::Hidden { by: self.visible_container(by) }, None);
            }
            Some(Occlusion::Duplicate(twin)) => {
                return empty(
                    CellBoundary::Hidden { by: self.visible_container(twin) },
                    Some(CellIssue::Duplicate { of: self.canonical(twin) }),
                );
            }
            None => {}
        }
        if issue.is_some() {
            return empty(CellBoundary::Inconsistent, issue);
        }

        let sphere = &self.spheres[index];
        if acc.is_empty() {
            return Cell {
                sas_area: sphere.surface_area(),
                ..empty(CellBoundary::Unbounded, None)
            };
        }
        let measure = acc.finish(sphere);
        Cell {
            index,
            sas_area: measure.sas_area.max(0.0),
            volume: measure.volume.max(0.0),
            included: true,
            boundary: CellBoundary::Bounded,
            issue: None,
        }
    }
}

fn merge_contact(
    contacts: &mut BTreeMap<(usize, usize), Contact>,
    a: usize,
    b: usize,
    m: &FaceMeasure,
) {
    contacts
        .entry((a, b))
        .and_modify(|c| {
            c.area += m.area;
            c.arc_length += m.arc_length;
            c.distance = c.distance.min(m.distance);
            c.solid_angle_a += m.solid_angle_a;
            c.solid_angle_b += m.solid_angle_b;
            c.pyramid_volume_a += m.pyramid_volume_a;
            c.pyramid_volume_b += m.pyramid_volume_b;
            c.central |= m.central;
        })
        .or_insert_with(|| Contact {
            index_a: a,
            index_b: b,
            area: m.area,
            arc_length: m.arc_length,
            distance: m.distance,
            solid_angle_a: m.solid_angle_a,
            solid_angle_b: m.solid_angle_b,
            pyramid_volume_a: m.pyramid_volume_a,
            pyramid_volume_b: m.pyramid_volume_b,
            central: m.central,
        });
}
