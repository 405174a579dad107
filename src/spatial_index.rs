use std::cmp::Ordering;
use std::collections::HashMap;

use crate::geometry::Sphere;
use crate::periodic::ImageSet;

/// Integer coordinates of a grid bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BucketKey {
    x: i64,
    y: i64,
    z: i64,
}

impl BucketKey {
    #[allow(clippy::cast_possible_truncation)]
    fn of(s: &Sphere, cell_size: f64) -> Self {
        Self {
            x: (s.center.x / cell_size).floor() as i64,
            y: (s.center.y / cell_size).floor() as i64,
            z: (s.center.z / cell_size).floor() as i64,
        }
    }

    const fn shifted(self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

/// Bucket edge is at least one effective diameter so overlapping spheres
/// always fall into adjacent buckets.
fn bucket_size(spheres: &[Sphere]) -> f64 {
    spheres
        .iter()
        .fold(1.0_f64, |size, s| size.max(s.r.mul_add(2.0, 0.25)))
}

/// An overlapping sphere, keyed by the distance from the query centre to
/// the radical plane they share.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub offset: f64,
    pub index: usize,
}

impl Neighbor {
    /// Ascending `(offset, index)`; total over all floats so sorting never panics.
    pub fn order(&self, other: &Self) -> Ordering {
        self.offset
            .total_cmp(&other.offset)
            .then(self.index.cmp(&other.index))
    }
}

/// Why a sphere owns no space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occlusion {
    /// Lies inside a larger sphere.
    Inside(usize),
    /// Identical to a sphere that comes earlier in the input.
    Duplicate(usize),
}

/// Result of querying one sphere.
#[derive(Debug, Clone, Default)]
pub struct Neighborhood {
    /// Sorted by [`Neighbor::order`].
    pub neighbors: Vec<Neighbor>,
    pub occluded_by: Option<Occlusion>,
}

/// Uniform grid over a fixed set of spheres. Only occupied buckets are
/// stored, so memory follows the sphere count rather than the extent.
pub struct SpatialIndex<'a> {
    spheres: &'a [Sphere],
    images: ImageSet,
    cell_size: f64,
    buckets: HashMap<BucketKey, Vec<usize>>,
}

impl<'a> SpatialIndex<'a> {
    /// `images` maps populated indices back to input order; duplicates are
    /// resolved on those canonical indices.
    pub fn new(spheres: &'a [Sphere], images: ImageSet) -> Self {
        let cell_size = bucket_size(spheres);
        let mut buckets: HashMap<BucketKey, Vec<usize>> = HashMap::new();
        for (i, s) in spheres.iter().enumerate() {
            buckets.entry(BucketKey::of(s, cell_size)).or_default().push(i);
        }
        Self {
            spheres,
            images,
            cell_size,
            buckets,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Every sphere strictly overlapping sphere `id`, except those `id`
    /// contains. Stops early when `id` itself is hidden by a neighbour.
    /// `id` must be a canonical index.
    pub fn query(&self, id: usize) -> Neighborhood {
        let mut found = Neighborhood::default();
        let Some(central) = self.spheres.get(id) else {
            return found;
        };
        let home = BucketKey::of(central, self.cell_size);

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let Some(bucket) = self.buckets.get(&home.shifted(dx, dy, dz)) else {
                        continue;
                    };
                    for &other in bucket {
                        if other == id {
                            continue;
                        }
                        let candidate = &self.spheres[other];
                        if !central.intersects(candidate) {
                            continue;
                        }
                        if candidate.contains(central) {
                            if !candidate.coincides_with(central) {
                                found.neighbors.clear();
                                found.occluded_by = Some(Occlusion::Inside(other));
                                return found;
                            }
                            if self.images.canonical_of(other) < id {
                                found.neighbors.clear();
                                found.occluded_by = Some(Occlusion::Duplicate(other));
                                return found;
                            }
                        }
                        if central.contains(candidate) {
                            continue;
                        }
                        found.neighbors.push(Neighbor {
                            offset: central.radical_offset(candidate),
                            index: other,
                        });
                    }
                }
            }
        }

        found.neighbors.sort_by(Neighbor::order);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_only_overlapping_spheres() {
        let spheres = [
            Sphere::at(0.0, 0.0, 0.0, 1.0),
            Sphere::at(1.5, 0.0, 0.0, 1.0),
            Sphere::at(5.0, 0.0, 0.0, 1.0),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        let hood = index.query(0);
        assert_eq!(hood.neighbors.len(), 1);
        assert_eq!(hood.neighbors[0].index, 1);
        assert!(hood.occluded_by.is_none());
        assert!(index.query(2).neighbors.is_empty());
    }

    #[test]
    fn neighbours_sorted_by_plane_offset() {
        let spheres = [
            Sphere::at(0.0, 0.0, 0.0, 1.0),
            Sphere::at(0.0, 1.8, 0.0, 1.0),
            Sphere::at(1.2, 0.0, 0.0, 1.0),
            Sphere::at(0.0, 0.0, -1.5, 1.0),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        let order: Vec<usize> = index.query(0).neighbors.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn sphere_inside_another_is_occluded() {
        let spheres = [
            Sphere::at(0.0, 0.0, 0.0, 1.0),
            Sphere::at(0.0, 0.0, 0.0, 2.0),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        let hood = index.query(0);
        assert_eq!(hood.occluded_by, Some(Occlusion::Inside(1)));
        assert!(hood.neighbors.is_empty());
        // The container does not list what it contains.
        assert!(index.query(1).neighbors.is_empty());
    }

    #[test]
    fn later_duplicate_is_occluded_by_earlier() {
        let spheres = [
            Sphere::at(1.0, 1.0, 1.0, 1.0),
            Sphere::at(1.0, 1.0, 1.0, 1.0),
            Sphere::at(2.0, 1.0, 1.0, 1.0),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        assert_eq!(index.query(1).occluded_by, Some(Occlusion::Duplicate(0)));
        let first = index.query(0);
        assert!(first.occluded_by.is_none());
        // The earlier twin skips the later one, which it contains.
        assert_eq!(first.neighbors.len(), 1);
        assert_eq!(first.neighbors[0].index, 2);
    }

    #[test]
    fn negative_coordinates_and_sparse_layout() {
        let spheres = [
            Sphere::at(-50.5, -50.0, -50.0, 1.0),
            Sphere::at(-50.0, -50.0, -50.0, 1.0),
            Sphere::at(50.0, 50.0, 50.0, 1.0),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        assert_eq!(index.bucket_count(), 2);
        assert_eq!(index.query(1).neighbors.len(), 1);
        assert!(index.query(2).neighbors.is_empty());
    }

    #[test]
    fn far_apart_spheres_need_no_dense_grid() {
        let spheres = [
            Sphere::at(0.0, 0.0, 0.0, 2.4),
            Sphere::at(1e4, 1e4, 1e4, 2.4),
            Sphere::at(-1e9, 3e8, 1e9, 2.4),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(spheres.len()));
        assert_eq!(index.bucket_count(), 3);
        assert!((0..3).all(|i| index.query(i).neighbors.is_empty()));
    }

    #[test]
    fn image_twin_hides_the_later_canonical_sphere() {
        // Canonical sphere 1 sits exactly on the image of sphere 0 shifted
        // by one box length; image `g` of sphere `j` is stored at `g * 2 + j`.
        let spheres = [
            Sphere::at(0.0, 5.0, 5.0, 1.5),
            Sphere::at(10.0, 5.0, 5.0, 1.5),
            Sphere::at(10.0, 5.0, 5.0, 1.5),
            Sphere::at(0.0, 5.0, 5.0, 1.5),
        ];
        let index = SpatialIndex::new(&spheres, ImageSet::new(2));
        assert_eq!(index.query(1).occluded_by, Some(Occlusion::Duplicate(2)));
        let first = index.query(0);
        assert!(first.occluded_by.is_none());
        assert!(first.neighbors.is_empty());
    }
}
