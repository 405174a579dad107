//! Geometric properties of the tessellation that hold for any valid input.

#![allow(clippy::unwrap_used)]

#[macro_use]
mod common;

use std::f64::consts::PI;

use common::{jittered_cluster, ring_17_balls};
use radtess::{
    Ball, CellBoundary, CellIssue, PeriodicBox, TessellationError, TessellationParameters,
    TessellationResult, compute_tessellation,
};

fn run(balls: &[Ball], probe: f64) -> TessellationResult {
    compute_tessellation(balls, &TessellationParameters::new(probe)).unwrap()
}

fn run_periodic(balls: &[Ball], probe: f64, pbox: PeriodicBox) -> TessellationResult {
    let params = TessellationParameters::new(probe).with_periodic_box(pbox);
    compute_tessellation(balls, &params).unwrap()
}

/// Surface of sphere `i` claimed by its contacts.
fn covered_area(result: &TessellationResult, i: usize, radius: f64) -> f64 {
    result
        .contacts_of(i)
        .map(|c| {
            if c.index_a == i {
                c.patch_area_a(radius)
            } else {
                c.patch_area_b(radius)
            }
        })
        .sum()
}

#[test]
fn two_sphere_reference_case() {
    let balls = [Ball::new(0.0, 0.0, 0.0, 1.5), Ball::new(3.0, 0.0, 0.0, 2.0)];
    let result = run(&balls, 0.0);

    // Radical plane at x = (d^2 + ra^2 - rb^2) / 2d.
    let x = 7.25 / 6.0;
    let rho2 = 1.5_f64.mul_add(1.5, -x * x);
    let disc = PI * rho2;

    assert_eq!(result.contacts.len(), 1);
    let c = &result.contacts[0];
    assert_approx!(c.area, disc, 1e-9, "contact area");
    assert_approx!(c.arc_length, 2.0 * PI * rho2.sqrt(), 1e-9, "arc length");
    assert_approx!(c.distance, 3.0, 1e-12, "distance");
    assert!(c.central);

    let (h_a, h_b) = (1.5 - x, 2.0 - (3.0 - x));
    let sas_a = 4.0 * PI * 1.5 * 1.5 - 2.0 * PI * 1.5 * h_a;
    let sas_b = 4.0 * PI * 2.0 * 2.0 - 2.0 * PI * 2.0 * h_b;
    assert_approx!(result.cells[0].sas_area, sas_a, 1e-9, "sas a");
    assert_approx!(result.cells[1].sas_area, sas_b, 1e-9, "sas b");
    assert_approx!(
        result.cells[0].volume,
        sas_a * 1.5 / 3.0 + x * disc / 3.0,
        1e-9,
        "volume a"
    );
    assert_approx!(
        result.cells[1].volume,
        sas_b * 2.0 / 3.0 + (3.0 - x) * disc / 3.0,
        1e-9,
        "volume b"
    );
    assert!(result.cells.iter().all(|cell| cell.boundary == CellBoundary::Bounded));
}

#[test]
fn exposed_and_covered_surface_add_up() {
    for (balls, probe) in [(ring_17_balls(), 1.0), (jittered_cluster(125, 7), 1.4)] {
        let result = run(&balls, probe);
        let mut checked = 0;
        for cell in result.cells.iter().filter(|c| c.included) {
            let radius = balls[cell.index].r + probe;
            let full = 4.0 * PI * radius * radius;
            let covered = covered_area(&result, cell.index, radius);
            // Cells whose centre lies outside their own region do not
            // satisfy the identity.
            if covered <= 1e-6 * full {
                continue;
            }
            assert_approx!(cell.sas_area + covered, full, 1e-6 * full, "cell {}", cell.index);
            checked += 1;
        }
        assert!(checked > balls.len() / 2);
    }
}

#[test]
fn contacts_are_sorted_and_non_negative() {
    let balls = jittered_cluster(216, 3);
    let result = run(&balls, 1.4);

    assert_eq!(result.cells.len(), balls.len());
    assert!(!result.contacts.is_empty());
    for pair in result.contacts.windows(2) {
        assert!((pair[0].index_a, pair[0].index_b) < (pair[1].index_a, pair[1].index_b));
    }
    for c in &result.contacts {
        assert!(c.index_a < c.index_b);
        assert!(c.area > 0.0 && c.arc_length >= 0.0);
    }
    for (i, cell) in result.cells.iter().enumerate() {
        assert_eq!(cell.index, i);
        assert!(cell.sas_area >= 0.0 && cell.volume >= 0.0);
    }
    assert_eq!(result.summary().inconsistent_cells, 0);
}

#[test]
fn input_order_does_not_change_measures() {
    let balls = jittered_cluster(64, 11);
    let n = balls.len();
    let reversed: Vec<Ball> = balls.iter().rev().copied().collect();

    let forward = run(&balls, 1.4);
    let backward = run(&reversed, 1.4);

    assert_eq!(forward.contacts.len(), backward.contacts.len());
    for c in &forward.contacts {
        let mirrored = backward.contact(n - 1 - c.index_a, n - 1 - c.index_b).unwrap();
        assert_approx!(mirrored.area, c.area, 1e-7, "area {}-{}", c.index_a, c.index_b);
        assert_approx!(mirrored.arc_length, c.arc_length, 1e-7, "arc {}-{}", c.index_a, c.index_b);
    }
    for (i, cell) in forward.cells.iter().enumerate() {
        let other = &backward.cells[n - 1 - i];
        assert_approx!(other.sas_area, cell.sas_area, 1e-7, "sas {i}");
        assert_approx!(other.volume, cell.volume, 1e-7, "volume {i}");
    }
}

#[test]
fn isolated_ball_is_unbounded() {
    let mut balls = ring_17_balls();
    balls.push(Ball::new(100.0, 0.0, 0.0, 1.2));
    let result = run(&balls, 1.0);

    assert_eq!(result.contacts_of(17).count(), 0);
    let cell = &result.cells[17];
    assert_eq!(cell.boundary, CellBoundary::Unbounded);
    assert!(!cell.included);
    assert_approx!(cell.sas_area, 4.0 * PI * 2.2 * 2.2, 1e-9, "isolated sas");
    assert_approx!(cell.volume, 0.0, 1e-12, "isolated volume");

    // The rest of the system is unaffected.
    let ring = run(&ring_17_balls(), 1.0);
    assert_eq!(ring.contacts, result.contacts);
}

#[test]
fn repeated_runs_are_identical() {
    let balls = jittered_cluster(125, 5);
    assert_eq!(run(&balls, 1.4), run(&balls, 1.4));
}

#[test]
fn larger_probe_keeps_surface_bound() {
    let balls = ring_17_balls();
    let base = run(&balls, 0.0);
    for probe in [0.5, 1.0, 1.4] {
        let result = run(&balls, probe);
        let new_contact_area = result.total_contact_area() - base.total_contact_area();
        assert!(
            result.total_sas_area() >= base.total_sas_area() - new_contact_area,
            "probe {probe}"
        );
    }
}

/// `(index_a, index_b, area, arc_length)` of the ring at probe 1.0.
#[rustfmt::skip]
const RING_CONTACTS: [(usize, usize, f64, f64); 44] = [
    (0, 1, 0.7477207286, 0.7269069732),
    (0, 2, 0.7477215188, 0.7269096430),
    (0, 3, 0.7477226976, 0.7269104344),
    (0, 4, 0.7477215188, 0.7269096430),
    (0, 5, 0.7477207286, 0.7269069732),
    (0, 6, 0.7477215188, 0.7269096430),
    (0, 7, 0.7477226976, 0.7269104344),
    (0, 8, 0.7477215188, 0.7269096430),
    (0, 9, 0.7477207286, 0.7269069732),
    (0, 10, 0.7477215188, 0.7269096430),
    (0, 11, 0.7477226976, 0.7269104344),
    (0, 12, 0.7477215188, 0.7269096430),
    (0, 13, 0.7477207286, 0.7269069732),
    (0, 14, 0.7477215188, 0.7269096430),
    (0, 15, 0.7477226976, 0.7269104344),
    (0, 16, 0.7477215188, 0.7269096430),
    (1, 2, 5.0216008229, 4.8281733048),
    (1, 3, 0.0000007032, 0.0000006377),
    (1, 5, 0.0000015114, 0.0000012501),
    (1, 13, 0.0000015114, 0.0000012501),
    (1, 15, 0.0000007032, 0.0000006377),
    (1, 16, 5.0216008229, 4.8281733048),
    (2, 3, 5.0216002003, 4.8281729809),
    (3, 4, 5.0216002003, 4.8281729809),
    (3, 5, 0.0000007032, 0.0000006377),
    (4, 5, 5.0216008229, 4.8281733048),
    (5, 6, 5.0216008229, 4.8281733048),
    (5, 7, 0.0000007032, 0.0000006377),
    (5, 9, 0.0000015114, 0.0000012501),
    (6, 7, 5.0216002003, 4.8281729809),
    (7, 8, 5.0216002003, 4.8281729809),
    (7, 9, 0.0000007032, 0.0000006377),
    (8, 9, 5.0216008229, 4.8281733048),
    (9, 10, 5.0216008229, 4.8281733048),
    (9, 11, 0.0000007032, 0.0000006377),
    (9, 13, 0.0000015114, 0.0000012501),
    (10, 11, 5.0216002003, 4.8281729809),
    (11, 12, 5.0216002003, 4.8281729809),
    (11, 13, 0.0000007032, 0.0000006377),
    (12, 13, 5.0216008229, 4.8281733048),
    (13, 14, 5.0216008229, 4.8281733048),
    (13, 15, 0.0000007032, 0.0000006377),
    (14, 15, 5.0216002003, 4.8281729809),
    (15, 16, 5.0216002003, 4.8281729809),
];

/// `(sas_area, volume)` of the ring cells at probe 1.0.
#[rustfmt::skip]
const RING_CELLS: [(f64, f64); 17] = [
    (34.816791932, 29.230237644),
    (3.291951877, 2.480214840),
    (3.291963643, 2.480221002),
    (3.291967397, 2.480224307),
    (3.291963643, 2.480221002),
    (3.291951877, 2.480214840),
    (3.291963643, 2.480221002),
    (3.291967397, 2.480224307),
    (3.291963643, 2.480221002),
    (3.291951877, 2.480214840),
    (3.291963643, 2.480221002),
    (3.291967397, 2.480224307),
    (3.291963643, 2.480221002),
    (3.291951877, 2.480214840),
    (3.291963643, 2.480221002),
    (3.291967397, 2.480224307),
    (3.291963643, 2.480221002),
];

#[test]
fn ring_contact_structure() {
    let result = run(&ring_17_balls(), 1.0);

    assert_eq!(result.contacts.len(), 44);
    assert_eq!(result.contacts_of(0).count(), 16);
    for i in 1..=16 {
        let next = if i == 16 { 1 } else { i + 1 };
        assert!(result.contact(i, next).is_some(), "{i}-{next}");
    }
    assert!(result.cells.iter().all(|c| c.included));
}

#[test]
fn ring_matches_recorded_measures() {
    let result = run(&ring_17_balls(), 1.0);

    assert_eq!(result.contacts.len(), RING_CONTACTS.len());
    for (c, &(a, b, area, arc)) in result.contacts.iter().zip(&RING_CONTACTS) {
        assert_eq!((c.index_a, c.index_b), (a, b));
        assert_approx!(c.area, area, 1e-6, "area {a}-{b}");
        assert_approx!(c.arc_length, arc, 1e-6, "arc {a}-{b}");
    }
    for (cell, &(sas, volume)) in result.cells.iter().zip(&RING_CELLS) {
        assert_approx!(cell.sas_area, sas, 1e-6, "sas {}", cell.index);
        assert_approx!(cell.volume, volume, 1e-6, "volume {}", cell.index);
    }
}

/// Face discs of a simple cubic lattice with spacing 3 and effective radius 1.6.
fn lattice_face() -> (f64, f64, f64) {
    let (radius, half) = (1.6_f64, 1.5_f64);
    let rho2 = radius.mul_add(radius, -half * half);
    let disc = PI * rho2;
    let sas = 4.0 * PI * radius * radius - 6.0 * 2.0 * PI * radius * (radius - half);
    (disc, rho2.sqrt(), sas)
}

#[test]
fn periodic_lattice_reports_each_pair_once() {
    let mut balls = Vec::new();
    for iz in 0..2 {
        for iy in 0..2 {
            for ix in 0..2 {
                balls.push(Ball::new(
                    f64::from(ix) * 3.0,
                    f64::from(iy) * 3.0,
                    f64::from(iz) * 3.0,
                    1.0,
                ));
            }
        }
    }
    let pbox = PeriodicBox::from_corners((0.0, 0.0, 0.0), (6.0, 6.0, 6.0));
    let result = run_periodic(&balls, 0.6, pbox);
    let (disc, rho, sas) = lattice_face();

    // Each lattice edge of the 2x2x2 block, and each pair meets twice: once
    // directly and once across the box.
    assert_eq!(result.contacts.len(), 12);
    for c in &result.contacts {
        assert!(c.index_a < c.index_b);
        assert_eq!((c.index_a ^ c.index_b).count_ones(), 1);
        assert_approx!(c.area, 2.0 * disc, 1e-9, "area {}-{}", c.index_a, c.index_b);
        assert_approx!(c.arc_length, 4.0 * PI * rho, 1e-9, "arc {}-{}", c.index_a, c.index_b);
        assert_approx!(c.distance, 3.0, 1e-12, "distance");
    }
    for cell in &result.cells {
        assert!(cell.included);
        assert_approx!(cell.sas_area, sas, 1e-9, "sas {}", cell.index);
        assert_approx!(
            cell.volume,
            sas * 1.6 / 3.0 + 6.0 * 1.5 * disc / 3.0,
            1e-9,
            "volume {}",
            cell.index
        );
    }

    // Moving everything by the same vector changes nothing.
    let shifted: Vec<Ball> = balls
        .iter()
        .map(|b| Ball::new(b.x + 0.7, b.y + 0.3, b.z + 1.1, b.r))
        .collect();
    let moved = run_periodic(&shifted, 0.6, pbox);
    for (a, b) in result.cells.iter().zip(&moved.cells) {
        assert_approx!(a.sas_area, b.sas_area, 1e-9, "shifted sas {}", a.index);
    }
}

#[test]
fn ball_touching_its_own_images_has_no_contacts() {
    let pbox = PeriodicBox::from_corners((0.0, 0.0, 0.0), (3.0, 3.0, 3.0));
    let result = run_periodic(&[Ball::new(0.0, 0.0, 0.0, 1.0)], 0.6, pbox);
    let (_, _, sas) = lattice_face();

    assert!(result.contacts.is_empty());
    let cell = &result.cells[0];
    assert_eq!(cell.boundary, CellBoundary::Bounded);
    assert!(cell.included);
    assert_approx!(cell.sas_area, sas, 1e-9, "self-image sas");
}

#[test]
fn duplicate_and_buried_balls_are_hidden() {
    let balls = [
        Ball::new(0.0, 0.0, 0.0, 1.0),
        Ball::new(0.0, 0.0, 0.0, 1.0),
        Ball::new(0.2, 0.0, 0.0, 0.3),
        Ball::new(2.0, 0.0, 0.0, 1.0),
    ];
    let result = run(&balls, 0.5);

    let pairs: Vec<_> = result.contacts.iter().map(|c| (c.index_a, c.index_b)).collect();
    assert_eq!(pairs, vec![(0, 3)]);

    assert_eq!(result.cells[1].boundary, CellBoundary::Hidden { by: 0 });
    assert_eq!(result.cells[1].issue, Some(CellIssue::Duplicate { of: 0 }));
    assert!(matches!(result.cells[2].boundary, CellBoundary::Hidden { by } if by < 2));
    assert!(result.cells[1..3].iter().all(|c| !c.included && c.volume == 0.0));

    // The survivors see exactly the two-sphere geometry.
    let alone = run(&[balls[0], balls[3]], 0.5);
    assert_approx!(result.contacts[0].area, alone.contacts[0].area, 1e-12, "area");
    assert_approx!(result.cells[0].sas_area, alone.cells[0].sas_area, 1e-12, "sas");
    assert_eq!(result.summary().hidden_cells, 2);
}

#[test]
fn buried_ball_names_the_visible_container() {
    let balls = [
        Ball::new(0.1, 0.0, 0.0, 0.3),
        Ball::new(0.0, 0.0, 0.0, 0.8),
        Ball::new(0.0, 0.0, 0.0, 1.5),
    ];
    let result = run(&balls, 0.5);

    assert_eq!(result.cells[0].boundary, CellBoundary::Hidden { by: 2 });
    assert_eq!(result.cells[1].boundary, CellBoundary::Hidden { by: 2 });
    assert_eq!(result.cells[2].boundary, CellBoundary::Unbounded);
}

#[test]
fn ball_on_an_image_of_another_is_a_duplicate() {
    let pbox = PeriodicBox::from_corners((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
    let balls = [
        Ball::new(0.0, 5.0, 5.0, 1.0),
        Ball::new(10.0, 5.0, 5.0, 1.0),
        Ball::new(1.5, 5.0, 5.0, 1.0),
    ];
    let result = run_periodic(&balls, 0.5, pbox);
    let alone = run_periodic(&[balls[0], balls[2]], 0.5, pbox);

    assert_eq!(result.cells[1].boundary, CellBoundary::Hidden { by: 0 });
    assert_eq!(result.cells[1].issue, Some(CellIssue::Duplicate { of: 0 }));
    let pairs: Vec<_> = result.contacts.iter().map(|c| (c.index_a, c.index_b)).collect();
    assert_eq!(pairs, vec![(0, 2)]);
    assert_approx!(result.contacts[0].area, alone.contacts[0].area, 1e-12, "area");
    assert_approx!(result.total_volume(), alone.total_volume(), 1e-9, "total volume");
    assert_approx!(result.cells[2].sas_area, alone.cells[1].sas_area, 1e-12, "sas");
}

#[test]
fn grouping_keeps_only_contacts_across_groups() {
    let balls = ring_17_balls();
    let mut groups = vec![2; balls.len()];
    groups[0] = 1;
    let params = TessellationParameters::new(1.0).with_grouping(groups);
    let grouped = compute_tessellation(&balls, &params).unwrap();
    let plain = run(&balls, 1.0);

    assert_eq!(grouped.contacts.len(), 16);
    assert!(grouped.contacts.iter().all(|c| c.index_a == 0));
    for c in &grouped.contacts {
        assert_eq!(Some(c), plain.contact(c.index_a, c.index_b));
    }
    assert_eq!(grouped.cells, plain.cells);

    let short = TessellationParameters::new(1.0).with_grouping(vec![1, 2]);
    assert_eq!(
        compute_tessellation(&balls, &short),
        Err(TessellationError::GroupingMismatch { expected: 17, found: 2 })
    );
}

#[test]
fn sparse_input_is_accepted() {
    let balls = [Ball::new(0.0, 0.0, 0.0, 1.0), Ball::new(1e4, 1e4, 1e4, 1.0)];
    let result = run(&balls, 1.4);

    assert!(result.contacts.is_empty());
    assert!(result.cells.iter().all(|c| c.boundary == CellBoundary::Unbounded));
}

#[test]
fn invalid_input_is_rejected() {
    let ball = [Ball::new(0.0, 0.0, 0.0, 1.0)];
    assert_eq!(
        compute_tessellation(&[], &TessellationParameters::new(1.4)),
        Err(TessellationError::EmptyInput)
    );
    assert!(matches!(
        compute_tessellation(&ball, &TessellationParameters::new(f64::NAN)),
        Err(TessellationError::InvalidProbe(_))
    ));
    assert!(matches!(
        compute_tessellation(&[ball[0], Ball::new(1.0, f64::INFINITY, 0.0, 1.0)], &TessellationParameters::new(1.4)),
        Err(TessellationError::InvalidBall { index: 1, .. })
    ));
    let flat = PeriodicBox::from_corners((0.0, 0.0, 0.0), (10.0, 10.0, 0.0));
    assert!(matches!(
        compute_tessellation(&ball, &TessellationParameters::new(1.4).with_periodic_box(flat)),
        Err(TessellationError::InvalidPeriodicBox { .. })
    ));
}
