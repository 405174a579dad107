#![allow(dead_code, unused_macros, clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::process::Command;

use radtess::Ball;

/// Approximate equality with context
macro_rules! assert_approx {
    ($actual:expr, $expected:expr, $eps:expr, $($arg:tt)*) => {
        let actual: f64 = $actual;
        let expected: f64 = $expected;
        let diff = (actual - expected).abs();
        assert!(
            diff < $eps,
            "{}: expected {}, got {} (diff={})",
            format!($($arg)*),
            expected,
            actual,
            diff
        );
    };
}

pub fn binary_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_radtess"))
}

pub fn test_data_path(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir).join("tests/data").join(name)
}

/// A larger ball at `(0, 0, 2)` above a ring of 16 small balls.
pub fn ring_17_balls() -> Vec<Ball> {
    vec![
        Ball::new(0.0, 0.0, 2.0, 1.0),
        Ball::new(0.0, 1.0, 0.0, 0.5),
        Ball::new(0.382683, 0.92388, 0.0, 0.5),
        Ball::new(0.707107, 0.707107, 0.0, 0.5),
        Ball::new(0.92388, 0.382683, 0.0, 0.5),
        Ball::new(1.0, 0.0, 0.0, 0.5),
        Ball::new(0.92388, -0.382683, 0.0, 0.5),
        Ball::new(0.707107, -0.707107, 0.0, 0.5),
        Ball::new(0.382683, -0.92388, 0.0, 0.5),
        Ball::new(0.0, -1.0, 0.0, 0.5),
        Ball::new(-0.382683, -0.92388, 0.0, 0.5),
        Ball::new(-0.707107, -0.707107, 0.0, 0.5),
        Ball::new(-0.92388, -0.382683, 0.0, 0.5),
        Ball::new(-1.0, 0.0, 0.0, 0.5),
        Ball::new(-0.92388, 0.382683, 0.0, 0.5),
        Ball::new(-0.707107, 0.707107, 0.0, 0.5),
        Ball::new(-0.382683, 0.92388, 0.0, 0.5),
    ]
}

/// Deterministic pseudo-random cluster of `n` balls packed roughly like atoms.
pub fn jittered_cluster(n: usize, seed: u64) -> Vec<Ball> {
    let mut state = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((state >> 11) as f64) / ((1_u64 << 53) as f64)
    };
    let side = (n as f64).cbrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let (ix, iy, iz) = (i % side, (i / side) % side, i / (side * side));
            Ball::new(
                (next() - 0.5).mul_add(1.2, ix as f64 * 3.0),
                (next() - 0.5).mul_add(1.2, iy as f64 * 3.0),
                (next() - 0.5).mul_add(1.2, iz as f64 * 3.0),
                next().mul_add(0.6, 1.2),
            )
        })
        .collect()
}
