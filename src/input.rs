// Copyright (c) 2026 Kliment Olechnovic and Mikael Lund
// Part of the radtess project, licensed under the MIT License.
// SPDX-License-Identifier: MIT

//! XYZR input: one ball per line, taken from the last four numeric columns.
//!
//! Leading columns (atom names, serial numbers) are ignored, as are blank
//! lines, `#` comments and lines whose last four columns are not numbers.
//!
//! Group files hold one integer id per ball, separated by whitespace.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::Ball;

fn parse_line(line: &str) -> Option<Ball> {
    let mut parts = line.split_whitespace().rev();
    let r: f64 = parts.next()?.parse().ok()?;
    let z: f64 = parts.next()?.parse().ok()?;
    let y: f64 = parts.next()?.parse().ok()?;
    let x: f64 = parts.next()?.parse().ok()?;
    Some(Ball::new(x, y, z, r))
}

/// Reads balls from `reader`.
///
/// # Errors
/// Returns the underlying I/O error if a line cannot be read.
pub fn read_xyzr<R: BufRead>(reader: R) -> io::Result<Vec<Ball>> {
    let mut balls = Vec::new();
    let mut skipped = 0_usize;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_line(trimmed) {
            Some(ball) => balls.push(ball),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {skipped} lines without four trailing numbers");
    }
    Ok(balls)
}

/// Reads balls from an XYZR file.
///
/// # Errors
/// Returns error if the file cannot be opened or read.
pub fn read_xyzr_file(path: &Path) -> io::Result<Vec<Ball>> {
    let balls = read_xyzr(BufReader::new(File::open(path)?))?;
    info!("Read {} balls from {}", balls.len(), path.display());
    Ok(balls)
}

/// Reads whitespace-separated group ids, skipping `#` comment lines.
///
/// # Errors
/// Returns `InvalidData` for a token that is not an integer, or the
/// underlying I/O error.
pub fn read_groups<R: BufRead>(reader: R) -> io::Result<Vec<i32>> {
    let mut groups = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim_start().starts_with('#') {
            continue;
        }
        for token in line.split_whitespace() {
            let id = token.parse::<i32>().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: group id '{token}' is not an integer", number + 1),
                )
            })?;
            groups.push(id);
        }
    }
    Ok(groups)
}

/// Reads group ids from a file.
///
/// # Errors
/// Returns error if the file cannot be opened, read or parsed.
pub fn read_groups_file(path: &Path) -> io::Result<Vec<i32>> {
    let groups = read_groups(BufReader::new(File::open(path)?))?;
    debug!("Read {} group ids from {}", groups.len(), path.display());
    Ok(groups)
}
