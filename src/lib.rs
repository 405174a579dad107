//! Radical (power) Voronoi tessellation of weighted spheres.
//!
//! Every ball is inflated by a solvent probe radius and the space is split
//! into power cells bounded by radical planes. The library reports the
//! contact face between every pair of neighbouring cells, constrained to the
//! inflated spheres, and the solvent-accessible surface (SAS) area and
//! volume of each cell. Optional periodic boundary conditions replicate the
//! balls into the 26 neighbouring copies of a box.
//!
//! # Example
//!
//! ```
//! use radtess::{Ball, TessellationParameters, compute_tessellation};
//!
//! let balls = vec![
//!     Ball::new(0.0, 0.0, 0.0, 1.5),
//!     Ball::new(3.0, 0.0, 0.0, 1.5),
//!     Ball::new(1.5, 2.5, 0.0, 1.5),
//! ];
//!
//! let result = compute_tessellation(&balls, &TessellationParameters::new(1.4))?;
//!
//! for contact in &result.contacts {
//!     println!("Contact {}-{}: area={:.2}", contact.index_a, contact.index_b, contact.area);
//! }
//!
//! for cell in &result.cells {
//!     println!("Cell {}: SAS area={:.2}, volume={:.2}", cell.index, cell.sas_area, cell.volume);
//! }
//! # Ok::<(), radtess::TessellationError>(())
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod assembler;
mod clipper;
mod error;
mod geometry;
mod measure;
mod periodic;
mod power_diagram;
mod spatial_index;
mod tessellation;
mod types;

pub mod input;

pub use error::{CellIssue, Result, TessellationError};
pub use tessellation::compute_tessellation;
pub use types::{
    Ball, Cell, CellBoundary, Contact, PeriodicBox, TessellationParameters, TessellationResult,
    TessellationSummary,
};
