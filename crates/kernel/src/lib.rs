//! Sampling kernel: lattice packing, pose transforms and trilinear lookup.
//!
//! Everything here is pure math shared by every backend.
//!
//! # Invariants
//! - The lattice is packed once per configuration and never changes.
//! - Lattice point `o` always maps to raster cell `o` and cube element `o`.

pub mod lattice;
pub mod transform;
pub mod trilinear;

pub use lattice::Lattice;
pub use transform::sample_transform;
pub use trilinear::{quantize, sample_trilinear};

pub fn crate_info() -> &'static str {
    "volsampler-kernel v0.1.0"
}
