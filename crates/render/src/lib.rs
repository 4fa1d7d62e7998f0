//! Resampling facade: backend-agnostic interface.
//!
//! # Invariants
//! - Sizes, poses and thread affinity are checked before a backend is called.
//! - A backend never sees a volume or cube of the wrong length.
//!
//! The [`SampleBackend`] trait is the seam between the facade and a device.
//! [`SoftwareBackend`] performs the math on the CPU; the wgpu backend lives in
//! its own crate and plugs in through the same trait.

mod backend;
mod resampler;

pub use backend::{SampleBackend, SoftwareBackend};
pub use resampler::{Resampler, SamplerStats};

pub fn crate_info() -> &'static str {
    "volsampler-render v0.1.0"
}
