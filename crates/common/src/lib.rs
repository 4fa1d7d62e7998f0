//! Shared types for the volume resampler: sampling geometry, poses and
//! error kinds.
//!
//! # Invariants
//! - `view_size^2 == cube_size^3` and every size is a power of two.
//! - A pose with non-finite components or non-positive scale never reaches a
//!   backend.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CUBE_SIZE, SamplerConfig, VIEW_SIZE, VOLUME_SIZE};
pub use error::{SamplerError, SamplerResult};
pub use types::Pose;

pub fn crate_info() -> &'static str {
    "volsampler-common v0.1.0"
}
