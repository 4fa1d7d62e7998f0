//! wgpu backend for the volume resampler.
//!
//! Packs the sampling lattice into a point cloud that tiles a square
//! offscreen target, renders it once per pose and reads the target back as
//! the cube.
//!
//! # Invariants
//! - One point per pixel: the target has exactly `cube_size^3` pixels.
//! - Lattice buffers are uploaded once and never rewritten.
//! - Readback blocks until the device has finished the draw.

mod backend;
mod gpu;
mod program;
mod shaders;
mod target;
mod volume;

pub use backend::WgpuBackend;
pub use gpu::{GpuContext, probe_adapter};
pub use program::{SampleProgram, TARGET_FORMAT};
pub use target::RenderTarget;
pub use volume::VolumeTexture;

use volsampler_common::{SamplerConfig, SamplerResult};
use volsampler_render::Resampler;

/// Resampler over a fresh headless wgpu context.
pub fn gpu_resampler(config: SamplerConfig) -> SamplerResult<Resampler<WgpuBackend>> {
    Resampler::create(config, WgpuBackend::new)
}

pub fn crate_info() -> &'static str {
    "volsampler-render-wgpu v0.1.0"
}
