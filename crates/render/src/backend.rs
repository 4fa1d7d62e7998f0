use glam::{Mat4, Vec3};
use volsampler_common::{SamplerConfig, SamplerError, SamplerResult};
use volsampler_kernel::{Lattice, quantize, sample_trilinear};

/// Backend-agnostic sampling interface. All backends implement this trait.
///
/// The facade validates sizes, thread affinity and poses before calling in,
/// so implementations may assume `volume` is `volume_len()` bytes and `out`
/// is `cube_len()` bytes.
pub trait SampleBackend {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Replace the whole volume.
    fn load_volume(&mut self, volume: &[u8]) -> SamplerResult<()>;

    /// Sample every lattice point through `transform` and write the cube into
    /// `out` in lattice order.
    fn sample_into(&mut self, transform: &Mat4, out: &mut [u8]) -> SamplerResult<()>;

    /// Release every resource held by the backend. Called once, either by
    /// `Resampler::destroy` or when the resampler is dropped.
    fn release(&mut self) {}
}

/// CPU backend running the same lattice, transform and trilinear math as the
/// hardware pipeline, directly against an in-memory volume.
///
/// Needs no graphics device, which makes it the reference for tests and the
/// fallback on machines without an adapter.
#[derive(Debug)]
pub struct SoftwareBackend {
    volume_size: u32,
    lattice: Lattice,
    volume: Vec<u8>,
}

impl SoftwareBackend {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            volume_size: config.volume_size,
            lattice: Lattice::build(config),
            volume: Vec::new(),
        }
    }
}

impl SampleBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn load_volume(&mut self, volume: &[u8]) -> SamplerResult<()> {
        self.volume.clear();
        self.volume.extend_from_slice(volume);
        Ok(())
    }

    fn sample_into(&mut self, transform: &Mat4, out: &mut [u8]) -> SamplerResult<()> {
        if self.volume.is_empty() {
            return Err(SamplerError::NoVolumeLoaded);
        }
        for (dst, local) in out.iter_mut().zip(self.lattice.local_coords()) {
            let coord = transform.transform_point3(Vec3::from_array(*local));
            *dst = quantize(sample_trilinear(&self.volume, self.volume_size, coord));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.volume = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_before_load_fails() {
        let config = SamplerConfig::new(4, 4, 8);
        let mut backend = SoftwareBackend::new(&config);
        let mut out = vec![0u8; config.cube_len()];
        let err = backend.sample_into(&Mat4::IDENTITY, &mut out).unwrap_err();
        assert!(matches!(err, SamplerError::NoVolumeLoaded));
    }

    #[test]
    fn identity_matrix_on_constant_volume() {
        let config = SamplerConfig::new(4, 4, 8);
        let mut backend = SoftwareBackend::new(&config);
        let volume = vec![40u8; config.volume_len()];
        backend.load_volume(&volume).unwrap();

        let mut out = vec![0u8; config.cube_len()];
        backend.sample_into(&Mat4::IDENTITY, &mut out).unwrap();
        assert!(out.iter().all(|&v| v == 40));
    }

    #[test]
    fn release_drops_volume() {
        let config = SamplerConfig::new(4, 4, 8);
        let mut backend = SoftwareBackend::new(&config);
        backend.load_volume(&vec![1u8; config.volume_len()]).unwrap();
        backend.release();
        let mut out = vec![0u8; config.cube_len()];
        assert!(backend.sample_into(&Mat4::IDENTITY, &mut out).is_err());
    }
}
