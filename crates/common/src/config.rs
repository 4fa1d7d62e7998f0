use serde::{Deserialize, Serialize};

use crate::error::SamplerError;

/// Side length of the extracted cube.
pub const CUBE_SIZE: u32 = 64;
/// Side length of the source volume.
pub const VOLUME_SIZE: u32 = 512;
/// Side length of the square render target.
pub const VIEW_SIZE: u32 = 512;

const _: () = {
    assert!(CUBE_SIZE.is_power_of_two());
    assert!(VOLUME_SIZE.is_power_of_two());
    assert!(VIEW_SIZE.is_power_of_two());
    assert!(VIEW_SIZE * VIEW_SIZE == CUBE_SIZE * CUBE_SIZE * CUBE_SIZE);
};

/// Sampling geometry: cube, volume and render target sizes.
///
/// The compiled-in defaults satisfy every invariant. Other geometries are
/// accepted as long as [`SamplerConfig::validate`] passes; small ones are
/// handy in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub cube_size: u32,
    pub volume_size: u32,
    pub view_size: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            cube_size: CUBE_SIZE,
            volume_size: VOLUME_SIZE,
            view_size: VIEW_SIZE,
        }
    }
}

impl SamplerConfig {
    pub fn new(cube_size: u32, volume_size: u32, view_size: u32) -> Self {
        Self {
            cube_size,
            volume_size,
            view_size,
        }
    }

    /// Check the power-of-two and pixel-count invariants.
    ///
    /// Every raster pixel must host exactly one lattice point, so
    /// `view_size^2` has to equal `cube_size^3`.
    pub fn validate(&self) -> Result<(), SamplerError> {
        for (name, value) in [
            ("cube_size", self.cube_size),
            ("volume_size", self.volume_size),
            ("view_size", self.view_size),
        ] {
            if !value.is_power_of_two() {
                return Err(SamplerError::ConfigurationInvalid(format!(
                    "{name} must be a non-zero power of two, got {value}"
                )));
            }
        }

        let pixels = u64::from(self.view_size) * u64::from(self.view_size);
        let points = u64::from(self.cube_size).pow(3);
        if pixels != points {
            return Err(SamplerError::ConfigurationInvalid(format!(
                "view_size^2 ({pixels}) must equal cube_size^3 ({points})"
            )));
        }

        if cubed(self.volume_size).is_none() || cubed(self.cube_size).is_none() {
            return Err(SamplerError::ConfigurationInvalid(format!(
                "volume_size {} does not fit in host memory",
                self.volume_size
            )));
        }
        Ok(())
    }

    /// Number of voxels in a loaded volume.
    pub fn volume_len(&self) -> usize {
        cubed(self.volume_size).unwrap_or(usize::MAX)
    }

    /// Number of lattice points, and bytes in one sampled cube.
    pub fn cube_len(&self) -> usize {
        cubed(self.cube_size).unwrap_or(usize::MAX)
    }

    /// Number of pixels in the render target.
    pub fn view_pixels(&self) -> usize {
        self.view_size as usize * self.view_size as usize
    }
}

fn cubed(side: u32) -> Option<usize> {
    let side = usize::try_from(side).ok()?;
    side.checked_mul(side)?.checked_mul(side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SamplerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cube_len(), 64 * 64 * 64);
        assert_eq!(config.view_pixels(), config.cube_len());
        assert_eq!(config.volume_len(), 512 * 512 * 512);
    }

    #[test]
    fn small_geometries_are_valid() {
        assert!(SamplerConfig::new(4, 4, 8).validate().is_ok());
        assert!(SamplerConfig::new(16, 128, 64).validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two() {
        let err = SamplerConfig::new(64, 500, 512).validate().unwrap_err();
        assert!(matches!(err, SamplerError::ConfigurationInvalid(_)));
        assert!(err.to_string().contains("volume_size"));
    }

    #[test]
    fn rejects_zero() {
        assert!(SamplerConfig::new(0, 512, 512).validate().is_err());
    }

    #[test]
    fn rejects_pixel_count_mismatch() {
        let err = SamplerConfig::new(32, 512, 512).validate().unwrap_err();
        assert!(err.to_string().contains("view_size^2"));
    }

    #[test]
    fn json_fills_missing_fields_from_defaults() {
        let config: SamplerConfig = serde_json::from_str(r#"{ "volume_size": 256 }"#).unwrap();
        assert_eq!(config.volume_size, 256);
        assert_eq!(config.cube_size, CUBE_SIZE);
        assert_eq!(config.view_size, VIEW_SIZE);
    }
}
