use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SamplerConfig;
use crate::error::SamplerError;

/// Where and how a cube is cut out of the volume.
///
/// `center` is in voxel units of the source volume. `phi` and `theta` pick
/// the rotation axis in spherical coordinates and `kappa` is the rotation
/// about it, all in radians. `scale > 1` widens the extracted region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub center: Vec3,
    pub phi: f32,
    pub theta: f32,
    pub kappa: f32,
    pub scale: f32,
}

impl Pose {
    pub fn new(center: Vec3, phi: f32, theta: f32, kappa: f32, scale: f32) -> Self {
        Self {
            center,
            phi,
            theta,
            kappa,
            scale,
        }
    }

    /// Unrotated, unscaled pose at the geometric center of the volume.
    pub fn centered(config: &SamplerConfig) -> Self {
        Self::at(Vec3::splat(config.volume_size as f32 / 2.0))
    }

    /// Unrotated, unscaled pose at `center`.
    pub fn at(center: Vec3) -> Self {
        Self::new(center, 0.0, 0.0, 0.0, 1.0)
    }

    /// Rotation axis selected by `phi` and `theta`. Always unit length.
    pub fn axis(&self) -> Vec3 {
        Vec3::new(
            self.phi.sin() * self.theta.cos(),
            self.phi.sin() * self.theta.sin(),
            self.phi.cos(),
        )
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if !self.center.is_finite() {
            return Err(SamplerError::InvalidPose(format!(
                "center {} is not finite",
                self.center
            )));
        }
        if !(self.phi.is_finite() && self.theta.is_finite() && self.kappa.is_finite()) {
            return Err(SamplerError::InvalidPose(format!(
                "angles ({}, {}, {}) are not finite",
                self.phi, self.theta, self.kappa
            )));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SamplerError::InvalidPose(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_pose_is_identity() {
        let pose = Pose::centered(&SamplerConfig::default());
        assert_eq!(pose.center, Vec3::splat(256.0));
        assert_eq!((pose.phi, pose.theta, pose.kappa), (0.0, 0.0, 0.0));
        assert_eq!(pose.scale, 1.0);
    }

    #[test]
    fn axis_follows_spherical_angles() {
        let pose = Pose::at(Vec3::ZERO);
        assert_eq!(pose.axis(), Vec3::Z);

        let pose = Pose::new(Vec3::ZERO, std::f32::consts::FRAC_PI_2, 0.0, 0.3, 1.0);
        assert!(pose.axis().abs_diff_eq(Vec3::X, 1e-6));
        assert!((pose.axis().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let mut pose = Pose::at(Vec3::ZERO);
        pose.scale = 0.0;
        assert!(matches!(pose.validate(), Err(SamplerError::InvalidPose(_))));
        pose.scale = -2.0;
        assert!(pose.validate().is_err());
    }

    #[test]
    fn rejects_nan_components() {
        let pose = Pose::at(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(pose.validate().is_err());

        let mut pose = Pose::at(Vec3::ZERO);
        pose.kappa = f32::INFINITY;
        assert!(pose.validate().is_err());
    }
}
