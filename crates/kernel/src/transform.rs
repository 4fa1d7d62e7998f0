use glam::{Mat4, Vec3};
use volsampler_common::{Pose, SamplerConfig};

/// Build the matrix taking cube-local coordinates in `[0, 1]^3` to
/// normalized volume texture coordinates.
///
/// Applied right to left: recenter the unit cube on the origin, rotate by
/// `kappa` about the pose axis, scale by `cube / volume / scale`, then move to
/// `center / volume`.
pub fn sample_transform(pose: &Pose, config: &SamplerConfig) -> Mat4 {
    let volume = config.volume_size as f32;
    let scale = config.cube_size as f32 / volume / pose.scale;

    Mat4::from_translation(pose.center / volume)
        * Mat4::from_scale(Vec3::splat(scale))
        * Mat4::from_axis_angle(pose.axis(), pose.kappa)
        * Mat4::from_translation(Vec3::splat(-0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_pose_maps_cube_to_central_region() {
        let config = SamplerConfig::default();
        let m = sample_transform(&Pose::centered(&config), &config);

        let lo = m.transform_point3(Vec3::ZERO);
        let hi = m.transform_point3(Vec3::ONE);
        let half = 32.0 / 512.0;
        assert!(lo.abs_diff_eq(Vec3::splat(0.5 - half), 1e-6));
        assert!(hi.abs_diff_eq(Vec3::splat(0.5 + half), 1e-6));
    }

    #[test]
    fn cube_center_lands_on_pose_center() {
        let config = SamplerConfig::default();
        let pose = Pose::new(Vec3::new(100.0, 200.0, 300.0), 0.7, 1.1, 2.3, 1.7);
        let m = sample_transform(&pose, &config);
        let c = m.transform_point3(Vec3::splat(0.5));
        assert!(c.abs_diff_eq(pose.center / 512.0, 1e-6));
    }

    #[test]
    fn larger_scale_widens_region() {
        let config = SamplerConfig::default();
        let mut pose = Pose::centered(&config);
        pose.scale = 2.0;
        let m = sample_transform(&pose, &config);
        let span = m.transform_point3(Vec3::ONE) - m.transform_point3(Vec3::ZERO);
        assert!(span.abs_diff_eq(Vec3::splat(32.0 / 512.0), 1e-6));
    }

    #[test]
    fn quarter_turn_about_z_swaps_x_and_y() {
        let config = SamplerConfig::new(4, 4, 8);
        let mut pose = Pose::at(Vec3::splat(2.0));
        pose.kappa = FRAC_PI_2;
        let m = sample_transform(&pose, &config);

        // cube-local +x edge midpoint rotates onto +y
        let p = m.transform_point3(Vec3::new(1.0, 0.5, 0.5));
        assert!(p.abs_diff_eq(Vec3::new(0.5, 1.0, 0.5), 1e-6));
    }

    #[test]
    fn tilted_axis_leaves_axis_fixed() {
        let config = SamplerConfig::new(4, 4, 8);
        let pose = Pose::new(Vec3::splat(2.0), 0.9, 0.4, 1.3, 1.0);
        let m = sample_transform(&pose, &config);
        let on_axis = Vec3::splat(0.5) + pose.axis() * 0.25;
        let mapped = m.transform_point3(on_axis);
        assert!(mapped.abs_diff_eq(on_axis, 1e-5));
    }
}
