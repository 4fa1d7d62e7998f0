use glam::Vec3;

/// Trilinear lookup into a cubic `u8` field of side `size`, matching a
/// hardware linear sampler with clamp-to-edge addressing.
///
/// `coord` is in normalized texture space: texel `n` has its center at
/// `(n + 0.5) / size`. `volume` is laid out with x fastest. Returns the
/// interpolated value on the `0..=255` scale.
pub fn sample_trilinear(volume: &[u8], size: u32, coord: Vec3) -> f32 {
    let n = size as usize;
    // Every tap more than one texel outside the volume is clamped to the edge
    // anyway. Bounding `u` keeps huge or infinite coordinates out of the
    // integer casts.
    let u = (coord * size as f32 - Vec3::splat(0.5))
        .clamp(Vec3::splat(-1.0), Vec3::splat(n as f32));
    let base = u.floor();
    let frac = u - base;

    let (x0, x1) = clamp_pair(base.x, n);
    let (y0, y1) = clamp_pair(base.y, n);
    let (z0, z1) = clamp_pair(base.z, n);

    let at = |x: usize, y: usize, z: usize| f32::from(volume[(z * n + y) * n + x]);

    let c00 = lerp(at(x0, y0, z0), at(x1, y0, z0), frac.x);
    let c10 = lerp(at(x0, y1, z0), at(x1, y1, z0), frac.x);
    let c01 = lerp(at(x0, y0, z1), at(x1, y0, z1), frac.x);
    let c11 = lerp(at(x0, y1, z1), at(x1, y1, z1), frac.x);

    let c0 = lerp(c00, c10, frac.y);
    let c1 = lerp(c01, c11, frac.y);
    lerp(c0, c1, frac.z)
}

/// Store an interpolated value the way a `R8Unorm` target does: round to
/// nearest and saturate.
pub fn quantize(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn clamp_pair(base: f32, n: usize) -> (usize, usize) {
    let last = n as i64 - 1;
    let lo = (base as i64).clamp(0, last);
    let hi = (base as i64 + 1).clamp(0, last);
    (lo as usize, hi as usize)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
