/// WGSL program that turns the point rasterizer into a 3D resampler.
///
/// The vertex stage places each lattice point on its own pixel and maps its
/// cube-local coordinate through the pose matrix. The fragment stage does one
/// filtered lookup into the volume and writes the red channel.
///
/// Packed raster positions sit on the upper-right corner of their pixel in
/// a y-up frame. `raster.x` holds half a pixel in NDC; subtracting it and
/// flipping y moves each point onto the center of pixel `(col, row)` of the
/// y-down framebuffer.
pub const LATTICE_SHADER: &str = r#"
struct Uniforms {
    pose: mat4x4<f32>,
    raster: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var volume_texture: texture_3d<f32>;

@group(0) @binding(2)
var volume_sampler: sampler;

struct LatticePoint {
    @location(0) raster: vec2<f32>,
    @location(1) local: vec3<f32>,
};

struct LatticeOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) sample_coord: vec3<f32>,
};

@vertex
fn vs_lattice(point: LatticePoint) -> LatticeOutput {
    let half_pixel = uniforms.raster.x;
    var out: LatticeOutput;
    out.clip_position = vec4<f32>(
        point.raster.x - half_pixel,
        half_pixel - point.raster.y,
        0.0,
        1.0,
    );
    out.sample_coord = (uniforms.pose * vec4<f32>(point.local, 1.0)).xyz;
    return out;
}

@fragment
fn fs_sample(in: LatticeOutput) -> @location(0) vec4<f32> {
    let value = textureSample(volume_texture, volume_sampler, in.sample_coord).r;
    return vec4<f32>(value, 0.0, 0.0, 1.0);
}
"#;
