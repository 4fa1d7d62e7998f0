use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use volsampler_common::{SamplerError, SamplerResult};

use crate::gpu::validated;
use crate::shaders;

/// Render target format: one unsigned normalized byte per pixel.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct LatticeUniforms {
    pose: [[f32; 4]; 4],
    raster: [f32; 4],
}

impl LatticeUniforms {
    pub(crate) fn new(pose: &Mat4, view_size: u32) -> Self {
        Self {
            pose: pose.to_cols_array_2d(),
            raster: [1.0 / view_size as f32, 0.0, 0.0, 0.0],
        }
    }
}

/// Compiled and linked sampling program.
pub struct SampleProgram {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) bind_group_layout: wgpu::BindGroupLayout,
}

impl SampleProgram {
    pub fn new(device: &wgpu::Device) -> SamplerResult<Self> {
        let (module, error) = validated(device, || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("lattice_shader"),
                source: wgpu::ShaderSource::Wgsl(shaders::LATTICE_SHADER.into()),
            })
        });
        log_compilation_messages(&module);
        if let Some(e) = error {
            tracing::error!(error = %e, "shader compilation failed");
            return Err(SamplerError::CompileFailed(e.to_string()));
        }

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lattice_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D3,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lattice_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let (pipeline, error) = validated(device, || {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("lattice_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_lattice"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                        },
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![1 => Float32x3],
                        },
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_sample"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::PointList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        });
        if let Some(e) = error {
            tracing::error!(error = %e, "pipeline link failed");
            return Err(SamplerError::LinkFailed(e.to_string()));
        }

        tracing::debug!("sampling program linked");
        Ok(Self {
            pipeline,
            bind_group_layout,
        })
    }
}

fn log_compilation_messages(module: &wgpu::ShaderModule) {
    let info = pollster::block_on(module.get_compilation_info());
    for message in &info.messages {
        let location = message
            .location
            .as_ref()
            .map(|l| format!("{}:{}", l.line_number, l.line_position))
            .unwrap_or_default();
        match message.message_type {
            wgpu::CompilationMessageType::Error => {
                tracing::error!(%location, "{}", message.message)
            }
            wgpu::CompilationMessageType::Warning => {
                tracing::warn!(%location, "{}", message.message)
            }
            wgpu::CompilationMessageType::Info => {
                tracing::info!(%location, "{}", message.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniforms_layout_matches_shader() {
        // mat4x4<f32> + vec4<f32>
        assert_eq!(std::mem::size_of::<LatticeUniforms>(), 80);
    }

    #[test]
    fn uniforms_carry_half_pixel() {
        let u = LatticeUniforms::new(&Mat4::IDENTITY, 512);
        assert_eq!(u.raster[0], 1.0 / 512.0);
        assert_eq!(u.pose, Mat4::IDENTITY.to_cols_array_2d());
    }
}
