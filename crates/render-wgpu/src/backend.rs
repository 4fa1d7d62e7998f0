use glam::Mat4;
use volsampler_common::{SamplerConfig, SamplerError, SamplerResult};
use volsampler_kernel::Lattice;
use volsampler_render::SampleBackend;
use wgpu::util::DeviceExt;

use crate::gpu::{GpuContext, validated};
use crate::program::{LatticeUniforms, SampleProgram};
use crate::target::RenderTarget;
use crate::volume::VolumeTexture;

/// Hardware backend: rasterizes one point per lattice element into an
/// offscreen target and reads the target back as the cube.
pub struct WgpuBackend {
    context: GpuContext,
    program: SampleProgram,
    volume: VolumeTexture,
    target: RenderTarget,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    raster_buffer: wgpu::Buffer,
    local_buffer: wgpu::Buffer,
    point_count: u32,
    view_size: u32,
}

impl WgpuBackend {
    /// Create a headless context and every resource the pipeline needs.
    pub fn new(config: &SamplerConfig) -> SamplerResult<Self> {
        Self::with_context(GpuContext::headless()?, config)
    }

    pub fn with_context(context: GpuContext, config: &SamplerConfig) -> SamplerResult<Self> {
        let device = &context.device;
        let point_count = u32::try_from(config.cube_len()).map_err(|_| {
            SamplerError::ConfigurationInvalid(format!(
                "{} lattice points exceed a single draw",
                config.cube_len()
            ))
        })?;

        let program = SampleProgram::new(device)?;
        let volume = VolumeTexture::new(device, config)?;
        let target = RenderTarget::new(device, config)?;

        // Lattice positions and coordinates never change after this point.
        let lattice = Lattice::build(config);
        let raster_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lattice_raster_buffer"),
            contents: bytemuck::cast_slice(lattice.raster_positions()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let local_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lattice_local_buffer"),
            contents: bytemuck::cast_slice(lattice.local_coords()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lattice_uniform_buffer"),
            contents: bytemuck::bytes_of(&LatticeUniforms::new(&Mat4::IDENTITY, config.view_size)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lattice_bind_group"),
            layout: &program.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&volume.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&volume.sampler),
                },
            ],
        });

        tracing::debug!(points = point_count, "gpu backend ready");

        Ok(Self {
            context,
            program,
            volume,
            target,
            uniform_buffer,
            bind_group,
            raster_buffer,
            local_buffer,
            point_count,
            view_size: config.view_size,
        })
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        self.context.adapter_info()
    }

    fn draw(&self, transform: &Mat4) {
        let queue = &self.context.queue;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&LatticeUniforms::new(transform, self.view_size)),
        );

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lattice_encoder"),
            });
        {
            let mut pass = self.target.begin_pass(&mut encoder);
            pass.set_pipeline(&self.program.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.raster_buffer.slice(..));
            pass.set_vertex_buffer(1, self.local_buffer.slice(..));
            pass.draw(0..self.point_count, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

impl SampleBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn load_volume(&mut self, volume: &[u8]) -> SamplerResult<()> {
        let ((), error) = validated(&self.context.device, || {
            self.volume.write(&self.context.queue, volume)
        });
        if let Some(e) = error {
            tracing::error!(error = %e, "volume upload rejected");
            return Err(SamplerError::DeviceRejected(e.to_string()));
        }
        Ok(())
    }

    fn sample_into(&mut self, transform: &Mat4, out: &mut [u8]) -> SamplerResult<()> {
        let ((), error) = validated(&self.context.device, || self.draw(transform));
        if let Some(e) = error {
            tracing::error!(error = %e, "draw rejected");
            return Err(SamplerError::DeviceRejected(e.to_string()));
        }

        // The readback must not start before the draw has landed.
        self.context.finish();
        self.target.read_into(&self.context.device, &self.context.queue, out)
    }

    fn release(&mut self) {
        self.volume.destroy();
        self.target.destroy();
        self.raster_buffer.destroy();
        self.local_buffer.destroy();
        self.uniform_buffer.destroy();
        self.context.finish();
        tracing::debug!("gpu resources released");
    }
}
