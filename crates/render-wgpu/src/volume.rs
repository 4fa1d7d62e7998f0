use volsampler_common::{SamplerConfig, SamplerError, SamplerResult};

/// GPU-resident scalar volume with a trilinear, clamp-to-edge sampler.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    size: u32,
}

impl VolumeTexture {
    /// Allocate a zeroed `size^3` volume.
    pub fn new(device: &wgpu::Device, config: &SamplerConfig) -> SamplerResult<Self> {
        let size = config.volume_size;
        let max = device.limits().max_texture_dimension_3d;
        if size > max {
            return Err(SamplerError::ConfigurationInvalid(format!(
                "volume_size {size} exceeds the device 3D texture limit {max}"
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("volume_texture"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("volume_view"),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("volume_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            size,
        })
    }

    /// Replace the whole volume in one transfer. `data` is x-fastest and
    /// exactly `size^3` bytes.
    pub fn write(&self, queue: &wgpu::Queue, data: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size),
                rows_per_image: Some(self.size),
            },
            extent(self.size),
        );
    }

    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

fn extent(size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: size,
    }
}
