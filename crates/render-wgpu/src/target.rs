use volsampler_common::{SamplerConfig, SamplerError, SamplerResult};

use crate::program::TARGET_FORMAT;

/// Square offscreen render target plus the staging buffer it is read back
/// through.
pub struct RenderTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    size: u32,
    padded_bytes_per_row: u32,
}

impl RenderTarget {
    pub fn new(device: &wgpu::Device, config: &SamplerConfig) -> SamplerResult<Self> {
        let size = config.view_size;
        let max = device.limits().max_texture_dimension_2d;
        if size > max {
            return Err(SamplerError::FramebufferIncomplete(format!(
                "view_size {size} exceeds the device 2D texture limit {max}"
            )));
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("target_texture"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        if texture.width() != size || texture.height() != size {
            return Err(SamplerError::FramebufferIncomplete(format!(
                "target is {}x{}, expected {size}x{size}",
                texture.width(),
                texture.height()
            )));
        }
        let view = texture.create_view(&Default::default());

        let padded_bytes_per_row = padded_bytes_per_row(size);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("target_readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(size),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Ok(Self {
            texture,
            view,
            readback,
            size,
            padded_bytes_per_row,
        })
    }

    /// Begin a pass that clears the target to zero.
    pub(crate) fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
    ) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lattice_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        })
    }

    /// Copy the target into the staging buffer, map it and write the
    /// unpadded `size * size` bytes into `out`, top row first.
    ///
    /// All drawing into the target must already have completed.
    pub(crate) fn read_into(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        out: &mut [u8],
    ) -> SamplerResult<()> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.size),
                },
            },
            wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| SamplerError::ReadbackFailed("map callback dropped".into()))?
            .map_err(|e| SamplerError::ReadbackFailed(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            unpad_rows(&data, self.padded_bytes_per_row as usize, self.size as usize, out);
        }
        self.readback.unmap();
        Ok(())
    }

    pub fn destroy(&self) {
        self.texture.destroy();
        self.readback.destroy();
    }
}

/// Bytes per row of a one-byte-per-pixel image, rounded up to the copy
/// alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    width.div_ceil(align) * align
}

fn unpad_rows(data: &[u8], padded: usize, width: usize, out: &mut [u8]) {
    for (row, dst) in out.chunks_exact_mut(width).enumerate() {
        let start = row * padded;
        dst.copy_from_slice(&data[start..start + width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(8), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(512), 512);
        assert_eq!(padded_bytes_per_row(300), 512);
    }

    #[test]
    fn unpad_keeps_row_order() {
        let width = 3;
        let padded = 8;
        let mut data = vec![0xEEu8; padded * 2];
        data[..3].copy_from_slice(&[1, 2, 3]);
        data[8..11].copy_from_slice(&[4, 5, 6]);

        let mut out = vec![0u8; width * 2];
        unpad_rows(&data, padded, width, &mut out);
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }
}
