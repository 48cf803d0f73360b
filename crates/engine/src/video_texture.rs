use media::frame::{Dimensions, Plane, YuvPlanes};

use crate::engine_errors::EngineError;

// Labels used for GPU objects
mod labels {
    pub const PLANES: [&str; 3] = ["tex/video-y", "tex/video-u", "tex/video-v"];
    pub const BIND_GROUP: &str = "bg/video";
}

/// The render target a session's pictures get uploaded to: one single-channel
/// texture per YUV 4:2:0 plane and the bind group that hands all three to the
/// shader.
///
/// A [VideoTexture] has fixed [Dimensions]. A picture of any other size is
/// rejected by [VideoTexture::upload].
pub struct VideoTexture {
    planes: [wgpu::Texture; 3],
    bind_group: wgpu::BindGroup,
    dimensions: Dimensions,
}

impl VideoTexture {
    pub(crate) fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        dimensions: Dimensions,
    ) -> Self {
        let plane_dimensions = [dimensions, dimensions.chroma_420(), dimensions.chroma_420()];

        let planes = std::array::from_fn(|i| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(labels::PLANES[i]),
                size: extent(plane_dimensions[i]),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        });

        let views: [wgpu::TextureView; 3] = std::array::from_fn(|i: usize| {
            planes[i].create_view(&wgpu::TextureViewDescriptor::default())
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(labels::BIND_GROUP),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&views[0]),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&views[1]),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&views[2]),
                },
            ],
        });

        Self {
            planes,
            bind_group,
            dimensions,
        }
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Copy a picture's planes into the textures. The copy is queued and
    /// happens with the next submitted command buffer.
    pub fn upload(&mut self, queue: &wgpu::Queue, picture: &YuvPlanes) -> Result<(), EngineError> {
        if picture.dimensions() != self.dimensions {
            return Err(EngineError::TextureSizeMismatch {
                expected: self.dimensions,
                actual: picture.dimensions(),
            });
        }

        let sources = [
            (picture.y(), picture.dimensions()),
            (picture.u(), picture.chroma_dimensions()),
            (picture.v(), picture.chroma_dimensions()),
        ];

        for (texture, (plane, dimensions)) in self.planes.iter().zip(sources) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                plane.data,
                plane_layout(plane, dimensions),
                extent(dimensions),
            );
        }

        Ok(())
    }
}

fn extent(dimensions: Dimensions) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: dimensions.width(),
        height: dimensions.height(),
        depth_or_array_layers: 1,
    }
}

/// How one plane's rows are laid out in memory. Queue writes (unlike buffer
/// copies) have no row alignment requirement, so the plane's own stride is
/// used and padded rows are uploaded without repacking.
fn plane_layout(plane: Plane, dimensions: Dimensions) -> wgpu::TexelCopyBufferLayout {
    wgpu::TexelCopyBufferLayout {
        offset: 0,
        bytes_per_row: Some(plane.stride as u32),
        rows_per_image: Some(dimensions.height()),
    }
}
