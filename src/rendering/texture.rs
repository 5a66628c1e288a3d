use image::{imageops::FilterType, RgbaImage};
use winit::dpi::PhysicalSize;

pub struct Texture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
}

impl Texture {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
    /// Sampled as stored, without sRGB decoding. Procedural maps use this.
    pub const DATA_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn from_wgpu_texture(texture: wgpu::Texture, device: &wgpu::Device) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Color sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }

    /// Uploads an image in `format` with a full mip chain generated on the CPU.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
        format: wgpu::TextureFormat,
    ) -> Self {
        let mips = mip_chain(image);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width().max(1),
                height: image.height().max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: mips.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in mips.iter().enumerate() {
            write_rgba(queue, &texture, level as u32, mip);
        }

        Self::from_wgpu_texture(texture, device)
    }

    /// 1x1 white texture for materials without a map.
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::from_image(device, queue, &image, "White Texture", Self::COLOR_FORMAT)
    }
}

fn write_rgba(queue: &wgpu::Queue, texture: &wgpu::Texture, mip_level: u32, image: &RgbaImage) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width()),
            rows_per_image: Some(image.height()),
        },
        wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        },
    );
}

/// The image followed by successively halved copies down to 1x1.
fn mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let mut mips = vec![image.clone()];
    let (mut width, mut height) = image.dimensions();

    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        let previous = &mips[mips.len() - 1];
        let next = image::imageops::resize(previous, width, height, FilterType::Triangle);
        mips.push(next);
    }

    mips
}

fn create_attachment(
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
    format: wgpu::TextureFormat,
    sample_count: u32,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

pub struct DepthTexture {
    view: wgpu::TextureView,
    sample_count: u32,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        sample_count: u32,
        label: impl Into<String>,
    ) -> Self {
        let label: String = label.into();
        let texture = create_attachment(device, size, Self::DEPTH_FORMAT, sample_count, &label);

        DepthTexture {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sample_count,
            label,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        *self = Self::new(device, size, self.sample_count, self.label.clone());
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Multisampled color target resolved into the swapchain image. Absent when
/// MSAA is disabled.
pub struct MultisampleTexture {
    view: Option<wgpu::TextureView>,
    format: wgpu::TextureFormat,
    sample_count: u32,
}

impl MultisampleTexture {
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let view = (sample_count > 1).then(|| {
            create_attachment(device, size, format, sample_count, "Multisample Color Texture")
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self {
            view,
            format,
            sample_count,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        *self = Self::new(device, size, self.format, self.sample_count);
    }

    /// Returns `(render target, resolve target)` for drawing into `output`.
    pub fn attachments<'a>(
        &'a self,
        output: &'a wgpu::TextureView,
    ) -> (&'a wgpu::TextureView, Option<&'a wgpu::TextureView>) {
        match &self.view {
            Some(view) => (view, Some(output)),
            None => (output, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_format_skips_srgb_decoding() {
        assert!(Texture::COLOR_FORMAT.is_srgb());
        assert!(!Texture::DATA_FORMAT.is_srgb());
        // Same texel layout, so one CPU mip chain serves both.
        assert_eq!(Texture::DATA_FORMAT, Texture::COLOR_FORMAT.remove_srgb_suffix());
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let image = RgbaImage::new(16, 4);
        let sizes: Vec<(u32, u32)> = mip_chain(&image).iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(16, 4), (8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn mip_chain_of_flat_image_stays_flat() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([10, 20, 30, 255]));
        let last = mip_chain(&image).pop().unwrap();
        assert_eq!(last.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }
}
