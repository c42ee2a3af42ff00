use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{flip_vertical_in_place, resize, FilterType};
use image::{Rgba, RgbaImage};
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::types::ContentSource;

use super::context::SurfaceColorSpace;

const PATTERN_WIDTH: u32 = 640;
const PATTERN_HEIGHT: u32 = 480;

/// SMPTE-ish colour bars, top to bottom order is irrelevant to the shader.
const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// Texture bound at `set = 1` and sampled by `sampleContent`.
pub(crate) struct ContentTexture {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub dimensions: (u32, u32),
}

pub(crate) fn create_content(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &ContentSource,
    color_space: SurfaceColorSpace,
    max_dimension: u32,
) -> ContentTexture {
    let image = match source {
        ContentSource::TestPattern => test_pattern(PATTERN_WIDTH, PATTERN_HEIGHT),
        ContentSource::Image(path) => match load_image(path) {
            Ok(image) => {
                tracing::info!(
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "loaded content image"
                );
                image
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "failed to load content image; using test pattern"
                );
                test_pattern(PATTERN_WIDTH, PATTERN_HEIGHT)
            }
        },
    };
    upload(device, queue, fit_within(image, max_dimension), color_space)
}

/// Downscales `image`, keeping its aspect ratio, until neither side exceeds
/// `max_dimension`.
pub(crate) fn fit_within(image: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return image;
    }
    let scale = f64::from(max_dimension) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);
    let (target_width, target_height) = (scaled(width), scaled(height));
    tracing::warn!(
        width,
        height,
        target_width,
        target_height,
        max_dimension,
        "content image exceeds GPU texture limit; downscaling"
    );
    resize(&image, target_width, target_height, FilterType::Triangle)
}

fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to open content image at {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Colour bars with a one-pixel grid every 32 pixels and a grey ramp strip.
pub(crate) fn test_pattern(width: u32, height: u32) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let ramp_start = height - height / 4;
    RgbaImage::from_fn(width, height, |x, y| {
        if x % 32 == 0 || y % 32 == 0 {
            return Rgba([255, 255, 255, 255]);
        }
        if y >= ramp_start {
            let level = (x * 255 / width.saturating_sub(1).max(1)) as u8;
            return Rgba([level, level, level, 255]);
        }
        let bar = (x as usize * BARS.len()) / width as usize;
        let [r, g, b] = BARS[bar.min(BARS.len() - 1)];
        Rgba([r, g, b, 255])
    })
}

fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mut image: RgbaImage,
    color_space: SurfaceColorSpace,
) -> ContentTexture {
    let (width, height) = image.dimensions();
    flip_vertical_in_place(&mut image);

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("content texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_space.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        image.as_raw(),
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("content sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    ContentTexture {
        _texture: texture,
        view,
        sampler,
        dimensions: (width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_has_requested_size() {
        let image = test_pattern(320, 200);
        assert_eq!(image.dimensions(), (320, 200));
        assert!(image.pixels().all(|pixel| pixel[3] == 255));
    }

    #[test]
    fn pattern_draws_grid_and_bars() {
        let image = test_pattern(640, 480);
        assert_eq!(image.get_pixel(0, 10), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(33, 33), &Rgba([192, 192, 192, 255]));
        assert_eq!(image.get_pixel(630, 33), &Rgba([0, 0, 192, 255]));
    }

    #[test]
    fn pattern_tolerates_degenerate_sizes() {
        assert_eq!(test_pattern(0, 0).dimensions(), (1, 1));
    }

    #[test]
    fn oversized_images_shrink_to_texture_limit() {
        let wide = fit_within(test_pattern(3000, 1000), 1500);
        assert_eq!(wide.dimensions(), (1500, 500));
        let tall = fit_within(test_pattern(10, 4000), 100);
        assert_eq!(tall.dimensions(), (1, 100));
    }

    #[test]
    fn images_within_limit_are_untouched() {
        let image = test_pattern(320, 200);
        let fitted = fit_within(image.clone(), 320);
        assert_eq!(fitted, image);
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(load_image(Path::new("/nonexistent/cathode/content.png")).is_err());
    }
}
