use crate::error::{ErrorKind, Result};
use crate::{Encoding, Renderer, Transform};
use async_trait::async_trait;
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;
use tracing::instrument;

/// Renderer backed by the `image` crate.
///
/// Decoding, adjusting and encoding are CPU-bound, so each render runs on
/// Tokio's blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRenderer {
    encoding: Encoding,
}
impl ImageRenderer {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

#[async_trait]
impl Renderer for ImageRenderer {
    #[instrument(skip_all, fields(bytes = source.len(), height = ?height, encoding = %self.encoding))]
    async fn render(&self, source: Arc<[u8]>, transform: &Transform, height: Option<u32>) -> Result<Vec<u8>> {
        let transform = *transform;
        let encoding = self.encoding;
        tokio::task::spawn_blocking(move || render_blocking(&source, &transform, height, encoding))
            .await
            .or_raise(|| ErrorKind::Task)?
    }
}

fn render_blocking(source: &[u8], transform: &Transform, height: Option<u32>, encoding: Encoding) -> Result<Vec<u8>> {
    let mut pixels = image::load_from_memory(source).or_raise(|| ErrorKind::Decode)?.into_rgba8();
    if let Some(height) = height {
        pixels = fit_height(pixels, height);
    }
    if !transform.is_identity() {
        adjust(&mut pixels, transform);
    }
    let (width, height) = pixels.dimensions();
    tracing::debug!(width, height, "Rendered image");
    encode(pixels, encoding)
}

/// Scale down so the image is no taller than `height`. Images that already
/// fit are returned untouched.
fn fit_height(pixels: RgbaImage, height: u32) -> RgbaImage {
    let (width, current) = pixels.dimensions();
    if height == 0 || current <= height {
        return pixels;
    }
    let scaled = u64::from(width) * u64::from(height) / u64::from(current);
    let scaled = u32::try_from(scaled).unwrap_or(width).max(1);
    imageops::resize(&pixels, scaled, height, FilterType::Lanczos3)
}

fn adjust(pixels: &mut RgbaImage, transform: &Transform) {
    for pixel in pixels.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let rgb = transform.apply([r, g, b].map(|c| f32::from(c) / 255.0));
        let [r, g, b] = rgb.map(|c| (c * 255.0).round() as u8);
        pixel.0 = [r, g, b, a];
    }
}

fn encode(pixels: RgbaImage, encoding: Encoding) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let written = match encoding {
        Encoding::Png => DynamicImage::ImageRgba8(pixels).write_with_encoder(PngEncoder::new(&mut out)),
        // JPEG has no alpha channel.
        Encoding::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(pixels).into_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, Encoding::JPEG_QUALITY)),
    };
    written.or_raise(|| ErrorKind::Encode)?;
    Ok(out)
}
