use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{
    AnimationDecoder, DynamicImage, Frame, ImageBuffer, ImageFormat, ImageResult, Pixel,
};

use super::{DecodedFrame, DecodedImage, ImageEngine};
use crate::effect::{EffectParameter, GrayscaleMode};
use crate::error::PipelineError;

/// [`ImageEngine`] built on the `image` crate.
///
/// Animated GIF, APNG and WebP input is decoded frame by frame. Only GIF can
/// be written back with more than one frame.
#[derive(Debug, Clone)]
pub struct RasterEngine {
    filter: FilterType,
    output_format: Option<ImageFormat>,
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
            output_format: None,
        }
    }
}

impl RasterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // Sets the resampling filter used by resize.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    // Forces the encoded format instead of reusing the detected input format.
    pub fn with_output_format(mut self, format: ImageFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    fn transform(&self, image: DynamicImage, parameter: &EffectParameter) -> DynamicImage {
        match *parameter {
            EffectParameter::Resize { width, height } => {
                image.resize_exact(width, height, self.filter)
            }
            EffectParameter::Grayscale => grayscale(image, GrayscaleMode::default()),
            EffectParameter::GrayscaleWithMode { mode } => grayscale(image, mode),
        }
    }

    /// `None` when the bytes hold a single still.
    fn decode_animation(
        bytes: &[u8],
        format: ImageFormat,
    ) -> ImageResult<Option<Vec<DecodedFrame>>> {
        let frames = match format {
            ImageFormat::Gif => GifDecoder::new(Cursor::new(bytes))?
                .into_frames()
                .collect_frames()?,
            ImageFormat::Png => {
                let decoder = PngDecoder::new(Cursor::new(bytes))?;
                if !decoder.is_apng()? {
                    return Ok(None);
                }
                decoder.apng()?.into_frames().collect_frames()?
            }
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(Cursor::new(bytes))?;
                if !decoder.has_animation() {
                    return Ok(None);
                }
                decoder.into_frames().collect_frames()?
            }
            _ => return Ok(None),
        };
        if frames.is_empty() {
            return Ok(None);
        }

        Ok(Some(
            frames
                .into_iter()
                .map(|frame| {
                    let delay = frame.delay();
                    DecodedFrame {
                        image: DynamicImage::ImageRgba8(frame.into_buffer()),
                        delay,
                    }
                })
                .collect(),
        ))
    }

    fn encode_still(image: DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PipelineError> {
        let jpeg_ready = matches!(
            image,
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)
        );
        let image = if format == ImageFormat::Jpeg && !jpeg_ready {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            image
        };

        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, format)
            .map_err(PipelineError::Encode)?;
        Ok(buffer.into_inner())
    }

    fn encode_gif(frames: Vec<DecodedFrame>) -> Result<Vec<u8>, PipelineError> {
        let mut buffer = Vec::new();
        {
            // The trailer is written when the encoder drops.
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(PipelineError::Encode)?;
            encoder
                .encode_frames(frames.into_iter().map(|frame| {
                    Frame::from_parts(frame.image.to_rgba8(), 0, 0, frame.delay)
                }))
                .map_err(PipelineError::Encode)?;
        }
        Ok(buffer)
    }
}

impl ImageEngine for RasterEngine {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
        let format = image::guess_format(bytes).map_err(PipelineError::Decode)?;
        if let Some(frames) = Self::decode_animation(bytes, format).map_err(PipelineError::Decode)? {
            return Ok(DecodedImage::animation(frames, format));
        }

        let image =
            image::load_from_memory_with_format(bytes, format).map_err(PipelineError::Decode)?;
        Ok(DecodedImage::still(image, format))
    }

    fn apply(
        &self,
        image: DecodedImage,
        parameter: &EffectParameter,
    ) -> Result<DecodedImage, PipelineError> {
        let DecodedImage { frames, format } = image;
        let frames = frames
            .into_iter()
            .map(|frame| DecodedFrame {
                image: self.transform(frame.image, parameter),
                delay: frame.delay,
            })
            .collect();
        Ok(DecodedImage { frames, format })
    }

    fn encode(&self, image: DecodedImage) -> Result<Vec<u8>, PipelineError> {
        let format = self.output_format.unwrap_or(image.format);
        let frame_count = image.frame_count();
        if image.is_animated() {
            if format != ImageFormat::Gif {
                return Err(PipelineError::AnimationUnsupported {
                    format,
                    frames: frame_count,
                });
            }
            return Self::encode_gif(image.frames);
        }

        match image.frames.into_iter().next() {
            Some(frame) => Self::encode_still(frame.image, format),
            None => Err(PipelineError::AnimationUnsupported {
                format,
                frames: frame_count,
            }),
        }
    }
}

/// Channel types luminance can be written back into.
trait Channel: Copy {
    fn widen(self) -> f32;
    fn narrow(value: f32) -> Self;
}

impl Channel for u8 {
    fn widen(self) -> f32 {
        f32::from(self)
    }

    fn narrow(value: f32) -> Self {
        value.round().clamp(0.0, f32::from(u8::MAX)) as u8
    }
}

impl Channel for u16 {
    fn widen(self) -> f32 {
        f32::from(self)
    }

    fn narrow(value: f32) -> Self {
        value.round().clamp(0.0, f32::from(u16::MAX)) as u16
    }
}

impl Channel for f32 {
    fn widen(self) -> f32 {
        self
    }

    fn narrow(value: f32) -> Self {
        value
    }
}

// Writes luminance into the first three channels; alpha is left alone.
fn desaturate<P>(
    mut buffer: ImageBuffer<P, Vec<P::Subpixel>>,
    [wr, wg, wb]: [f32; 3],
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
    P::Subpixel: Channel,
{
    for pixel in buffer.pixels_mut() {
        let channels = pixel.channels_mut();
        let luma = <P::Subpixel as Channel>::narrow(
            wr * channels[0].widen() + wg * channels[1].widen() + wb * channels[2].widen(),
        );
        channels[..3].fill(luma);
    }
    buffer
}

/// Keeps the channel layout and bit depth of `image`.
fn grayscale(image: DynamicImage, mode: GrayscaleMode) -> DynamicImage {
    let weights = mode.weights();
    match image {
        DynamicImage::ImageRgb8(buffer) => DynamicImage::ImageRgb8(desaturate(buffer, weights)),
        DynamicImage::ImageRgba8(buffer) => DynamicImage::ImageRgba8(desaturate(buffer, weights)),
        DynamicImage::ImageRgb16(buffer) => DynamicImage::ImageRgb16(desaturate(buffer, weights)),
        DynamicImage::ImageRgba16(buffer) => {
            DynamicImage::ImageRgba16(desaturate(buffer, weights))
        }
        DynamicImage::ImageRgb32F(buffer) => {
            DynamicImage::ImageRgb32F(desaturate(buffer, weights))
        }
        DynamicImage::ImageRgba32F(buffer) => {
            DynamicImage::ImageRgba32F(desaturate(buffer, weights))
        }
        gray @ (DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)) => gray,
        other if other.color().has_alpha() => {
            DynamicImage::ImageRgba8(desaturate(other.to_rgba8(), weights))
        }
        other => DynamicImage::ImageRgb8(desaturate(other.to_rgb8(), weights)),
    }
}
