//! Pixel-level collaborator used by the imaging provider.
//!
//! The pipeline core never touches pixels itself. A run executor reads its
//! input stream into memory, hands the bytes to an [`ImageEngine`] once, applies
//! every parameter of the run to the decoded handle, and encodes once.

pub mod raster;

use image::{Delay, DynamicImage, ImageFormat};

use crate::effect::EffectParameter;
use crate::error::PipelineError;

pub use raster::RasterEngine;

/// One frame of a decoded image. Stills have exactly one, with a zero delay.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: DynamicImage,
    pub delay: Delay,
}

/// An in-memory image owned by a single materialization.
///
/// Effects are applied to every frame; frames are full canvas, never
/// partial patches.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub frames: Vec<DecodedFrame>,
    /// Format detected while decoding; used as the default output format.
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn still(image: DynamicImage, format: ImageFormat) -> Self {
        Self {
            frames: vec![DecodedFrame {
                image,
                delay: Delay::from_numer_denom_ms(0, 1),
            }],
            format,
        }
    }

    pub fn animation(frames: Vec<DecodedFrame>, format: ImageFormat) -> Self {
        Self { frames, format }
    }

    /// Dimensions of the first frame.
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map_or((0, 0), |frame| (frame.image.width(), frame.image.height()))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }
}

pub trait ImageEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, PipelineError>;

    /// Applies one effect. Variants the engine does not know are a
    /// [`PipelineError::NotImplemented`].
    fn apply(
        &self,
        image: DecodedImage,
        parameter: &EffectParameter,
    ) -> Result<DecodedImage, PipelineError>;

    fn encode(&self, image: DecodedImage) -> Result<Vec<u8>, PipelineError>;
}
