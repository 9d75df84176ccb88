use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Largest width or height a resize may request.
pub const MAX_DIMENSION: u32 = 65_535;

/// Luminance weighting used when converting to grayscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrayscaleMode {
    /// ITU-R BT.601 weights (0.299, 0.587, 0.114).
    #[default]
    Bt601,
    /// ITU-R BT.709 weights (0.2126, 0.7152, 0.0722).
    Bt709,
}

impl GrayscaleMode {
    pub fn weights(self) -> [f32; 3] {
        match self {
            GrayscaleMode::Bt601 => [0.299, 0.587, 0.114],
            GrayscaleMode::Bt709 => [0.2126, 0.7152, 0.0722],
        }
    }
}

/// Variant tag of an [`EffectParameter`], used for capability tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Resize,
    Grayscale,
    GrayscaleWithMode,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [
        EffectKind::Resize,
        EffectKind::Grayscale,
        EffectKind::GrayscaleWithMode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Resize => "resize",
            EffectKind::Grayscale => "grayscale",
            EffectKind::GrayscaleWithMode => "grayscale_with_mode",
        }
    }
}

/// A declarative description of one requested effect.
///
/// Parameters carry no behavior. Two parameters of the same variant with the
/// same field values are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectParameter {
    Resize { width: u32, height: u32 },
    Grayscale,
    GrayscaleWithMode { mode: GrayscaleMode },
}

impl EffectParameter {
    pub fn resize(width: u32, height: u32) -> Self {
        EffectParameter::Resize { width, height }
    }

    pub fn grayscale() -> Self {
        EffectParameter::Grayscale
    }

    pub fn grayscale_with_mode(mode: GrayscaleMode) -> Self {
        EffectParameter::GrayscaleWithMode { mode }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectParameter::Resize { .. } => EffectKind::Resize,
            EffectParameter::Grayscale => EffectKind::Grayscale,
            EffectParameter::GrayscaleWithMode { .. } => EffectKind::GrayscaleWithMode,
        }
    }

    /// Short variant name used in logs.
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Checks the parameter before it is accepted into a pipeline.
    pub fn validate(&self) -> Result<(), PipelineError> {
        match *self {
            EffectParameter::Resize { width, height } => {
                if width == 0 || height == 0 {
                    return Err(PipelineError::InvalidParameter {
                        parameter: *self,
                        reason: "resize dimensions must be greater than 0".to_string(),
                    });
                }
                if width > MAX_DIMENSION || height > MAX_DIMENSION {
                    return Err(PipelineError::InvalidParameter {
                        parameter: *self,
                        reason: format!("resize dimensions must not exceed {MAX_DIMENSION}"),
                    });
                }
                Ok(())
            }
            EffectParameter::Grayscale | EffectParameter::GrayscaleWithMode { .. } => Ok(()),
        }
    }

    /// One representative value per variant, used to lint provider
    /// registrations for overlapping claims.
    pub fn representatives() -> Vec<EffectParameter> {
        vec![
            EffectParameter::resize(1, 1),
            EffectParameter::Grayscale,
            EffectParameter::grayscale_with_mode(GrayscaleMode::Bt601),
            EffectParameter::grayscale_with_mode(GrayscaleMode::Bt709),
        ]
    }
}
