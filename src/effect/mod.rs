pub mod parameters;

pub use parameters::{EffectKind, EffectParameter, GrayscaleMode, MAX_DIMENSION};
