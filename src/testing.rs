//! Test doubles shared by the unit tests.

use std::any::Any;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::codecs::gif::{GifDecoder, GifEncoder};
use image::{
    AnimationDecoder, Delay, DynamicImage, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::effect::{EffectKind, EffectParameter};
use crate::error::PipelineError;
use crate::imaging::{DecodedImage, ImageEngine, RasterEngine};
use crate::metrics::{MetricReporter, NoopMetrics};
use crate::pipeline::{ExecutionContext, PipelineNode, RunExecutor};
use crate::provider::EffectProvider;

/// A red field with a green rectangle inset by a tenth of each side.
pub(crate) fn red_green_image(width: u32, height: u32) -> DynamicImage {
    let (border_x, border_y) = (width / 10, height / 10);
    let image = RgbImage::from_fn(width, height, |x, y| {
        let inside = x >= border_x
            && x < width - border_x
            && y >= border_y
            && y < height - border_y;
        if inside {
            Rgb([0, 255, 0])
        } else {
            Rgb([255, 0, 0])
        }
    });
    DynamicImage::ImageRgb8(image)
}

pub(crate) fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub(crate) fn red_green_png(width: u32, height: u32) -> Vec<u8> {
    png_bytes(&red_green_image(width, height))
}

/// Three solid frames (red, green, blue), 100ms each.
pub(crate) fn rgb_frames_gif(width: u32, height: u32) -> Vec<u8> {
    let frames = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]].map(|color| {
        Frame::from_parts(
            RgbaImage::from_pixel(width, height, Rgba(color)),
            0,
            0,
            Delay::from_numer_denom_ms(100, 1),
        )
    });

    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

pub(crate) fn gif_frames(bytes: &[u8]) -> Vec<Frame> {
    GifDecoder::new(Cursor::new(bytes))
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
}

#[derive(Default)]
struct Script {
    merge_all: bool,
    merging: Vec<EffectParameter>,
    append_marker: bool,
    fail_on: Option<EffectParameter>,
    runs: Vec<Vec<EffectParameter>>,
    merge_queries: Vec<EffectParameter>,
}

pub(crate) struct ScriptedExecutor {
    name: &'static str,
    script: Mutex<Script>,
}

impl ScriptedExecutor {
    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl RunExecutor for ScriptedExecutor {
    fn provider(&self) -> &'static str {
        self.name
    }

    fn merges_into(&self, current: &PipelineNode, _next: &PipelineNode) -> bool {
        let mut script = self.script();
        script.merge_queries.push(*current.parameter());
        script.merge_all || script.merging.contains(current.parameter())
    }

    async fn execute_run(
        &self,
        _context: &ExecutionContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
        run: &[&PipelineNode],
    ) -> Result<(), PipelineError> {
        let parameters: Vec<EffectParameter> = run.iter().map(|node| *node.parameter()).collect();
        let (append_marker, failing) = {
            let mut script = self.script();
            script.runs.push(parameters.clone());
            let failing = script
                .fail_on
                .map_or(false, |fail_on| parameters.contains(&fail_on));
            (script.append_marker, failing)
        };
        if failing {
            return Err(PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "scripted failure",
            )));
        }

        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes).await?;
        if append_marker {
            for parameter in &parameters {
                bytes.push(b'|');
                bytes.extend_from_slice(parameter.name().as_bytes());
            }
        }
        output.write_all(&bytes).await?;
        output.flush().await?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Provider whose nodes record what the driver asks of them.
///
/// Copies input to output unless told otherwise; claims every effect unless
/// restricted with [`ScriptedProvider::claiming`].
pub(crate) struct ScriptedProvider {
    claims: Vec<EffectKind>,
    metrics: Arc<dyn MetricReporter>,
    executor: Arc<ScriptedExecutor>,
    created: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            claims: EffectKind::ALL.to_vec(),
            metrics: Arc::new(NoopMetrics),
            executor: Arc::new(ScriptedExecutor {
                name,
                script: Mutex::new(Script::default()),
            }),
            created: AtomicUsize::new(0),
        }
    }

    pub(crate) fn claiming(mut self, kinds: &[EffectKind]) -> Self {
        self.claims = kinds.to_vec();
        self
    }

    /// Nodes carrying any of `parameters` merge into their successor.
    pub(crate) fn merging_for(self, parameters: &[EffectParameter]) -> Self {
        self.executor.script().merging.extend_from_slice(parameters);
        self
    }

    pub(crate) fn merging_all(self) -> Self {
        self.executor.script().merge_all = true;
        self
    }

    pub(crate) fn with_metrics(mut self, metrics: Arc<dyn MetricReporter>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Each run appends `|<effect name>` per node to what it read.
    pub(crate) fn appending_marker(self) -> Self {
        self.executor.script().append_marker = true;
        self
    }

    /// A run containing `parameter` is recorded and then fails with an I/O error.
    pub(crate) fn failing_on(self, parameter: EffectParameter) -> Self {
        self.executor.script().fail_on = Some(parameter);
        self
    }

    pub(crate) fn runs(&self) -> Vec<Vec<EffectParameter>> {
        self.executor.script().runs.clone()
    }

    /// Parameter of the current node for every merge question asked.
    pub(crate) fn merge_queries(&self) -> Vec<EffectParameter> {
        self.executor.script().merge_queries.clone()
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EffectProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.executor.name
    }

    fn can_process(&self, parameter: &EffectParameter) -> bool {
        self.claims.contains(&parameter.kind())
    }

    fn create_node(
        &self,
        predecessor: Option<Arc<PipelineNode>>,
        parameter: EffectParameter,
    ) -> Arc<PipelineNode> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let executor: Arc<dyn RunExecutor> = self.executor.clone();
        Arc::new(PipelineNode::new(
            parameter,
            predecessor,
            executor,
            Arc::clone(&self.metrics),
        ))
    }
}

/// [`RasterEngine`] that counts how often each stage runs.
#[derive(Default)]
pub(crate) struct CountingEngine {
    inner: RasterEngine,
    decodes: AtomicUsize,
    applies: AtomicUsize,
    encodes: AtomicUsize,
}

impl CountingEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub(crate) fn applies(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }

    pub(crate) fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }
}

impl ImageEngine for CountingEngine {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, PipelineError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.inner.decode(bytes)
    }

    fn apply(
        &self,
        image: DecodedImage,
        parameter: &EffectParameter,
    ) -> Result<DecodedImage, PipelineError> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(image, parameter)
    }

    fn encode(&self, image: DecodedImage) -> Result<Vec<u8>, PipelineError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        self.inner.encode(image)
    }
}
