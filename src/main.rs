use std::sync::Arc;

use effect_pipeline::config::Configuration;
use effect_pipeline::error::AppError;
use effect_pipeline::imaging::RasterEngine;
use effect_pipeline::metrics::PerformanceMonitor;
use effect_pipeline::setting::ConfigSettingStore;
use effect_pipeline::{BuilderFactory, ImagingProvider};
use tokio::fs::File;
use tokio::io::BufWriter;
use tracing::{info, Level};

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let sources = Configuration::sources()?;
    let configuration = Configuration::from_config(&sources)?;
    init_logging(configuration.max_level());

    let monitor = PerformanceMonitor::new();
    let store = ConfigSettingStore::new(sources);
    let imaging = ImagingProvider::from_settings(
        Arc::new(RasterEngine::new()),
        Arc::new(monitor.clone()),
        Some(&store),
    )
    .await?;
    let factory = BuilderFactory::new(vec![Arc::new(imaging)]);

    let builder = configuration
        .effects
        .iter()
        .try_fold(factory.create(), |builder, effect| builder.append(*effect))?;
    let pipeline = builder.build();
    info!(
        "Running {} effects on {}",
        pipeline.len(),
        configuration.input_path.display()
    );

    let mut input = File::open(&configuration.input_path)
        .await
        .map_err(|e| AppError::File(e, configuration.input_path.display().to_string()))?;
    let output = File::create(&configuration.output_path)
        .await
        .map_err(|e| AppError::File(e, configuration.output_path.display().to_string()))?;
    let mut output = BufWriter::new(output);

    pipeline.execute(&mut input, &mut output).await?;

    let stats = monitor.get_stats();
    info!(
        "Wrote {} after {} materializations (avg {:.0}us, max {}us)",
        configuration.output_path.display(),
        stats.hits,
        stats.average_duration_us,
        stats.max_duration_us
    );
    Ok(())
}
