//! Runtime self-check for the re-identification engine.
//!
//! Loads the model from the configured location, runs a synthetic person
//! crop through the full pipeline twice and verifies the second pass is
//! re-identified as the same subject. Exits non-zero on any failure.

use std::io::Cursor;
use std::process::ExitCode;

use anyhow::{bail, Context};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use reid_engine::{INPUT_HEIGHT, INPUT_WIDTH};
use reid_models::DetectionClass;
use reid_service::{build_engine, init_tracing, ServiceConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServiceConfig::from_env();
    init_tracing(config.log_format);

    println!("reid-selfcheck: starting");
    println!(
        "reid-selfcheck: tracking_window_ms={} similarity_threshold={}",
        config.engine.tracking_window_ms, config.engine.similarity_threshold
    );

    match run(&config).await {
        Ok(()) => {
            println!("reid-selfcheck: ok");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("reid-selfcheck: FAILED: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &ServiceConfig) -> anyhow::Result<()> {
    let engine = build_engine(config)
        .await
        .context("Failed to initialize engine")?;

    let model_path = config
        .engine
        .resolve_model_path()
        .context("Failed to resolve model path")?;
    println!("reid-selfcheck: model={}", model_path.display());

    let probe = probe_image().context("Failed to encode probe image")?;

    let first = engine
        .process_detection(probe.clone(), "selfcheck", "Self-check", &DetectionClass::Person)
        .await
        .context("First probe failed")?;
    let second = engine
        .process_detection(probe, "selfcheck", "Self-check", &DetectionClass::Person)
        .await
        .context("Second probe failed")?;

    println!(
        "reid-selfcheck: first={} ({}), second={} ({})",
        first.identity_id(),
        first.outcome_label(),
        second.identity_id(),
        second.outcome_label()
    );

    if !first.is_new() {
        bail!("first probe matched an existing identity on an empty store");
    }
    if second.identity_id() != first.identity_id() {
        bail!("identical probe was not re-identified");
    }

    let stats = engine.stats().await;
    println!(
        "reid-selfcheck: tracked={} approx_cache_bytes={}",
        stats.tracked_count, stats.approx_cache_bytes
    );

    engine.clear().await;
    Ok(())
}

/// Uniform mid-gray crop at the model's input size.
fn probe_image() -> anyhow::Result<Vec<u8>> {
    let img = RgbImage::from_pixel(INPUT_WIDTH, INPUT_HEIGHT, Rgb([128, 128, 128]));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut cursor, ImageOutputFormat::Png)?;
    Ok(cursor.into_inner())
}
