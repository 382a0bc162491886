//! Simulator: runs the full pipeline against a synthetic depth source that
//! walks an obstacle toward the sensor and back. Useful for exercising the
//! alert path end to end without depth hardware.
//!
//! `PATHSENSE_MUTE=1` replaces the speech engine with a silent sink;
//! `PATHSENSE_SETTINGS=<path>` points at a settings file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::info;
use tokio::time::sleep;

use pathsense::depth::synthetic::{grid_with_center_patch, uniform_grid};
use pathsense::depth::{FrameBuffer, FrameSource};
use pathsense::speech::{NullSink, SpeechEngineHandle, SpeechSink};
use pathsense::{DetectionController, SettingsStore};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const BACKGROUND_M: f32 = 5.0;
const FRAME_PERIOD: Duration = Duration::from_millis(100);

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Reads RUST_LOG; defaults to info so the alert transitions are visible.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("PathSense simulator starting up...");

    let settings_path = std::env::var("PATHSENSE_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("pathsense-settings.json"));
    let settings = SettingsStore::new(settings_path)?;
    let config = settings.pipeline();
    config.validate()?;

    let muted = settings.speech_muted() || env_flag("PATHSENSE_MUTE");
    let engine = if muted { None } else { Some(Arc::new(SpeechEngineHandle::new())) };
    let speech: Arc<dyn SpeechSink> = match &engine {
        Some(engine) => Arc::clone(engine) as Arc<dyn SpeechSink>,
        None => {
            info!("speech muted");
            Arc::new(NullSink)
        }
    };

    let buffer = Arc::new(FrameBuffer::new());
    let mut controller = DetectionController::new(config);

    // Log overlay transitions the way a UI would consume them.
    let mut overlay = controller.subscribe();
    tokio::spawn(async move {
        let mut was_alerting = false;
        while overlay.changed().await.is_ok() {
            let snapshot = overlay.borrow_and_update().clone();
            if snapshot.alert_active != was_alerting {
                match &snapshot.alert_text {
                    Some(text) => info!("overlay -> {text}"),
                    None => info!("overlay -> clear"),
                }
                was_alerting = snapshot.alert_active;
            }
        }
    });

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech),
        )
        .await?;

    // Empty path for a second, then an obstacle walks in from 1.2 m to
    // 0.2 m, holds, and recedes. With the default 0.5 m threshold that is
    // one alert edge on the way in and one clearance on the way out.
    for _ in 0..10 {
        buffer.publish(WIDTH, HEIGHT, uniform_grid(WIDTH, HEIGHT, BACKGROUND_M))?;
        sleep(FRAME_PERIOD).await;
    }

    let mut distance = 1.2_f32;
    while distance >= 0.2 {
        let depths = grid_with_center_patch(WIDTH, HEIGHT, BACKGROUND_M, distance, 0.15);
        buffer.publish(WIDTH, HEIGHT, depths)?;
        distance -= 0.1;
        sleep(FRAME_PERIOD).await;
    }

    for _ in 0..5 {
        let depths = grid_with_center_patch(WIDTH, HEIGHT, BACKGROUND_M, 0.2, 0.15);
        buffer.publish(WIDTH, HEIGHT, depths)?;
        sleep(FRAME_PERIOD).await;
    }

    let mut distance = 0.3_f32;
    while distance <= 1.2 {
        let depths = grid_with_center_patch(WIDTH, HEIGHT, BACKGROUND_M, distance, 0.15);
        buffer.publish(WIDTH, HEIGHT, depths)?;
        distance += 0.1;
        sleep(FRAME_PERIOD).await;
    }

    for _ in 0..10 {
        buffer.publish(WIDTH, HEIGHT, uniform_grid(WIDTH, HEIGHT, BACKGROUND_M))?;
        sleep(FRAME_PERIOD).await;
    }

    controller.stop().await?;
    if let Some(engine) = engine {
        engine.shutdown();
    }

    info!("simulation finished");
    Ok(())
}
