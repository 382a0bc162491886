//! End-to-end pipeline tests: synthetic frames in, speech and overlay
//! snapshots out. Speech goes through a recording sink so assertions cover
//! exactly what the state machine emitted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

use pathsense::depth::synthetic::{grid_with_center_patch, uniform_grid};
use pathsense::depth::{FrameBuffer, FrameSource};
use pathsense::speech::{Priority, SpeechSink};
use pathsense::{DetectionController, PipelineConfig};

const WIDTH: usize = 64;
const HEIGHT: usize = 48;
const BACKGROUND_M: f32 = 4.0;

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<(String, Priority)>>,
}

impl RecordingSink {
    fn spoken(&self) -> Vec<(String, Priority)> {
        self.records.lock().unwrap().clone()
    }
}

impl SpeechSink for RecordingSink {
    fn speak(&self, text: &str, priority: Priority) {
        self.records
            .lock()
            .unwrap()
            .push((text.to_string(), priority));
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        threshold_m: 1.0,
        tick_interval_ms: 20,
        ..PipelineConfig::default()
    }
}

async fn feed_clear(buffer: &FrameBuffer, frames: usize) {
    for _ in 0..frames {
        buffer
            .publish(WIDTH, HEIGHT, uniform_grid(WIDTH, HEIGHT, BACKGROUND_M))
            .unwrap();
        sleep(Duration::from_millis(30)).await;
    }
}

async fn feed_obstacle(buffer: &FrameBuffer, distance_m: f32, frames: usize) {
    for _ in 0..frames {
        let depths = grid_with_center_patch(WIDTH, HEIGHT, BACKGROUND_M, distance_m, 0.1);
        buffer.publish(WIDTH, HEIGHT, depths).unwrap();
        sleep(Duration::from_millis(30)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn announces_once_per_alert_edge_with_centimeters() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();

    // Clear path: nothing to say.
    feed_clear(&buffer, 4).await;
    assert!(speech.spoken().is_empty());

    // Obstacle persists across many cycles: exactly one announcement, with
    // the rounded centimeter distance, high priority, warning prefix.
    feed_obstacle(&buffer, 0.42, 6).await;
    sleep(Duration::from_millis(80)).await;
    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 1, "repeated obstacle cycles must not re-announce");
    assert!(spoken[0].0.starts_with("Warning:"), "got: {}", spoken[0].0);
    assert!(spoken[0].0.contains("42"), "got: {}", spoken[0].0);
    assert_eq!(spoken[0].1, Priority::High);

    // Clearing is silent.
    feed_clear(&buffer, 6).await;
    sleep(Duration::from_millis(80)).await;
    assert_eq!(speech.spoken().len(), 1);

    // A fresh edge announces again.
    feed_obstacle(&buffer, 0.3, 6).await;
    sleep(Duration::from_millis(80)).await;
    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 2);
    assert!(spoken[1].0.contains("30"), "got: {}", spoken[1].0);

    controller.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn overlay_tracks_alert_state() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());
    let overlay = controller.subscribe();

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();

    assert!(!overlay.borrow().alert_active);

    feed_obstacle(&buffer, 0.42, 5).await;
    sleep(Duration::from_millis(80)).await;
    {
        let snapshot = overlay.borrow().clone();
        assert!(snapshot.alert_active);
        assert!(snapshot.status_bar_hidden);
        let text = snapshot.alert_text.expect("alert text set while alerting");
        assert!(text.contains("42"), "got: {text}");
        assert!(snapshot.min_distance_m.is_some());
    }

    feed_clear(&buffer, 5).await;
    sleep(Duration::from_millis(80)).await;
    {
        let snapshot = overlay.borrow().clone();
        assert!(!snapshot.alert_active);
        assert!(snapshot.alert_text.is_none());
        assert!(!snapshot.status_bar_hidden);
    }

    controller.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_source_skips_cycles_without_alerting() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();

    // No frames at all: every cycle is a NoFrame skip.
    sleep(Duration::from_millis(150)).await;
    assert!(speech.spoken().is_empty());
    assert!(!controller.subscribe().borrow().alert_active);

    controller.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn double_start_is_refused() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();
    assert!(controller.is_running());

    let second = controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await;
    assert!(second.is_err());

    controller.stop().await.unwrap();
    assert!(!controller.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_resets_the_overlay() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());
    let overlay = controller.subscribe();

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();

    feed_obstacle(&buffer, 0.42, 5).await;
    sleep(Duration::from_millis(80)).await;
    assert!(overlay.borrow().alert_active);

    controller.stop().await.unwrap();
    assert!(!overlay.borrow().alert_active);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_fails_start() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(PipelineConfig {
        roi_width_ratio: 0.0,
        ..PipelineConfig::default()
    });

    let result = controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await;
    assert!(result.is_err());
    assert!(!controller.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn reconfigure_between_runs_only() {
    let buffer = Arc::new(FrameBuffer::new());
    let speech = Arc::new(RecordingSink::default());
    let mut controller = DetectionController::new(test_config());

    controller
        .start(
            Arc::clone(&buffer) as Arc<dyn FrameSource>,
            Arc::clone(&speech) as Arc<dyn SpeechSink>,
        )
        .await
        .unwrap();
    assert!(controller.set_config(PipelineConfig::default()).is_err());

    controller.stop().await.unwrap();
    assert!(controller.set_config(PipelineConfig::default()).is_ok());
}
