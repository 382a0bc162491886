use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::depth::FrameSource;
use crate::detect::detect;
use crate::display::OverlaySnapshot;
use crate::speech::SpeechSink;

use super::state::{distance_cm, CollisionTracker, Transition};

/// Fixed-cadence detection cycle. Each tick pulls the most recent frame (or
/// skips if none), runs the per-pixel scan on the blocking pool, then applies
/// the result here — this task is the only writer of collision state and the
/// overlay channel, so no lock guards either.
///
/// The loop never blocks on frame delivery and never processes frames
/// retroactively; a tick that finds nothing new simply passes.
pub async fn detection_loop(
    session_id: String,
    source: Arc<dyn FrameSource>,
    config: PipelineConfig,
    speech: Arc<dyn SpeechSink>,
    overlay_tx: watch::Sender<OverlaySnapshot>,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tracker = CollisionTracker::new();
    let mut last_scanned_seq: Option<u64> = None;
    // Set while a scan runs on the blocking pool; a scan that outlives its
    // timeout keeps later ticks from piling more work onto the same frame.
    let scan_in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(frame) = source.latest_frame() else {
                    // NoFrame: not an error, the sensor session is warming up
                    // or restarting. State stays as it is.
                    debug!("no depth frame available, skipping cycle");
                    continue;
                };

                if last_scanned_seq == Some(frame.seq()) {
                    debug!("frame {} already scanned, skipping cycle", frame.seq());
                    continue;
                }

                if scan_in_flight.load(Ordering::Acquire) {
                    warn!("previous scan still in flight, skipping cycle");
                    continue;
                }

                last_scanned_seq = Some(frame.seq());
                scan_in_flight.store(true, Ordering::Release);

                let in_flight = Arc::clone(&scan_in_flight);
                let (roi_w, roi_h, threshold) = (
                    config.roi_width_ratio,
                    config.roi_height_ratio,
                    config.threshold_m,
                );
                let scan = task::spawn_blocking(move || {
                    let result = detect(&frame, roi_w, roi_h, threshold);
                    in_flight.store(false, Ordering::Release);
                    result
                });

                let result = match timeout(config.scan_timeout(), scan).await {
                    Ok(Ok(Ok(result))) => result,
                    Ok(Ok(Err(err))) => {
                        error!("detector rejected input: {err}");
                        continue;
                    }
                    Ok(Err(err)) => {
                        scan_in_flight.store(false, Ordering::Release);
                        error!("scan worker join failed: {err}");
                        continue;
                    }
                    Err(_) => {
                        warn!(
                            "scan exceeded {}ms, skipping cycle (session {})",
                            config.scan_timeout_ms, session_id
                        );
                        continue;
                    }
                };

                // A result that arrives after teardown is discarded.
                if cancel_token.is_cancelled() {
                    break;
                }

                match tracker.observe(&result) {
                    Some(Transition::AlertRaised { min_distance_m }) => {
                        let cm = distance_cm(min_distance_m);
                        info!("obstacle entered threshold at {cm} cm (session {session_id})");
                        speech.speak_warning(&format!("obstacle ahead at {cm} centimeters"));
                        overlay_tx.send_replace(OverlaySnapshot::alerting(
                            format!("Obstacle {cm} cm"),
                            min_distance_m,
                        ));
                    }
                    Some(Transition::AlertCleared) => {
                        // The transition back is silent; only the overlay resets.
                        info!("obstacle cleared (session {session_id})");
                        overlay_tx.send_replace(OverlaySnapshot::clear());
                    }
                    None => {
                        // No edge: refresh the cadence-published display fields
                        // without re-announcing.
                        if result.obstacle_found {
                            let cm = distance_cm(result.min_distance_m);
                            overlay_tx.send_replace(OverlaySnapshot::alerting(
                                format!("Obstacle {cm} cm"),
                                result.min_distance_m,
                            ));
                        } else {
                            overlay_tx.send_replace(OverlaySnapshot::clear());
                        }
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("detection loop shutting down (session {session_id})");
                break;
            }
        }
    }
}
