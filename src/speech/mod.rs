pub mod params;

pub use params::{format_distance, DistanceUnit, Priority, SpeechParams, SpeechRequest};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, warn};
use tts::Tts;

/// Anything the pipeline can speak through. The engine below implements it
/// for production; tests inject a recording sink instead.
///
/// Calls are fire-and-forget: acceptance is immediate and failures degrade to
/// silence, never to a crash.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str, priority: Priority);
    fn stop(&self);
    fn is_speaking(&self) -> bool;

    /// High-priority message with a fixed warning prefix.
    fn speak_warning(&self, message: &str) {
        self.speak(&format!("Warning: {message}"), Priority::High);
    }

    /// Low-priority informational message.
    fn speak_clearance(&self, message: &str) {
        self.speak(message, Priority::Low);
    }

    /// High-priority distance announcement in the configured unit.
    fn speak_distance(&self, distance_m: f32, unit: DistanceUnit) {
        self.speak(&format_distance(distance_m, unit), Priority::High);
    }
}

/// Sink that swallows everything. Used when speech is muted.
pub struct NullSink;

impl SpeechSink for NullSink {
    fn speak(&self, _text: &str, _priority: Priority) {}
    fn stop(&self) {}
    fn is_speaking(&self) -> bool {
        false
    }
}

enum SpeechCommand {
    Speak(SpeechRequest),
    Stop,
    Shutdown,
}

// How often the engine thread refreshes the speaking flag while idle.
const SPEAKING_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to the process-wide speech engine.
///
/// A dedicated OS thread owns the platform TTS handle (not `Send` on every
/// backend) and drains a command channel, the same shape as a dedicated
/// audio thread holding its output stream. One instance serves the whole
/// application; inject it wherever speech is needed rather than reaching for
/// a global.
///
/// Every accepted request preempts whatever is currently playing: the backend
/// is always asked to interrupt, so at most one utterance is audible and the
/// most recent call wins regardless of priority. If the platform engine fails
/// to initialize, the failure is logged once and every later call is a no-op.
pub struct SpeechEngineHandle {
    tx: Mutex<Option<Sender<SpeechCommand>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    speaking: Arc<AtomicBool>,
}

impl SpeechEngineHandle {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<SpeechCommand>();
        let speaking = Arc::new(AtomicBool::new(false));
        let speaking_for_worker = Arc::clone(&speaking);

        let worker = thread::Builder::new()
            .name("speech-engine".to_string())
            .spawn(move || {
                // Output configuration happens here, on the owning thread.
                // Media ducking is the platform backend's job once spoken
                // audio is active.
                let mut tts = match Tts::default() {
                    Ok(tts) => tts,
                    Err(err) => {
                        error!("speech engine unavailable, speech disabled: {err}");
                        return;
                    }
                };

                loop {
                    match rx.recv_timeout(SPEAKING_POLL_INTERVAL) {
                        Ok(SpeechCommand::Speak(request)) => {
                            apply_params(&mut tts, request.params);
                            // interrupt = true: cancel the in-progress
                            // utterance before starting this one.
                            match tts.speak(request.text.clone(), true) {
                                Ok(_) => {
                                    speaking_for_worker.store(true, Ordering::SeqCst);
                                    debug!(
                                        "speaking ({:?}): {}",
                                        request.priority, request.text
                                    );
                                }
                                Err(err) => warn!("speech dispatch failed: {err}"),
                            }
                        }
                        Ok(SpeechCommand::Stop) => {
                            if let Err(err) = tts.stop() {
                                warn!("speech stop failed: {err}");
                            }
                            speaking_for_worker.store(false, Ordering::SeqCst);
                        }
                        Ok(SpeechCommand::Shutdown) => {
                            let _ = tts.stop();
                            speaking_for_worker.store(false, Ordering::SeqCst);
                            break;
                        }
                        Err(RecvTimeoutError::Timeout) => {
                            // Keep the flag honest once the utterance runs out.
                            if let Ok(active) = tts.is_speaking() {
                                speaking_for_worker.store(active, Ordering::SeqCst);
                            }
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("failed to spawn speech engine thread: {err}");
                None
            }
        };

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(worker),
            speaking,
        }
    }

    fn send(&self, command: SpeechCommand) -> bool {
        let guard = self.tx.lock().unwrap();
        match guard.as_ref() {
            // A dead engine thread shows up as a send error; speech simply
            // becomes a no-op.
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }

    /// Stop the engine thread and wait for it to exit. Speech calls after
    /// shutdown are no-ops.
    pub fn shutdown(&self) {
        let _ = self.send(SpeechCommand::Shutdown);
        if let Some(tx) = self.tx.lock().unwrap().take() {
            drop(tx);
        }
        if let Some(worker) = self.worker.lock().unwrap().take() {
            if worker.join().is_err() {
                warn!("speech engine thread panicked during shutdown");
            }
        }
        self.speaking.store(false, Ordering::SeqCst);
    }
}

impl Default for SpeechEngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSink for SpeechEngineHandle {
    fn speak(&self, text: &str, priority: Priority) {
        let request = SpeechRequest::new(text, priority);
        if self.send(SpeechCommand::Speak(request)) {
            // Reflect the new utterance immediately; the worker keeps the
            // flag current from there.
            self.speaking.store(true, Ordering::SeqCst);
        }
    }

    fn stop(&self) {
        if self.send(SpeechCommand::Stop) {
            self.speaking.store(false, Ordering::SeqCst);
        }
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Map normalized parameters onto whatever range the backend exposes.
fn apply_params(tts: &mut Tts, params: SpeechParams) {
    let features = tts.supported_features();

    if features.rate {
        let (min, max) = (tts.min_rate(), tts.max_rate());
        let rate = min + params.rate.clamp(0.0, 1.0) * (max - min);
        if let Err(err) = tts.set_rate(rate) {
            warn!("failed to set speech rate: {err}");
        }
    }

    if features.volume {
        let (min, max) = (tts.min_volume(), tts.max_volume());
        let volume = min + params.volume.clamp(0.0, 1.0) * (max - min);
        if let Err(err) = tts.set_volume(volume) {
            warn!("failed to set speech volume: {err}");
        }
    }

    if features.pitch {
        let (min, max) = (tts.min_pitch(), tts.max_pitch());
        let pitch = (tts.normal_pitch() * params.pitch).clamp(min, max);
        if let Err(err) = tts.set_pitch(pitch) {
            warn!("failed to set speech pitch: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_is_silent() {
        let sink = NullSink;
        sink.speak_warning("obstacle ahead");
        sink.speak_clearance("path is clear");
        sink.speak_distance(0.42, DistanceUnit::Meters);
        assert!(!sink.is_speaking());
    }

    #[test]
    fn engine_calls_never_panic_without_a_backend() {
        // On hosts without a speech service the worker logs and exits; the
        // handle must degrade to no-ops rather than crash.
        let engine = SpeechEngineHandle::new();
        engine.speak("hello", Priority::Normal);
        engine.stop();
        let _ = engine.is_speaking();
        engine.shutdown();
    }
}
