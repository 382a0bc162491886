//! Real-time obstacle alerts from a depth sensor, for visually impaired
//! users.
//!
//! The pipeline: a sensor session publishes depth frames into a
//! [`depth::FrameBuffer`]; the [`collision::DetectionController`] runs a
//! fixed-cadence loop that scans the most recent frame for readings inside
//! the collision threshold, debounces the outcome into a Clear/Alerting state
//! and, on the transition into danger, speaks a warning through the
//! [`speech::SpeechEngineHandle`] and publishes an alert overlay snapshot for
//! the presentation layer.

pub mod collision;
pub mod config;
pub mod depth;
pub mod detect;
pub mod display;
pub mod speech;

pub use collision::{CollisionState, CollisionTracker, DetectionController};
pub use config::{PipelineConfig, SettingsStore};
pub use depth::{CameraIntrinsics, DepthFrame, FrameBuffer, FrameSource};
pub use detect::{detect, DetectError, DetectionResult, RegionOfInterest};
pub use display::{detection_zone_rect, force_brightness, OverlaySnapshot, ZoneRect};
pub use speech::{DistanceUnit, Priority, SpeechEngineHandle, SpeechSink};
