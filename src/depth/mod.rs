pub mod synthetic;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Camera intrinsics reported by the sensor session. The detector never reads
/// these; they are exposed for the presentation layer's reprojection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// One captured depth map: a row-major width x height grid of distances in
/// meters. Readings <= 0.0 mean the sensor had no measurement for that pixel.
///
/// Frames are immutable after capture and shared as `Arc<DepthFrame>`; the
/// source replaces its Arc wholesale instead of mutating, so any in-flight
/// scan keeps a consistent snapshot.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    depths: Vec<f32>,
    seq: u64,
    captured_at: DateTime<Utc>,
}

impl DepthFrame {
    pub fn new(width: usize, height: usize, depths: Vec<f32>, seq: u64) -> Result<Self> {
        if depths.len() != width * height {
            bail!(
                "depth buffer length {} does not match {}x{} grid",
                depths.len(),
                width,
                height
            );
        }
        Ok(Self {
            width,
            height,
            depths,
            seq,
            captured_at: Utc::now(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Raw row-major depth readings in meters.
    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// One row of readings. Panics if `y` is out of bounds, so callers clamp
    /// against `height()` first; the detector only iterates validated ranges.
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.width;
        &self.depths[start..start + self.width]
    }
}

/// Pull-based access to the most recent depth frame. `None` means the sensor
/// has not delivered anything yet (or the session is restarting) and the
/// current detection cycle should be skipped.
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self) -> Option<Arc<DepthFrame>>;

    fn intrinsics(&self) -> Option<CameraIntrinsics> {
        None
    }
}

/// The slot a sensor session publishes into. Each publish allocates a fresh
/// `Arc<DepthFrame>` with the next sequence number; readers always see either
/// the previous complete frame or the new one, never a partial write.
pub struct FrameBuffer {
    slot: Mutex<Option<Arc<DepthFrame>>>,
    intrinsics: Mutex<Option<CameraIntrinsics>>,
    next_seq: AtomicU64,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            intrinsics: Mutex::new(None),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Publish a new capture, returning the sequence number it was assigned.
    pub fn publish(&self, width: usize, height: usize, depths: Vec<f32>) -> Result<u64> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let frame = Arc::new(DepthFrame::new(width, height, depths, seq)?);
        *self.slot.lock().unwrap() = Some(frame);
        Ok(seq)
    }

    pub fn set_intrinsics(&self, intrinsics: CameraIntrinsics) {
        *self.intrinsics.lock().unwrap() = Some(intrinsics);
    }

    /// Drop the current frame, e.g. when the sensor session pauses. Readers
    /// fall back to skipping cycles until the next publish.
    pub fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FrameBuffer {
    fn latest_frame(&self) -> Option<Arc<DepthFrame>> {
        self.slot.lock().unwrap().clone()
    }

    fn intrinsics(&self) -> Option<CameraIntrinsics> {
        *self.intrinsics.lock().unwrap()
    }
}
