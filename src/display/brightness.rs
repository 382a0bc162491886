//! Screen brightness forcing with read-back verification.
//!
//! Low-vision users rely on the preview being visible outdoors, so the app
//! pins brightness to maximum while the camera view is open. The platform
//! occasionally reverts the value right after it is set; instead of firing
//! the same write at fixed delays and hoping, we verify by reading back and
//! retry a bounded number of times.

use anyhow::Result;
use log::{debug, warn};

/// Hardware seam. The real backend talks to the platform display service;
/// tests substitute an in-memory fake.
pub trait BrightnessBackend: Send + Sync {
    /// Current brightness in `[0.0, 1.0]`.
    fn brightness(&self) -> Result<f32>;
    fn set_brightness(&self, level: f32) -> Result<()>;
}

// Read-back within this distance of the target counts as applied.
const BRIGHTNESS_TOLERANCE: f32 = 0.01;

/// Set `target` and verify it stuck, retrying up to `max_attempts` times.
/// Returns an error only when every attempt failed to apply; individual
/// backend errors are logged and retried.
pub fn force_brightness(
    backend: &dyn BrightnessBackend,
    target: f32,
    max_attempts: u32,
) -> Result<()> {
    let target = target.clamp(0.0, 1.0);

    for attempt in 1..=max_attempts {
        if let Err(err) = backend.set_brightness(target) {
            warn!("brightness write failed (attempt {attempt}/{max_attempts}): {err}");
            continue;
        }

        match backend.brightness() {
            Ok(level) if (level - target).abs() <= BRIGHTNESS_TOLERANCE => {
                debug!("brightness {target} applied on attempt {attempt}");
                return Ok(());
            }
            Ok(level) => {
                warn!(
                    "brightness read back {level} instead of {target} \
                     (attempt {attempt}/{max_attempts})"
                );
            }
            Err(err) => {
                warn!("brightness read-back failed (attempt {attempt}/{max_attempts}): {err}");
            }
        }
    }

    anyhow::bail!("brightness {target} did not stick after {max_attempts} attempts")
}
