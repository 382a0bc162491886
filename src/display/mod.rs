pub mod brightness;

pub use brightness::{force_brightness, BrightnessBackend};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detection-zone rectangle in screen points, for the overlay the sighted
/// helper sees. Purely presentational; the detector works in raw sensor
/// pixels and never touches this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Centered strip covering `ratio` of the screen in both axes. Recompute
/// whenever the display size or the region ratio changes.
pub fn detection_zone_rect(screen_width: f32, screen_height: f32, ratio: f32) -> ZoneRect {
    let width = screen_width * ratio;
    let height = screen_height * ratio;
    ZoneRect {
        x: (screen_width - width) / 2.0,
        y: (screen_height - height) / 2.0,
        width,
        height,
    }
}

/// Everything the presentation layer needs per detection cycle, published on
/// a single watch channel. The status-bar flag travels here too instead of a
/// broadcast notification: during an alert the app goes full screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub alert_active: bool,
    pub alert_text: Option<String>,
    pub min_distance_m: Option<f32>,
    pub status_bar_hidden: bool,
    pub updated_at: DateTime<Utc>,
}

impl OverlaySnapshot {
    pub fn clear() -> Self {
        Self {
            alert_active: false,
            alert_text: None,
            min_distance_m: None,
            status_bar_hidden: false,
            updated_at: Utc::now(),
        }
    }

    pub fn alerting(text: String, min_distance_m: f32) -> Self {
        Self {
            alert_active: true,
            alert_text: Some(text),
            min_distance_m: Some(min_distance_m),
            status_bar_hidden: true,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_rect_is_centered() {
        let zone = detection_zone_rect(390.0, 844.0, 0.3);
        assert!((zone.width - 117.0).abs() < 1e-3);
        assert!((zone.height - 253.2).abs() < 1e-3);
        assert!((zone.x - (390.0 - 117.0) / 2.0).abs() < 1e-3);
        assert!((zone.y - (844.0 - 253.2) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn zone_rect_tracks_the_ratio() {
        let full = detection_zone_rect(100.0, 100.0, 1.0);
        assert_eq!(full.x, 0.0);
        assert_eq!(full.width, 100.0);
    }

    #[test]
    fn alert_snapshot_hides_the_status_bar() {
        let snapshot = OverlaySnapshot::alerting("Obstacle 42 cm".into(), 0.42);
        assert!(snapshot.alert_active);
        assert!(snapshot.status_bar_hidden);
        assert!(!OverlaySnapshot::clear().status_bar_hidden);
    }
}
