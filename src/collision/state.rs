use serde::{Deserialize, Serialize};

use crate::detect::DetectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollisionState {
    Clear,
    Alerting,
}

impl Default for CollisionState {
    fn default() -> Self {
        CollisionState::Clear
    }
}

/// Edge produced by one detection cycle. Self-transitions produce nothing:
/// an obstacle that stays in view must not re-trigger speech every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    AlertRaised { min_distance_m: f32 },
    AlertCleared,
}

/// Debounces raw detector output into stable state. Side effects (speech,
/// overlay) belong to the caller; this stays a pure function of the observed
/// sequence so the gating is unit-testable.
#[derive(Debug, Default)]
pub struct CollisionTracker {
    state: CollisionState,
}

impl CollisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CollisionState {
        self.state
    }

    pub fn observe(&mut self, result: &DetectionResult) -> Option<Transition> {
        match (self.state, result.obstacle_found) {
            (CollisionState::Clear, true) => {
                self.state = CollisionState::Alerting;
                Some(Transition::AlertRaised {
                    min_distance_m: result.min_distance_m,
                })
            }
            (CollisionState::Alerting, false) => {
                self.state = CollisionState::Clear;
                Some(Transition::AlertCleared)
            }
            _ => None,
        }
    }
}

/// Whole centimeters for announcements and overlay text.
pub fn distance_cm(min_distance_m: f32) -> i64 {
    (min_distance_m * 100.0).round() as i64
}
