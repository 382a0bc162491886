use serde::{Deserialize, Serialize};

/// Urgency of a spoken message. Priority selects delivery parameters; it does
/// not gate preemption (the most recent request always wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    High,
    Normal,
    Low,
}

/// Delivery parameters for one utterance. Rate and volume are normalized
/// fractions of the backend's range; pitch is a multiplier on the backend's
/// normal pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechParams {
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
}

impl Priority {
    /// The fixed priority-to-parameter table. Alerts are slightly faster and
    /// higher pitched, informational messages slower and softer.
    pub fn params(self) -> SpeechParams {
        match self {
            Priority::High => SpeechParams {
                rate: 0.55,
                volume: 1.0,
                pitch: 1.1,
            },
            Priority::Normal => SpeechParams {
                rate: 0.50,
                volume: 1.0,
                pitch: 1.0,
            },
            Priority::Low => SpeechParams {
                rate: 0.45,
                volume: 0.9,
                pitch: 0.95,
            },
        }
    }
}

/// One accepted request. Consumed by the engine once spoken or preempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    pub text: String,
    pub priority: Priority,
    #[serde(flatten)]
    pub params: SpeechParams,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            priority,
            params: priority.params(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceUnit {
    Meters,
    Inches,
}

const INCHES_PER_METER: f32 = 39.3701;

/// Spoken form of a distance: meters with one decimal, inches whole.
pub fn format_distance(distance_m: f32, unit: DistanceUnit) -> String {
    match unit {
        DistanceUnit::Meters => format!("{distance_m:.1} meters"),
        DistanceUnit::Inches => {
            format!("{} inches", (distance_m * INCHES_PER_METER).round() as i64)
        }
    }
}
