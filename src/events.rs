// Presence Reporter — Measurement & Cycle Data Types

use core::fmt;

use crate::config::SPEED_OF_SOUND_CM_PER_US;

// ---------------------------------------------------------------------------
// Sample (one ultrasonic ranging result)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub distance_cm: f32,
    /// `false` when no echo arrived within the timeout.
    pub valid: bool,
}

impl Sample {
    /// Convert an echo pulse width into a sample.  A zero-length pulse means
    /// the echo never came back.
    pub fn from_echo_us(echo_us: u32) -> Self {
        if echo_us == 0 {
            return Self::timeout();
        }
        Self {
            distance_cm: echo_us_to_cm(echo_us),
            valid: true,
        }
    }

    pub fn timeout() -> Self {
        Self {
            distance_cm: 0.0,
            valid: false,
        }
    }

    /// Build a sample from an already-converted distance (0 = no echo).
    pub fn from_cm(distance_cm: f32) -> Self {
        Self {
            distance_cm,
            valid: distance_cm > 0.0,
        }
    }

    /// `0 < distance < threshold` on a valid reading.
    pub fn qualifies(&self, threshold_cm: f32) -> bool {
        self.valid && self.distance_cm > 0.0 && self.distance_cm < threshold_cm
    }
}

/// Round-trip echo time to one-way distance.
pub fn echo_us_to_cm(echo_us: u32) -> f32 {
    (echo_us as f32 * SPEED_OF_SOUND_CM_PER_US) / 2.0
}

// ---------------------------------------------------------------------------
// Cycle Outcome
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadResult {
    Uploaded,
    /// Could not join the network; the upload step was skipped.
    AssociationFailed,
    /// Joined the network but the remote write failed.
    UploadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    SleepOnly,
    UploadAttempted(UploadResult),
}

impl CycleOutcome {
    pub fn uploaded(&self) -> bool {
        matches!(self, Self::UploadAttempted(UploadResult::Uploaded))
    }
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploaded => f.write_str("upload success"),
            Self::AssociationFailed => f.write_str("WiFi connection failed"),
            Self::UploadFailed => f.write_str("upload failed"),
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SleepOnly => f.write_str("sleep only"),
            Self::UploadAttempted(result) => write!(f, "upload attempted ({result})"),
        }
    }
}
