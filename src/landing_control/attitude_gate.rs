use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Gimbal (or vehicle) orientation in degrees. Pitch -90 looks straight down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub yaw_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttitudeError {
    Unavailable(String),
    /// The last attitude report is too old to describe the current pointing.
    Stale,
}

impl fmt::Display for AttitudeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttitudeError::Unavailable(reason) => write!(f, "{reason}"),
            AttitudeError::Stale => write!(f, "attitude report is stale"),
        }
    }
}

impl std::error::Error for AttitudeError {}

/// Delivers the current attitude of the vehicle with system id `sysid`.
/// Never cached across cycles.
#[async_trait]
pub trait AttitudeSource: Send + Sync {
    async fn attitude(&self, sysid: u8) -> Result<Attitude, AttitudeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Approved,
    /// The camera points too far away from the ground.
    Denied(Attitude),
    /// No attitude could be read; output is suppressed.
    Unavailable(AttitudeError),
}

impl GateVerdict {
    pub fn is_approved(&self) -> bool { matches!(self, GateVerdict::Approved) }
}

/// Suppresses guidance while the camera does not look down.
pub struct AttitudeGate {
    enabled: bool,
    sysid: u8,
    source: Arc<dyn AttitudeSource>,
}

impl AttitudeGate {
    /// Pitch of a camera facing the ground.
    pub const DOWNWARD_PITCH_DEG: f64 = -90.0;
    /// Accepted deviation from [`Self::DOWNWARD_PITCH_DEG`].
    pub const TOLERANCE_DEG: f64 = 15.0;

    pub fn new(enabled: bool, sysid: u8, source: Arc<dyn AttitudeSource>) -> Self {
        Self { enabled, sysid, source }
    }

    /// Only pitch moves the optical axis off nadir; roll spins the image
    /// around it and yaw is irrelevant once pointing down.
    pub fn is_downward(attitude: &Attitude) -> bool {
        (attitude.pitch_deg - Self::DOWNWARD_PITCH_DEG).abs() <= Self::TOLERANCE_DEG
    }

    pub async fn check(&self) -> GateVerdict {
        if !self.enabled {
            return GateVerdict::Approved;
        }
        match self.source.attitude(self.sysid).await {
            Ok(attitude) if Self::is_downward(&attitude) => GateVerdict::Approved,
            Ok(attitude) => GateVerdict::Denied(attitude),
            Err(err) => GateVerdict::Unavailable(err),
        }
    }
}
