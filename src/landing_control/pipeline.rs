use super::angle_converter::{AngleConverter, GuidanceAngles};
use super::attitude_gate::{AttitudeGate, AttitudeSource, GateVerdict};
use super::settings::{Settings, TargetFilter};
use super::target_selector::select_target;
use crate::imaging::{DetectionError, DetectionParams, Frame, MarkerDetector, Observation};
use std::sync::Arc;

/// What one frame yielded after selection, gating and conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub observations: Vec<Observation>,
    pub target: Option<Observation>,
    /// `None` when there was no target to gate.
    pub verdict: Option<GateVerdict>,
    /// Only present for an approved target.
    pub angles: Option<GuidanceAngles>,
}

/// Result of the synchronous single cycle test path.
#[derive(Debug, Clone)]
pub struct CycleReport {
    frame: Frame,
    evaluation: Evaluation,
}

impl CycleReport {
    pub(crate) fn new(frame: Frame, evaluation: Evaluation) -> Self { Self { frame, evaluation } }

    pub fn frame(&self) -> &Frame { &self.frame }
    pub fn observations(&self) -> &[Observation] { &self.evaluation.observations }
    pub fn target(&self) -> Option<&Observation> { self.evaluation.target.as_ref() }
    pub fn verdict(&self) -> Option<&GateVerdict> { self.evaluation.verdict.as_ref() }
    pub fn angles(&self) -> Option<&GuidanceAngles> { self.evaluation.angles.as_ref() }
}

/// Detection, selection, gating and conversion for one settings bundle.
pub(crate) struct Pipeline {
    detector: Arc<dyn MarkerDetector>,
    params: DetectionParams,
    filter: TargetFilter,
    gate: AttitudeGate,
    converter: AngleConverter,
}

impl Pipeline {
    pub(crate) fn new(
        settings: &Settings,
        detector: Arc<dyn MarkerDetector>,
        attitude: Arc<dyn AttitudeSource>,
    ) -> Self {
        Self {
            detector,
            params: DetectionParams {
                family: settings.marker_family(),
                target: settings.target(),
                quad_decimate: settings.detection_quality().quad_decimate(),
                undistort: settings.undistort(),
            },
            filter: settings.target(),
            gate: AttitudeGate::new(settings.attitude_gating(), settings.sysid(), attitude),
            converter: AngleConverter::new(settings.horizontal_fov_deg()),
        }
    }

    pub(crate) fn converter(&self) -> &AngleConverter { &self.converter }

    pub(crate) async fn detect(&self, frame: &Frame) -> Result<Vec<Observation>, DetectionError> {
        self.detector.detect(frame, &self.params).await
    }

    pub(crate) async fn evaluate(&self, frame: &Frame, observations: Vec<Observation>) -> Evaluation {
        let target = select_target(&observations, self.filter).cloned();
        let Some(chosen) = &target else {
            return Evaluation { observations, target: None, verdict: None, angles: None };
        };
        let verdict = self.gate.check().await;
        let angles = verdict.is_approved().then(|| {
            self.converter.convert(frame.width(), frame.height(), chosen, frame.captured_at())
        });
        Evaluation { observations, target, verdict: Some(verdict), angles }
    }
}
