//! The precision landing control loop and everything it is assembled from.

mod angle_converter;
mod attitude_gate;
mod controller_state;
mod cycle_runner;
mod errors;
mod failure_backoff;
mod landing_controller;
mod loop_config;
mod pipeline;
mod settings;
mod target_emitter;
mod target_selector;

pub use attitude_gate::{Attitude, AttitudeError, AttitudeSource};
pub use controller_state::ControllerState;
pub use errors::{CycleError, StartError};
pub use landing_controller::{Collaborators, LandingController};
pub use loop_config::LoopConfig;
pub use pipeline::CycleReport;
pub use settings::{DetectionQuality, MarkerFamily, Settings, SettingsDraft, TargetFilter};
pub use target_emitter::{EmitError, LandingTargetMessage, TargetSink};

#[cfg(test)]
pub(crate) use angle_converter::AngleConverter;
