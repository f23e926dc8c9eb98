//! Hardware seams. The stepper base and the gripper servo sit behind traits
//! so the dispatch logic and its tests never touch real motors.

use thiserror::Error;
use tracing::info;

use crate::pose::ArmPose;

#[derive(Debug, Error)]
pub enum ArmError {
    #[error("arm controller I/O failure: {0}")]
    Io(String),
    #[error("arm controller not responding")]
    NotResponding,
}

/// The stepper-driven arm base.
pub trait ArmDriver: Send {
    /// Energize or release the stepper coils. Released between moves so the
    /// motors do not heat up while holding position.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), ArmError>;

    fn set_frequency(&mut self, hz: u32) -> Result<(), ArmError>;

    /// Drive each axis to its reference switch.
    fn move_to_sensor_point(&mut self) -> Result<(), ArmError>;

    fn move_to(&mut self, pose: ArmPose) -> Result<(), ArmError>;
}

/// The gripper servo, addressed by PWM channel.
pub trait GripperDriver: Send {
    fn set_angle(&mut self, channel: u8, degrees: u8) -> Result<(), ArmError>;
}

/// Stand-in driver that narrates every motion instead of moving hardware.
/// Used when running without an arm attached.
#[derive(Debug, Default)]
pub struct LoggingArmDriver;

impl ArmDriver for LoggingArmDriver {
    fn set_enabled(&mut self, enabled: bool) -> Result<(), ArmError> {
        info!(enabled, "arm: set motor enable");
        Ok(())
    }

    fn set_frequency(&mut self, hz: u32) -> Result<(), ArmError> {
        info!(hz, "arm: set step frequency");
        Ok(())
    }

    fn move_to_sensor_point(&mut self) -> Result<(), ArmError> {
        info!("arm: homing to sensor point");
        Ok(())
    }

    fn move_to(&mut self, pose: ArmPose) -> Result<(), ArmError> {
        info!(%pose, "arm: moving to pose");
        Ok(())
    }
}

impl GripperDriver for LoggingArmDriver {
    fn set_angle(&mut self, channel: u8, degrees: u8) -> Result<(), ArmError> {
        info!(channel, degrees, "gripper: set servo angle");
        Ok(())
    }
}
