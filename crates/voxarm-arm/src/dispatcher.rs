use std::str::FromStr;

use tracing::{info, warn};

use voxarm_session::{CommandDispatcher, DispatchError, DispatchOutcome};

use crate::driver::{ArmDriver, ArmError, GripperDriver};
use crate::pose::{ArmLimits, ArmPose};

/// Distance covered by one spoken movement command, in millimeters.
pub const MOVE_STEP: f32 = 10.0;

const GRIPPER_CHANNEL: u8 = 0;
const GRIPPER_OPEN_DEGREES: u8 = 90;
const GRIPPER_CLOSED_DEGREES: u8 = 10;

/// One spoken command, resolved to an arm action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmCommand {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
    Open,
    Close,
}

impl FromStr for ArmCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ArmCommand::Up),
            "down" => Ok(ArmCommand::Down),
            "left" => Ok(ArmCommand::Left),
            "right" => Ok(ArmCommand::Right),
            "forward" => Ok(ArmCommand::Forward),
            "back" => Ok(ArmCommand::Back),
            "open" => Ok(ArmCommand::Open),
            "close" => Ok(ArmCommand::Close),
            _ => Err(()),
        }
    }
}

impl ArmCommand {
    /// Axis delta for movement commands, `None` for gripper commands.
    fn movement_delta(&self) -> Option<(f32, f32, f32)> {
        match self {
            ArmCommand::Up => Some((0.0, 0.0, MOVE_STEP)),
            ArmCommand::Down => Some((0.0, 0.0, -MOVE_STEP)),
            ArmCommand::Left => Some((-MOVE_STEP, 0.0, 0.0)),
            ArmCommand::Right => Some((MOVE_STEP, 0.0, 0.0)),
            ArmCommand::Forward => Some((0.0, MOVE_STEP, 0.0)),
            ArmCommand::Back => Some((0.0, -MOVE_STEP, 0.0)),
            ArmCommand::Open | ArmCommand::Close => None,
        }
    }
}

/// Tracks the arm's commanded pose and turns spoken tokens into motions.
///
/// Movement is stateful: each command offsets the last commanded pose, and a
/// pose outside the envelope is refused without touching the hardware.
pub struct ArmDispatcher {
    arm: Box<dyn ArmDriver>,
    gripper: Box<dyn GripperDriver>,
    pose: ArmPose,
    limits: ArmLimits,
}

impl ArmDispatcher {
    pub fn new(arm: Box<dyn ArmDriver>, gripper: Box<dyn GripperDriver>) -> Self {
        Self::with_limits(arm, gripper, ArmLimits::default())
    }

    pub fn with_limits(
        arm: Box<dyn ArmDriver>,
        gripper: Box<dyn GripperDriver>,
        limits: ArmLimits,
    ) -> Self {
        Self {
            arm,
            gripper,
            pose: ArmPose::home(),
            limits,
        }
    }

    pub fn pose(&self) -> ArmPose {
        self.pose
    }

    /// Step the motors to `pose` and release them so they do not hold
    /// current between commands.
    fn drive_to(&mut self, pose: ArmPose) -> Result<(), ArmError> {
        self.arm.move_to(pose)?;
        self.arm.set_enabled(true)?;
        self.arm.set_enabled(false)
    }

    fn execute_move(&mut self, delta: (f32, f32, f32)) -> Result<DispatchOutcome, ArmError> {
        let target = self.pose.offset(delta.0, delta.1, delta.2);
        if let Some(axis) = self.limits.violated_axis(target) {
            warn!(%target, axis, "Move refused, target outside arm envelope");
            return Ok(DispatchOutcome::Rejected {
                reason: format!("target {} exceeds {} axis limits", target, axis),
            });
        }

        self.drive_to(target)?;
        self.pose = target;
        info!(pose = %self.pose, "Arm moved");
        Ok(DispatchOutcome::Executed)
    }

    fn execute_gripper(&mut self, degrees: u8) -> Result<DispatchOutcome, ArmError> {
        self.gripper.set_angle(GRIPPER_CHANNEL, degrees)?;
        Ok(DispatchOutcome::Executed)
    }

    /// Drive each axis against its reference switch.
    fn home_axes(&mut self) -> Result<(), ArmError> {
        self.arm.set_enabled(false)?;
        self.arm.set_frequency(1_000)?;
        self.arm.move_to_sensor_point()?;
        self.arm.set_enabled(true)?;
        self.arm.set_enabled(false)
    }
}

impl CommandDispatcher for ArmDispatcher {
    fn dispatch(&mut self, command: &str) -> Result<DispatchOutcome, DispatchError> {
        let command = ArmCommand::from_str(command)
            .map_err(|_| DispatchError::UnknownCommand(command.to_string()))?;

        let result = match command.movement_delta() {
            Some(delta) => self.execute_move(delta),
            None => {
                let degrees = match command {
                    ArmCommand::Open => GRIPPER_OPEN_DEGREES,
                    _ => GRIPPER_CLOSED_DEGREES,
                };
                info!(degrees, "Setting gripper");
                self.execute_gripper(degrees)
            }
        };
        result.map_err(|e| DispatchError::Actuator(e.to_string()))
    }

    /// Home every axis against its reference switch, then return to the
    /// resting pose. Run once at startup before any command is accepted.
    fn calibrate(&mut self) -> Result<(), DispatchError> {
        info!("Calibrating arm");
        self.home_axes()
            .map_err(|e| DispatchError::Actuator(e.to_string()))?;

        self.pose = ArmPose::home();
        self.drive_to(self.pose)
            .map_err(|e| DispatchError::Actuator(e.to_string()))?;
        info!(pose = %self.pose, "Calibration complete");
        Ok(())
    }
}
