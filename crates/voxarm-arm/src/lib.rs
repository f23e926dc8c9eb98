//! Robot arm actuation: pose tracking, the movement envelope, and the
//! dispatcher that turns recognized command words into motor actions.

pub mod dispatcher;
pub mod driver;
pub mod pose;

pub use dispatcher::{ArmCommand, ArmDispatcher, MOVE_STEP};
pub use driver::{ArmDriver, ArmError, GripperDriver, LoggingArmDriver};
pub use pose::{ArmLimits, ArmPose, AxisLimits};
