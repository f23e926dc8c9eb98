use serde::{Deserialize, Serialize};

/// Travel range for one cartesian axis, in millimeters. A pose landing
/// exactly on a bound is already out of range; the usable interval is open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AxisLimits {
    pub min: f32,
    pub max: f32,
}

impl AxisLimits {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        self.min < value && value < self.max
    }
}

/// Reachable envelope of the arm. Moves that would leave it are refused
/// before any motor runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArmLimits {
    pub x: AxisLimits,
    pub y: AxisLimits,
    pub z: AxisLimits,
}

impl Default for ArmLimits {
    fn default() -> Self {
        Self {
            x: AxisLimits::new(-110.0, 110.0),
            y: AxisLimits::new(60.0, 250.0),
            z: AxisLimits::new(20.0, 320.0),
        }
    }
}

impl ArmLimits {
    pub fn contains(&self, pose: ArmPose) -> bool {
        self.x.contains(pose.x) && self.y.contains(pose.y) && self.z.contains(pose.z)
    }

    /// Name of the first axis `pose` violates, for rejection messages.
    pub fn violated_axis(&self, pose: ArmPose) -> Option<&'static str> {
        if !self.x.contains(pose.x) {
            Some("x")
        } else if !self.y.contains(pose.y) {
            Some("y")
        } else if !self.z.contains(pose.z) {
            Some("z")
        } else {
            None
        }
    }
}

/// Cartesian position of the arm's end effector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ArmPose {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Resting position the arm returns to after calibration.
    pub const fn home() -> Self {
        Self::new(0.0, 100.0, 200.0)
    }

    pub fn offset(&self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl std::fmt::Display for ArmPose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_envelope_contains_home() {
        let limits = ArmLimits::default();
        assert!(limits.contains(ArmPose::home()));
    }

    #[test]
    fn poses_on_a_bound_are_out_of_range() {
        let limits = ArmLimits::default();
        assert!(limits.contains(ArmPose::new(109.0, 61.0, 319.0)));
        assert!(!limits.contains(ArmPose::new(110.0, 61.0, 319.0)));
        assert!(!limits.contains(ArmPose::new(109.0, 60.0, 319.0)));
        assert!(!limits.contains(ArmPose::new(109.0, 61.0, 320.0)));
    }

    #[test]
    fn violated_axis_reports_first_offender() {
        let limits = ArmLimits::default();
        assert_eq!(limits.violated_axis(ArmPose::new(200.0, 100.0, 200.0)), Some("x"));
        assert_eq!(limits.violated_axis(ArmPose::new(0.0, 0.0, 200.0)), Some("y"));
        assert_eq!(limits.violated_axis(ArmPose::new(0.0, 100.0, 330.0)), Some("z"));
        assert_eq!(limits.violated_axis(ArmPose::home()), None);
    }
}
