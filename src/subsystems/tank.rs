use std::sync::Arc;

use super::BasicSubsystem;
use crate::utils::math::arcade_desaturate;

/// Two-sided drivetrain built from a left and a right [`BasicSubsystem`].
///
/// Each side keeps its own rate limiter and admissibility predicate;
/// the drivetrain only mixes and fans out.
pub struct TankDrivetrain {
    left: Arc<BasicSubsystem>,
    right: Arc<BasicSubsystem>,
}

impl TankDrivetrain {
    pub fn new(left: Arc<BasicSubsystem>, right: Arc<BasicSubsystem>) -> Self {
        Self { left, right }
    }

    pub fn set_left(&self, speed: f64) {
        self.left.move_at(speed);
    }

    pub fn set_right(&self, speed: f64) {
        self.right.move_at(speed);
    }

    /// Drives with a forward throttle and a rotation component,
    /// desaturating so neither side is asked to exceed full scale.
    pub fn arcade_drive(&self, throttle: f64, steer: f64) {
        let (left, right) = arcade_desaturate(throttle, steer);
        self.left.move_at(left);
        self.right.move_at(right);
    }

    /// Stops both sides. One call per deactivation is enough; callers
    /// should not stop each side separately as well.
    pub fn stop(&self) {
        self.left.stop();
        self.right.stop();
    }

    pub fn left(&self) -> &Arc<BasicSubsystem> {
        &self.left
    }

    pub fn right(&self) -> &Arc<BasicSubsystem> {
        &self.right
    }
}
