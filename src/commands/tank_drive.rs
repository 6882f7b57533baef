use std::{rc::Rc, sync::Arc};

use log::debug;

use crate::{
    command::Command,
    control::{constant, FeedbackSource, PidLoop, SetpointSource, SettleGuard},
    controllers::pid::Pid,
    settings::SharedSettings,
    subsystems::TankDrivetrain,
    time::Clock,
};

/// Drives both sides of a [`TankDrivetrain`] to their setpoints.
///
/// Left and right run independent feedback loops but share one settle
/// clock: the dwell timer resets whenever either side is off target,
/// so the command only finishes once both sides have been within
/// tolerance simultaneously and continuously for the full wait time.
pub struct TankMoveTo {
    drivetrain: Rc<TankDrivetrain>,
    left_source: Rc<dyn FeedbackSource>,
    right_source: Rc<dyn FeedbackSource>,
    left_setpoint: SetpointSource,
    right_setpoint: SetpointSource,
    settings: SharedSettings,
    clock: Rc<dyn Clock>,
    left_control: Option<PidLoop>,
    right_control: Option<PidLoop>,
    guard: SettleGuard,
}

impl TankMoveTo {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        drivetrain: Rc<TankDrivetrain>,
        left_source: Rc<dyn FeedbackSource>,
        right_source: Rc<dyn FeedbackSource>,
        left_setpoint: SetpointSource,
        right_setpoint: SetpointSource,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            drivetrain,
            left_source,
            right_source,
            left_setpoint,
            right_setpoint,
            settings,
            clock,
            left_control: None,
            right_control: None,
            guard: SettleGuard::new(),
        }
    }

    /// Both sides chase the same supplier.
    pub fn with_shared_setpoint(
        drivetrain: Rc<TankDrivetrain>,
        left_source: Rc<dyn FeedbackSource>,
        right_source: Rc<dyn FeedbackSource>,
        setpoint: SetpointSource,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::new(
            drivetrain,
            left_source,
            right_source,
            Rc::clone(&setpoint),
            setpoint,
            settings,
            clock,
        )
    }

    /// Both sides chase the same fixed setpoint.
    pub fn with_setpoint(
        drivetrain: Rc<TankDrivetrain>,
        left_source: Rc<dyn FeedbackSource>,
        right_source: Rc<dyn FeedbackSource>,
        setpoint: f64,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::with_shared_setpoint(
            drivetrain,
            left_source,
            right_source,
            constant(setpoint),
            settings,
            clock,
        )
    }

    fn build_loop(
        &self,
        source: &Rc<dyn FeedbackSource>,
        setpoint: f64,
        output: Box<dyn Fn(f64)>,
    ) -> PidLoop {
        let s = self.settings.borrow();
        let pid = Pid::new(s.kp, s.ki, s.kd, s.windup_range, s.reset_on_sign_flip);
        let mut control = PidLoop::new(
            Box::new(pid),
            Rc::clone(source),
            output,
            Rc::clone(&self.clock),
            setpoint,
        );
        control.enable();
        control
    }
}

impl Command for TankMoveTo {
    fn initialize(&mut self) {
        let left_side = Arc::clone(self.drivetrain.left());
        let right_side = Arc::clone(self.drivetrain.right());
        self.left_control = Some(self.build_loop(
            &self.left_source,
            (self.left_setpoint)(),
            Box::new(move |output| left_side.move_at(output)),
        ));
        self.right_control = Some(self.build_loop(
            &self.right_source,
            (self.right_setpoint)(),
            Box::new(move |output| right_side.move_at(output)),
        ));
        self.guard.arm(self.clock.now());
        debug!("tank_move_to activated");
    }

    fn execute(&mut self) {
        if let Some(control) = &mut self.left_control {
            let new_setpoint = (self.left_setpoint)();
            if new_setpoint != control.setpoint() {
                control.set_setpoint(new_setpoint);
            }
            control.update();
        }
        if let Some(control) = &mut self.right_control {
            let new_setpoint = (self.right_setpoint)();
            if new_setpoint != control.setpoint() {
                control.set_setpoint(new_setpoint);
            }
            control.update();
        }
    }

    fn is_finished(&mut self) -> bool {
        let (Some(left), Some(right)) = (&self.left_control, &self.right_control) else {
            return false;
        };
        let settings = self.settings.borrow();
        let both_on_target =
            left.on_target(settings.tolerance()) && right.on_target(settings.tolerance());
        self.guard
            .check(both_on_target, self.clock.now(), settings.wait_time())
    }

    fn end(&mut self) {
        if let Some(control) = &mut self.left_control {
            control.disable();
        }
        if let Some(control) = &mut self.right_control {
            control.disable();
        }
        self.left_control = None;
        self.right_control = None;
        // One composite stop, not one per side.
        self.drivetrain.stop();
        debug!("tank_move_to deactivated");
    }
}
