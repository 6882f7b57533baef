use std::rc::Rc;

use log::debug;

use crate::{
    command::Command,
    control::{constant, FeedbackSource, PidLoop, SetpointSource, SettleGuard},
    controllers::pid::Pid,
    settings::SharedSettings,
    subsystems::TankDrivetrain,
    time::Clock,
    utils::math::wrap_to_shortest_path,
};

/// Turns a [`TankDrivetrain`] in place to a global angle, in degrees.
///
/// The caller's setpoint is wrapped to the shortest rotational path on
/// every poll, so the loop never winds up through an extra revolution
/// even when the heading feedback moves while turning. The loop output
/// feeds the rotation channel only; forward motion is held at zero.
pub struct TurnToAngle {
    drivetrain: Rc<TankDrivetrain>,
    source: Rc<dyn FeedbackSource>,
    setpoint: SetpointSource,
    settings: SharedSettings,
    clock: Rc<dyn Clock>,
    control: Option<PidLoop>,
    guard: SettleGuard,
}

impl TurnToAngle {
    pub fn new(
        drivetrain: Rc<TankDrivetrain>,
        source: Rc<dyn FeedbackSource>,
        setpoint: SetpointSource,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let feedback = Rc::clone(&source);
        let raw = setpoint;
        // Same wrap applied at activation and on every subsequent poll.
        let setpoint: SetpointSource =
            Rc::new(move || wrap_to_shortest_path(raw(), feedback.read()));
        Self {
            drivetrain,
            source,
            setpoint,
            settings,
            clock,
            control: None,
            guard: SettleGuard::new(),
        }
    }

    /// Convenience form for a fixed target angle.
    pub fn with_angle(
        drivetrain: Rc<TankDrivetrain>,
        source: Rc<dyn FeedbackSource>,
        angle: f64,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::new(drivetrain, source, constant(angle), settings, clock)
    }
}

impl Command for TurnToAngle {
    fn initialize(&mut self) {
        let pid = {
            let s = self.settings.borrow();
            Pid::new(s.kp, s.ki, s.kd, s.windup_range, s.reset_on_sign_flip)
        };
        let drivetrain = Rc::clone(&self.drivetrain);
        let mut control = PidLoop::new(
            Box::new(pid),
            Rc::clone(&self.source),
            Box::new(move |rotate| drivetrain.arcade_drive(0.0, rotate)),
            Rc::clone(&self.clock),
            (self.setpoint)(),
        );
        control.enable();
        self.guard.arm(self.clock.now());
        self.control = Some(control);
        debug!("turn_to_angle activated");
    }

    fn execute(&mut self) {
        let Some(control) = &mut self.control else {
            return;
        };
        let new_setpoint = (self.setpoint)();
        if control.setpoint() != new_setpoint {
            control.set_setpoint(new_setpoint);
        }
        control.update();
    }

    fn is_finished(&mut self) -> bool {
        let Some(control) = &self.control else {
            return false;
        };
        let settings = self.settings.borrow();
        let on_target = control.on_target(settings.tolerance());
        self.guard
            .check(on_target, self.clock.now(), settings.wait_time())
    }

    fn end(&mut self) {
        if let Some(control) = &mut self.control {
            control.disable();
        }
        self.control = None;
        self.drivetrain.stop();
        debug!("turn_to_angle deactivated");
    }
}
