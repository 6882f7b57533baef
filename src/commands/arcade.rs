use std::rc::Rc;

use bon::bon;
use log::debug;

use crate::{
    command::Command,
    control::{FeedbackSource, PidLoop, SetpointSource},
    controllers::pid::Pid,
    settings::SharedSettings,
    subsystems::TankDrivetrain,
    time::Clock,
};

/// Arcade-drives a [`TankDrivetrain`] while a feedback loop holds its
/// heading (or any other rotational process variable) at a setpoint.
///
/// Forward motion comes from an external supplier; the loop only
/// steers. Giving the drivetrain's starting state as the setpoint
/// forces it to drive straight. `output_range` is the span of the
/// feedback source (360 for a gyro, a camera's pixel width, ...); the
/// rotation command is normalized by half of it before mixing. The
/// default of 2 suits a source already scaled to [-1, 1].
///
/// There is no settle guard here: the command runs until the optional
/// finish condition fires or it is interrupted.
pub struct ArcadeWithHeading {
    drivetrain: Rc<TankDrivetrain>,
    source: Rc<dyn FeedbackSource>,
    setpoint: SetpointSource,
    movement: SetpointSource,
    finish_condition: Option<Rc<dyn Fn() -> bool>>,
    settings: SharedSettings,
    output_range: f64,
    clock: Rc<dyn Clock>,
    control: Option<PidLoop>,
}

#[bon]
impl ArcadeWithHeading {
    #[builder]
    pub fn new(
        drivetrain: Rc<TankDrivetrain>,
        source: Rc<dyn FeedbackSource>,
        setpoint: SetpointSource,
        movement: SetpointSource,
        finish_condition: Option<Rc<dyn Fn() -> bool>>,
        settings: SharedSettings,
        #[builder(default = 2.0)] output_range: f64,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            drivetrain,
            source,
            setpoint,
            movement,
            finish_condition,
            settings,
            output_range,
            clock,
            control: None,
        }
    }
}

impl Command for ArcadeWithHeading {
    fn initialize(&mut self) {
        let pid = {
            let s = self.settings.borrow();
            Pid::new(s.kp, s.ki, s.kd, s.windup_range, s.reset_on_sign_flip)
        };
        let drivetrain = Rc::clone(&self.drivetrain);
        let movement = Rc::clone(&self.movement);
        let half_range = self.output_range / 2.0;
        let mut control = PidLoop::new(
            Box::new(pid),
            Rc::clone(&self.source),
            Box::new(move |rotate| drivetrain.arcade_drive(movement(), rotate / half_range)),
            Rc::clone(&self.clock),
            (self.setpoint)(),
        );
        control.set_output_range(-half_range, half_range);
        control.enable();
        self.control = Some(control);
        debug!("arcade_with_heading activated");
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
        match &self.finish_condition {
            Some(condition) => condition(),
            None => false,
        }
    }

    fn end(&mut self) {
        if let Some(control) = &mut self.control {
            control.disable();
        }
        self.control = None;
        self.drivetrain.stop();
        debug!("arcade_with_heading deactivated");
    }
}
