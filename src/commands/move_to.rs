use std::{rc::Rc, sync::Arc};

use log::debug;

use crate::{
    command::Command,
    control::{constant, FeedbackSource, PidLoop, SetpointSource, SettleGuard},
    controllers::pid::Pid,
    settings::SharedSettings,
    subsystems::BasicSubsystem,
    time::Clock,
};

/// Drives a [`BasicSubsystem`] to a setpoint with a settle-guarded
/// feedback loop.
///
/// After the error first falls within tolerance, the loop keeps
/// driving for the configured wait time before the command finishes,
/// so the subsystem doesn't coast past and stay beyond the setpoint.
pub struct MoveToSetpoint {
    subsystem: Arc<BasicSubsystem>,
    source: Rc<dyn FeedbackSource>,
    setpoint: SetpointSource,
    settings: SharedSettings,
    clock: Rc<dyn Clock>,
    control: Option<PidLoop>,
    guard: SettleGuard,
}

impl MoveToSetpoint {
    pub fn new(
        subsystem: Arc<BasicSubsystem>,
        source: Rc<dyn FeedbackSource>,
        setpoint: SetpointSource,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            subsystem,
            source,
            setpoint,
            settings,
            clock,
            control: None,
            guard: SettleGuard::new(),
        }
    }

    /// Convenience form for a fixed setpoint.
    pub fn with_setpoint(
        subsystem: Arc<BasicSubsystem>,
        source: Rc<dyn FeedbackSource>,
        setpoint: f64,
        settings: SharedSettings,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self::new(subsystem, source, constant(setpoint), settings, clock)
    }

    /// The settings this command re-reads every tick.
    pub fn settings(&self) -> SharedSettings {
        Rc::clone(&self.settings)
    }
}

impl Command for MoveToSetpoint {
    fn initialize(&mut self) {
        let pid = {
            let s = self.settings.borrow();
            Pid::new(s.kp, s.ki, s.kd, s.windup_range, s.reset_on_sign_flip)
        };
        let subsystem = Arc::clone(&self.subsystem);
        let mut control = PidLoop::new(
            Box::new(pid),
            Rc::clone(&self.source),
            Box::new(move |output| subsystem.move_at(output)),
            Rc::clone(&self.clock),
            (self.setpoint)(),
        );
        control.enable();
        self.guard.arm(self.clock.now());
        self.control = Some(control);
        debug!("move_to_setpoint activated");
    }

    fn execute(&mut self) {
        let Some(control) = &mut self.control else {
            return;
        };
        let new_setpoint = (self.setpoint)();
        // Exact comparison on purpose: only push a target the supplier
        // actually changed.
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
        self.subsystem.stop();
        debug!("move_to_setpoint deactivated");
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        sync::{Arc, Mutex},
    };

    use approx::assert_relative_eq;

    use super::*;
    use crate::{settings::PidSettings, time::ManualClock};

    struct Rig {
        command: MoveToSetpoint,
        clock: Rc<ManualClock>,
        position: Rc<Cell<f64>>,
        commanded: Arc<Mutex<Vec<f64>>>,
    }

    fn rig(tolerance: f64, wait_time: f64) -> Rig {
        let commanded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&commanded);
        let subsystem = Arc::new(BasicSubsystem::unrestricted(Box::new(move |speed| {
            sink.lock().unwrap().push(speed)
        })));
        let position = Rc::new(Cell::new(0.0));
        let feedback = Rc::clone(&position);
        let clock = Rc::new(ManualClock::new());
        let command = MoveToSetpoint::with_setpoint(
            subsystem,
            Rc::new(move || feedback.get()),
            10.0,
            PidSettings::new(0.1, 0.0, 0.0, tolerance, wait_time)
                .unwrap()
                .into_shared(),
            clock.clone() as Rc<dyn Clock>,
        );
        Rig {
            command,
            clock,
            position,
            commanded,
        }
    }

    #[test]
    fn finishes_after_continuous_dwell() {
        let mut rig = rig(0.5, 2.0);
        rig.command.initialize();
        // Still far from the setpoint at the first check.
        rig.clock.set(1.0);
        rig.command.execute();
        assert!(!rig.command.is_finished());
        rig.position.set(9.8);
        rig.clock.set(2.9);
        assert!(!rig.command.is_finished());
        rig.clock.set(3.0);
        assert!(rig.command.is_finished());
    }

    #[test]
    fn out_of_tolerance_tick_resets_dwell() {
        let mut rig = rig(0.5, 2.0);
        rig.command.initialize();
        rig.position.set(9.8);
        rig.clock.set(1.5);
        assert!(!rig.command.is_finished());
        // Drifts out of tolerance for a single check.
        rig.position.set(8.0);
        rig.clock.set(1.9);
        assert!(!rig.command.is_finished());
        rig.position.set(9.8);
        rig.clock.set(3.5);
        assert!(!rig.command.is_finished());
        rig.clock.set(3.9);
        assert!(rig.command.is_finished());
    }

    #[test]
    fn zero_tolerance_never_finishes() {
        let mut rig = rig(0.0, 0.5);
        rig.command.initialize();
        rig.position.set(10.0);
        for tick in 1..100 {
            rig.clock.set(tick as f64);
            rig.command.execute();
            assert!(!rig.command.is_finished());
        }
    }

    #[test]
    fn end_stops_subsystem_and_kills_loop() {
        let mut rig = rig(0.5, 0.0);
        rig.command.initialize();
        rig.clock.set(0.1);
        rig.command.execute();
        let pushed_before_end = rig.commanded.lock().unwrap().len();
        rig.command.end();
        let after_end = rig.commanded.lock().unwrap().clone();
        // Exactly one extra actuation: the stop command.
        assert_eq!(after_end.len(), pushed_before_end + 1);
        assert_relative_eq!(*after_end.last().unwrap(), 0.0);
        // No actuation after deactivation.
        rig.command.execute();
        assert_eq!(rig.commanded.lock().unwrap().len(), pushed_before_end + 1);
    }

    #[test]
    fn moving_setpoint_is_repolled() {
        let target = Rc::new(Cell::new(10.0));
        let supplier = Rc::clone(&target);
        let subsystem = Arc::new(BasicSubsystem::unrestricted(Box::new(|_| {})));
        let clock = Rc::new(ManualClock::new());
        let mut command = MoveToSetpoint::new(
            subsystem,
            Rc::new(|| 0.0),
            Rc::new(move || supplier.get()),
            PidSettings::new(0.1, 0.0, 0.0, 1.0, 0.0)
                .unwrap()
                .into_shared(),
            clock as Rc<dyn Clock>,
        );
        command.initialize();
        target.set(-4.0);
        command.execute();
        assert!(!command.is_finished());
        // Settle only counts against the new target.
        assert!(command.control.as_ref().unwrap().setpoint() == -4.0);
    }

    #[test]
    fn retuning_tolerance_applies_next_tick() {
        let mut rig = rig(0.1, 0.0);
        rig.command.initialize();
        rig.position.set(9.0);
        rig.clock.set(1.0);
        assert!(!rig.command.is_finished());
        rig.command
            .settings()
            .borrow_mut()
            .set_tolerance(2.0)
            .unwrap();
        assert!(rig.command.is_finished());
    }
}
