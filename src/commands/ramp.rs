use std::{rc::Rc, sync::Arc};

use bon::bon;
use log::debug;

use crate::{
    command::Command, control::SetpointSource, subsystems::BasicSubsystem, time::Clock,
};

/// Ramps a [`BasicSubsystem`] linearly from rest so it reaches a wanted
/// speed after a given time, open loop.
///
/// The wanted speed is re-polled every tick and the commanded speed
/// never exceeds its magnitude. Finishes when the optional stop
/// condition fires, or, with `finish_when_reaching_speed`, once the
/// commanded speed equals the target exactly.
pub struct RampSpeed {
    subsystem: Arc<BasicSubsystem>,
    wanted_speed: SetpointSource,
    time: f64,
    finish_when_reaching_speed: bool,
    stop_condition: Option<Rc<dyn Fn() -> bool>>,
    clock: Rc<dyn Clock>,
    start_time: f64,
    acceleration: f64,
    current_speed: f64,
}

#[bon]
impl RampSpeed {
    #[builder]
    pub fn new(
        subsystem: Arc<BasicSubsystem>,
        wanted_speed: SetpointSource,
        time: f64,
        #[builder(default = false)] finish_when_reaching_speed: bool,
        stop_condition: Option<Rc<dyn Fn() -> bool>>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        // Sub-second ramp times would produce a near-instant jump, so
        // they are raised to one second.
        let time = if time <= 1.0 { 1.0 } else { time };
        Self {
            subsystem,
            wanted_speed,
            time,
            finish_when_reaching_speed,
            stop_condition,
            clock,
            start_time: 0.0,
            acceleration: 0.0,
            current_speed: 0.0,
        }
    }
}

impl Command for RampSpeed {
    fn initialize(&mut self) {
        self.start_time = self.clock.now();
        self.current_speed = 0.0;
        self.acceleration = (self.wanted_speed)() / self.time;
        debug!(
            "ramp activated: {} over {}s",
            (self.wanted_speed)(),
            self.time
        );
    }

    fn execute(&mut self) {
        let wanted = (self.wanted_speed)();
        self.current_speed = (self.clock.now() - self.start_time) * self.acceleration;
        if self.current_speed.abs() > wanted.abs() {
            self.current_speed = wanted;
        }
        self.subsystem.move_at(self.current_speed);
    }

    fn is_finished(&mut self) -> bool {
        if let Some(stop) = &self.stop_condition {
            if stop() {
                return true;
            }
        }
        // Exact equality on purpose: the clamp in execute() commits the
        // commanded speed to the target the tick it would pass it.
        self.finish_when_reaching_speed && self.current_speed == (self.wanted_speed)()
    }

    fn end(&mut self) {
        self.subsystem.stop();
        debug!("ramp deactivated");
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
    use crate::{control::constant, time::ManualClock};

    struct Rig {
        clock: Rc<ManualClock>,
        subsystem: Arc<BasicSubsystem>,
        commanded: Arc<Mutex<Vec<f64>>>,
    }

    fn rig() -> Rig {
        let commanded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&commanded);
        Rig {
            clock: Rc::new(ManualClock::new()),
            subsystem: Arc::new(BasicSubsystem::unrestricted(Box::new(move |speed| {
                sink.lock().unwrap().push(speed)
            }))),
            commanded,
        }
    }

    #[test]
    fn reaches_target_exactly_at_the_configured_time() {
        let rig = rig();
        let mut command = RampSpeed::builder()
            .subsystem(Arc::clone(&rig.subsystem))
            .wanted_speed(constant(1.0))
            .time(4.0)
            .finish_when_reaching_speed(true)
            .clock(rig.clock.clone() as Rc<dyn Clock>)
            .build();
        command.initialize();
        for tick in 1..8 {
            rig.clock.set(tick as f64 * 0.5);
            command.execute();
            let commanded = *rig.commanded.lock().unwrap().last().unwrap();
            assert!(commanded.abs() < 1.0);
            assert_relative_eq!(commanded, tick as f64 * 0.125);
            assert!(!command.is_finished());
        }
        rig.clock.set(4.0);
        command.execute();
        assert_relative_eq!(*rig.commanded.lock().unwrap().last().unwrap(), 1.0);
        assert!(command.is_finished());
    }

    #[test]
    fn commanded_speed_never_exceeds_target_magnitude() {
        let rig = rig();
        let mut command = RampSpeed::builder()
            .subsystem(Arc::clone(&rig.subsystem))
            .wanted_speed(constant(-0.5))
            .time(2.0)
            .clock(rig.clock.clone() as Rc<dyn Clock>)
            .build();
        command.initialize();
        rig.clock.set(10.0);
        command.execute();
        assert_relative_eq!(*rig.commanded.lock().unwrap().last().unwrap(), -0.5);
        // Without finish_when_reaching_speed the ramp holds forever.
        assert!(!command.is_finished());
    }

    #[test]
    fn stop_condition_ends_the_ramp() {
        let rig = rig();
        let tripped = Rc::new(Cell::new(false));
        let flag = Rc::clone(&tripped);
        let mut command = RampSpeed::builder()
            .subsystem(Arc::clone(&rig.subsystem))
            .wanted_speed(constant(1.0))
            .time(4.0)
            .stop_condition(Rc::new(move || flag.get()) as Rc<dyn Fn() -> bool>)
            .clock(rig.clock.clone() as Rc<dyn Clock>)
            .build();
        command.initialize();
        rig.clock.set(1.0);
        command.execute();
        assert!(!command.is_finished());
        tripped.set(true);
        assert!(command.is_finished());
    }

    #[test]
    fn sub_second_times_are_raised_to_one_second() {
        let rig = rig();
        let mut command = RampSpeed::builder()
            .subsystem(Arc::clone(&rig.subsystem))
            .wanted_speed(constant(1.0))
            .time(0.25)
            .clock(rig.clock.clone() as Rc<dyn Clock>)
            .build();
        command.initialize();
        rig.clock.set(0.5);
        command.execute();
        // Acceleration computed against the floored one-second ramp.
        assert_relative_eq!(*rig.commanded.lock().unwrap().last().unwrap(), 0.5);
    }

    #[test]
    fn end_stops_the_subsystem() {
        let rig = rig();
        let mut command = RampSpeed::builder()
            .subsystem(Arc::clone(&rig.subsystem))
            .wanted_speed(constant(1.0))
            .time(2.0)
            .clock(rig.clock.clone() as Rc<dyn Clock>)
            .build();
        command.initialize();
        rig.clock.set(1.0);
        command.execute();
        command.end();
        assert_relative_eq!(*rig.commanded.lock().unwrap().last().unwrap(), 0.0);
    }
}
