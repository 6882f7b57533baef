use std::rc::Rc;

use log::debug;

use super::FeedbackSource;
use crate::{controllers::FeedbackController, time::Clock};

/// One closed feedback loop: controller, feedback source, output sink.
///
/// Built fresh on every command activation from the settings current at
/// that moment, and disabled on termination so no stale output can
/// reach the actuator after control is relinquished. While enabled,
/// every [`update`](Self::update) reads feedback, runs the controller
/// and pushes the clamped result through the output callback; updates
/// may be driven by a timing source other than the scheduler tick.
pub struct PidLoop {
    controller: Box<dyn FeedbackController<f64>>,
    feedback: Rc<dyn FeedbackSource>,
    output: Box<dyn Fn(f64)>,
    clock: Rc<dyn Clock>,
    setpoint: f64,
    output_range: (f64, f64),
    enabled: bool,
    prev_update: Option<f64>,
}

impl PidLoop {
    pub fn new(
        controller: Box<dyn FeedbackController<f64>>,
        feedback: Rc<dyn FeedbackSource>,
        output: Box<dyn Fn(f64)>,
        clock: Rc<dyn Clock>,
        setpoint: f64,
    ) -> Self {
        Self {
            controller,
            feedback,
            output,
            clock,
            setpoint,
            output_range: (-1.0, 1.0),
            enabled: false,
            prev_update: None,
        }
    }

    /// Symmetric clamp applied to every pushed output. Defaults to the
    /// actuator range [-1, 1].
    pub fn set_output_range(&mut self, min: f64, max: f64) {
        self.output_range = (min, max);
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
        self.prev_update = None;
        debug!("feedback loop enabled, setpoint {}", self.setpoint);
    }

    /// Stops pushing output. Further updates are no-ops until the loop
    /// is enabled again.
    pub fn disable(&mut self) {
        self.enabled = false;
        debug!("feedback loop disabled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Runs one controller step and pushes the clamped output.
    pub fn update(&mut self) {
        if !self.enabled {
            return;
        }
        let now = self.clock.now();
        let delta_time = match self.prev_update {
            Some(prev) => now - prev,
            None => 0.0,
        };
        self.prev_update = Some(now);
        let error = self.setpoint - self.feedback.read();
        let output = self
            .controller
            .update(error, delta_time)
            .clamp(self.output_range.0, self.output_range.1);
        (self.output)(output);
    }

    /// Whether the feedback is currently within `tolerance` of the
    /// setpoint. A tolerance of 0 never reports on target, which makes
    /// the owning command hold position until interrupted.
    pub fn on_target(&self, tolerance: f64) -> bool {
        tolerance > 0.0 && (self.setpoint - self.feedback.read()).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use approx::assert_relative_eq;

    use super::*;
    use crate::{controllers::pid::Pid, time::ManualClock};

    fn harness(
        kp: f64,
        feedback: f64,
        setpoint: f64,
    ) -> (PidLoop, Rc<RefCell<Vec<f64>>>, Rc<ManualClock>) {
        let outputs = Rc::new(RefCell::new(Vec::new()));
        let clock = Rc::new(ManualClock::new());
        let sink = Rc::clone(&outputs);
        let pid_loop = PidLoop::new(
            Box::new(Pid::new(kp, 0.0, 0.0, 0.0, false)),
            Rc::new(move || feedback),
            Box::new(move |out| sink.borrow_mut().push(out)),
            clock.clone() as Rc<dyn Clock>,
            setpoint,
        );
        (pid_loop, outputs, clock)
    }

    #[test]
    fn pushes_clamped_output_while_enabled() {
        let (mut pid_loop, outputs, _clock) = harness(1.0, 0.0, 10.0);
        pid_loop.enable();
        pid_loop.update();
        // Error of 10 with kp 1 saturates at the actuator range.
        assert_relative_eq!(outputs.borrow()[0], 1.0);
    }

    #[test]
    fn disabled_loop_pushes_nothing() {
        let (mut pid_loop, outputs, _clock) = harness(1.0, 0.0, 10.0);
        pid_loop.update();
        pid_loop.enable();
        pid_loop.update();
        pid_loop.disable();
        pid_loop.update();
        assert_eq!(outputs.borrow().len(), 1);
    }

    #[test]
    fn on_target_respects_tolerance() {
        let (pid_loop, _outputs, _clock) = harness(1.0, 9.5, 10.0);
        assert!(pid_loop.on_target(1.0));
        assert!(!pid_loop.on_target(0.25));
    }

    #[test]
    fn zero_tolerance_is_never_on_target() {
        let (pid_loop, _outputs, _clock) = harness(1.0, 10.0, 10.0);
        assert!(!pid_loop.on_target(0.0));
    }

    #[test]
    fn custom_output_range_applies() {
        let outputs = Rc::new(Cell::new(0.0));
        let clock = Rc::new(ManualClock::new());
        let sink = Rc::clone(&outputs);
        let mut pid_loop = PidLoop::new(
            Box::new(Pid::new(1.0, 0.0, 0.0, 0.0, false)),
            Rc::new(|| 0.0),
            Box::new(move |out| sink.set(out)),
            clock as Rc<dyn Clock>,
            500.0,
        );
        pid_loop.set_output_range(-180.0, 180.0);
        pid_loop.enable();
        pid_loop.update();
        assert_relative_eq!(outputs.get(), 180.0);
    }
}
