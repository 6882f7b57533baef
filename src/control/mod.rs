use std::rc::Rc;

pub mod pid_loop;
pub mod settle;

pub use pid_loop::PidLoop;
pub use settle::SettleGuard;

/// A process-variable reading the feedback loop drives towards its
/// setpoint. Polled at the loop's own cadence, which is not
/// necessarily the scheduler's tick rate.
pub trait FeedbackSource {
    fn read(&self) -> f64;
}

impl<F: Fn() -> f64> FeedbackSource for F {
    fn read(&self) -> f64 {
        self()
    }
}

/// A setpoint polled every tick, so targets can move mid-command
/// (vision tracking, operator nudges) without restarting it.
pub type SetpointSource = Rc<dyn Fn() -> f64>;

/// A setpoint that always returns the same value.
pub fn constant(value: f64) -> SetpointSource {
    Rc::new(move || value)
}
