use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

/// Settings shared between commands and their owners.
///
/// Commands borrow the settings rather than copying them, so tolerance
/// and wait time can be retuned while a command is active and take
/// effect on its next tick. Gain edits only apply at the next
/// activation, since the feedback loop is built from the gains once.
pub type SharedSettings = Rc<RefCell<PidSettings>>;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("gain {name} must be finite, got {value}")]
    NonFiniteGain { name: &'static str, value: f64 },

    #[error("tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),

    #[error("wait time must be non-negative, got {0}")]
    NegativeWaitTime(f64),
}

/// Gains and termination policy for a settle-guarded feedback loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PidSettings {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// Maximum |setpoint - feedback| considered on target.
    /// A tolerance of 0 means the loop is never on target, so a
    /// command using these settings only ends when interrupted.
    tolerance: f64,

    /// Time to stay continuously within tolerance before finishing.
    wait_time: f64,

    /// Error range outside which the integral term resets. 0 disables.
    pub windup_range: f64,

    /// Whether the integral term resets when the error changes sign.
    pub reset_on_sign_flip: bool,
}

impl PidSettings {
    pub fn new(
        kp: f64,
        ki: f64,
        kd: f64,
        tolerance: f64,
        wait_time: f64,
    ) -> Result<Self, SettingsError> {
        for (name, value) in [("kp", kp), ("ki", ki), ("kd", kd)] {
            if !value.is_finite() {
                return Err(SettingsError::NonFiniteGain { name, value });
            }
        }
        if tolerance < 0.0 {
            return Err(SettingsError::NegativeTolerance(tolerance));
        }
        if wait_time < 0.0 {
            return Err(SettingsError::NegativeWaitTime(wait_time));
        }
        Ok(Self {
            kp,
            ki,
            kd,
            tolerance,
            wait_time,
            windup_range: 0.0,
            reset_on_sign_flip: false,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), SettingsError> {
        if tolerance < 0.0 {
            return Err(SettingsError::NegativeTolerance(tolerance));
        }
        self.tolerance = tolerance;
        Ok(())
    }

    pub fn wait_time(&self) -> f64 {
        self.wait_time
    }

    pub fn set_wait_time(&mut self, wait_time: f64) -> Result<(), SettingsError> {
        if wait_time < 0.0 {
            return Err(SettingsError::NegativeWaitTime(wait_time));
        }
        self.wait_time = wait_time;
        Ok(())
    }

    pub fn into_shared(self) -> SharedSettings {
        Rc::new(RefCell::new(self))
    }
}
