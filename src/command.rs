use log::debug;

/// The lifecycle surface a scheduler drives.
///
/// Per activation the scheduler calls `initialize` once, then
/// interleaves `execute` and `is_finished`, and finally calls `end`
/// exactly once, whether the command finished on its own or was
/// interrupted.
pub trait Command {
    fn initialize(&mut self);
    fn execute(&mut self);
    fn is_finished(&mut self) -> bool;
    fn end(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandState {
    Idle,
    Active,
    Finished,
}

/// Drives a [`Command`] through its state machine.
///
/// Enforces the lifecycle ordering contract: `end` runs exactly once
/// per activation, on normal finish and on [`cancel`](Self::cancel)
/// alike. Polling a finished or idle runner is a no-op.
pub struct CommandRunner<C: Command> {
    command: C,
    state: CommandState,
}

impl<C: Command> CommandRunner<C> {
    pub fn new(command: C) -> Self {
        Self {
            command,
            state: CommandState::Idle,
        }
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn start(&mut self) {
        if self.state == CommandState::Idle {
            self.command.initialize();
            self.state = CommandState::Active;
        }
    }

    /// Runs one scheduler tick. Returns the state after the tick.
    pub fn poll(&mut self) -> CommandState {
        if self.state == CommandState::Active {
            self.command.execute();
            if self.command.is_finished() {
                self.command.end();
                self.state = CommandState::Finished;
                debug!("command finished");
            }
        }
        self.state
    }

    /// Interruption path: stops the command without waiting for it to
    /// finish. `end` still runs, once.
    pub fn cancel(&mut self) {
        if self.state == CommandState::Active {
            self.command.end();
            self.state = CommandState::Finished;
            debug!("command cancelled");
        }
    }

    /// Gives the command back, e.g. to restart it after a finish.
    pub fn into_inner(self) -> C {
        self.command
    }
}
