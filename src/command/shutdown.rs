use nix::{sys::signal, unistd::Pid};

use super::error::CommandError;

/// ProcessTerminator asks the process with the provided pid to exit gracefully.
#[derive(Debug, Clone, Copy)]
pub struct ProcessTerminator {
    pid: u32,
}

impl ProcessTerminator {
    pub fn new(pid: u32) -> Self {
        Self { pid }
    }

    /// Sends SIGTERM.
    pub fn terminate(&self) -> Result<(), CommandError> {
        signal::kill(Pid::from_raw(self.pid as i32), signal::SIGTERM)
            .map_err(|err| CommandError::NixError(err.to_string()))
    }
}
