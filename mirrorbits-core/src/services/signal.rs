// src/services/signal.rs
//! Out-of-band control of a running redirector daemon.
//!
//! The daemon writes its pid to a well-known file; we read it and deliver a
//! POSIX signal. This module never starts a daemon.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{AdminError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Re-read configuration.
    Reload,
    /// Re-exec the binary without dropping connections.
    Upgrade,
}

impl ControlSignal {
    pub fn as_signal(&self) -> Signal {
        match self {
            ControlSignal::Reload => Signal::SIGHUP,
            ControlSignal::Upgrade => Signal::SIGUSR2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlSignal::Reload => "reload-configuration",
            ControlSignal::Upgrade => "begin-seamless-upgrade",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Pid of a live daemon, or `None` when the file is missing, unreadable
    /// as a pid, or names a process that no longer exists. A daemon owned by
    /// another user still counts as live; delivery reports the EPERM.
    pub fn running_pid(&self) -> Result<Option<Pid>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let Ok(raw) = text.trim().parse::<i32>() else {
            tracing::warn!(path = %self.path.display(), "pid file does not contain a pid");
            return Ok(None);
        };
        if raw <= 0 {
            return Ok(None);
        }
        let pid = Pid::from_raw(raw);
        if !is_alive(kill(pid, None)) {
            tracing::debug!(pid = raw, "stale pid file");
            return Ok(None);
        }
        Ok(Some(pid))
    }
}

/// Interprets the result of `kill(pid, 0)`. Only ESRCH means the process is gone.
fn is_alive(check: nix::Result<()>) -> bool {
    !matches!(check, Err(Errno::ESRCH))
}

/// Deliver `signal` to the daemon named by `pid_file`; returns the pid signaled.
pub fn send(pid_file: &PidFile, signal: ControlSignal) -> Result<i32> {
    let pid = pid_file.running_pid()?.ok_or(AdminError::NoRunningInstance)?;
    kill(pid, signal.as_signal()).map_err(|source| AdminError::Signal {
        pid: pid.as_raw(),
        source,
    })?;
    tracing::info!(pid = pid.as_raw(), signal = signal.as_str(), "control signal sent");
    Ok(pid.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_esrch_means_gone() {
        assert!(is_alive(Ok(())));
        assert!(is_alive(Err(Errno::EPERM)));
        assert!(!is_alive(Err(Errno::ESRCH)));
    }
}
