//! Collection of finished child processes.
//!
//! Background jobs are spawned and forgotten. Without somebody calling `wait` on
//! them they would linger as zombies, so a dedicated thread listens for `SIGCHLD`
//! and drains every child that has already terminated.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::{Handle, Signals};
use std::thread::{self, JoinHandle};
use tracing::{trace, warn};

/// Collect every terminated child of this process without blocking.
///
/// Returns the number of children collected. Exit statuses are discarded.
pub fn drain() -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                trace!(?status, "reaped child");
                reaped += 1;
            }
            Err(Errno::EINTR) => continue,
            // No children left at all.
            Err(Errno::ECHILD) => break,
            Err(e) => {
                warn!(error = %e, "waitpid failed while reaping");
                break;
            }
        }
    }
    reaped
}

/// Background thread that calls [`drain`] whenever a child terminates.
///
/// The thread stops when the `Reaper` is dropped.
pub struct Reaper {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Register for `SIGCHLD` and start the reaping thread.
    pub fn install() -> Result<Self> {
        let mut signals = Signals::new([SIGCHLD]).context("failed to register SIGCHLD handler")?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    let reaped = drain();
                    trace!(reaped, "SIGCHLD handled");
                }
            })
            .context("failed to start reaper thread")?;
        // Children may have exited before the handler was registered.
        drain();
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Stop listening for `SIGCHLD` and wait for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.stop();
    }
}
