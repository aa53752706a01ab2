//! `fg` and `bg`: moving stopped or background jobs between the terminal and the
//! background.

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::errors::{Result, ShellError};
use crate::host::ProcessHost;
use crate::jobs::{JobId, JobState};
use crate::report::{Event, JobNotice};
use crate::shell::Shell;

impl<H: ProcessHost> Shell<H> {
    /// Continues job `id` in the foreground and waits until it stops or ends.
    ///
    /// Once the terminal has been handed to the job it is always taken back, even when
    /// the continue signal or the wait fails.
    pub fn foreground(&mut self, id: JobId) -> Result<()> {
        let pid = self.jobs.pid_of(id).ok_or(ShellError::NoSuchJob(id))?;
        debug!(%id, %pid, "putting job in foreground");

        self.host.give_terminal(pid)?;
        let waited = self.continue_and_wait(id, pid);
        let reclaimed = self.host.reclaim_terminal();

        if let Err(e) = waited {
            self.report(e)?;
        }
        if let Err(e) = reclaimed {
            self.report(e)?;
        }
        Ok(())
    }

    fn continue_and_wait(&mut self, id: JobId, pid: Pid) -> Result<()> {
        self.host.resume(pid)?;
        self.jobs.update_state_by_id(id, JobState::Running);

        match self.host.wait_for(pid)? {
            WaitStatus::Signaled(pid, sig, _) => {
                self.reporter
                    .status(JobNotice::new(id, pid, Event::Signaled(sig)))?;
                self.jobs.remove_by_id(id);
            }
            WaitStatus::Exited(pid, code) => {
                debug!(%id, %pid, code, "foreground job exited");
                self.jobs.remove_by_id(id);
            }
            WaitStatus::Stopped(pid, sig) => {
                self.reporter
                    .status(JobNotice::new(id, pid, Event::Suspended(sig)))?;
                self.jobs.update_state_by_id(id, JobState::Stopped);
            }
            other => warn!(%id, ?other, "unexpected foreground wait status"),
        }
        Ok(())
    }

    /// Continues job `id` without giving it the terminal or waiting for it.
    pub fn background(&mut self, id: JobId) -> Result<()> {
        let pid = self.jobs.pid_of(id).ok_or(ShellError::NoSuchJob(id))?;
        debug!(%id, %pid, "continuing job in background");

        self.host.resume(pid)?;
        self.jobs.update_state_by_id(id, JobState::Running);
        Ok(())
    }
}
