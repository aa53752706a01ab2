use nix::errno::Errno;
use nix::sys::wait::WaitStatus;
use tracing::{debug, warn};

use crate::errors::{Result, ShellError};
use crate::host::ProcessHost;
use crate::jobs::JobState;
use crate::report::{Event, JobNotice};
use crate::shell::Shell;

impl<H: ProcessHost> Shell<H> {
    /// Collects every pending child status change without blocking, announces it and
    /// updates the job table. Runs once before each prompt.
    ///
    /// A failing wait is reported and ends this cycle; it does not end the shell, unlike
    /// a failed read or write. Only a failed write comes back as `Err`.
    pub fn reap(&mut self) -> Result<()> {
        loop {
            let status = match self.host.poll_children() {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return Ok(()),
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "waitpid failed while reaping");
                    return self.report(ShellError::sys("waitpid", e));
                }
            };
            debug!(?status, "reaped");

            let Some(pid) = status.pid() else { continue };
            let Some(id) = self.jobs.id_of(pid) else {
                self.report(ShellError::NoJobForPid(pid))?;
                continue;
            };

            match status {
                WaitStatus::Exited(_, code) => {
                    self.reporter
                        .status(JobNotice::new(id, pid, Event::Exited(code)))?;
                    self.jobs.remove_by_id(id);
                }
                WaitStatus::Signaled(_, sig, _) => {
                    self.reporter
                        .status(JobNotice::new(id, pid, Event::Signaled(sig)))?;
                    self.jobs.remove_by_id(id);
                }
                WaitStatus::Stopped(_, sig) => {
                    self.reporter
                        .status(JobNotice::new(id, pid, Event::Suspended(sig)))?;
                    self.jobs.update_state_by_id(id, JobState::Stopped);
                }
                WaitStatus::Continued(_) => {
                    self.reporter.status(JobNotice::new(id, pid, Event::Resumed))?;
                    self.jobs.update_state_by_id(id, JobState::Running);
                }
                other => debug!(?other, "ignoring status"),
            }
        }
    }
}
