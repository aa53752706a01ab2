use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use nix::unistd::Pid;
use tracing::debug;

use crate::errors::JobTableError;

/// Upper bound on simultaneously tracked jobs.
pub const MAX_JOBS: usize = 64;

/// Shell-assigned job number, distinct from the process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the state of a live job. A terminated job is simply absent from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => f.write_str("Running"),
            JobState::Stopped => f.write_str("Stopped"),
        }
    }
}

/// Represents a job in the shell. Each job leads its own process group, so `pid` is
/// also the group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub pid: Pid,
    pub state: JobState,
    pub name: String,
}

/// Manages the list of jobs, ordered by job id.
#[derive(Debug)]
pub struct JobTable {
    jobs: BTreeMap<JobId, Job>,
    capacity: usize,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    /// Creates a new, empty job table holding at most [`MAX_JOBS`] jobs.
    pub fn new() -> Self {
        Self::with_capacity(MAX_JOBS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        JobTable {
            jobs: BTreeMap::new(),
            capacity,
        }
    }

    /// Adds a job. Ids and pids must both be unused.
    pub fn insert(
        &mut self,
        id: JobId,
        pid: Pid,
        state: JobState,
        name: impl Into<String>,
    ) -> Result<(), JobTableError> {
        if self.jobs.len() >= self.capacity {
            return Err(JobTableError::Full(self.capacity));
        }
        if self.jobs.contains_key(&id) {
            return Err(JobTableError::DuplicateId(id));
        }
        if self.id_of(pid).is_some() {
            return Err(JobTableError::DuplicatePid(pid));
        }
        let job = Job {
            id,
            pid,
            state,
            name: name.into(),
        };
        debug!(?job, "job added");
        self.jobs.insert(id, job);
        Ok(())
    }

    /// Deletes the job with the given id, returning it if it was present.
    pub fn remove_by_id(&mut self, id: JobId) -> Option<Job> {
        let removed = self.jobs.remove(&id);
        if removed.is_some() {
            debug!(%id, "job removed");
        }
        removed
    }

    /// Returns false when no job has this id.
    pub fn update_state_by_id(&mut self, id: JobId, state: JobState) -> bool {
        match self.jobs.get_mut(&id) {
            Some(job) => {
                job.state = state;
                true
            }
            None => false,
        }
    }

    pub fn pid_of(&self, id: JobId) -> Option<Pid> {
        self.jobs.get(&id).map(|job| job.pid)
    }

    /// Maps a process ID to its job ID.
    pub fn id_of(&self, pid: Pid) -> Option<JobId> {
        self.jobs.values().find(|job| job.pid == pid).map(|job| job.id)
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Prints the list of jobs, one per line, in job id order.
    pub fn print_all(&self, out: &mut dyn Write) -> io::Result<()> {
        for job in self.jobs.values() {
            writeln!(out, "[{}] ({}) {} {}", job.id, job.pid, job.state, job.name)?;
        }
        out.flush()
    }

    /// Releases the table at shutdown. Live jobs are left running.
    pub fn destroy(self) {
        debug!(remaining = self.jobs.len(), "releasing job table");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn insert_and_lookup() {
        let mut table = JobTable::new();
        table.insert(JobId(1), pid(100), JobState::Running, "/bin/sleep").unwrap();
        table.insert(JobId(3), pid(300), JobState::Stopped, "vi").unwrap();

        assert_eq!(table.pid_of(JobId(1)), Some(pid(100)));
        assert_eq!(table.id_of(pid(300)), Some(JobId(3)));
        assert_eq!(table.pid_of(JobId(2)), None);
        assert_eq!(table.id_of(pid(200)), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_duplicates_and_overflow() {
        let mut table = JobTable::with_capacity(2);
        table.insert(JobId(1), pid(100), JobState::Running, "a").unwrap();
        assert_eq!(
            table.insert(JobId(1), pid(101), JobState::Running, "b"),
            Err(JobTableError::DuplicateId(JobId(1)))
        );
        assert_eq!(
            table.insert(JobId(2), pid(100), JobState::Running, "b"),
            Err(JobTableError::DuplicatePid(pid(100)))
        );
        table.insert(JobId(2), pid(102), JobState::Running, "b").unwrap();
        assert_eq!(
            table.insert(JobId(3), pid(103), JobState::Running, "c"),
            Err(JobTableError::Full(2))
        );
    }

    #[test]
    fn update_and_remove() {
        let mut table = JobTable::new();
        table.insert(JobId(4), pid(400), JobState::Running, "a").unwrap();
        assert!(table.update_state_by_id(JobId(4), JobState::Stopped));
        assert_eq!(table.get(JobId(4)).unwrap().state, JobState::Stopped);
        assert!(!table.update_state_by_id(JobId(5), JobState::Running));

        let removed = table.remove_by_id(JobId(4)).unwrap();
        assert_eq!(removed.pid, pid(400));
        assert!(table.remove_by_id(JobId(4)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn prints_in_id_order() {
        let mut table = JobTable::new();
        table.insert(JobId(5), pid(500), JobState::Stopped, "b").unwrap();
        table.insert(JobId(2), pid(200), JobState::Running, "/bin/a").unwrap();

        let mut out = Vec::new();
        table.print_all(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[2] (200) Running /bin/a\n[5] (500) Stopped b\n"
        );
    }
}
