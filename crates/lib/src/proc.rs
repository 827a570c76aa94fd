//! Spawning and reaping child processes.
//!
//! [`spawn`] never blocks: a build program may start several commands and
//! only then wait on them, which runs them in parallel as separate OS
//! processes. [`wait`] and [`wait_many`] are the only blocking calls and
//! they have no timeout.

use std::process::Child;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::arr::Array;
use crate::cmd::Cmd;
use crate::platform::{ExitStatus, Host, Platform};

/// Errors that can occur while waiting on a process.
#[derive(Debug, Error)]
pub enum ProcError {
  /// The handle came from a failed spawn.
  #[error("invalid process handle")]
  InvalidHandle,

  #[error("could not wait for process: {0}")]
  Wait(#[source] std::io::Error),

  #[error("process exited with exit code {0}")]
  ExitCode(i32),

  #[error("process was terminated by signal {0}")]
  Signal(i32),

  #[error("{failed} of {total} processes failed")]
  Many { failed: usize, total: usize },
}

/// A spawned process that has not been waited on yet.
///
/// A failed spawn yields [`Proc::invalid`], which waits as a failure without
/// blocking. Waiting consumes the handle; a handle that is dropped instead is
/// never reaped.
#[derive(Debug)]
#[must_use = "a process must be waited on to be reaped"]
pub struct Proc<H = Child> {
  handle: Option<H>,
}

impl<H> Proc<H> {
  pub const fn invalid() -> Self {
    Self { handle: None }
  }

  fn from_handle(handle: H) -> Self {
    Self { handle: Some(handle) }
  }

  pub fn is_valid(&self) -> bool {
    self.handle.is_some()
  }
}

impl Proc<Child> {
  /// OS process id, if the spawn succeeded.
  pub fn id(&self) -> Option<u32> {
    self.handle.as_ref().map(Child::id)
  }

  /// Block until the process terminates on the host.
  pub fn wait(self) -> Result<(), ProcError> {
    wait(&Host, self)
  }
}

/// Growable list of process handles started together.
#[derive(Debug)]
pub struct Procs<H = Child> {
  items: Array<Proc<H>>,
}

impl<H> Procs<H> {
  pub const fn new() -> Self {
    Self { items: Array::new() }
  }

  pub fn push(&mut self, proc: Proc<H>) {
    self.items.append(proc);
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl<H> Default for Procs<H> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H> IntoIterator for Procs<H> {
  type Item = Proc<H>;
  type IntoIter = std::vec::IntoIter<Proc<H>>;

  fn into_iter(self) -> Self::IntoIter {
    self.items.into_iter()
  }
}

impl Procs<Child> {
  /// Wait on every process on the host. See [`wait_many`].
  pub fn wait_all(self) -> Result<(), ProcError> {
    wait_many(&Host, self)
  }
}

/// Start `cmd` without waiting for it.
///
/// Empty arguments are dropped before the process is created. The command
/// line is logged before spawning. Failure to create the process is logged
/// and reported as [`Proc::invalid`].
pub fn spawn<P: Platform>(platform: &P, cmd: &Cmd<'_>) -> Proc<P::Handle> {
  let argv = cmd.argv();
  let Some(program) = argv.first() else {
    error!("could not run an empty command");
    return Proc::invalid();
  };

  info!("CMD: {}", cmd);

  match platform.spawn(&argv) {
    Ok(handle) => {
      debug!(program = %program, "process started");
      Proc::from_handle(handle)
    }
    Err(err) => {
      error!("could not create process for {}: {}", program, err);
      Proc::invalid()
    }
  }
}

/// Block until `proc` terminates.
///
/// Succeeds only when the process exited normally with code 0. The invalid
/// handle fails immediately.
pub fn wait<P: Platform>(platform: &P, proc: Proc<P::Handle>) -> Result<(), ProcError> {
  let Some(handle) = proc.handle else {
    return Err(ProcError::InvalidHandle);
  };

  let status = platform.wait(handle).map_err(|err| {
    error!("could not wait for process: {}", err);
    ProcError::Wait(err)
  })?;

  match status {
    ExitStatus::Exited(0) => Ok(()),
    ExitStatus::Exited(code) => {
      error!("process exited with exit code {}", code);
      Err(ProcError::ExitCode(code))
    }
    ExitStatus::Signaled(signal) => {
      error!("process was terminated by signal {}", signal);
      Err(ProcError::Signal(signal))
    }
  }
}

/// Wait on every process, even after one of them has failed, so none is
/// left unreaped. Succeeds only if all of them succeed.
pub fn wait_many<P, I>(platform: &P, procs: I) -> Result<(), ProcError>
where
  P: Platform,
  I: IntoIterator<Item = Proc<P::Handle>>,
{
  let mut total = 0;
  let mut failed = 0;
  for proc in procs {
    total += 1;
    if wait(platform, proc).is_err() {
      failed += 1;
    }
  }

  if failed > 0 {
    return Err(ProcError::Many { failed, total });
  }
  Ok(())
}
