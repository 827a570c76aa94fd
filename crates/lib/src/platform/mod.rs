//! The operating-system collaborator.
//!
//! Everything the rest of the crate needs from the OS goes through
//! [`Platform`]: process creation and reaping, file modification times,
//! directory creation and file writes. [`Host`] is the real implementation;
//! tests substitute a recording fake so the freshness oracle, the bootstrap
//! protocol and the compilation database can be checked without spawning
//! anything.

mod host;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use host::Host;

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
  /// Normal termination with an exit code.
  Exited(i32),
  /// Killed by a signal (unix only).
  Signaled(i32),
}

impl ExitStatus {
  pub fn success(&self) -> bool {
    matches!(self, ExitStatus::Exited(0))
  }
}

impl fmt::Display for ExitStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExitStatus::Exited(code) => write!(f, "exit code {}", code),
      ExitStatus::Signaled(signal) => write!(f, "signal {}", signal),
    }
  }
}

/// Primitive OS operations used by the build runtime.
///
/// Errors follow `std::io` conventions: a missing file is
/// `ErrorKind::NotFound` and an existing directory is
/// `ErrorKind::AlreadyExists`.
pub trait Platform {
  /// A spawned process that has not been waited on yet.
  type Handle;

  /// Start `argv[0]` with the remaining arguments, without a shell.
  fn spawn(&self, argv: &[&str]) -> io::Result<Self::Handle>;

  /// Block until the process terminates and release its resources.
  fn wait(&self, handle: Self::Handle) -> io::Result<ExitStatus>;

  fn modified(&self, path: &Path) -> io::Result<SystemTime>;

  fn create_dir(&self, path: &Path) -> io::Result<()>;

  fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

  fn current_dir(&self) -> io::Result<PathBuf>;
}
