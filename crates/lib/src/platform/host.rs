use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::SystemTime;

use super::{ExitStatus, Platform};

/// The running operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Host;

impl Platform for Host {
  type Handle = Child;

  fn spawn(&self, argv: &[&str]) -> io::Result<Child> {
    let (program, args) = argv
      .split_first()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

    Command::new(program).args(args).spawn()
  }

  fn wait(&self, mut handle: Child) -> io::Result<ExitStatus> {
    let status = handle.wait()?;
    Ok(convert_status(status))
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
  }

  fn create_dir(&self, path: &Path) -> io::Result<()> {
    std::fs::create_dir(path)
  }

  fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()
  }

  fn current_dir(&self) -> io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(dunce::canonicalize(&cwd).unwrap_or(cwd))
  }
}

#[cfg(unix)]
fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
  use std::os::unix::process::ExitStatusExt;

  match (status.code(), status.signal()) {
    (Some(code), _) => ExitStatus::Exited(code),
    (None, Some(signal)) => ExitStatus::Signaled(signal),
    // Stopped or continued children are not reported by a blocking wait.
    (None, None) => ExitStatus::Exited(-1),
  }
}

#[cfg(windows)]
fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
  // Windows has no signals; every termination carries an exit code.
  ExitStatus::Exited(status.code().unwrap_or(-1))
}
