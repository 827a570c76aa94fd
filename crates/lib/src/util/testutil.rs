//! Test utilities for nobuild-lib.
//!
//! This module provides cross-platform helpers for tests that need to run
//! real processes, plus [`MockPlatform`], an in-memory [`Platform`] that
//! records every spawn and wait so tests can account for each handle.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::platform::{ExitStatus, Platform};

/// Returns the command and args for a process that exits with `code`.
#[cfg(unix)]
pub fn exit_with(code: i32) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), format!("exit {}", code)])
}

#[cfg(windows)]
pub fn exit_with(code: i32) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("exit {}", code)])
}

/// Returns the command and args for a process that outlives the test unless killed.
#[cfg(unix)]
pub fn sleep_briefly() -> (&'static str, Vec<String>) {
  ("/bin/sleep", vec!["30".to_string()])
}

#[cfg(windows)]
pub fn sleep_briefly() -> (&'static str, Vec<String>) {
  ("powershell.exe", vec!["-NoProfile".to_string(), "-Command".to_string(), "Start-Sleep 30".to_string()])
}

/// Modification time `secs` seconds after the epoch.
pub fn at(secs: u64) -> SystemTime {
  SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// Set the modification time of a real file.
pub fn set_mtime(path: &Path, secs: u64) {
  let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
  file.set_modified(at(secs)).unwrap();
}

/// Handle returned by [`MockPlatform::spawn`]: index into the spawn log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockHandle(pub usize);

/// In-memory platform with a fake filesystem and a process log.
#[derive(Debug)]
pub struct MockPlatform {
  cwd: PathBuf,
  files: RefCell<BTreeMap<PathBuf, SystemTime>>,
  broken: BTreeSet<PathBuf>,
  dirs: RefCell<BTreeSet<PathBuf>>,
  written: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
  unspawnable: BTreeSet<String>,
  statuses: BTreeMap<String, ExitStatus>,
  outputs: BTreeMap<String, (PathBuf, SystemTime)>,
  spawned: RefCell<Vec<Vec<String>>>,
  waited: RefCell<Vec<usize>>,
}

impl Default for MockPlatform {
  fn default() -> Self {
    Self::new()
  }
}

impl MockPlatform {
  pub fn new() -> Self {
    Self {
      cwd: PathBuf::from("/work"),
      files: RefCell::default(),
      broken: BTreeSet::new(),
      dirs: RefCell::default(),
      written: RefCell::default(),
      unspawnable: BTreeSet::new(),
      statuses: BTreeMap::new(),
      outputs: BTreeMap::new(),
      spawned: RefCell::default(),
      waited: RefCell::default(),
    }
  }

  pub fn with_cwd(mut self, cwd: &str) -> Self {
    self.cwd = PathBuf::from(cwd);
    self
  }

  /// Add a file modified `secs` seconds after the epoch.
  pub fn with_file(self, path: &str, secs: u64) -> Self {
    self.files.borrow_mut().insert(PathBuf::from(path), at(secs));
    self
  }

  /// Make `modified` fail with a permission error for `path`.
  pub fn with_broken_file(mut self, path: &str) -> Self {
    self.broken.insert(PathBuf::from(path));
    self
  }

  pub fn with_dir(self, path: &str) -> Self {
    self.dirs.borrow_mut().insert(PathBuf::from(path));
    self
  }

  /// Make spawning `program` fail.
  pub fn with_unspawnable(mut self, program: &str) -> Self {
    self.unspawnable.insert(program.to_string());
    self
  }

  /// Every process started from `program` terminates with `status`.
  /// Programs without an entry exit with code 0.
  pub fn with_status(mut self, program: &str, status: ExitStatus) -> Self {
    self.statuses.insert(program.to_string(), status);
    self
  }

  /// A successful wait on `program` leaves `path` modified at `secs`,
  /// like a compiler writing its output.
  pub fn with_output(mut self, program: &str, path: &str, secs: u64) -> Self {
    self.outputs.insert(program.to_string(), (PathBuf::from(path), at(secs)));
    self
  }

  /// Argument vectors of every successful spawn, in order.
  pub fn spawned(&self) -> Vec<Vec<String>> {
    self.spawned.borrow().clone()
  }

  /// Spawn indices that were waited on, in order.
  pub fn waited(&self) -> Vec<usize> {
    self.waited.borrow().clone()
  }

  pub fn written(&self, path: &str) -> Option<Vec<u8>> {
    self.written.borrow().get(Path::new(path)).cloned()
  }

  pub fn dirs(&self) -> Vec<PathBuf> {
    self.dirs.borrow().iter().cloned().collect()
  }
}

impl Platform for MockPlatform {
  type Handle = MockHandle;

  fn spawn(&self, argv: &[&str]) -> io::Result<MockHandle> {
    let program = argv.first().copied().unwrap_or_default();
    if self.unspawnable.contains(program) {
      return Err(io::Error::new(io::ErrorKind::NotFound, "no such program"));
    }

    let mut spawned = self.spawned.borrow_mut();
    spawned.push(argv.iter().map(|arg| arg.to_string()).collect());
    Ok(MockHandle(spawned.len() - 1))
  }

  fn wait(&self, handle: MockHandle) -> io::Result<ExitStatus> {
    self.waited.borrow_mut().push(handle.0);
    let spawned = self.spawned.borrow();
    let program = spawned
      .get(handle.0)
      .and_then(|argv| argv.first())
      .ok_or_else(|| io::Error::other("unknown handle"))?;
    let status = self.statuses.get(program).copied().unwrap_or(ExitStatus::Exited(0));
    if let (true, Some((path, time))) = (status.success(), self.outputs.get(program)) {
      self.files.borrow_mut().insert(path.clone(), *time);
    }
    Ok(status)
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    if self.broken.contains(path) {
      return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
    }
    self
      .files
      .borrow()
      .get(path)
      .copied()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
  }

  fn create_dir(&self, path: &Path) -> io::Result<()> {
    if !self.dirs.borrow_mut().insert(path.to_path_buf()) {
      return Err(io::Error::new(io::ErrorKind::AlreadyExists, "exists"));
    }
    Ok(())
  }

  fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
    self.written.borrow_mut().insert(path.to_path_buf(), bytes.to_vec());
    Ok(())
  }

  fn current_dir(&self) -> io::Result<PathBuf> {
    Ok(self.cwd.clone())
  }
}
