//! Compilation database (`compile_commands.json`) writer.
//!
//! Language servers and static analyzers read a JSON array of
//! `{"directory", "command", "file"}` objects, one per compiler invocation.
//! [`CompileDb`] accumulates those objects as commands are recorded and
//! writes the finished array once at the end of the build.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::arr::Array;
use crate::cmd::Cmd;
use crate::fs::{self, FsError};
use crate::platform::Platform;

/// Extensions that mark an argument as the translation unit of a command.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cpp", "cc", "cxx"];

const OPEN: &[u8] = b"[\n";
const SEPARATOR: &[u8] = b",\n";
const CLOSE: &[u8] = b"\n]\n";

#[derive(Debug, Error)]
pub enum CompileDbError {
  #[error("could not find file in compile command {0}")]
  NoSourceFile(String),

  #[error("could not serialize compile command: {0}")]
  Serialize(#[from] serde_json::Error),

  #[error(transparent)]
  Fs(#[from] FsError),
}

#[derive(Serialize)]
struct Entry<'a> {
  directory: &'a Path,
  command: &'a str,
  file: &'a str,
}

/// In-memory compilation database.
///
/// The buffer holds `[`, then every entry followed by a separator. Writing
/// swaps the last separator for the closing `]`; recording again afterwards
/// reopens the array.
#[derive(Debug, Default)]
pub struct CompileDb {
  buf: Array<u8>,
  entries: usize,
  closed: bool,
}

impl CompileDb {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of recorded commands.
  pub fn len(&self) -> usize {
    self.entries
  }

  pub fn is_empty(&self) -> bool {
    self.entries == 0
  }

  /// Current buffer contents.
  pub fn as_bytes(&self) -> &[u8] {
    &self.buf
  }

  /// Record one compiler invocation.
  ///
  /// The entry's `file` is the first argument with a C or C++ source
  /// extension. Commands without one are skipped with a warning.
  pub fn record<P: Platform>(&mut self, platform: &P, cmd: &Cmd<'_>) -> Result<(), CompileDbError> {
    let command = cmd.to_string();
    let Some(file) = source_file(cmd) else {
      warn!("could not find file in compile command {}", command);
      return Err(CompileDbError::NoSourceFile(command));
    };
    let directory: PathBuf = fs::current_dir(platform)?;

    let reopened = self.closed;
    if self.closed {
      self.buf.truncate(self.buf.len() - CLOSE.len());
      self.buf.append_many(SEPARATOR);
      self.closed = false;
    } else if self.entries == 0 {
      self.buf.append_many(OPEN);
    }

    let mark = self.buf.len();
    let entry = Entry {
      directory: &directory,
      command: &command,
      file,
    };
    if let Err(err) = serde_json::to_writer(&mut self.buf, &entry) {
      self.buf.truncate(mark);
      if reopened {
        self.buf.truncate(mark - SEPARATOR.len());
        self.buf.append_many(CLOSE);
        self.closed = true;
      } else if self.entries == 0 {
        self.buf.clear();
      }
      return Err(err.into());
    }
    self.buf.append_many(SEPARATOR);
    self.entries += 1;

    debug!(file = %file, "recorded compile command");
    Ok(())
  }

  /// Close the array and write it to `path`.
  ///
  /// Without any recorded command nothing is written. Writing again
  /// rewrites the same contents.
  pub fn write<P: Platform>(&mut self, platform: &P, path: impl AsRef<Path>) -> Result<(), CompileDbError> {
    if self.entries == 0 {
      return Ok(());
    }

    if !self.closed {
      self.buf.truncate(self.buf.len() - SEPARATOR.len());
      self.buf.append_many(CLOSE);
      self.closed = true;
    }

    fs::write(platform, path, &self.buf)?;
    Ok(())
  }
}

/// First argument that names a C or C++ source file.
pub fn source_file<'c>(cmd: &'c Cmd<'_>) -> Option<&'c str> {
  cmd.args().find(|arg| {
    Path::new(arg)
      .extension()
      .and_then(OsStr::to_str)
      .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
  })
}
