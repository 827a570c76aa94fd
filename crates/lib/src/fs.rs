//! Filesystem helpers: the freshness oracle, directory creation and writes.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::platform::Platform;

/// Whether a destination has to be rebuilt from its sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
  /// The destination is missing or older than one of its sources.
  Stale,
  /// The destination is at least as new as every source that exists.
  Fresh,
}

impl Freshness {
  pub fn is_stale(self) -> bool {
    self == Freshness::Stale
  }
}

/// Errors that can occur in filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
  #[error("no sources given for {0}")]
  NoSources(PathBuf),

  #[error("could not stat {path}: {source}")]
  Stat {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not write file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("could not get current directory: {0}")]
  CurrentDir(#[source] io::Error),
}

/// Decide whether `dst` is stale relative to its direct inputs `srcs`.
///
/// A missing destination is always stale. A source that cannot be stat'ed is
/// logged as a warning and ignored, so a vanished input never blocks the
/// decision. The first source strictly newer than the destination ends the
/// scan. Only direct inputs are checked; callers walk deeper dependency
/// chains themselves.
///
/// At least one source is required.
pub fn outdated<P, D, S>(platform: &P, dst: D, srcs: &[S]) -> Result<Freshness, FsError>
where
  P: Platform,
  D: AsRef<Path>,
  S: AsRef<Path>,
{
  let dst = dst.as_ref();
  if srcs.is_empty() {
    return Err(FsError::NoSources(dst.to_path_buf()));
  }

  let dst_time = match platform.modified(dst) {
    Ok(time) => time,
    Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Freshness::Stale),
    Err(err) => {
      error!("could not stat {}: {}", dst.display(), err);
      return Err(FsError::Stat {
        path: dst.to_path_buf(),
        source: err,
      });
    }
  };

  for src in srcs {
    let src = src.as_ref();
    match platform.modified(src) {
      Ok(src_time) if src_time > dst_time => return Ok(Freshness::Stale),
      Ok(_) => {}
      Err(err) => warn!("could not stat {}: {}", src.display(), err),
    }
  }

  info!("{} is up-to-date", dst.display());
  Ok(Freshness::Fresh)
}

/// Create one directory. An existing directory counts as success.
pub fn mkdir<P: Platform>(platform: &P, path: impl AsRef<Path>) -> Result<(), FsError> {
  let path = path.as_ref();
  match platform.create_dir(path) {
    Ok(()) => {
      info!("create directory {}", path.display());
      Ok(())
    }
    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
    Err(err) => {
      error!("could not create directory {}: {}", path.display(), err);
      Err(FsError::CreateDir {
        path: path.to_path_buf(),
        source: err,
      })
    }
  }
}

/// Create every directory along the `/`-delimited prefixes of `path`.
///
/// The final segment is not created, so an output file path can be passed
/// directly: `build/obj/main.o` creates `build` and `build/obj`.
pub fn mkdir_parents<P: Platform>(platform: &P, path: impl AsRef<Path>) -> Result<(), FsError> {
  let path = path.as_ref().to_string_lossy();
  for (end, _) in path.match_indices('/') {
    let prefix = &path[..end];
    if prefix.is_empty() || prefix.ends_with('/') {
      continue;
    }
    mkdir(platform, prefix)?;
  }
  Ok(())
}

/// Write `bytes` to `path` in one buffered write, replacing any old content.
pub fn write<P: Platform>(platform: &P, path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), FsError> {
  let path = path.as_ref();
  platform.write_file(path, bytes).map_err(|err| {
    error!("could not write file {}: {}", path.display(), err);
    FsError::Write {
      path: path.to_path_buf(),
      source: err,
    }
  })
}

pub fn current_dir<P: Platform>(platform: &P) -> Result<PathBuf, FsError> {
  platform.current_dir().map_err(|err| {
    error!("could not get current directory: {}", err);
    FsError::CurrentDir(err)
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::Host;
  use crate::util::testutil::{MockPlatform, set_mtime};
  use tempfile::TempDir;
  use tracing_test::traced_test;

  const NO_SOURCES: &[&str] = &[];

  #[test]
  fn missing_destination_is_stale() {
    let platform = MockPlatform::new().with_file("a.c", 100);
    assert_eq!(outdated(&platform, "missing.o", &["a.c"]).unwrap(), Freshness::Stale);

    let platform = MockPlatform::new();
    assert_eq!(outdated(&platform, "missing.o", &["a.c"]).unwrap(), Freshness::Stale);
  }

  #[test]
  #[traced_test]
  fn destination_newer_than_sources_is_fresh() {
    let platform = MockPlatform::new()
      .with_file("a.o", 200)
      .with_file("a.c", 100)
      .with_file("a.h", 150);

    assert_eq!(outdated(&platform, "a.o", &["a.c", "a.h"]).unwrap(), Freshness::Fresh);
    assert!(logs_contain("a.o is up-to-date"));
  }

  #[test]
  fn equal_times_are_fresh() {
    let platform = MockPlatform::new().with_file("a.o", 100).with_file("a.c", 100);
    assert_eq!(outdated(&platform, "a.o", &["a.c"]).unwrap(), Freshness::Fresh);
  }

  #[test]
  #[traced_test]
  fn newer_source_is_stale_even_with_missing_sources() {
    let platform = MockPlatform::new()
      .with_file("a.o", 100)
      .with_file("b.c", 300)
      .with_broken_file("c.c");

    let freshness = outdated(&platform, "a.o", &["gone.c", "b.c", "c.c"]).unwrap();
    assert_eq!(freshness, Freshness::Stale);
    assert!(logs_contain("could not stat gone.c"));
    // The newer source ends the scan before c.c is looked at.
    assert!(!logs_contain("could not stat c.c"));
  }

  #[test]
  #[traced_test]
  fn missing_sources_only_warn() {
    let platform = MockPlatform::new().with_file("a.o", 100);

    assert_eq!(outdated(&platform, "a.o", &["gone.c"]).unwrap(), Freshness::Fresh);
    assert!(logs_contain("could not stat gone.c"));
  }

  #[test]
  fn destination_stat_failure_is_an_error() {
    let platform = MockPlatform::new().with_broken_file("a.o").with_file("a.c", 100);
    let err = outdated(&platform, "a.o", &["a.c"]).unwrap_err();
    assert!(matches!(err, FsError::Stat { .. }));
  }

  #[test]
  fn sources_are_required() {
    let platform = MockPlatform::new().with_file("a.o", 100);
    let err = outdated(&platform, "a.o", NO_SOURCES).unwrap_err();
    assert!(matches!(err, FsError::NoSources(_)));
  }

  #[test]
  fn outdated_on_real_files() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("main.c");
    let obj = temp.path().join("main.o");
    std::fs::write(&src, "int main(void) { return 0; }").unwrap();
    std::fs::write(&obj, "").unwrap();

    set_mtime(&src, 1_000);
    set_mtime(&obj, 2_000);
    assert_eq!(outdated(&Host, &obj, &[&src]).unwrap(), Freshness::Fresh);

    set_mtime(&src, 3_000);
    assert_eq!(outdated(&Host, &obj, &[&src]).unwrap(), Freshness::Stale);
  }

  #[test]
  fn mkdir_accepts_existing_directory() {
    let platform = MockPlatform::new().with_dir("build");
    assert!(mkdir(&platform, "build").is_ok());
    assert!(mkdir(&platform, "out").is_ok());
    assert_eq!(platform.dirs(), vec![PathBuf::from("build"), PathBuf::from("out")]);
  }

  #[test]
  fn mkdir_parents_creates_each_prefix() {
    let platform = MockPlatform::new().with_dir("build");
    mkdir_parents(&platform, "build/obj/debug/main.o").unwrap();

    assert_eq!(
      platform.dirs(),
      vec![
        PathBuf::from("build"),
        PathBuf::from("build/obj"),
        PathBuf::from("build/obj/debug"),
      ]
    );
  }

  #[test]
  fn mkdir_parents_skips_empty_prefixes() {
    let platform = MockPlatform::new();
    mkdir_parents(&platform, "/tmp//out/").unwrap();

    assert_eq!(platform.dirs(), vec![PathBuf::from("/tmp"), PathBuf::from("/tmp//out")]);
  }

  #[test]
  #[cfg(unix)]
  fn mkdir_parents_on_real_filesystem() {
    let temp = TempDir::new().unwrap();
    let target = format!("{}/a/b/file.o", temp.path().display());

    mkdir_parents(&Host, &target).unwrap();
    assert!(temp.path().join("a").join("b").is_dir());
    assert!(!temp.path().join("a").join("b").join("file.o").exists());
  }

  #[test]
  fn write_reports_failure() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing-dir").join("out.json");

    let err = write(&Host, &path, b"[]").unwrap_err();
    assert!(matches!(err, FsError::Write { .. }));
  }
}
