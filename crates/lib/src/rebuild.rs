//! Self-rebuild bootstrap.
//!
//! A build program calls this first thing in `main`. If its binary is older
//! than any of its own sources, it recompiles itself, runs the fresh binary
//! with the same arguments and exits with that run's status. The stale
//! process never gets to run any build logic.
//!
//! The protocol is a decision procedure, [`Bootstrap::decide`], that either
//! lets the caller proceed or names the exit code. [`Bootstrap::run`] applies
//! that decision on the host.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::cmd::Cmd;
use crate::fs::{self, Freshness};
use crate::platform::{Host, Platform};
use crate::proc::{self, ProcError};

/// Set to any non-empty value to skip the freshness check entirely.
pub const NO_REBUILD_ENV: &str = "NOB_NO_REBUILD";

/// Rebuild the calling build program if its sources changed.
///
/// Uses `file!()` as the primary source, the extra arguments as auxiliary
/// sources, and cargo to rebuild the current package binary. Paths from
/// `file!()` are relative to the directory cargo ran in.
#[macro_export]
macro_rules! rebuild_myself {
  ($($src:expr),* $(,)?) => {
    $crate::rebuild::rebuild_myself(
      ::std::file!(),
      &[$($src),*],
      $crate::Toolchain::Cargo {
        package: ::std::env!("CARGO_PKG_NAME").to_string(),
        bin: ::std::env!("CARGO_BIN_NAME").to_string(),
      },
    )
  };
}

#[derive(Debug, Error)]
pub enum BootstrapError {
  #[error("missing binary path in command-line arguments")]
  MissingBinaryPath,
}

/// The command used to recompile a build program from its primary source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Toolchain {
  /// `rustc -o <dst> <src>`, for single-file build programs.
  #[default]
  Rustc,
  /// The platform C compiler.
  Cc,
  /// `cargo build` for one binary of a package. The profile follows the one
  /// this library was compiled with. Cargo writes into its own target
  /// directory, so the running binary must live there for the rebuild to
  /// refresh it.
  Cargo { package: String, bin: String },
  /// Arbitrary argument template; `{dst}` and `{src}` are substituted.
  Custom(Vec<String>),
}

impl Toolchain {
  /// The command that writes the binary `dst` from the source `src`.
  pub fn command<'a>(&'a self, dst: &'a str, src: &'a str) -> Cmd<'a> {
    let mut cmd = Cmd::new();
    match self {
      Toolchain::Rustc => {
        cmd.extend(["rustc", "--edition", "2024", "-o", dst, src]);
      }
      Toolchain::Cc => append_cc(&mut cmd, dst, src),
      Toolchain::Cargo { package, bin } => {
        let profile = if cfg!(debug_assertions) { "" } else { "--release" };
        cmd.extend(["cargo", "build", "--quiet", profile, "-p", package.as_str(), "--bin", bin.as_str()]);
      }
      Toolchain::Custom(template) => {
        cmd.extend(template.iter().map(|arg| arg.replace("{dst}", dst).replace("{src}", src)));
      }
    }
    cmd
  }
}

#[cfg(all(windows, target_env = "msvc"))]
fn append_cc<'a>(cmd: &mut Cmd<'a>, dst: &'a str, src: &'a str) {
  cmd.append("cl.exe").append(format!("/Fe:{}", dst)).append(src);
}

#[cfg(all(windows, not(target_env = "msvc")))]
fn append_cc<'a>(cmd: &mut Cmd<'a>, dst: &'a str, src: &'a str) {
  cmd.extend(["gcc", "-Wall", "-Wextra", "-Wpedantic", "-o", dst, src]);
}

#[cfg(not(windows))]
fn append_cc<'a>(cmd: &mut Cmd<'a>, dst: &'a str, src: &'a str) {
  cmd.extend(["cc", "-Wall", "-Wextra", "-Wpedantic", "-o", dst, src]);
}

/// Outcome of the startup check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  /// The binary is current; continue with the build.
  Proceed,
  /// The process is done and must exit with this code.
  Exit(i32),
}

/// The startup check of a self-rebuilding build program.
#[derive(Debug, Clone)]
pub struct Bootstrap {
  binary: String,
  args: Vec<String>,
  sources: Vec<PathBuf>,
  toolchain: Toolchain,
}

impl Bootstrap {
  /// Take the binary path from the first argument and keep the rest to
  /// forward to the rebuilt binary.
  pub fn from_args<I, S>(args: I, primary_source: impl Into<PathBuf>) -> Result<Self, BootstrapError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut args = args.into_iter().map(Into::into);
    let binary = args.next().ok_or(BootstrapError::MissingBinaryPath)?;

    Ok(Self {
      binary,
      args: args.collect(),
      sources: vec![primary_source.into()],
      toolchain: Toolchain::default(),
    })
  }

  /// Add an auxiliary source whose changes also trigger a rebuild.
  pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
    self.sources.push(source.into());
    self
  }

  pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
    self.toolchain = toolchain;
    self
  }

  pub fn binary(&self) -> &str {
    &self.binary
  }

  /// Primary source first, then auxiliary sources in order.
  pub fn sources(&self) -> &[PathBuf] {
    &self.sources
  }

  /// Check the binary against its sources and rebuild and re-run it if stale.
  ///
  /// A check error or a failed recompilation exits with 1, and so does a
  /// recompilation that leaves the binary stale, since re-running it would
  /// only rebuild again. After a rebuild the exit code of the new binary is passed through; a re-run that did
  /// not exit normally maps to 1.
  pub fn decide<P: Platform>(&self, platform: &P) -> Decision {
    match fs::outdated(platform, &self.binary, &self.sources) {
      Ok(Freshness::Fresh) => return Decision::Proceed,
      Ok(Freshness::Stale) => {}
      Err(_) => return Decision::Exit(1),
    }

    let Some(primary) = self.sources.first() else {
      return Decision::Exit(1);
    };

    info!("rebuild myself");

    let primary = primary.to_string_lossy();
    let rebuild = self.toolchain.command(&self.binary, &primary);
    if proc::wait(platform, proc::spawn(platform, &rebuild)).is_err() {
      return Decision::Exit(1);
    }

    match fs::outdated(platform, &self.binary, &self.sources) {
      Ok(Freshness::Fresh) => {}
      Ok(Freshness::Stale) => {
        error!("rebuild did not update {}: {}", self.binary, rebuild);
        return Decision::Exit(1);
      }
      Err(_) => return Decision::Exit(1),
    }

    let mut rerun = Cmd::new();
    rerun.append(self.binary.as_str());
    rerun.extend(self.args.iter().map(String::as_str));

    match proc::wait(platform, proc::spawn(platform, &rerun)) {
      Ok(()) => Decision::Exit(0),
      Err(ProcError::ExitCode(code)) => Decision::Exit(code),
      Err(_) => Decision::Exit(1),
    }
  }

  /// Apply [`decide`](Self::decide) on the host, exiting the process unless
  /// the binary is current. Skipped when [`NO_REBUILD_ENV`] is set.
  pub fn run(&self) {
    if rebuild_disabled() {
      return;
    }

    if let Decision::Exit(code) = self.decide(&Host) {
      std::process::exit(code);
    }
  }
}

fn rebuild_disabled() -> bool {
  std::env::var_os(NO_REBUILD_ENV).is_some_and(|value| !value.is_empty())
}

/// Entry point behind [`rebuild_myself!`]: bootstrap from `std::env::args`.
pub fn rebuild_myself(primary_source: &str, aux_sources: &[&str], toolchain: Toolchain) {
  let bootstrap = match Bootstrap::from_args(std::env::args(), primary_source) {
    Ok(bootstrap) => bootstrap,
    Err(err) => {
      error!("{}", err);
      std::process::exit(1);
    }
  };

  aux_sources
    .iter()
    .fold(bootstrap, |bootstrap, source| bootstrap.with_source(*source))
    .with_toolchain(toolchain)
    .run();
}
