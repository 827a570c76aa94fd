//! nobuild: primitives for build programs that compile their own sources.
//!
//! A project's build logic is an ordinary program. This crate gives that
//! program what it needs:
//! - `Cmd` and `Proc`: run argument-vector commands, in parallel if desired
//! - `fs::outdated`: timestamp-based staleness of one output against its inputs
//! - `Bootstrap` / `rebuild_myself!`: recompile and re-run the build program
//!   when its own sources change
//! - `CompileDb`: record compiler invocations into `compile_commands.json`
//! - `Scratch`: a bump arena for short-lived strings
//! - `Array`: the growable container underneath all of the above
//!
//! All OS access goes through the `Platform` trait; `Host` is the real one.
//! A build program normally starts with `rebuild_myself!()` and then does:
//!
//! ```no_run
//! use nobuild::{CompileDb, Host, cmd, fs};
//!
//! nobuild::log::init(false).ok();
//!
//! let mut db = CompileDb::new();
//! let compile = cmd!("cc", "-c", "main.c", "-o", "build/main.o");
//! db.record(&Host, &compile).ok();
//! fs::mkdir_parents(&Host, "build/main.o").unwrap();
//! if nobuild::outdated("build/main.o", &["main.c"]).unwrap().is_stale() {
//!   compile.run().unwrap();
//! }
//! db.write(&Host, "build/compile_commands.json").unwrap();
//! ```

use std::path::Path;

pub mod arr;
pub mod cmd;
pub mod compile_db;
pub mod fs;
pub mod log;
pub mod platform;
pub mod proc;
pub mod rebuild;
pub mod scratch;

#[cfg(test)]
mod util;

pub use arr::Array;
pub use cmd::Cmd;
pub use compile_db::{CompileDb, CompileDbError};
pub use fs::{Freshness, FsError};
pub use platform::{ExitStatus, Host, Platform};
pub use proc::{Proc, ProcError, Procs};
pub use rebuild::{Bootstrap, BootstrapError, Decision, Toolchain};
pub use scratch::Scratch;

/// [`fs::outdated`] against the host filesystem.
pub fn outdated<D, S>(dst: D, srcs: &[S]) -> Result<Freshness, FsError>
where
  D: AsRef<Path>,
  S: AsRef<Path>,
{
  fs::outdated(&Host, dst, srcs)
}
