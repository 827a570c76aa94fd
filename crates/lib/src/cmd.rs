//! Commands: argument vectors describing one process invocation.

use std::borrow::Cow;
use std::fmt;
use std::process::Child;

use crate::arr::Array;
use crate::platform::Host;
use crate::proc::{self, Proc, ProcError};

/// Build a [`Cmd`] from a list of arguments.
///
/// ```
/// let cmd = nobuild::cmd!("cc", "-c", "main.c", "-o", "main.o");
/// assert_eq!(cmd.to_string(), "cc -c main.c -o main.o");
/// ```
#[macro_export]
macro_rules! cmd {
  ($($arg:expr),* $(,)?) => {{
    let mut cmd = $crate::Cmd::new();
    $(cmd.append($arg);)*
    cmd
  }};
}

/// An ordered list of process arguments; the first one names the executable.
///
/// Arguments are passed to the process verbatim, never through a shell.
/// Empty arguments are kept in the list but skipped when the command is
/// displayed or executed, so callers can splice in optional flags as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd<'a> {
  args: Array<Cow<'a, str>>,
}

impl<'a> Cmd<'a> {
  pub const fn new() -> Self {
    Self { args: Array::new() }
  }

  pub fn append(&mut self, arg: impl Into<Cow<'a, str>>) -> &mut Self {
    self.args.append(arg.into());
    self
  }

  pub fn extend<I, S>(&mut self, args: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<Cow<'a, str>>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Forget all arguments but keep the allocation for the next command.
  pub fn clear(&mut self) {
    self.args.clear();
  }

  /// Number of arguments, empty ones included.
  pub fn len(&self) -> usize {
    self.args.len()
  }

  pub fn is_empty(&self) -> bool {
    self.args.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.args.capacity()
  }

  /// All arguments, empty ones included.
  pub fn args(&self) -> impl Iterator<Item = &str> {
    self.args.iter().map(|arg| arg.as_ref())
  }

  /// The argument vector handed to the OS: every non-empty argument.
  pub fn argv(&self) -> Vec<&str> {
    self.args().filter(|arg| !arg.is_empty()).collect()
  }

  /// Start the command on the host without waiting for it.
  pub fn spawn(&self) -> Proc<Child> {
    proc::spawn(&Host, self)
  }

  /// Start the command on the host and wait for it to finish.
  pub fn run(&self) -> Result<(), ProcError> {
    self.spawn().wait()
  }
}

/// Renders the command for humans: arguments are separated by one space and
/// any argument containing a space is wrapped in single quotes.
impl fmt::Display for Cmd<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for arg in self.args().filter(|arg| !arg.is_empty()) {
      if !first {
        f.write_str(" ")?;
      }
      first = false;

      if arg.contains(' ') {
        write!(f, "'{}'", arg)?;
      } else {
        f.write_str(arg)?;
      }
    }
    Ok(())
  }
}

impl<'a, S: Into<Cow<'a, str>>> FromIterator<S> for Cmd<'a> {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    let mut cmd = Cmd::new();
    cmd.extend(iter);
    cmd
  }
}
