//! Diagnostic stream setup.
//!
//! Build programs report everything on stderr, one line per message, with a
//! severity tag in front: `[INFO] CMD: cc -c main.c`. The library emits
//! plain `tracing` events; [`init`] installs a subscriber that renders them
//! in that shape.

use std::fmt;
use std::io::IsTerminal;

use owo_colors::OwoColorize;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global subscriber writing tagged lines to stderr.
///
/// The level defaults to `info`, or `debug` when `verbose` is set. `RUST_LOG`
/// overrides both.
pub fn init(verbose: bool) -> Result<(), InitError> {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .event_format(TagFormat)
    .try_init()
}

/// Severity tag for a level.
pub fn tag(level: Level) -> &'static str {
  match level {
    Level::ERROR => "[ERROR]",
    Level::WARN => "[WARN]",
    Level::INFO => "[INFO]",
    Level::DEBUG => "[DEBUG]",
    Level::TRACE => "[TRACE]",
  }
}

/// Event formatter producing `[LEVEL] message key=value ...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFormat;

impl<S, N> FormatEvent<S, N> for TagFormat
where
  S: Subscriber + for<'a> LookupSpan<'a>,
  N: for<'a> FormatFields<'a> + 'static,
{
  fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
    let level = *event.metadata().level();
    let tag = tag(level);

    if writer.has_ansi_escapes() {
      match level {
        Level::ERROR => write!(writer, "{} ", tag.red().bold())?,
        Level::WARN => write!(writer, "{} ", tag.yellow().bold())?,
        Level::INFO => write!(writer, "{} ", tag.cyan())?,
        _ => write!(writer, "{} ", tag.dimmed())?,
      }
    } else {
      write!(writer, "{} ", tag)?;
    }

    ctx.field_format().format_fields(writer.by_ref(), event)?;
    writeln!(writer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;
  use std::sync::{Arc, Mutex};
  use tracing::{debug, error, info, warn};

  #[derive(Clone, Default)]
  struct Capture(Arc<Mutex<Vec<u8>>>);

  impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  fn capture(level: Level, f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
      .with_max_level(level)
      .with_writer(move || writer.clone())
      .with_ansi(false)
      .event_format(TagFormat)
      .finish();

    tracing::subscriber::with_default(subscriber, f);
    let bytes = capture.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
  }

  #[test]
  fn one_tagged_line_per_event() {
    let output = capture(Level::INFO, || {
      info!("CMD: cc -c main.c");
      warn!("could not stat gone.c");
      error!("process exited with exit code 1");
    });

    assert_eq!(
      output,
      "[INFO] CMD: cc -c main.c\n[WARN] could not stat gone.c\n[ERROR] process exited with exit code 1\n"
    );
  }

  #[test]
  fn fields_follow_the_message() {
    let output = capture(Level::DEBUG, || debug!(program = "cc", "process started"));
    assert_eq!(output, "[DEBUG] process started program=\"cc\"\n");
  }

  #[test]
  fn level_filter_applies() {
    let output = capture(Level::INFO, || debug!("hidden"));
    assert!(output.is_empty());
  }

  #[test]
  fn tags_cover_every_level() {
    assert_eq!(tag(Level::ERROR), "[ERROR]");
    assert_eq!(tag(Level::WARN), "[WARN]");
    assert_eq!(tag(Level::INFO), "[INFO]");
    assert_eq!(tag(Level::DEBUG), "[DEBUG]");
    assert_eq!(tag(Level::TRACE), "[TRACE]");
  }
}
