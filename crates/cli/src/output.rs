//! Summary lines printed on stdout once a command finishes.
//!
//! Progress and diagnostics go through `tracing` to stderr; this module only
//! renders the final result.

use std::time::Duration;

use owo_colors::OwoColorize;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const INFO: &str = "•";
}

/// Elapsed time rounded to milliseconds, e.g. `1s 250ms`.
pub fn format_duration(duration: Duration) -> String {
  let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
  if millis == 0 {
    return "0ms".to_string();
  }
  humantime::format_duration(Duration::from_millis(millis)).to_string()
}

pub fn print_success(message: &str) {
  println!("{} {}", symbols::SUCCESS.green(), message);
}

pub fn print_info(message: &str) {
  println!("{} {}", symbols::INFO.cyan(), message);
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.dimmed(), value);
}
