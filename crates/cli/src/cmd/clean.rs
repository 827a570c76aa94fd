//! Implementation of the `nob clean` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::output::{print_info, print_success};

/// Remove the build directory and everything in it.
pub fn cmd_clean(build_dir: &str) -> Result<()> {
  let path = Path::new(build_dir);
  if !path.exists() {
    print_info(&format!("Nothing to clean in {}", build_dir));
    return Ok(());
  }

  info!("remove directory {}", build_dir);
  std::fs::remove_dir_all(path).with_context(|| format!("could not remove {}", build_dir))?;

  print_success(&format!("Removed {}", build_dir));
  Ok(())
}
