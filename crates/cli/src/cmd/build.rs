//! Implementation of the `nob build` command.
//!
//! Compiles every C file of the source directory into its own object, all
//! compilers running at once, then links the objects into one executable
//! named after the directory. Outputs newer than their inputs are left alone.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use nobuild::{Cmd, CompileDb, Host, Procs, Scratch, cmd, fs, scratch_format};

use crate::output::{format_duration, print_stat, print_success};

const CFLAGS: &[&str] = &["-Wall", "-Wextra", "-Wpedantic", "-std=c99", "-g"];

pub struct BuildOptions<'a> {
  pub cc: &'a str,
  pub build_dir: &'a str,
  pub source_dir: &'a str,
  pub compile_db: bool,
}

/// Execute the build command.
///
/// Every object depends on its own source and on all headers of the source
/// directory. The executable depends on all objects.
pub fn cmd_build(options: &BuildOptions<'_>) -> Result<()> {
  let start = Instant::now();
  let sources = scan(options.source_dir)?;
  let mut scratch = Scratch::new();
  let mut db = CompileDb::new();

  info!("compile {} source(s)", sources.units.len());
  let compiled = {
    let mut procs = Procs::new();
    let mut queued = Ok(());
    for unit in &sources.units {
      match prepare_compile(&scratch, options, &sources.headers, unit, &mut db) {
        Ok(Some(compile)) => procs.push(compile.spawn()),
        Ok(None) => {}
        Err(err) => {
          queued = Err(err);
          break;
        }
      }
    }

    // Compilers already running are reaped even when a later unit failed.
    let started = procs.len();
    let waited = procs.wait_all().context("compilation failed");
    queued?;
    waited?;
    started
  };

  if options.compile_db {
    let path = scratch_format!(scratch, "{}/compile_commands.json", options.build_dir);
    db.write(&Host, path)?;
  }

  scratch.reset();

  let objects: Vec<&str> = sources
    .units
    .iter()
    .map(|unit| object_path(&scratch, options.build_dir, unit))
    .collect();
  let exe = scratch_format!(
    scratch,
    "{}/{}{}",
    options.build_dir,
    target_name(options.source_dir),
    std::env::consts::EXE_SUFFIX
  );

  let linked = nobuild::outdated(exe, &objects)?.is_stale();
  if linked {
    let mut link = cmd!(options.cc, "-o", exe);
    link.extend(objects.iter().copied());
    link.run().context("link failed")?;
  }

  print_success(&format!("Built {}", exe));
  print_stat("Compiled", &format!("{} of {}", compiled, sources.units.len()));
  print_stat("Linked", if linked { "yes" } else { "up-to-date" });
  if options.compile_db {
    print_stat("Compile db", &format!("{} entries", db.len()));
  }
  print_stat("Elapsed", &format_duration(start.elapsed()));

  Ok(())
}

/// Set up the compile of one unit and record it in the database. Returns
/// the command when the object is stale.
fn prepare_compile<'a>(
  scratch: &'a Scratch,
  options: &BuildOptions<'a>,
  headers: &[String],
  unit: &'a str,
  db: &mut CompileDb,
) -> Result<Option<Cmd<'a>>> {
  let object = object_path(scratch, options.build_dir, unit);
  fs::mkdir_parents(&Host, object)?;

  let mut compile = cmd!(options.cc);
  compile.extend(CFLAGS.iter().copied());
  compile.extend(["-c", unit, "-o", object]);

  if options.compile_db {
    db.record(&Host, &compile)?;
  }

  let mut inputs = vec![unit];
  inputs.extend(headers.iter().map(String::as_str));
  if fs::outdated(&Host, object, &inputs)?.is_stale() {
    return Ok(Some(compile));
  }
  Ok(None)
}

#[derive(Debug, Default)]
struct Sources {
  units: Vec<String>,
  headers: Vec<String>,
}

/// List the `.c` and `.h` files directly inside `dir`, sorted by name.
fn scan(dir: &str) -> Result<Sources> {
  let entries = std::fs::read_dir(dir).with_context(|| format!("could not read source directory {}", dir))?;
  let prefix = dir.trim_end_matches('/');

  let mut sources = Sources::default();
  for entry in entries {
    let entry = entry.with_context(|| format!("could not read source directory {}", dir))?;
    let file_name = entry.file_name();
    let Some(file_name) = file_name.to_str() else {
      continue;
    };

    let path = format!("{}/{}", prefix, file_name);
    match Path::new(file_name).extension().and_then(OsStr::to_str) {
      Some("c") => sources.units.push(path),
      Some("h") => sources.headers.push(path),
      _ => {}
    }
  }

  if sources.units.is_empty() {
    bail!("no C sources in {}", dir);
  }

  sources.units.sort();
  sources.headers.sort();
  Ok(sources)
}

fn object_path<'s>(scratch: &'s Scratch, build_dir: &str, unit: &str) -> &'s str {
  let stem = Path::new(unit).file_stem().and_then(OsStr::to_str).unwrap_or(unit);
  scratch_format!(scratch, "{}/{}.o", build_dir, stem)
}

/// The executable is named after the source directory.
fn target_name(source_dir: &str) -> &str {
  Path::new(source_dir)
    .file_name()
    .and_then(OsStr::to_str)
    .unwrap_or("main")
}
