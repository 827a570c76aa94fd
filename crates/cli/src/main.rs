mod cmd;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use nobuild::{Bootstrap, Toolchain};

use crate::cmd::BuildOptions;

/// nob - Build program for the hello demo
#[derive(Parser)]
#[command(name = "nob")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// C compiler used to compile and link
  #[arg(long, env = "CC", default_value = "cc", global = true)]
  cc: String,

  /// Directory for objects, the executable and compile_commands.json
  #[arg(long, default_value = "build", global = true)]
  build_dir: String,

  /// Directory holding the C sources
  #[arg(long, default_value = "demos/hello", global = true)]
  source_dir: String,

  /// Skip writing compile_commands.json
  #[arg(long, global = true)]
  no_compile_db: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Default)]
enum Commands {
  /// Compile and link the demo (default)
  #[default]
  Build,

  /// Remove the build directory
  Clean,
}

fn main() -> ExitCode {
  // Flags are parsed after the rebuild check, so peek at the raw arguments.
  let verbose = std::env::args().skip(1).any(|arg| arg == "-v" || arg == "--verbose");
  if let Err(err) = nobuild::log::init(verbose) {
    eprintln!("[ERROR] could not initialize logging: {}", err);
  }

  rebuild_myself();

  let cli = Cli::parse();
  let result = match cli.command.unwrap_or_default() {
    Commands::Build => cmd::cmd_build(&BuildOptions {
      cc: &cli.cc,
      build_dir: &cli.build_dir,
      source_dir: &cli.source_dir,
      compile_db: !cli.no_compile_db,
    }),
    Commands::Clean => cmd::cmd_clean(&cli.build_dir),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{:#}", err);
      ExitCode::FAILURE
    }
  }
}

/// Rebuild through cargo when any source of this program is newer than the
/// running binary, then hand over to the fresh binary.
fn rebuild_myself() {
  let src = concat!(env!("CARGO_MANIFEST_DIR"), "/src");
  let bootstrap = match Bootstrap::from_args(std::env::args(), format!("{}/main.rs", src)) {
    Ok(bootstrap) => bootstrap,
    Err(err) => {
      error!("{}", err);
      std::process::exit(1);
    }
  };

  bootstrap
    .with_source(format!("{}/output.rs", src))
    .with_source(format!("{}/cmd/mod.rs", src))
    .with_source(format!("{}/cmd/build.rs", src))
    .with_source(format!("{}/cmd/clean.rs", src))
    .with_toolchain(Toolchain::Cargo {
      package: env!("CARGO_PKG_NAME").to_string(),
      bin: env!("CARGO_BIN_NAME").to_string(),
    })
    .run();
}
