mod cli;

use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tinycompute",
    version,
    about = "Translate C++ compute-kernel structs into GLSL compute shaders"
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit one GLSL compute shader per valid kernel
    Transpile(cli::transpile::TranspileArgs),
    /// Validate and translate kernels without writing files
    Check(cli::check::CheckArgs),
    /// List the kernels declared in a source file
    Kernels(cli::kernels::KernelsArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Command::Transpile(args) => cli::transpile::cmd_transpile(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Kernels(args) => cli::kernels::cmd_kernels(args),
    };
    process::exit(code);
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "tinycompute=debug",
        _ => "tinycompute=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
