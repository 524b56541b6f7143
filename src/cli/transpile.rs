use std::path::PathBuf;

use clap::Args;
use tinycompute::transpile::{manifest, KernelStatus};

use super::{fatal, load_options, report_diagnostics, run, TranslateArgs};

#[derive(Args)]
pub struct TranspileArgs {
    /// Source file declaring kernel structs
    pub input: PathBuf,
    /// Directory receiving the shaders (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
    /// Shader file extension (default: comp)
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,
    /// Version in the `#version` header (default: 430)
    #[arg(long = "glsl-version", value_name = "VERSION")]
    pub glsl_version: Option<String>,
    /// Run the external shader validator on every emitted file
    #[arg(long)]
    pub validate: bool,
    /// Validator executable (default: glslangValidator)
    #[arg(long, value_name = "PROGRAM")]
    pub validator: Option<String>,
    /// Also write a kernels.json manifest to this path
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
    #[command(flatten)]
    pub common: TranslateArgs,
}

pub fn cmd_transpile(args: TranspileArgs) -> i32 {
    let mut options = load_options(&args.input);
    args.common.apply(&mut options);
    if let Some(dir) = args.output_dir {
        options.output_dir = dir;
    }
    if let Some(ext) = args.extension {
        options.extension = ext;
    }
    if let Some(version) = args.glsl_version {
        options.version = version;
    }
    if args.validate {
        options.validate = true;
    }
    if let Some(validator) = args.validator {
        options.validator = validator;
    }

    let report = run(&args.input, &options);
    report_diagnostics(&report, args.common.style());

    for outcome in &report.outcomes {
        match (&outcome.status, &outcome.shader_file) {
            (KernelStatus::Emitted(_), Some(file)) => eprintln!("Emitted {}", file),
            (KernelStatus::Rejected, _) => eprintln!("Rejected {}", outcome.descriptor.name),
            _ => {}
        }
    }
    if report.fatal.is_empty() && report.outcomes.is_empty() {
        eprintln!("No kernels found in {}", args.input.display());
    }

    if let Some(path) = &args.manifest {
        if let Err(e) = manifest::save(&report.manifest(), path) {
            fatal(e);
        }
    }
    report.exit_code()
}
