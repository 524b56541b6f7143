use std::path::PathBuf;

use clap::Args;
use tinycompute::transpile::KernelStatus;

use super::{load_options, report_diagnostics, run, TranslateArgs};

#[derive(Args)]
pub struct CheckArgs {
    /// Source file declaring kernel structs
    pub input: PathBuf,
    #[command(flatten)]
    pub common: TranslateArgs,
}

/// Validate and translate every kernel without writing anything.
pub fn cmd_check(args: CheckArgs) -> i32 {
    let mut options = load_options(&args.input);
    args.common.apply(&mut options);
    options.write = false;
    options.validate = false;

    let report = run(&args.input, &options);
    report_diagnostics(&report, args.common.style());
    for outcome in &report.outcomes {
        match outcome.status {
            KernelStatus::Rejected => eprintln!("FAILED: {}", outcome.descriptor.name),
            _ => eprintln!("OK: {}", outcome.descriptor.name),
        }
    }
    report.exit_code()
}
