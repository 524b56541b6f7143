pub mod check;
pub mod kernels;
pub mod transpile;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process;

use clap::Args;
use tinycompute::config::ProjectConfig;
use tinycompute::diagnostic::{render_diagnostics, Diagnostic, DiagnosticStyle};
use tinycompute::transpile::{transpile_file, Options, RunReport, EXIT_FATAL};

/// Flags shared by the subcommands that translate kernels.
#[derive(Args, Clone, Debug, Default)]
pub struct TranslateArgs {
    /// DSL namespace whose qualifiers are stripped (repeatable, default: tc)
    #[arg(long = "namespace", value_name = "NAME")]
    pub namespaces: Vec<String>,
    /// Process kernels in parallel
    #[arg(long)]
    pub parallel: bool,
    /// Render diagnostics as annotated source excerpts
    #[arg(long)]
    pub pretty: bool,
}

impl TranslateArgs {
    /// Command-line values win over tinycompute.toml.
    pub fn apply(&self, options: &mut Options) {
        if !self.namespaces.is_empty() {
            options.namespaces = self.namespaces.clone();
        }
        if self.parallel {
            options.parallel = true;
        }
    }

    pub fn style(&self) -> DiagnosticStyle {
        if self.pretty {
            DiagnosticStyle::Pretty
        } else {
            DiagnosticStyle::Line
        }
    }
}

/// Print `error: <message>` and exit with the fatal code.
pub fn fatal(message: impl Display) -> ! {
    eprintln!("error: {}", message);
    process::exit(EXIT_FATAL);
}

/// Defaults overlaid with the tinycompute.toml found next to the input
/// or in one of its ancestors.
pub fn load_options(input: &Path) -> Options {
    let mut options = Options::default();
    let dir = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let dir: PathBuf = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    if let Some(path) = ProjectConfig::find(&dir) {
        match ProjectConfig::load(&path) {
            Ok(config) => {
                tracing::debug!(config = %path.display(), "loaded configuration");
                config.apply(&mut options);
            }
            Err(e) => fatal(e),
        }
    }
    options
}

/// Run the pipeline; run-level failures end the process.
pub fn run(input: &Path, options: &Options) -> RunReport {
    match transpile_file(input, options) {
        Ok(report) => report,
        Err(e) => fatal(e),
    }
}

/// Write every diagnostic of the run to stderr.
pub fn report_diagnostics(report: &RunReport, style: DiagnosticStyle) {
    let all: Vec<Diagnostic> = report.diagnostics().cloned().collect();
    render_diagnostics(&all, &report.source, style);
}
