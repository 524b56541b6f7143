use std::path::PathBuf;

use clap::Args;
use tinycompute::diagnostic::{render_diagnostics, DiagnosticStyle};
use tinycompute::syntax::parse_source;
use tinycompute::syntax::source::SourceFile;
use tinycompute::transpile::manifest::{self, ManifestEntry};
use tinycompute::transpile::{kernel_descriptors, EXIT_FATAL, EXIT_OK};

use super::fatal;

#[derive(Args)]
pub struct KernelsArgs {
    /// Source file declaring kernel structs
    pub input: PathBuf,
    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// List located kernels without validating or translating them.
pub fn cmd_kernels(args: KernelsArgs) -> i32 {
    let text = match std::fs::read_to_string(&args.input) {
        Ok(text) => text,
        Err(e) => fatal(format!("cannot read '{}': {}", args.input.display(), e)),
    };
    let source = SourceFile::new(args.input.display().to_string(), text);
    let unit = match parse_source(&source) {
        Ok(unit) => unit,
        Err(errors) => {
            render_diagnostics(&errors, &source, DiagnosticStyle::Line);
            return EXIT_FATAL;
        }
    };

    let descriptors = kernel_descriptors(&unit, &source.text);
    if args.json {
        let entries: Vec<ManifestEntry> = descriptors
            .iter()
            .map(ManifestEntry::from_descriptor)
            .collect();
        print!("{}", manifest::to_json(&entries));
        return EXIT_OK;
    }

    let width = descriptors.iter().map(|d| d.name.len()).max().unwrap_or(0);
    for d in &descriptors {
        let (line, col) = source.line_col(d.span.start);
        let local_size = if d.has_local_size { "" } else { "  (no local_size)" };
        println!(
            "{:<width$}  {}  {}:{}:{}{}",
            d.name,
            d.file_location,
            source.name,
            line,
            col,
            local_size,
            width = width
        );
    }
    EXIT_OK
}
