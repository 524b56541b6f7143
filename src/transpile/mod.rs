//! The translation pipeline: locate, validate, rewrite, apply, emit.
//!
//! One input is parsed once. Every located kernel is then processed on
//! its own: a kernel rejected by validation produces diagnostics and no
//! file, and never affects the others.

pub mod edit;
pub mod emit;
pub mod error;
pub mod image_format;
pub mod locate;
pub mod manifest;
pub mod rewrite;
pub mod typemap;
pub mod validate;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use snafu::ResultExt;

use crate::diagnostic::{has_errors, Diagnostic};
use crate::syntax::consteval::ConstEnv;
use crate::syntax::parse_source;
use crate::syntax::source::SourceFile;
use crate::typecheck::check_kernel;

pub use error::{Error, Result};
pub use locate::{kernel_descriptors, locate_kernels, KernelDescriptor, LocatedKernel};
pub use manifest::ManifestEntry;
pub use rewrite::{BindingDecl, BindingKind};

use edit::apply_edits;
use emit::Validation;
use error::ReadInputSnafu;
use rewrite::{rewrite_kernel, RewriteContext};

/// Exit code: every kernel emitted (or none found).
pub const EXIT_OK: i32 = 0;
/// Exit code: a kernel was rejected or failed external validation.
pub const EXIT_KERNEL_FAILED: i32 = 1;
/// Exit code: the run could not proceed.
pub const EXIT_FATAL: i32 = 2;

/// Run settings. `Default` gives the stock behaviour: `./<fileLocation>.comp`,
/// `#version 430`, `tc` as the DSL namespace, no external validation.
#[derive(Clone, Debug)]
pub struct Options {
    pub output_dir: PathBuf,
    pub extension: String,
    pub version: String,
    /// Namespaces whose qualifiers are stripped and whose names are the DSL.
    pub namespaces: Vec<String>,
    /// Run the external validator on each written shader.
    pub validate: bool,
    pub validator: String,
    /// Process kernels on the rayon pool.
    pub parallel: bool,
    /// Write shader files. Off for a dry run.
    pub write: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            extension: emit::DEFAULT_EXTENSION.to_string(),
            version: emit::DEFAULT_VERSION.to_string(),
            namespaces: vec!["tc".to_string()],
            validate: false,
            validator: emit::DEFAULT_VALIDATOR.to_string(),
            parallel: false,
            write: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum KernelStatus {
    /// Written to this path.
    Emitted(PathBuf),
    /// Failed validation; nothing was written.
    Rejected,
    /// Translated without writing (dry run).
    Checked,
}

/// What happened to one kernel.
#[derive(Clone, Debug)]
pub struct KernelOutcome {
    pub descriptor: KernelDescriptor,
    pub status: KernelStatus,
    /// Validation errors, or mapping-gap warnings.
    pub diagnostics: Vec<Diagnostic>,
    pub validation: Option<Validation>,
    pub bindings: Vec<BindingDecl>,
    /// Full shader text, when the kernel was translated.
    pub shader: Option<String>,
    /// `<fileLocation>.<ext>`, relative to the output directory.
    pub shader_file: Option<String>,
}

impl KernelOutcome {
    pub fn failed(&self) -> bool {
        self.status == KernelStatus::Rejected
            || self.validation.as_ref().is_some_and(Validation::failed)
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        let mut entry = ManifestEntry::from_descriptor(&self.descriptor);
        entry.shader = self.shader_file.clone();
        entry.bindings = self.bindings.clone();
        entry
    }
}

/// Result of one run over one input.
#[derive(Debug)]
pub struct RunReport {
    pub source: SourceFile,
    /// In source order.
    pub outcomes: Vec<KernelOutcome>,
    /// Errors that stopped the run before any kernel was processed.
    pub fatal: Vec<Diagnostic>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        if !self.fatal.is_empty() {
            EXIT_FATAL
        } else if self.outcomes.iter().any(KernelOutcome::failed) {
            EXIT_KERNEL_FAILED
        } else {
            EXIT_OK
        }
    }

    pub fn manifest(&self) -> Vec<ManifestEntry> {
        self.outcomes
            .iter()
            .map(KernelOutcome::manifest_entry)
            .collect()
    }

    /// Every diagnostic of the run, fatal ones first.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.fatal.iter().chain(self.outcomes.iter().flat_map(|o| {
            o.diagnostics
                .iter()
                .chain(o.validation.iter().flat_map(|v| v.diagnostics.iter()))
        }))
    }
}

/// Read and transpile one file.
pub fn transpile_file(path: &Path, options: &Options) -> Result<RunReport> {
    let text = std::fs::read_to_string(path).context(ReadInputSnafu { path })?;
    transpile_source(SourceFile::new(path.display().to_string(), text), options)
}

/// Transpile every kernel of an in-memory source.
pub fn transpile_source(source: SourceFile, options: &Options) -> Result<RunReport> {
    let unit = match parse_source(&source) {
        Ok(unit) => unit,
        Err(fatal) => {
            tracing::debug!(file = %source.name, errors = fatal.len(), "parse failed");
            return Ok(RunReport {
                source,
                outcomes: Vec::new(),
                fatal,
            });
        }
    };

    let kernels = locate_kernels(&unit, &source.text);
    tracing::info!(file = %source.name, kernels = kernels.len(), "located kernels");

    let outcomes = if options.parallel {
        kernels
            .into_par_iter()
            .map(|k| process_kernel(k, &source, options))
            .collect::<Result<Vec<_>>>()?
    } else {
        kernels
            .into_iter()
            .map(|k| process_kernel(k, &source, options))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(RunReport {
        source,
        outcomes,
        fatal: Vec::new(),
    })
}

fn process_kernel(
    kernel: LocatedKernel<'_>,
    source: &SourceFile,
    options: &Options,
) -> Result<KernelOutcome> {
    let LocatedKernel {
        descriptor,
        record,
        mut edits,
    } = kernel;
    let _span = tracing::debug_span!("kernel", name = %descriptor.name).entered();

    let diagnostics = validate::validate_kernel(record);
    if has_errors(&diagnostics) {
        tracing::info!(kernel = %descriptor.name, errors = diagnostics.len(), "kernel rejected");
        return Ok(KernelOutcome {
            descriptor,
            status: KernelStatus::Rejected,
            diagnostics,
            validation: None,
            bindings: Vec::new(),
            shader: None,
            shader_file: None,
        });
    }

    let env = ConstEnv::from_record(record);
    let types = check_kernel(record, &env, &options.namespaces);
    let ctx = RewriteContext {
        source,
        env: &env,
        types: &types,
        namespaces: &options.namespaces,
    };
    let rewritten = rewrite_kernel(record, &ctx, &mut edits);
    let body = apply_edits(&source.text, descriptor.interior, edits.into_edits());
    let text = emit::shader_text(&body, &options.version);
    let shader_file = format!("{}.{}", descriptor.file_location, options.extension);

    let mut all = diagnostics;
    all.extend(rewritten.diagnostics);

    let (status, validation) = if options.write {
        let path = emit::shader_path(
            &options.output_dir,
            &descriptor.file_location,
            &options.extension,
        );
        emit::write_shader(&path, &text)?;
        let validation = options
            .validate
            .then(|| emit::run_validator(&options.validator, &path));
        (KernelStatus::Emitted(path), validation)
    } else {
        (KernelStatus::Checked, None)
    };

    Ok(KernelOutcome {
        descriptor,
        status,
        diagnostics: all,
        validation,
        bindings: rewritten.bindings,
        shader: Some(text),
        shader_file: Some(shader_file),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_KERNELS: &str = r#"
namespace demo {
struct [[clang::annotate("kernel")]] Good {
    static constexpr char fileLocation[] = "good";
    tc::uvec3 local_size{1, 1, 1};
    tc::BufferBinding<tc::uint, 0> out;
    void main() { out[0] = 1u; }
};

struct [[clang::annotate("kernel")]] Bad {
    static constexpr char fileLocation[] = "bad";
    void main() { int* p = new int[4]; }
};
}
"#;

    const BROKEN: &str = r#"
struct [[clang::annotate("kernel")]] K {
    static constexpr char fileLocation[] = "k";
    void main() { int x = ; }
};
"#;

    fn dry_run() -> Options {
        Options {
            write: false,
            ..Options::default()
        }
    }

    #[test]
    fn test_rejection_does_not_affect_other_kernels() {
        let report =
            transpile_source(SourceFile::new("k.h", TWO_KERNELS), &dry_run()).unwrap();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].descriptor.name, "demo::Good");
        assert_eq!(report.outcomes[0].status, KernelStatus::Checked);
        assert!(report.outcomes[0]
            .shader
            .as_deref()
            .unwrap()
            .starts_with("#version 430\n"));
        assert_eq!(report.outcomes[1].status, KernelStatus::Rejected);
        assert!(report.outcomes[1].shader.is_none());
        assert_eq!(report.exit_code(), EXIT_KERNEL_FAILED);
    }

    #[test]
    fn test_parallel_keeps_source_order() {
        let options = Options {
            parallel: true,
            ..dry_run()
        };
        let report = transpile_source(SourceFile::new("k.h", TWO_KERNELS), &options).unwrap();
        let names: Vec<&str> = report
            .outcomes
            .iter()
            .map(|o| o.descriptor.name.as_str())
            .collect();
        assert_eq!(names, ["demo::Good", "demo::Bad"]);
    }

    #[test]
    fn test_parse_failure_is_fatal() {
        let report =
            transpile_source(SourceFile::new("k.h", BROKEN), &dry_run())
                .unwrap();
        assert!(!report.fatal.is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(report.exit_code(), EXIT_FATAL);
    }

    #[test]
    fn test_no_kernels_is_success() {
        let report =
            transpile_source(SourceFile::new("k.h", "struct Plain { int x; };"), &dry_run())
                .unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(report.exit_code(), EXIT_OK);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let err = transpile_file(Path::new("/nonexistent/kernel.h"), &dry_run()).unwrap_err();
        assert!(matches!(err, Error::ReadInput { .. }));
    }

    #[test]
    fn test_manifest_entries_follow_outcomes() {
        let report =
            transpile_source(SourceFile::new("k.h", TWO_KERNELS), &dry_run()).unwrap();
        let manifest = report.manifest();
        assert_eq!(manifest[0].shader.as_deref(), Some("good.comp"));
        assert_eq!(manifest[0].bindings.len(), 1);
        assert_eq!(manifest[1].shader, None);
    }
}
