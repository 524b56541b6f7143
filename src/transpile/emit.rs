//! Shader emission: version header, line-ending normalisation, the output
//! file, and the optional external validator run over it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use snafu::ResultExt;

use super::error::{CreateDirSnafu, Result, WriteOutputSnafu};
use crate::diagnostic::{Diagnostic, Severity};
use crate::syntax::span::Span;

pub const DEFAULT_VERSION: &str = "430";
pub const DEFAULT_EXTENSION: &str = "comp";
pub const DEFAULT_VALIDATOR: &str = "glslangValidator";

/// Full shader text: `#version <version>` followed by the rewritten body,
/// with every line ending turned into `\n`.
pub fn shader_text(body: &str, version: &str) -> String {
    let mut out = String::with_capacity(body.len() + 16);
    out.push_str("#version ");
    out.push_str(version);
    out.push('\n');
    out.push_str(&normalize_line_endings(body));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}

/// `<output_dir>/<file_location>.<extension>`. A `fileLocation` may
/// contain directories of its own.
pub fn shader_path(output_dir: &Path, file_location: &str, extension: &str) -> PathBuf {
    let mut path = output_dir.join(file_location);
    let name = match path.file_name() {
        Some(name) => format!("{}.{}", name.to_string_lossy(), extension),
        None => format!("shader.{}", extension),
    };
    path.set_file_name(name);
    path
}

/// Write `text` to `path`, creating missing parent directories.
pub fn write_shader(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(CreateDirSnafu { path: parent })?;
        }
    }
    fs::write(path, text).context(WriteOutputSnafu { path })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "wrote shader");
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationStatus {
    Passed,
    Failed,
    /// The validator could not be started.
    Unavailable,
}

/// Outcome of running the external validator over one shader.
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    pub status: ValidationStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    pub fn failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}

/// Run `validator <shader>` and relay its findings as diagnostics located
/// in the shader file. The file is kept whatever the result.
pub fn run_validator(validator: &str, shader: &Path) -> Validation {
    let shown = shader.display().to_string();
    let output = match Command::new(validator).arg(shader).output() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(validator, error = %e, "validator unavailable");
            let warning = Diagnostic::warning(
                format!("could not run shader validator '{}': {}", validator, e),
                Span::dummy(),
            )
            .with_origin(shown, 1, 1);
            return Validation {
                status: ValidationStatus::Unavailable,
                diagnostics: vec![warning],
            };
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut diagnostics = parse_validator_output(&stdout, &shown);
    diagnostics.extend(parse_validator_output(&stderr, &shown));

    let failed = !output.status.success()
        || diagnostics.iter().any(|d| d.severity == Severity::Error);
    if failed && diagnostics.is_empty() {
        diagnostics.push(
            Diagnostic::error(
                format!("shader validator '{}' exited with {}", validator, output.status),
                Span::dummy(),
            )
            .with_origin(shown, 1, 1),
        );
    }
    tracing::debug!(
        shader = %shader.display(),
        failed,
        findings = diagnostics.len(),
        "validated shader"
    );
    Validation {
        status: if failed {
            ValidationStatus::Failed
        } else {
            ValidationStatus::Passed
        },
        diagnostics,
    }
}

/// Pick `ERROR: <n>:<line>: <message>` and `WARNING: ...` lines out of
/// validator output. Other lines are ignored.
pub fn parse_validator_output(output: &str, shader: &str) -> Vec<Diagnostic> {
    output
        .lines()
        .filter_map(|line| parse_validator_line(line.trim_end(), shader))
        .collect()
}

fn parse_validator_line(line: &str, shader: &str) -> Option<Diagnostic> {
    let (severity, rest) = if let Some(rest) = line.strip_prefix("ERROR:") {
        (Severity::Error, rest)
    } else if let Some(rest) = line.strip_prefix("WARNING:") {
        (Severity::Warning, rest)
    } else {
        return None;
    };
    let rest = rest.strip_prefix(char::is_whitespace)?;
    let (_file_index, rest) = split_number(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (line_no, rest) = split_number(rest)?;
    let message = rest.strip_prefix(':')?.trim();

    let diag = match severity {
        Severity::Error => Diagnostic::error(message.to_string(), Span::dummy()),
        _ => Diagnostic::warning(message.to_string(), Span::dummy()),
    };
    Some(diag.with_origin(shader.to_string(), line_no, 1))
}

fn split_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let n = text[..end].parse().ok()?;
    Some((n, &text[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::source::SourceFile;

    #[test]
    fn test_shader_text_header_and_line_endings() {
        let text = shader_text("\r\nvoid main() {\r\n}\r", "450");
        assert_eq!(text, "#version 450\n\nvoid main() {\n}\n");
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_shader_path_keeps_subdirectories() {
        let dir = Path::new("out");
        assert_eq!(
            shader_path(dir, "gol_v4", "comp"),
            Path::new("out").join("gol_v4.comp")
        );
        assert_eq!(
            shader_path(dir, "life/gol.v2", "glsl"),
            Path::new("out").join("life").join("gol.v2.glsl")
        );
    }

    #[test]
    fn test_write_shader_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = shader_path(tmp.path(), "nested/deeper/blur", "comp");
        write_shader(&path, "#version 430\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "#version 430\n");
    }

    #[test]
    fn test_parse_validator_output() {
        let output = "out/gol.comp\n\
                      ERROR: 0:12: 'cellz' : undeclared identifier\n\
                      WARNING: 0:3: '#extension' : extension not supported\n\
                      ERROR: 1 compilation errors.  No code generated.\n";
        let diags = parse_validator_output(output, "out/gol.comp");
        assert_eq!(diags.len(), 2);
        let source = SourceFile::new("k.h", "");
        assert_eq!(
            diags[0].render_line(&source),
            "out/gol.comp(12,1): error: 'cellz' : undeclared identifier"
        );
        assert_eq!(diags[1].severity, Severity::Warning);
    }

    #[test]
    fn test_missing_validator_is_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("k.comp");
        write_shader(&path, "#version 430\nvoid main() {}\n").unwrap();
        let validation = run_validator("tinycompute-no-such-validator", &path);
        assert_eq!(validation.status, ValidationStatus::Unavailable);
        assert!(!validation.failed());
        assert_eq!(validation.diagnostics.len(), 1);
        assert_eq!(validation.diagnostics[0].severity, Severity::Warning);
        assert!(path.exists());
    }
}
