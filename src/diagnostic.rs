use std::fmt;

use crate::syntax::source::SourceFile;
use crate::syntax::span::Span;

/// A transpiler diagnostic.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
    /// Location in a file other than the parsed input (e.g. an emitted
    /// shader reported on by the external validator).
    pub origin: Option<Origin>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit file/line/column, used when the span does not point into
/// the parsed source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: u32,
    pub col: u32,
}

/// How diagnostics are written to stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagnosticStyle {
    /// One `file(line,col): severity: message` line per diagnostic.
    #[default]
    Line,
    /// Multi-line ariadne report with source excerpt.
    Pretty,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Error, message, span)
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self::with_severity(Severity::Warning, message, span)
    }

    fn with_severity(severity: Severity, message: String, span: Span) -> Self {
        Self {
            severity,
            message,
            span,
            notes: Vec::new(),
            help: None,
            origin: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_origin(mut self, file: String, line: u32, col: u32) -> Self {
        self.origin = Some(Origin { file, line, col });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Format as a single `file(line,col): severity: message` line.
    pub fn render_line(&self, source: &SourceFile) -> String {
        let (file, line, col) = match &self.origin {
            Some(o) => (o.file.as_str(), o.line, o.col),
            None => {
                let (line, col) = source.line_col(self.span.start);
                (source.name.as_str(), line, col)
            }
        };
        format!(
            "{}({},{}): {}: {}",
            file, line, col, self.severity, self.message
        )
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, source: &SourceFile) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        // Diagnostics about other files have no excerpt to show.
        if self.origin.is_some() {
            eprintln!("{}", self.render_line(source));
            return;
        }

        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let filename = source.name.as_str();
        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        if let Err(e) = report
            .finish()
            .eprint((filename, Source::from(source.text.as_str())))
        {
            tracing::warn!(error = %e, "failed to render diagnostic");
        }
    }

    /// Write the diagnostic to stderr in the requested style.
    pub fn emit(&self, source: &SourceFile, style: DiagnosticStyle) {
        match style {
            DiagnosticStyle::Line => {
                eprintln!("{}", self.render_line(source));
                for note in &self.notes {
                    eprintln!("    note: {}", note);
                }
                if let Some(help) = &self.help {
                    eprintln!("    help: {}", help);
                }
            }
            DiagnosticStyle::Pretty => self.render(source),
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], source: &SourceFile, style: DiagnosticStyle) {
    for diag in diagnostics {
        diag.emit(source, style);
    }
}

/// True if any diagnostic in the list is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}
