//! Per-construct translation rules.
//!
//! The rewriter walks a validated kernel and queues edits against the
//! original source text. Each rule handles one host construct: binding
//! fields, uniforms, the workgroup size, arrays, initializer lists,
//! namespace qualifiers, vector temporaries, casts, swizzles and the
//! implicit conversions GLSL will not perform on its own.

mod decls;
mod exprs;
mod fields;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::syntax::consteval::ConstEnv;
use crate::syntax::source::SourceFile;
use crate::syntax::span::Span;
use crate::typecheck::{resolve_type, KernelTypes, Ty};

use super::edit::EditQueue;

/// Everything a rule may read.
pub struct RewriteContext<'a> {
    pub source: &'a SourceFile,
    pub env: &'a ConstEnv,
    pub types: &'a KernelTypes,
    /// Host DSL namespaces whose qualifiers are stripped (`tc`).
    pub namespaces: &'a [String],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Buffer,
    Image,
    Uniform,
}

impl BindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingKind::Buffer => "buffer",
            BindingKind::Image => "image",
            BindingKind::Uniform => "uniform",
        }
    }
}

/// A resource declaration derived from a binding or uniform field.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingDecl {
    pub kind: BindingKind,
    /// Buffer element, image texel or uniform value type.
    pub element: String,
    /// Image dimensionality.
    pub dim: Option<u32>,
    /// Binding index (location for uniforms).
    pub binding: u32,
    pub set: u32,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct RewriteOutput {
    /// Mapping gaps: rules that could not fire or degraded.
    pub diagnostics: Vec<Diagnostic>,
    pub bindings: Vec<BindingDecl>,
}

/// Queue the edits that translate `record` into GLSL onto `edits`.
pub fn rewrite_kernel(
    record: &Record,
    ctx: &RewriteContext<'_>,
    edits: &mut EditQueue,
) -> RewriteOutput {
    let mut rw = Rewriter {
        ctx,
        edits,
        out: RewriteOutput::default(),
        return_name: None,
    };
    if let Some(body) = &record.body {
        for member in &body.members {
            rw.rewrite_member(member);
        }
    }
    tracing::debug!(
        kernel = %record.name.node,
        edits = rw.edits.len(),
        bindings = rw.out.bindings.len(),
        "rewrote kernel"
    );
    rw.out
}

pub(super) struct Rewriter<'r, 'a> {
    pub(super) ctx: &'r RewriteContext<'a>,
    pub(super) edits: &'r mut EditQueue,
    pub(super) out: RewriteOutput,
    /// GLSL spelling of the current method's return type.
    pub(super) return_name: Option<String>,
}

impl Rewriter<'_, '_> {
    fn rewrite_member(&mut self, member: &Member) {
        match member {
            Member::Field(decl) => {
                if decl.name() != Some("fileLocation") {
                    self.rewrite_field(decl);
                }
            }
            Member::Method(method) => {
                if !method.name.node.starts_with('_') {
                    self.rewrite_method(method);
                }
            }
            Member::Record(nested) => self.rewrite_nested_record(nested),
            Member::Access(_, span) => self.edits.remove(*span),
            Member::Using(using) => self.comment_out(using),
            Member::Template(_) | Member::Opaque(_) => {}
        }
    }

    /// `using namespace tc;` becomes `// using namespace tc;`. Code after it
    /// on the same line moves to the next line.
    pub(super) fn comment_out(&mut self, using: &UsingDecl) {
        let text = self.ctx.source.slice(using.span);
        let rest = self
            .ctx
            .source
            .text
            .get(using.span.end as usize..)
            .unwrap_or("");
        let shares_line = rest
            .split('\n')
            .next()
            .is_some_and(|line| !line.trim().is_empty());
        let marker = if shares_line {
            format!("// {}\n", text)
        } else {
            format!("// {}", text)
        };
        self.edits.replace(using.span, marker);
    }

    /// Nested helper structs keep their shape; only field types are mapped.
    fn rewrite_nested_record(&mut self, record: &Record) {
        let Some(body) = &record.body else {
            return;
        };
        for member in &body.members {
            match member {
                Member::Field(decl) => self.map_type(&decl.ty, None),
                Member::Access(_, span) => self.edits.remove(*span),
                Member::Record(inner) => self.rewrite_nested_record(inner),
                _ => {}
            }
        }
    }

    fn rewrite_method(&mut self, method: &Method) {
        // Leading `static`, `inline`, `constexpr`, `virtual`.
        if let Some(first) = method.specifiers.first() {
            let end = match &method.ret {
                Some(ret) => ret.span.start,
                None => method.name.span.start,
            };
            self.edits.remove(Span::new(first.span.start, end));
        }

        self.return_name = None;
        if let Some(ret) = &method.ret {
            self.map_type(ret, None);
            self.return_name = self.glsl_spelling(ret);
        }

        for param in &method.params {
            self.rewrite_param(param);
        }

        // Trailing `const`, `noexcept`, `override`, `final`.
        for spec in &method.trailing {
            let span = self.with_leading_space(spec.span);
            self.edits.remove(span);
        }

        if let Some(body) = &method.body {
            self.rewrite_block(body);
        }
        self.return_name = None;
    }

    /// `T& x` becomes `inout T x`, `const T& x` becomes `in T x`.
    fn rewrite_param(&mut self, param: &Param) {
        let ty = &param.ty;
        let by_ref = ty
            .ptr_ops
            .iter()
            .any(|p| matches!(p.node, PtrOp::LRef | PtrOp::RRef));
        if by_ref {
            let qualifier = if ty.is_const() { "in " } else { "inout " };
            self.edits.insert_before(ty.span.start, qualifier);
            self.edits.remove(Span::new(ty.span.start, ty.base_span.start));
            self.edits.remove(Span::new(ty.base_span.end, ty.span.end));
        } else if ty.is_const() {
            self.edits.remove(Span::new(ty.span.start, ty.base_span.start));
        }
        self.map_type(ty, None);
    }

    // --- Type spellings ---

    /// Replace a written type by its GLSL spelling. `auto` takes the
    /// spelling of `inferred`. Unmapped paths only lose their DSL qualifier.
    pub(super) fn map_type(&mut self, ty: &TypeExpr, inferred: Option<&Ty>) {
        match &ty.base {
            TypeBase::Auto => {
                let name = match inferred.map(Ty::value) {
                    Some(Ty::Record(name)) => Some(name.clone()),
                    Some(other) => other.glsl_name(),
                    None => None,
                };
                if let Some(name) = name {
                    self.replace_if_changed(ty.base_span, name);
                }
            }
            TypeBase::Builtin(_) | TypeBase::Path(_) => {
                match resolve_type(ty, self.ctx.env).glsl_name() {
                    Some(name) => self.replace_if_changed(ty.base_span, name),
                    None => {
                        if let TypeBase::Path(path) = &ty.base {
                            self.strip_qualifier(path);
                        }
                    }
                }
            }
            TypeBase::Opaque => {}
        }
    }

    /// The GLSL name for a written type: the mapped scalar or vector name,
    /// or the written name without its DSL qualifier.
    pub(super) fn glsl_spelling(&self, ty: &TypeExpr) -> Option<String> {
        if let Some(name) = resolve_type(ty, self.ctx.env).glsl_name() {
            return Some(name);
        }
        match &ty.base {
            TypeBase::Path(path) if self.is_dsl_qualified(path) => {
                let last = path.last()?;
                let span = Span::new(last.name.span.start, ty.base_span.end);
                Some(self.ctx.source.slice(span).to_string())
            }
            TypeBase::Path(_) | TypeBase::Builtin(_) => {
                Some(self.ctx.source.slice(ty.base_span).to_string())
            }
            TypeBase::Auto | TypeBase::Opaque => None,
        }
    }

    pub(super) fn is_dsl_qualified(&self, path: &Path) -> bool {
        path.segments.len() > 1
            && self
                .ctx
                .namespaces
                .iter()
                .any(|ns| *ns == path.segments[0].name.node)
    }

    /// `tc::x` becomes `x`.
    pub(super) fn strip_qualifier(&mut self, path: &Path) {
        if self.is_dsl_qualified(path) {
            self.edits.remove(path.qualifier_span());
        }
    }

    pub(super) fn replace_if_changed(&mut self, span: Span, text: String) {
        if self.ctx.source.slice(span) != text {
            self.edits.replace(span, text);
        }
    }

    /// Extend `span` back over the blanks that precede it.
    fn with_leading_space(&self, span: Span) -> Span {
        let text = self.ctx.source.text.as_bytes();
        let mut start = span.start as usize;
        while start > 0 && matches!(text.get(start - 1), Some(b' ' | b'\t')) {
            start -= 1;
        }
        Span::new(start as u32, span.end)
    }

    /// Swap a brace pair for parentheses.
    pub(super) fn braces_to_parens(&mut self, open: Span, close: Span) {
        self.edits.replace_token(open.start, "(");
        self.edits.replace_token(close.start, ")");
    }

    pub(super) fn warn(&mut self, message: String, span: Span) {
        tracing::debug!(message = %message, "mapping gap");
        self.out.diagnostics.push(Diagnostic::warning(message, span));
    }
}
