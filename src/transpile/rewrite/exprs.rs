use crate::ast::*;
use crate::syntax::span::{Span, Spanned};
use crate::transpile::typemap::{self, needs_cast};
use crate::typecheck::{resolve_type, swizzle_letters, Ty};

use super::Rewriter;

impl Rewriter<'_, '_> {
    /// Rewrite an expression, spelling out the conversion recorded for it
    /// when GLSL would not perform it implicitly.
    pub(super) fn rewrite_expr(&mut self, expr: &Spanned<Expr>) {
        let cast = self
            .ctx
            .types
            .conversion_at(expr.span)
            .filter(|c| needs_cast(c.from, c.to));
        if let Some(c) = cast {
            tracing::debug!(
                from = c.from.glsl_name(),
                to = c.to.glsl_name(),
                start = expr.span.start,
                "explicit conversion"
            );
            self.edits
                .insert_before(expr.span.start, format!("{}( ", c.to.glsl_name()));
        }
        self.rewrite_expr_inner(expr);
        if cast.is_some() {
            self.edits.insert_after(expr.span.end, " )");
        }
    }

    /// Rewrite the children of `expr` without wrapping `expr` itself.
    pub(super) fn rewrite_expr_inner(&mut self, expr: &Spanned<Expr>) {
        match &expr.node {
            Expr::Path(path) => self.strip_qualifier(path),
            Expr::Literal(_) | Expr::This | Expr::Sizeof => {}
            Expr::Paren(inner) => self.rewrite_expr(inner),
            Expr::Unary { operand, .. } | Expr::Postfix { operand, .. } => {
                self.rewrite_expr(operand)
            }
            Expr::Binary { lhs, rhs, .. } => {
                self.rewrite_expr(lhs);
                self.rewrite_expr(rhs);
            }
            Expr::Assign { lhs, rhs, .. } => {
                self.rewrite_expr(lhs);
                if let Expr::InitList(list) = &rhs.node {
                    let target = self.ctx.types.expr_ty(lhs.span).and_then(Ty::glsl_name);
                    if let Some(name) = target {
                        self.edits.insert_before(list.open.start, name);
                    }
                }
                self.rewrite_expr(rhs);
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.rewrite_expr(cond);
                self.rewrite_expr(then_expr);
                self.rewrite_expr(else_expr);
            }
            Expr::Call { callee, args } => {
                self.rewrite_callee(callee);
                for a in args {
                    self.rewrite_expr(a);
                }
            }
            Expr::Construct {
                ty,
                args,
                braced,
                open,
                close,
            } => {
                match resolve_type(ty, self.ctx.env).glsl_name() {
                    Some(name) => self.replace_if_changed(ty.span, name),
                    None => {
                        if let TypeBase::Path(path) = &ty.base {
                            self.strip_qualifier(path);
                        }
                    }
                }
                if *braced {
                    self.braces_to_parens(*open, *close);
                }
                for a in args {
                    self.rewrite_expr(a);
                }
            }
            Expr::Index { base, index, .. } => {
                self.rewrite_expr(base);
                match swizzle_letters(index) {
                    Some(letters) => {
                        tracing::debug!(letters, "swizzle");
                        self.edits.replace(
                            Span::new(base.span.end, expr.span.end),
                            format!(".{}", letters),
                        );
                    }
                    None => self.rewrite_expr(index),
                }
            }
            Expr::Member { base, member, arrow } => {
                if *arrow && matches!(Expr::unparen(base).node, Expr::This) {
                    self.edits
                        .remove(Span::new(expr.span.start, member.span.start));
                } else {
                    self.rewrite_expr(base);
                }
            }
            Expr::Cast { kind, ty, operand } => {
                let name = self
                    .glsl_spelling(ty)
                    .unwrap_or_else(|| self.ctx.source.slice(ty.span).to_string());
                self.edits.replace(
                    Span::new(expr.span.start, operand.span.start),
                    format!("{}(", name),
                );
                self.rewrite_expr(operand);
                if *kind == CastKind::CStyle {
                    self.edits.insert_after(operand.span.end, ")");
                }
            }
            Expr::InitList(list) => {
                self.braces_to_parens(list.open, list.close);
                for e in &list.elems {
                    self.rewrite_expr(e);
                }
            }
            // Rejected by validation before rewriting.
            Expr::New { .. } | Expr::Delete { .. } | Expr::Lambda { .. } => {}
        }
    }

    fn rewrite_callee(&mut self, callee: &Spanned<Expr>) {
        match &callee.node {
            // `tc::uvec2(x, y)`, `tc::uint(x)`: constructor calls.
            Expr::Path(path) => {
                let type_name = path.last().and_then(|last| {
                    if last.template_args.is_some() {
                        return None;
                    }
                    let name = last.name.node.as_str();
                    typemap::host_scalar(name)
                        .map(|k| k.glsl_name().to_string())
                        .or_else(|| {
                            typemap::host_vector(name)
                                .and_then(|(k, n)| typemap::vector_name(k, n))
                        })
                });
                let shadowed = path.segments.len() == 1
                    && self.ctx.types.field_ty(&path.segments[0].name.node).is_some();
                match type_name {
                    Some(name) if !shadowed => self.replace_if_changed(path.span, name),
                    _ => self.strip_qualifier(path),
                }
            }
            // `arr.size()` on a fixed-size array.
            Expr::Member { base, member, .. } => {
                let on_array = matches!(
                    self.ctx.types.expr_ty(base.span).map(Ty::value),
                    Some(Ty::Array(..))
                );
                if on_array && member.node == "size" {
                    self.edits.replace(member.span, "length");
                }
                self.rewrite_expr_inner(callee);
            }
            _ => self.rewrite_expr(callee),
        }
    }
}
