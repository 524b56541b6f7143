//! Expression typing: check_expr and the usual arithmetic conversions.

use crate::ast::*;
use crate::syntax::span::Spanned;
use crate::transpile::typemap::{self, ScalarKind};

use super::builtins::builtin_call;
use super::types::{resolve_type, Ty};
use super::TypeChecker;

const BOOL: Ty = Ty::Scalar(ScalarKind::Bool);
const INT: Ty = Ty::Scalar(ScalarKind::Int);

/// Swizzle suffix on subscript literals: `v["xy"_sw]`.
pub const SWIZZLE_SUFFIX: &str = "_sw";

/// The letters of a swizzle subscript, if `index` is one.
pub fn swizzle_letters(index: &Spanned<Expr>) -> Option<&str> {
    match &Expr::unparen(index).node {
        Expr::Literal(Literal::Str { value, suffix }) if suffix == SWIZZLE_SUFFIX => Some(value),
        _ => None,
    }
}

/// Bool operands of arithmetic promote to int.
fn promote(kind: ScalarKind) -> ScalarKind {
    if kind == ScalarKind::Bool {
        ScalarKind::Int
    } else {
        kind
    }
}

/// Common type of two scalar operands.
fn common_kind(a: ScalarKind, b: ScalarKind) -> ScalarKind {
    let (a, b) = (promote(a), promote(b));
    if a.rank() >= b.rank() {
        a
    } else {
        b
    }
}

fn swizzle_ty(base: &Ty, letters: &str) -> Ty {
    let kind = match base.value() {
        Ty::Vector(k, _) | Ty::Scalar(k) => *k,
        _ => return Ty::Unknown,
    };
    match letters.len() {
        1 => Ty::Scalar(kind),
        n @ 2..=4 => Ty::Vector(kind, n as u32),
        _ => Ty::Unknown,
    }
}

impl TypeChecker<'_> {
    pub(super) fn check_expr(&mut self, expr: &Spanned<Expr>) -> Ty {
        let ty = self.check_expr_inner(expr);
        self.record(expr.span, &ty);
        ty
    }

    fn check_expr_inner(&mut self, expr: &Spanned<Expr>) -> Ty {
        match &expr.node {
            Expr::Literal(lit) => match lit {
                Literal::Int { suffix, .. } => {
                    if suffix.contains(['u', 'U']) {
                        Ty::Scalar(ScalarKind::UInt)
                    } else {
                        INT
                    }
                }
                Literal::Float { suffix, .. } => {
                    if suffix.contains(['f', 'F']) {
                        Ty::Scalar(ScalarKind::Float)
                    } else {
                        Ty::Scalar(ScalarKind::Double)
                    }
                }
                Literal::Bool(_) => BOOL,
                Literal::Char(_) => INT,
                Literal::Str { .. } | Literal::Nullptr => Ty::Unknown,
            },
            Expr::Path(path) => match path.last() {
                Some(last) if last.template_args.is_none() => {
                    self.lookup(&last.name.node).unwrap_or(Ty::Unknown)
                }
                _ => Ty::Unknown,
            },
            Expr::This => Ty::Record(self.kernel.clone()),
            Expr::Paren(inner) => self.check_expr(inner),
            Expr::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                match op {
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => {
                        if ty.scalar() == Some(ScalarKind::Bool) {
                            self.convert(operand.span, &ty, &INT);
                            INT
                        } else {
                            ty.value().clone()
                        }
                    }
                    UnaryOp::Not => {
                        self.convert(operand.span, &ty, &BOOL);
                        BOOL
                    }
                    UnaryOp::PreInc | UnaryOp::PreDec => ty.value().clone(),
                    UnaryOp::Deref | UnaryOp::AddrOf => Ty::Unknown,
                }
            }
            Expr::Postfix { operand, .. } => self.check_expr(operand).value().clone(),
            Expr::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs),
            Expr::Assign { lhs, rhs, .. } => {
                let target = self.check_expr(lhs);
                let value = self.check_expr(rhs);
                if !matches!(rhs.node, Expr::InitList(_)) {
                    self.convert(rhs.span, &value, &target);
                }
                target.value().clone()
            }
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.check_cond(cond);
                let a = self.check_expr(then_expr);
                let b = self.check_expr(else_expr);
                match (a.scalar(), b.scalar()) {
                    (Some(x), Some(y)) if x != y => {
                        let common = Ty::Scalar(common_kind(x, y));
                        self.convert(then_expr.span, &a, &common);
                        self.convert(else_expr.span, &b, &common);
                        common
                    }
                    _ => a.value().clone(),
                }
            }
            Expr::Call { callee, args } => self.check_call(callee, args),
            Expr::Construct { ty, args, .. } => {
                for a in args {
                    self.check_expr(a);
                }
                resolve_type(ty, self.env)
            }
            Expr::Index { base, index, .. } => {
                let base_ty = self.check_expr(base);
                if let Some(letters) = swizzle_letters(index) {
                    return swizzle_ty(&base_ty, letters);
                }
                self.check_expr(index);
                match base_ty.value() {
                    Ty::Buffer(elem) | Ty::Array(elem, _) => (**elem).clone(),
                    Ty::Vector(k, _) => Ty::Scalar(*k),
                    _ => Ty::Unknown,
                }
            }
            Expr::Member { base, member, .. } => {
                let base_ty = self.check_expr(base);
                self.member_ty(&base_ty, &member.node)
            }
            Expr::Cast { ty, operand, .. } => {
                self.check_expr(operand);
                resolve_type(ty, self.env)
            }
            Expr::InitList(list) => {
                for e in &list.elems {
                    self.check_expr(e);
                }
                Ty::Unknown
            }
            Expr::New { args, .. } => {
                for a in args {
                    self.check_expr(a);
                }
                Ty::Unknown
            }
            Expr::Delete { operand, .. } => {
                self.check_expr(operand);
                Ty::Void
            }
            Expr::Lambda { .. } => Ty::Unknown,
            Expr::Sizeof => Ty::Scalar(ScalarKind::UInt),
        }
    }

    fn check_binary(&mut self, op: BinOp, lhs: &Spanned<Expr>, rhs: &Spanned<Expr>) -> Ty {
        let a = self.check_expr(lhs);
        let b = self.check_expr(rhs);

        match op {
            BinOp::And | BinOp::Or => {
                self.convert(lhs.span, &a, &BOOL);
                self.convert(rhs.span, &b, &BOOL);
                return BOOL;
            }
            BinOp::Comma => return b.value().clone(),
            BinOp::Shl | BinOp::Shr => {
                // Shift operands promote independently.
                let result = match a.scalar() {
                    Some(k) => Ty::Scalar(promote(k)),
                    None => a.value().clone(),
                };
                self.convert(lhs.span, &a, &result);
                if let Some(k) = b.scalar() {
                    self.convert(rhs.span, &b, &Ty::Scalar(promote(k)));
                }
                return result;
            }
            _ => {}
        }

        match (a.value(), b.value()) {
            (Ty::Scalar(x), Ty::Scalar(y)) => {
                let common = Ty::Scalar(common_kind(*x, *y));
                self.convert(lhs.span, &a, &common);
                self.convert(rhs.span, &b, &common);
                if op.is_comparison() {
                    BOOL
                } else {
                    common
                }
            }
            (Ty::Vector(..), _) | (_, Ty::Vector(..)) if op.is_comparison() => BOOL,
            (v @ Ty::Vector(..), _) | (_, v @ Ty::Vector(..)) => v.clone(),
            _ if op.is_comparison() => BOOL,
            _ => Ty::Unknown,
        }
    }

    fn check_call(&mut self, callee: &Spanned<Expr>, args: &[Spanned<Expr>]) -> Ty {
        let callee_node = &Expr::unparen(callee).node;

        if let Expr::Member { base, member, .. } = callee_node {
            let base_ty = self.check_expr(base);
            for a in args {
                self.check_expr(a);
            }
            return match (base_ty.value(), member.node.as_str()) {
                (Ty::Array(..), "size" | "length") | (Ty::Vector(..), "length") => INT,
                _ => Ty::Unknown,
            };
        }

        let Expr::Path(path) = callee_node else {
            self.check_expr(callee);
            for a in args {
                self.check_expr(a);
            }
            return Ty::Unknown;
        };
        let Some(last) = path.last() else {
            return Ty::Unknown;
        };
        let name = last.name.node.as_str();
        let qualified_by_dsl = path
            .segments
            .first()
            .is_some_and(|s| path.segments.len() > 1 && self.is_dsl_namespace(&s.name.node));

        // Functional casts and vector constructors: `tc::uvec2(x, y)`.
        if last.template_args.is_none() && self.lookup(name).is_none() {
            let as_type = typemap::host_scalar(name)
                .map(Ty::Scalar)
                .or_else(|| typemap::host_vector(name).map(|(k, n)| Ty::Vector(k, n)));
            if let Some(ty) = as_type {
                for a in args {
                    self.check_expr(a);
                }
                return ty;
            }
        }

        if !qualified_by_dsl {
            if let Some(sig) = self.methods.get(name).cloned() {
                for (i, a) in args.iter().enumerate() {
                    let ty = self.check_expr(a);
                    if let Some(param) = sig.params.get(i) {
                        if !matches!(a.node, Expr::InitList(_)) {
                            self.convert(a.span, &ty, param);
                        }
                    }
                }
                return sig.return_ty;
            }
        }

        let arg_tys: Vec<Ty> = args.iter().map(|a| self.check_expr(a)).collect();
        builtin_call(name, &arg_tys).unwrap_or(Ty::Unknown)
    }

    fn member_ty(&self, base: &Ty, member: &str) -> Ty {
        match base.value() {
            Ty::Vector(..) | Ty::Scalar(_) => swizzle_ty(base, member),
            Ty::Record(name) if *name == self.kernel => {
                self.out.fields.get(member).cloned().unwrap_or(Ty::Unknown)
            }
            Ty::Record(name) => self
                .records
                .get(name)
                .and_then(|fields| fields.get(member))
                .cloned()
                .unwrap_or(Ty::Unknown),
            _ => Ty::Unknown,
        }
    }
}
