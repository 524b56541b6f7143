//! Semantic typing of kernel bodies.
//!
//! Computes the type of every expression in a kernel record and records
//! the implicit scalar conversions the host compiler would perform at
//! initialisation, assignment, return, call-argument, condition and
//! operand positions. The rewriter decides which of those conversions
//! have to be spelled out in GLSL.

mod builtins;
mod expr;
mod stmt;
#[cfg(test)]
mod tests;
pub mod types;

use std::collections::{BTreeMap, HashMap};

use crate::ast::*;
use crate::syntax::consteval::ConstEnv;
use crate::syntax::span::Span;
use crate::transpile::typemap::ScalarKind;
pub use expr::{swizzle_letters, SWIZZLE_SUFFIX};
pub use types::{resolve_type, Ty};

/// A kernel method signature.
#[derive(Clone, Debug)]
pub(super) struct FnSig {
    pub(super) params: Vec<Ty>,
    pub(super) return_ty: Ty,
}

/// An implicit scalar conversion applied to the expression at `span`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub span: Span,
    pub from: ScalarKind,
    pub to: ScalarKind,
}

/// Typing results for one kernel.
#[derive(Clone, Debug, Default)]
pub struct KernelTypes {
    expr_types: HashMap<Span, Ty>,
    conversions: HashMap<Span, Conversion>,
    /// Declared (or inferred, for `auto`) types keyed by declarator name span.
    decl_types: HashMap<Span, Ty>,
    fields: BTreeMap<String, Ty>,
}

impl KernelTypes {
    pub fn expr_ty(&self, span: Span) -> Option<&Ty> {
        self.expr_types.get(&span)
    }

    pub fn conversion_at(&self, span: Span) -> Option<Conversion> {
        self.conversions.get(&span).copied()
    }

    /// Every recorded conversion, in source order.
    pub fn conversions(&self) -> Vec<Conversion> {
        let mut all: Vec<Conversion> = self.conversions.values().copied().collect();
        all.sort_by_key(|c| (c.span.start, std::cmp::Reverse(c.span.end)));
        all
    }

    pub fn decl_ty(&self, name_span: Span) -> Option<&Ty> {
        self.decl_types.get(&name_span)
    }

    pub fn field_ty(&self, name: &str) -> Option<&Ty> {
        self.fields.get(name)
    }
}

pub(crate) struct TypeChecker<'a> {
    pub(super) env: &'a ConstEnv,
    /// Host DSL namespaces (`tc`).
    pub(super) namespaces: &'a [String],
    pub(super) kernel: String,
    /// Nested record name -> field types.
    pub(super) records: BTreeMap<String, BTreeMap<String, Ty>>,
    pub(super) methods: BTreeMap<String, FnSig>,
    /// Local scopes, innermost last.
    pub(super) scopes: Vec<BTreeMap<String, Ty>>,
    /// Return type of the method being checked.
    pub(super) return_ty: Ty,
    pub(super) out: KernelTypes,
}

/// Type every method body and field initializer of a kernel record.
pub fn check_kernel(record: &Record, env: &ConstEnv, namespaces: &[String]) -> KernelTypes {
    let mut tc = TypeChecker::new(record.name.node.clone(), env, namespaces);
    tc.check_record(record);
    tc.out
}

impl<'a> TypeChecker<'a> {
    pub(crate) fn new(kernel: String, env: &'a ConstEnv, namespaces: &'a [String]) -> Self {
        Self {
            env,
            namespaces,
            kernel,
            records: BTreeMap::new(),
            methods: BTreeMap::new(),
            scopes: Vec::new(),
            return_ty: Ty::Void,
            out: KernelTypes::default(),
        }
    }

    pub(crate) fn check_record(&mut self, record: &Record) {
        let Some(body) = &record.body else {
            return;
        };

        // --- Collect member signatures ---
        for member in &body.members {
            match member {
                Member::Field(decl) => {
                    for d in &decl.declarators {
                        let ty = self.declared_ty(decl, d);
                        self.out.decl_types.insert(d.name.span, ty.clone());
                        self.out.fields.insert(d.name.node.clone(), ty);
                    }
                }
                Member::Method(m) if m.kind == MethodKind::Normal => {
                    let params = m.params.iter().map(|p| self.param_ty(p)).collect();
                    let return_ty = m
                        .ret
                        .as_ref()
                        .map_or(Ty::Void, |t| resolve_type(t, self.env));
                    self.methods.insert(
                        m.name.node.clone(),
                        FnSig { params, return_ty },
                    );
                }
                Member::Record(nested) => self.collect_nested(nested),
                _ => {}
            }
        }
        tracing::trace!(
            kernel = %self.kernel,
            fields = self.out.fields.len(),
            methods = self.methods.len(),
            "collected kernel members"
        );

        // --- Field initializers ---
        for member in &body.members {
            if let Member::Field(decl) = member {
                for d in &decl.declarators {
                    let Some(ty) = self.out.fields.get(&d.name.node).cloned() else {
                        continue;
                    };
                    if matches!(ty, Ty::Scalar(_) | Ty::Vector(..)) {
                        self.check_initializer(d, &ty);
                    }
                }
            }
        }

        // --- Method bodies ---
        for member in &body.members {
            let Member::Method(m) = member else {
                continue;
            };
            let Some(block) = &m.body else {
                continue;
            };
            self.return_ty = m
                .ret
                .as_ref()
                .map_or(Ty::Void, |t| resolve_type(t, self.env));
            self.push_scope();
            for p in &m.params {
                let ty = self.param_ty(p);
                if let Some(name) = &p.name {
                    self.out.decl_types.insert(name.span, ty.clone());
                    self.declare(&name.node, ty);
                }
            }
            self.check_block(block);
            self.pop_scope();
        }
    }

    fn collect_nested(&mut self, record: &Record) {
        let Some(body) = &record.body else {
            return;
        };
        let mut fields = BTreeMap::new();
        for member in &body.members {
            if let Member::Field(decl) = member {
                for d in &decl.declarators {
                    fields.insert(d.name.node.clone(), self.declared_ty(decl, d));
                }
            }
        }
        self.records.insert(record.name.node.clone(), fields);
    }

    pub(super) fn declared_ty(&self, decl: &VarDecl, d: &Declarator) -> Ty {
        if d.ptr_ops.iter().any(|p| p.node == PtrOp::Pointer) {
            return Ty::Unknown;
        }
        let base = resolve_type(&decl.ty, self.env);
        types::with_array_dims(base, &d.array_dims, self.env)
    }

    fn param_ty(&self, p: &Param) -> Ty {
        types::with_array_dims(resolve_type(&p.ty, self.env), &p.array_dims, self.env)
    }

    // --- Scopes ---

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    pub(super) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(super) fn declare(&mut self, name: &str, ty: Ty) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    /// Locals shadow fields; fields shadow named constants and built-ins.
    pub(super) fn lookup(&self, name: &str) -> Option<Ty> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Some(ty.clone());
            }
        }
        if let Some(ty) = self.out.fields.get(name) {
            return Some(ty.clone());
        }
        if self.env.get(name).is_some() {
            return Some(Ty::Scalar(ScalarKind::Int));
        }
        builtins::builtin_var(name)
    }

    pub(super) fn is_dsl_namespace(&self, name: &str) -> bool {
        self.namespaces.iter().any(|n| n == name)
    }

    // --- Conversions ---

    /// Record that the value at `span` converts from `from` to `to`.
    pub(super) fn convert(&mut self, span: Span, from: &Ty, to: &Ty) {
        if let (Some(f), Some(t)) = (from.scalar(), to.scalar()) {
            if f != t {
                self.out
                    .conversions
                    .insert(span, Conversion { span, from: f, to: t });
            }
        }
    }

    pub(super) fn record(&mut self, span: Span, ty: &Ty) {
        self.out.expr_types.insert(span, ty.clone());
    }
}
