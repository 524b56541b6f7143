use crate::ast::*;
use crate::syntax::span::Spanned;
use crate::transpile::typemap::ScalarKind;

use super::types::{resolve_type, Ty};
use super::TypeChecker;

const BOOL: Ty = Ty::Scalar(ScalarKind::Bool);

impl TypeChecker<'_> {
    pub(super) fn check_block(&mut self, block: &Block) {
        self.push_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Block(block) => self.check_block(block),
            Stmt::Decl(decl) => self.check_local(decl),
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_cond(cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                self.push_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_cond(cond);
                }
                if let Some(step) = step {
                    self.check_expr(step);
                }
                self.check_stmt(body);
                self.pop_scope();
            }
            Stmt::RangeFor { var, range, body } => {
                self.push_scope();
                let range_ty = self.check_expr(range);
                let elem = match range_ty.value() {
                    Ty::Array(e, _) | Ty::Buffer(e) => (**e).clone(),
                    _ => Ty::Unknown,
                };
                for d in &var.declarators {
                    let ty = match var.ty.base {
                        TypeBase::Auto => elem.clone(),
                        _ => resolve_type(&var.ty, self.env),
                    };
                    self.out.decl_types.insert(d.name.span, ty.clone());
                    self.declare(&d.name.node, ty);
                }
                self.check_stmt(body);
                self.pop_scope();
            }
            Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
                self.check_cond(cond);
                self.check_stmt(body);
            }
            Stmt::Switch { cond, body } => {
                self.check_expr(cond);
                self.check_stmt(body);
            }
            Stmt::Case(value) => {
                self.check_expr(value);
            }
            Stmt::Return(Some(value)) => {
                let ty = self.check_expr(value);
                if !matches!(value.node, Expr::InitList(_)) {
                    let ret = self.return_ty.clone();
                    self.convert(value.span, &ty, &ret);
                }
            }
            Stmt::Return(None)
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Using(_)
            | Stmt::Empty
            | Stmt::Opaque => {}
        }
    }

    /// A condition converts contextually to `bool`.
    pub(super) fn check_cond(&mut self, cond: &Spanned<Expr>) {
        let ty = self.check_expr(cond);
        self.convert(cond.span, &ty, &BOOL);
    }

    fn check_local(&mut self, decl: &VarDecl) {
        for d in &decl.declarators {
            let ty = match decl.ty.base {
                TypeBase::Auto if d.array_dims.is_empty() => self.infer_from_init(d),
                _ => self.declared_ty(decl, d),
            };
            self.out.decl_types.insert(d.name.span, ty.clone());
            self.check_initializer(d, &ty);
            self.declare(&d.name.node, ty);
        }
    }

    fn infer_from_init(&mut self, d: &Declarator) -> Ty {
        let value = match &d.init {
            Some(Initializer::Assign { value, .. }) => value,
            Some(Initializer::Braced(list)) if list.elems.len() == 1 => &list.elems[0],
            Some(Initializer::Paren { args, .. }) if args.len() == 1 => &args[0],
            _ => return Ty::Unknown,
        };
        let ty = self.check_expr(value);
        match ty.value() {
            Ty::Scalar(_) | Ty::Vector(..) | Ty::Record(_) => ty.value().clone(),
            _ => Ty::Unknown,
        }
    }

    /// Check a declarator's initializer against the declared type. Brace
    /// lists convert element-wise only through constructor semantics, so
    /// they are typed but not converted.
    pub(super) fn check_initializer(&mut self, d: &Declarator, declared: &Ty) {
        match &d.init {
            None => {}
            Some(Initializer::Assign { value, .. }) => {
                if let Expr::InitList(list) = &value.node {
                    for e in &list.elems {
                        self.check_expr(e);
                    }
                } else {
                    let ty = self.check_expr(value);
                    self.convert(value.span, &ty, declared);
                }
            }
            Some(Initializer::Braced(list)) => {
                for e in &list.elems {
                    self.check_expr(e);
                }
            }
            Some(Initializer::Paren { args, .. }) => {
                if let [single] = args.as_slice() {
                    let ty = self.check_expr(single);
                    self.convert(single.span, &ty, declared);
                } else {
                    for a in args {
                        self.check_expr(a);
                    }
                }
            }
        }
    }
}
