use crate::ast::*;
use crate::syntax::span::{Span, Spanned};

use super::Rewriter;

impl Rewriter<'_, '_> {
    pub(super) fn rewrite_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.rewrite_stmt(stmt);
        }
    }

    fn rewrite_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Block(block) => self.rewrite_block(block),
            Stmt::Decl(decl) => self.rewrite_local(decl),
            Stmt::Expr(e) | Stmt::Case(e) => self.rewrite_expr(e),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.rewrite_expr(cond);
                self.rewrite_stmt(then_branch);
                if let Some(e) = else_branch {
                    self.rewrite_stmt(e);
                }
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.rewrite_stmt(init);
                }
                if let Some(cond) = cond {
                    self.rewrite_expr(cond);
                }
                if let Some(step) = step {
                    self.rewrite_expr(step);
                }
                self.rewrite_stmt(body);
            }
            Stmt::RangeFor { var, range, body } => {
                self.warn(
                    "range-based for has no GLSL equivalent; use an indexed loop".to_string(),
                    var.span,
                );
                self.rewrite_expr(range);
                self.rewrite_stmt(body);
            }
            Stmt::While { cond, body }
            | Stmt::DoWhile { body, cond }
            | Stmt::Switch { cond, body } => {
                self.rewrite_expr(cond);
                self.rewrite_stmt(body);
            }
            Stmt::Return(Some(value)) => match &value.node {
                Expr::InitList(list) => {
                    if let Some(name) = self.return_name.clone() {
                        self.edits.insert_before(list.open.start, name);
                    }
                    self.rewrite_expr(value);
                }
                _ => self.rewrite_expr(value),
            },
            Stmt::Using(using) => self.comment_out(using),
            Stmt::Return(None)
            | Stmt::Default
            | Stmt::Break
            | Stmt::Continue
            | Stmt::Empty
            | Stmt::Opaque => {}
        }
    }

    fn rewrite_local(&mut self, decl: &VarDecl) {
        if self.rewrite_array(decl, false) {
            return;
        }
        // `static`/`constexpr` locals: only constness survives.
        if let Some(first) = decl.specifiers.first() {
            let text = if decl.has_spec(DeclSpec::Constexpr) && !decl.ty.is_const() {
                "const "
            } else {
                ""
            };
            self.edits
                .replace(Span::new(first.span.start, decl.ty.span.start), text);
        }
        self.rewrite_plain_decl(decl);
    }

    /// Initializers in GLSL constructor syntax: `T x{a, b}` and
    /// `T x = {a, b}` become `T x = T(a, b)`, `T x(a)` becomes `T x = T(a)`.
    pub(super) fn rewrite_declarator_init(&mut self, d: &Declarator, type_name: Option<String>) {
        match &d.init {
            None => {}
            Some(Initializer::Assign { value, .. }) => match &value.node {
                Expr::InitList(list) => {
                    if let Some(name) = type_name {
                        self.edits.insert_before(list.open.start, name);
                    }
                    self.rewrite_expr(value);
                }
                _ => self.rewrite_expr(value),
            },
            Some(Initializer::Braced(list)) => {
                if let Some(name) = type_name {
                    self.edits
                        .insert_before(list.open.start, format!(" = {}", name));
                }
                self.braces_to_parens(list.open, list.close);
                for e in &list.elems {
                    self.rewrite_expr(e);
                }
            }
            Some(Initializer::Paren { args, open, .. }) => {
                if let Some(name) = type_name {
                    self.edits.insert_before(open.start, format!(" = {}", name));
                }
                match args.as_slice() {
                    // The constructor call already performs the conversion.
                    [single] => self.rewrite_expr_inner(single),
                    _ => {
                        for a in args {
                            self.rewrite_expr(a);
                        }
                    }
                }
            }
        }
    }
}
