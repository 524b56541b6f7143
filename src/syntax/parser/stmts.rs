use super::*;

/// The leading part of a declaration: specifiers, type and first name.
type DeclHead = (Vec<Spanned<DeclSpec>>, TypeExpr, Spanned<String>);

impl Parser {
    pub(super) fn parse_block(&mut self) -> Block {
        let open = self.expect(&Lexeme::LBrace);
        let mut stmts = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            stmts.push(self.parse_stmt());
            if self.pos == before {
                self.error_at_current("expected statement");
                self.advance();
            }
        }
        let close = self.expect(&Lexeme::RBrace);
        Block {
            stmts,
            span: open.merge(close),
        }
    }

    fn parse_stmt(&mut self) -> Spanned<Stmt> {
        let start = self.current_span();
        if !self.enter_nesting() {
            return Spanned::new(Stmt::Empty, start);
        }
        let stmt = self.parse_stmt_inner();
        self.exit_nesting();
        Spanned::new(stmt, start.merge(self.prev_span()))
    }

    fn parse_stmt_inner(&mut self) -> Stmt {
        match self.peek().clone() {
            Lexeme::LBrace => Stmt::Block(self.parse_block()),
            Lexeme::If => {
                self.advance();
                self.eat(&Lexeme::Constexpr);
                let cond = self.parse_condition();
                let then_branch = Box::new(self.parse_stmt());
                let else_branch = if self.eat(&Lexeme::Else) {
                    Some(Box::new(self.parse_stmt()))
                } else {
                    None
                };
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            Lexeme::For => self.parse_for(),
            Lexeme::While => {
                self.advance();
                let cond = self.parse_condition();
                let body = Box::new(self.parse_stmt());
                Stmt::While { cond, body }
            }
            Lexeme::Do => {
                self.advance();
                let body = Box::new(self.parse_stmt());
                self.expect(&Lexeme::While);
                let cond = self.parse_condition();
                self.expect(&Lexeme::Semicolon);
                Stmt::DoWhile { body, cond }
            }
            Lexeme::Switch => {
                self.advance();
                let cond = self.parse_condition();
                let body = Box::new(self.parse_stmt());
                Stmt::Switch { cond, body }
            }
            Lexeme::Case => {
                self.advance();
                let value = self.parse_assign_expr();
                self.expect(&Lexeme::Colon);
                Stmt::Case(value)
            }
            Lexeme::Default => {
                self.advance();
                self.expect(&Lexeme::Colon);
                Stmt::Default
            }
            Lexeme::Break => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Break
            }
            Lexeme::Continue => {
                self.advance();
                self.expect(&Lexeme::Semicolon);
                Stmt::Continue
            }
            Lexeme::Return => {
                self.advance();
                let value = if self.at(&Lexeme::Semicolon) {
                    None
                } else {
                    Some(self.parse_initializer_clause())
                };
                self.expect(&Lexeme::Semicolon);
                Stmt::Return(value)
            }
            Lexeme::Using => Stmt::Using(self.parse_using()),
            Lexeme::Semicolon => {
                self.advance();
                Stmt::Empty
            }
            Lexeme::Goto
            | Lexeme::StaticAssert
            | Lexeme::Typedef
            | Lexeme::Enum
            | Lexeme::Struct
            | Lexeme::Class
            | Lexeme::Union => {
                self.skip_declaration();
                Stmt::Opaque
            }
            Lexeme::Ident(_) if self.peek_at(1) == &Lexeme::Colon => {
                // label
                self.advance();
                self.advance();
                Stmt::Opaque
            }
            _ => {
                let start = self.current_span();
                if let Some((specs, ty, name)) = self.try_decl_head() {
                    return Stmt::Decl(self.finish_var_decl(start, specs, ty, name, true));
                }
                let expr = self.parse_expr();
                self.expect(&Lexeme::Semicolon);
                Stmt::Expr(expr)
            }
        }
    }

    /// `( expr )` of `if`, `while`, `switch`.
    fn parse_condition(&mut self) -> Spanned<Expr> {
        self.expect(&Lexeme::LParen);
        let saved = self.no_gt;
        self.no_gt = false;
        let cond = self.parse_expr();
        self.no_gt = saved;
        self.expect(&Lexeme::RParen);
        cond
    }

    /// Speculatively parse `specifiers type name` and keep it only when the
    /// next token can continue a declarator.
    fn try_decl_head(&mut self) -> Option<DeclHead> {
        if !matches!(
            self.peek(),
            Lexeme::Ident(_) | Lexeme::ColonColon | Lexeme::Typename | Lexeme::Auto | Lexeme::Const
                | Lexeme::Volatile | Lexeme::Static | Lexeme::Constexpr | Lexeme::ThreadLocal
                | Lexeme::Inline | Lexeme::Extern | Lexeme::Mutable | Lexeme::LBracket
        ) && self.peek().builtin_type_word().is_none()
        {
            return None;
        }
        if self.at(&Lexeme::LBracket) && self.peek_at(1) != &Lexeme::LBracket {
            return None;
        }
        self.attempt(
            |p| {
                let specs = p.parse_decl_specs();
                let ty = p.parse_type();
                let name = p.expect_ident();
                (specs, ty, name)
            },
            |p, _| {
                matches!(
                    p.peek(),
                    Lexeme::Eq
                        | Lexeme::Semicolon
                        | Lexeme::Comma
                        | Lexeme::LBracket
                        | Lexeme::LBrace
                        | Lexeme::LParen
                        | Lexeme::Colon
                )
            },
        )
    }

    fn parse_for(&mut self) -> Stmt {
        self.expect(&Lexeme::For);
        self.expect(&Lexeme::LParen);
        let saved = self.no_gt;
        self.no_gt = false;

        let init_start = self.current_span();
        let init = if self.eat(&Lexeme::Semicolon) {
            None
        } else if let Some((specs, ty, name)) = self.try_decl_head() {
            if self.eat(&Lexeme::Colon) {
                let var_span = init_start.merge(name.span);
                let var = VarDecl {
                    specifiers: specs,
                    ty,
                    declarators: vec![Declarator {
                        ptr_ops: Vec::new(),
                        span: name.span,
                        name,
                        array_dims: Vec::new(),
                        init: None,
                    }],
                    span: var_span,
                };
                let range = self.parse_expr();
                self.expect(&Lexeme::RParen);
                self.no_gt = saved;
                let body = Box::new(self.parse_stmt());
                return Stmt::RangeFor { var, range, body };
            }
            let decl = self.finish_var_decl(init_start, specs, ty, name, true);
            let span = decl.span;
            Some(Box::new(Spanned::new(Stmt::Decl(decl), span)))
        } else {
            let expr = self.parse_expr();
            let end = self.expect(&Lexeme::Semicolon);
            let span = expr.span.merge(end);
            Some(Box::new(Spanned::new(Stmt::Expr(expr), span)))
        };

        let cond = if self.at(&Lexeme::Semicolon) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::Semicolon);

        let step = if self.at(&Lexeme::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&Lexeme::RParen);
        self.no_gt = saved;

        let body = Box::new(self.parse_stmt());
        Stmt::For {
            init,
            cond,
            step,
            body,
        }
    }
}
