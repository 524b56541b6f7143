use super::*;

impl Parser {
    /// Full expression, including the comma operator.
    pub(super) fn parse_expr(&mut self) -> Spanned<Expr> {
        let mut lhs = self.parse_assign_expr();
        while self.at(&Lexeme::Comma) && !self.no_gt {
            self.advance();
            let rhs = self.parse_assign_expr();
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op: BinOp::Comma,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        lhs
    }

    /// Assignment or conditional expression (no top-level comma).
    pub(super) fn parse_assign_expr(&mut self) -> Spanned<Expr> {
        if !self.enter_nesting() {
            let span = self.current_span();
            return Spanned::new(Expr::Literal(Literal::Int { value: 0, suffix: String::new() }), span);
        }

        let lhs = self.parse_binary(0);

        let result = if self.at(&Lexeme::Question) {
            self.advance();
            let saved = self.no_gt;
            self.no_gt = false;
            let then_expr = self.parse_expr();
            self.no_gt = saved;
            self.expect(&Lexeme::Colon);
            let else_expr = self.parse_assign_expr();
            let span = lhs.span.merge(else_expr.span);
            Spanned::new(
                Expr::Conditional {
                    cond: Box::new(lhs),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            )
        } else if let Some(op) = self.eat_assign_op() {
            let rhs = self.parse_initializer_clause();
            let span = lhs.span.merge(rhs.span);
            Spanned::new(
                Expr::Assign {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            )
        } else {
            lhs
        };

        self.exit_nesting();
        result
    }

    fn eat_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek() {
            Lexeme::Eq => None,
            Lexeme::PlusEq => Some(BinOp::Add),
            Lexeme::MinusEq => Some(BinOp::Sub),
            Lexeme::StarEq => Some(BinOp::Mul),
            Lexeme::SlashEq => Some(BinOp::Div),
            Lexeme::PercentEq => Some(BinOp::Rem),
            Lexeme::AmpEq => Some(BinOp::BitAnd),
            Lexeme::PipeEq => Some(BinOp::BitOr),
            Lexeme::CaretEq => Some(BinOp::BitXor),
            Lexeme::ShlEq => Some(BinOp::Shl),
            Lexeme::Gt
                if !self.no_gt && self.at_shift_right() && self.peek_at(1) == &Lexeme::GtEq =>
            {
                self.advance();
                self.advance();
                return Some(AssignOp(Some(BinOp::Shr)));
            }
            _ => return None,
        };
        self.advance();
        Some(AssignOp(op))
    }

    /// Binary operator at the cursor: (operator, binding power, token count).
    fn peek_binop(&self) -> Option<(BinOp, u8, usize)> {
        let info = match self.peek() {
            Lexeme::PipePipe => (BinOp::Or, 1, 1),
            Lexeme::AmpAmp => (BinOp::And, 2, 1),
            Lexeme::Pipe => (BinOp::BitOr, 3, 1),
            Lexeme::Caret => (BinOp::BitXor, 4, 1),
            Lexeme::Amp => (BinOp::BitAnd, 5, 1),
            Lexeme::EqEq => (BinOp::Eq, 6, 1),
            Lexeme::BangEq => (BinOp::Ne, 6, 1),
            Lexeme::Lt => (BinOp::Lt, 7, 1),
            Lexeme::LtEq => (BinOp::Le, 7, 1),
            Lexeme::GtEq => (BinOp::Ge, 7, 1),
            Lexeme::Gt if self.no_gt => return None,
            Lexeme::Gt if self.at_shift_right() => {
                if self.peek_at(1) == &Lexeme::GtEq {
                    return None;
                }
                (BinOp::Shr, 8, 2)
            }
            Lexeme::Gt => (BinOp::Gt, 7, 1),
            Lexeme::Shl => (BinOp::Shl, 8, 1),
            Lexeme::Plus => (BinOp::Add, 9, 1),
            Lexeme::Minus => (BinOp::Sub, 9, 1),
            Lexeme::Star => (BinOp::Mul, 10, 1),
            Lexeme::Slash => (BinOp::Div, 10, 1),
            Lexeme::Percent => (BinOp::Rem, 10, 1),
            _ => return None,
        };
        Some(info)
    }

    fn parse_binary(&mut self, min_bp: u8) -> Spanned<Expr> {
        let mut lhs = self.parse_unary();

        while let Some((op, bp, tokens)) = self.peek_binop() {
            if bp < min_bp {
                break;
            }
            for _ in 0..tokens {
                self.advance();
            }
            let rhs = self.parse_binary(bp + 1);
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        lhs
    }

    fn parse_unary(&mut self) -> Spanned<Expr> {
        let op = match self.peek() {
            Lexeme::Minus => UnaryOp::Neg,
            Lexeme::Plus => UnaryOp::Plus,
            Lexeme::Bang => UnaryOp::Not,
            Lexeme::Tilde => UnaryOp::BitNot,
            Lexeme::Star => UnaryOp::Deref,
            Lexeme::Amp => UnaryOp::AddrOf,
            Lexeme::PlusPlus => UnaryOp::PreInc,
            Lexeme::MinusMinus => UnaryOp::PreDec,
            _ => {
                let primary = self.parse_primary();
                return self.parse_postfix(primary);
            }
        };
        let start = self.advance().span;
        if !self.enter_nesting() {
            return Spanned::new(Expr::Literal(Literal::Nullptr), start);
        }
        let operand = self.parse_unary();
        self.exit_nesting();
        let span = start.merge(operand.span);
        Spanned::new(
            Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    fn parse_postfix(&mut self, mut expr: Spanned<Expr>) -> Spanned<Expr> {
        loop {
            match self.peek() {
                Lexeme::LParen => {
                    let (args, _open, close) = self.parse_call_args();
                    let span = expr.span.merge(close);
                    expr = Spanned::new(
                        Expr::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                Lexeme::LBracket if self.peek_at(1) != &Lexeme::LBracket => {
                    let open = self.advance().span;
                    let saved = self.no_gt;
                    self.no_gt = false;
                    let index = self.parse_initializer_clause();
                    self.no_gt = saved;
                    let close = self.expect(&Lexeme::RBracket);
                    let span = expr.span.merge(close);
                    expr = Spanned::new(
                        Expr::Index {
                            base: Box::new(expr),
                            index: Box::new(index),
                            open,
                            close,
                        },
                        span,
                    );
                }
                Lexeme::Dot | Lexeme::Arrow => {
                    let arrow = self.at(&Lexeme::Arrow);
                    self.advance();
                    self.eat(&Lexeme::Template);
                    let member = if self.at(&Lexeme::Tilde) {
                        let tilde = self.advance().span;
                        let name = self.expect_ident();
                        Spanned::new(format!("~{}", name.node), tilde.merge(name.span))
                    } else {
                        self.expect_ident()
                    };
                    let span = expr.span.merge(member.span);
                    expr = Spanned::new(
                        Expr::Member {
                            base: Box::new(expr),
                            member,
                            arrow,
                        },
                        span,
                    );
                }
                Lexeme::PlusPlus | Lexeme::MinusMinus => {
                    let op = if self.at(&Lexeme::PlusPlus) {
                        PostfixOp::Inc
                    } else {
                        PostfixOp::Dec
                    };
                    let end = self.advance().span;
                    let span = expr.span.merge(end);
                    expr = Spanned::new(
                        Expr::Postfix {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    /// `( args )`: returns the arguments and the paren spans.
    pub(super) fn parse_call_args(&mut self) -> (Vec<Spanned<Expr>>, Span, Span) {
        let open = self.expect(&Lexeme::LParen);
        let saved = self.no_gt;
        self.no_gt = false;
        let mut args = Vec::new();
        while !self.at(&Lexeme::RParen) && !self.at(&Lexeme::Eof) {
            args.push(self.parse_initializer_clause());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.no_gt = saved;
        let close = self.expect(&Lexeme::RParen);
        (args, open, close)
    }

    fn parse_primary(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        match self.peek().clone() {
            Lexeme::Integer { value, suffix } => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Int { value, suffix }), start)
            }
            Lexeme::FloatLit { value, suffix } => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Float { value, suffix }), start)
            }
            Lexeme::True | Lexeme::False => {
                let value = self.at(&Lexeme::True);
                self.advance();
                Spanned::new(Expr::Literal(Literal::Bool(value)), start)
            }
            Lexeme::CharLit(c) => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Char(c)), start)
            }
            Lexeme::Nullptr => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Nullptr), start)
            }
            Lexeme::Str { .. } => self.parse_string_literal(),
            Lexeme::This => {
                self.advance();
                Spanned::new(Expr::This, start)
            }
            Lexeme::LParen => self.parse_paren_or_cast(),
            Lexeme::LBracket => self.parse_lambda(),
            Lexeme::LBrace => {
                let list = self.parse_init_list();
                let span = list.span();
                Spanned::new(Expr::InitList(list), span)
            }
            Lexeme::New => self.parse_new(),
            Lexeme::Delete => {
                self.advance();
                let array = self.at(&Lexeme::LBracket) && self.peek_at(1) == &Lexeme::RBracket;
                if array {
                    self.advance();
                    self.advance();
                }
                let operand = self.parse_unary();
                let span = start.merge(operand.span);
                Spanned::new(
                    Expr::Delete {
                        array,
                        operand: Box::new(operand),
                    },
                    span,
                )
            }
            Lexeme::StaticCast
            | Lexeme::ReinterpretCast
            | Lexeme::ConstCast
            | Lexeme::DynamicCast => self.parse_named_cast(),
            Lexeme::Sizeof => {
                self.advance();
                if self.at(&Lexeme::LParen) {
                    self.skip_balanced();
                } else {
                    self.parse_unary();
                }
                Spanned::new(Expr::Sizeof, start.merge(self.prev_span()))
            }
            Lexeme::Ident(_) | Lexeme::ColonColon => {
                let path = self.parse_path(false);
                let has_args = path
                    .last()
                    .is_some_and(|seg| seg.template_args.is_some());
                if self.at(&Lexeme::LBrace) || (has_args && self.at(&Lexeme::LParen)) {
                    self.parse_construct(Self::type_from_path(path))
                } else {
                    let span = path.span;
                    Spanned::new(Expr::Path(path), span)
                }
            }
            tok if tok.builtin_type_word().is_some() => {
                let ty = self.parse_type();
                if matches!(self.peek(), Lexeme::LParen | Lexeme::LBrace) {
                    self.parse_construct(ty)
                } else {
                    self.error_at_current("expected '(' or '{' after type in expression");
                    let span = ty.span;
                    Spanned::new(Expr::Literal(Literal::Nullptr), span)
                }
            }
            other => {
                self.error_at_current(&format!(
                    "expected expression, found {}",
                    other.description()
                ));
                Spanned::new(Expr::Literal(Literal::Nullptr), start)
            }
        }
    }

    /// Adjacent string literals concatenate.
    fn parse_string_literal(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let mut value = String::new();
        let mut suffix = String::new();
        while let Lexeme::Str { value: v, suffix: s } = self.peek().clone() {
            self.advance();
            value.push_str(&v);
            if !s.is_empty() {
                suffix = s;
            }
        }
        Spanned::new(
            Expr::Literal(Literal::Str { value, suffix }),
            start.merge(self.prev_span()),
        )
    }

    /// `T(args)` or `T{args}`.
    fn parse_construct(&mut self, ty: TypeExpr) -> Spanned<Expr> {
        let (args, braced, open, close) = if self.at(&Lexeme::LBrace) {
            let list = self.parse_init_list();
            (list.elems, true, list.open, list.close)
        } else {
            let (args, open, close) = self.parse_call_args();
            (args, false, open, close)
        };
        let span = ty.span.merge(close);
        Spanned::new(
            Expr::Construct {
                ty,
                args,
                braced,
                open,
                close,
            },
            span,
        )
    }

    fn parse_paren_or_cast(&mut self) -> Spanned<Expr> {
        let start = self.current_span();

        let cast_ty = self.attempt(
            |p| {
                p.advance();
                let ty = p.parse_type();
                p.expect(&Lexeme::RParen);
                ty
            },
            |p, ty| {
                let simple_path = matches!(&ty.base, TypeBase::Path(path)
                    if path.segments.iter().all(|s| s.template_args.is_none()));
                if simple_path && ty.ptr_ops.is_empty() {
                    // `(x) + y` is a parenthesised name, `(uint)x` a cast.
                    matches!(
                        p.peek(),
                        Lexeme::Ident(_)
                            | Lexeme::Integer { .. }
                            | Lexeme::FloatLit { .. }
                            | Lexeme::CharLit(_)
                            | Lexeme::True
                            | Lexeme::False
                            | Lexeme::This
                    )
                } else {
                    !matches!(ty.base, TypeBase::Opaque)
                }
            },
        );

        if let Some(ty) = cast_ty {
            let operand = self.parse_unary();
            let span = start.merge(operand.span);
            return Spanned::new(
                Expr::Cast {
                    kind: CastKind::CStyle,
                    ty,
                    operand: Box::new(operand),
                },
                span,
            );
        }

        self.advance();
        let saved = self.no_gt;
        self.no_gt = false;
        let inner = self.parse_expr();
        self.no_gt = saved;
        let close = self.expect(&Lexeme::RParen);
        Spanned::new(Expr::Paren(Box::new(inner)), start.merge(close))
    }

    fn parse_named_cast(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        let kind = match self.peek() {
            Lexeme::ReinterpretCast => CastKind::Reinterpret,
            Lexeme::ConstCast => CastKind::Const,
            Lexeme::DynamicCast => CastKind::Dynamic,
            _ => CastKind::Static,
        };
        self.advance();
        self.expect(&Lexeme::Lt);
        let saved = self.no_gt;
        self.no_gt = true;
        let ty = self.parse_type();
        self.no_gt = saved;
        self.expect(&Lexeme::Gt);
        self.expect(&Lexeme::LParen);
        let saved = self.no_gt;
        self.no_gt = false;
        let operand = self.parse_expr();
        self.no_gt = saved;
        let close = self.expect(&Lexeme::RParen);
        Spanned::new(
            Expr::Cast {
                kind,
                ty,
                operand: Box::new(operand),
            },
            start.merge(close),
        )
    }

    fn parse_lambda(&mut self) -> Spanned<Expr> {
        let start = self.current_span();
        self.skip_balanced(); // captures
        if self.at(&Lexeme::LParen) {
            self.skip_balanced();
        }
        while !matches!(self.peek(), Lexeme::LBrace | Lexeme::Eof | Lexeme::Semicolon) {
            self.advance();
        }
        let body = self.parse_block();
        let span = start.merge(body.span);
        Spanned::new(Expr::Lambda { body }, span)
    }

    fn parse_new(&mut self) -> Spanned<Expr> {
        let start = self.expect(&Lexeme::New);
        if self.at(&Lexeme::LParen) {
            self.skip_balanced(); // placement arguments
        }
        let ty = self.parse_type();
        if self.at(&Lexeme::LBracket) {
            self.skip_balanced();
        }
        let args = match self.peek() {
            Lexeme::LParen => self.parse_call_args().0,
            Lexeme::LBrace => self.parse_init_list().elems,
            _ => Vec::new(),
        };
        Spanned::new(Expr::New { ty, args }, start.merge(self.prev_span()))
    }
}
