use super::*;

impl Parser {
    pub(super) fn parse_type(&mut self) -> TypeExpr {
        let start = self.current_span();
        let mut cv = self.parse_cv();

        // Elaborated and dependent forms carry no extra meaning here.
        while matches!(
            self.peek(),
            Lexeme::Typename | Lexeme::Struct | Lexeme::Class | Lexeme::Union | Lexeme::Enum
        ) {
            self.advance();
        }

        let base_start = self.current_span();
        let base = match self.peek().clone() {
            Lexeme::Auto => {
                self.advance();
                TypeBase::Auto
            }
            Lexeme::Decltype => {
                self.advance();
                if self.at(&Lexeme::LParen) {
                    self.skip_balanced();
                }
                TypeBase::Opaque
            }
            Lexeme::Ident(_) | Lexeme::ColonColon => TypeBase::Path(self.parse_path(true)),
            tok if tok.builtin_type_word().is_some() => {
                let mut words = Vec::new();
                loop {
                    if let Some(word) = self.peek().builtin_type_word() {
                        words.push(word.to_string());
                        self.advance();
                    } else if matches!(self.peek(), Lexeme::Const | Lexeme::Volatile)
                        && self.peek_at(1).builtin_type_word().is_some()
                    {
                        cv.extend(self.parse_cv());
                    } else {
                        break;
                    }
                }
                TypeBase::Builtin(words)
            }
            _ => {
                let found = self.peek().description();
                self.error_at_current(&format!("expected type, found {}", found));
                TypeBase::Opaque
            }
        };
        let base_span = base_start.merge(self.prev_span());

        cv.extend(self.parse_cv());
        let ptr_ops = self.parse_ptr_ops();

        TypeExpr {
            cv,
            base,
            base_span,
            ptr_ops,
            span: start.merge(self.prev_span()),
        }
    }

    fn parse_cv(&mut self) -> Vec<Spanned<Cv>> {
        let mut cv = Vec::new();
        loop {
            let q = match self.peek() {
                Lexeme::Const => Cv::Const,
                Lexeme::Volatile => Cv::Volatile,
                _ => break,
            };
            let span = self.advance().span;
            cv.push(Spanned::new(q, span));
        }
        cv
    }

    /// `*`, `&`, `&&`, with cv-qualifiers on pointers consumed.
    pub(super) fn parse_ptr_ops(&mut self) -> Vec<Spanned<PtrOp>> {
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                Lexeme::Star => PtrOp::Pointer,
                Lexeme::Amp => PtrOp::LRef,
                Lexeme::AmpAmp => PtrOp::RRef,
                _ => break,
            };
            let span = self.advance().span;
            ops.push(Spanned::new(op, span));
            self.parse_cv();
        }
        ops
    }

    /// Parse a possibly qualified name. In type position a `<` after a
    /// segment always opens template arguments; in expression position it
    /// only does when the arguments parse and are followed by `(`, `{` or
    /// `::`.
    pub(super) fn parse_path(&mut self, in_type: bool) -> Path {
        let start = self.current_span();
        let global = self.eat(&Lexeme::ColonColon);
        let mut segments = Vec::new();

        loop {
            self.eat(&Lexeme::Template);
            let name = self.expect_ident();
            let template_args = if self.at(&Lexeme::Lt) {
                if in_type {
                    Some(self.parse_template_args())
                } else {
                    self.attempt(
                        |p| p.parse_template_args(),
                        |p, _| {
                            matches!(
                                p.peek(),
                                Lexeme::LParen | Lexeme::LBrace | Lexeme::ColonColon
                            )
                        },
                    )
                }
            } else {
                None
            };
            segments.push(PathSegment {
                name,
                template_args,
            });

            let continues = self.at(&Lexeme::ColonColon)
                && matches!(self.peek_at(1), Lexeme::Ident(_) | Lexeme::Template);
            if !continues {
                break;
            }
            self.advance();
        }

        Path {
            global,
            segments,
            span: start.merge(self.prev_span()),
        }
    }

    pub(super) fn parse_template_args(&mut self) -> TemplateArgs {
        let open = self.expect(&Lexeme::Lt);
        let saved = self.no_gt;
        self.no_gt = true;

        let mut args = Vec::new();
        while !self.at(&Lexeme::Gt) && !self.at(&Lexeme::Eof) {
            args.push(self.parse_template_arg());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }

        self.no_gt = saved;
        let close = self.expect(&Lexeme::Gt);
        TemplateArgs { args, open, close }
    }

    fn parse_template_arg(&mut self) -> TemplateArg {
        let ty = self.attempt(
            |p| p.parse_type(),
            |p, _| matches!(p.peek(), Lexeme::Comma | Lexeme::Gt),
        );
        match ty {
            Some(ty) => TemplateArg::Type(ty),
            None => TemplateArg::Expr(self.parse_assign_expr()),
        }
    }

    /// A path usable as a type in expression position (`T{...}`).
    pub(super) fn type_from_path(path: Path) -> TypeExpr {
        let span = path.span;
        TypeExpr {
            cv: Vec::new(),
            base: TypeBase::Path(path),
            base_span: span,
            ptr_ops: Vec::new(),
            span,
        }
    }
}
