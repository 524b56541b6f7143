use super::*;

/// Attribute that marks a record as a GPU kernel.
pub const KERNEL_ATTRIBUTE: (&str, &str) = ("clang::annotate", "kernel");

impl Parser {
    pub(super) fn parse_item(&mut self) -> Item {
        match self.peek().clone() {
            Lexeme::Namespace => self.parse_namespace(),
            Lexeme::Inline if self.peek_at(1) == &Lexeme::Namespace => {
                self.advance();
                self.parse_namespace()
            }
            Lexeme::Using => Item::Using(self.parse_using()),
            Lexeme::Struct | Lexeme::Class | Lexeme::Union | Lexeme::LBracket
                if self.looks_like_record() =>
            {
                Item::Record(self.parse_record(false))
            }
            Lexeme::Template => Item::Opaque(self.skip_template()),
            Lexeme::Semicolon => Item::Opaque(self.advance().span),
            // Stray closer at namespace level: consumed by the caller's
            // progress guard.
            Lexeme::RBrace => Item::Opaque(self.current_span()),
            _ => Item::Opaque(self.skip_declaration()),
        }
    }

    fn parse_namespace(&mut self) -> Item {
        let start = self.expect(&Lexeme::Namespace);

        let mut name: Option<Spanned<String>> = None;
        while self.at_ident() {
            let part = self.expect_ident();
            name = Some(match name {
                Some(prev) => Spanned::new(
                    format!("{}::{}", prev.node, part.node),
                    prev.span.merge(part.span),
                ),
                None => part,
            });
            if !self.eat(&Lexeme::ColonColon) {
                break;
            }
        }

        // `namespace a = b;`
        if self.at(&Lexeme::Eq) {
            let rest = self.skip_declaration();
            return Item::Opaque(start.merge(rest));
        }

        self.expect(&Lexeme::LBrace);
        let mut items = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            items.push(self.parse_item());
            if self.pos == before {
                let tok = self.advance();
                items.push(Item::Opaque(tok.span));
            }
        }
        let close = self.expect(&Lexeme::RBrace);
        self.eat(&Lexeme::Semicolon);

        Item::Namespace(Namespace {
            name,
            items,
            span: start.merge(close),
        })
    }

    pub(super) fn parse_using(&mut self) -> UsingDecl {
        let start = self.expect(&Lexeme::Using);
        let kind = if self.eat(&Lexeme::Namespace) {
            let path = self.parse_path(true);
            UsingKind::Directive(path.joined())
        } else if self.at_ident() && self.peek_at(1) == &Lexeme::Eq {
            let name = self.expect_ident();
            self.advance();
            self.parse_type();
            UsingKind::Alias(name.node)
        } else {
            self.eat(&Lexeme::Typename);
            let path = self.parse_path(true);
            UsingKind::Declaration(path.joined())
        };
        let end = self.expect(&Lexeme::Semicolon);
        UsingDecl {
            kind,
            span: start.merge(end),
        }
    }

    /// `template <...>` followed by the declaration it introduces.
    fn skip_template(&mut self) -> Span {
        let start = self.expect(&Lexeme::Template);
        if self.at(&Lexeme::Lt) {
            self.skip_angles();
        }
        let rest = self.skip_declaration();
        start.merge(rest)
    }

    // --- Records ---

    fn looks_like_record(&mut self) -> bool {
        let cp = self.checkpoint();
        self.parse_attributes();
        let mut ok = false;
        if matches!(self.peek(), Lexeme::Struct | Lexeme::Class | Lexeme::Union) {
            self.advance();
            self.parse_attributes();
            if self.at_ident() {
                self.advance();
                if self.at_ident_named("final") {
                    self.advance();
                }
                ok = matches!(
                    self.peek(),
                    Lexeme::LBrace | Lexeme::Colon | Lexeme::Semicolon
                );
            }
        }
        self.rewind(cp);
        ok
    }

    /// Parse `[[...]]` attribute groups and `alignas(...)`.
    pub(super) fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        loop {
            if self.at(&Lexeme::Alignas) {
                self.advance();
                if self.at(&Lexeme::LParen) {
                    self.skip_balanced();
                }
                continue;
            }
            if !(self.at(&Lexeme::LBracket) && self.peek_at(1) == &Lexeme::LBracket) {
                break;
            }
            self.advance();
            self.advance();

            // `[[using ns: a, b]]`
            let mut prefix = String::new();
            if self.eat(&Lexeme::Using) {
                prefix = self.expect_ident().node;
                self.expect(&Lexeme::Colon);
            }

            while !self.at(&Lexeme::RBracket) && !self.at(&Lexeme::Eof) {
                let start = self.current_span();
                let mut name = self.expect_ident().node;
                while self.eat(&Lexeme::ColonColon) {
                    name.push_str("::");
                    name.push_str(&self.expect_ident().node);
                }
                if !prefix.is_empty() {
                    name = format!("{}::{}", prefix, name);
                }

                let mut args = Vec::new();
                if self.at(&Lexeme::LParen) {
                    self.advance();
                    let mut depth = 1u32;
                    while depth > 0 && !self.at(&Lexeme::Eof) {
                        let tok = self.advance();
                        match &tok.node {
                            Lexeme::LParen => depth += 1,
                            Lexeme::RParen => depth -= 1,
                            Lexeme::Str { value, .. } if depth == 1 => args.push(value.clone()),
                            _ => {}
                        }
                    }
                }
                attrs.push(Attribute {
                    name,
                    args,
                    span: start.merge(self.prev_span()),
                });
                if !self.eat(&Lexeme::Comma) {
                    break;
                }
            }
            self.expect(&Lexeme::RBracket);
            self.expect(&Lexeme::RBracket);
        }
        attrs
    }

    /// Parse a record declaration or definition. Members of records inside
    /// a kernel, or of a kernel itself, must parse; members of other
    /// records that fail to parse are kept as opaque regions.
    pub(super) fn parse_record(&mut self, strict_parent: bool) -> Record {
        let start = self.current_span();
        let mut attributes = self.parse_attributes();
        let key = match self.peek() {
            Lexeme::Class => RecordKey::Class,
            Lexeme::Union => RecordKey::Union,
            _ => RecordKey::Struct,
        };
        self.advance();
        attributes.extend(self.parse_attributes());
        let name = self.expect_ident();
        if self.at_ident_named("final") {
            self.advance();
        }

        // Base clause.
        if self.eat(&Lexeme::Colon) {
            while !matches!(
                self.peek(),
                Lexeme::LBrace | Lexeme::Semicolon | Lexeme::Eof
            ) {
                if self.at(&Lexeme::Lt) {
                    self.skip_angles();
                } else {
                    self.advance();
                }
            }
        }

        if self.at(&Lexeme::Semicolon) {
            let end = self.advance().span;
            return Record {
                key,
                attributes,
                name,
                body: None,
                span: start.merge(end),
            };
        }

        let strict = strict_parent
            || attributes
                .iter()
                .any(|a| a.name == KERNEL_ATTRIBUTE.0 && a.args.iter().any(|x| x == KERNEL_ATTRIBUTE.1));

        let open = self.expect(&Lexeme::LBrace);
        let mut members = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            let before = self.pos;
            let cp = self.checkpoint();
            let member = self.parse_member(&name.node, strict);
            if !strict && self.failed_since(cp) {
                self.rewind(cp);
                members.push(Member::Opaque(self.skip_declaration()));
            } else {
                members.push(member);
            }
            if self.pos == before {
                let tok = self.advance();
                members.push(Member::Opaque(tok.span));
            }
        }
        let close = self.expect(&Lexeme::RBrace);

        // `struct K { ... } instance;`
        if !self.at(&Lexeme::Semicolon) && !self.at(&Lexeme::Eof) {
            while !matches!(self.peek(), Lexeme::Semicolon | Lexeme::Eof) {
                self.advance();
            }
        }
        let end = self.expect(&Lexeme::Semicolon);

        Record {
            key,
            attributes,
            name,
            body: Some(RecordBody {
                members,
                open,
                close,
            }),
            span: start.merge(end),
        }
    }

    fn parse_member(&mut self, record_name: &str, strict: bool) -> Member {
        match self.peek().clone() {
            Lexeme::Public | Lexeme::Private | Lexeme::Protected
                if self.peek_at(1) == &Lexeme::Colon =>
            {
                let access = match self.peek() {
                    Lexeme::Public => AccessSpecifier::Public,
                    Lexeme::Private => AccessSpecifier::Private,
                    _ => AccessSpecifier::Protected,
                };
                let start = self.advance().span;
                let end = self.advance().span;
                Member::Access(access, start.merge(end))
            }
            Lexeme::Using => Member::Using(self.parse_using()),
            Lexeme::Template => Member::Template(self.skip_template()),
            Lexeme::Struct | Lexeme::Class | Lexeme::Union | Lexeme::LBracket
                if self.looks_like_record() =>
            {
                Member::Record(self.parse_record(strict))
            }
            Lexeme::Enum | Lexeme::StaticAssert | Lexeme::Friend | Lexeme::Typedef => {
                Member::Opaque(self.skip_declaration())
            }
            Lexeme::Semicolon => Member::Opaque(self.advance().span),
            Lexeme::Tilde => self.parse_destructor(),
            _ => self.parse_member_decl(record_name),
        }
    }

    fn parse_destructor(&mut self) -> Member {
        let start = self.expect(&Lexeme::Tilde);
        let name = self.expect_ident();
        let name = Spanned::new(format!("~{}", name.node), start.merge(name.span));
        Member::Method(self.finish_method(start, Vec::new(), None, MethodKind::Destructor, name))
    }

    pub(super) fn parse_decl_specs(&mut self) -> Vec<Spanned<DeclSpec>> {
        let mut specs = Vec::new();
        loop {
            let spec = match self.peek() {
                Lexeme::Static => DeclSpec::Static,
                Lexeme::Constexpr => DeclSpec::Constexpr,
                Lexeme::Consteval => DeclSpec::Consteval,
                Lexeme::Inline => DeclSpec::Inline,
                Lexeme::Virtual => DeclSpec::Virtual,
                Lexeme::Mutable => DeclSpec::Mutable,
                Lexeme::Extern => DeclSpec::Extern,
                Lexeme::ThreadLocal => DeclSpec::ThreadLocal,
                Lexeme::Explicit => DeclSpec::Explicit,
                Lexeme::Friend => DeclSpec::Friend,
                Lexeme::LBracket | Lexeme::Alignas => {
                    if self.at(&Lexeme::Alignas) || self.peek_at(1) == &Lexeme::LBracket {
                        self.parse_attributes();
                        continue;
                    }
                    break;
                }
                _ => break,
            };
            let span = self.advance().span;
            specs.push(Spanned::new(spec, span));
        }
        specs
    }

    fn parse_member_decl(&mut self, record_name: &str) -> Member {
        let start = self.current_span();
        let specs = self.parse_decl_specs();

        if self.at_ident_named(record_name) && self.peek_at(1) == &Lexeme::LParen {
            let name = self.expect_ident();
            return Member::Method(self.finish_method(
                start,
                specs,
                None,
                MethodKind::Constructor,
                name,
            ));
        }

        if self.at(&Lexeme::Operator) {
            let op_start = self.advance().span;
            let target = self.parse_type();
            let name = Spanned::new("operator".to_string(), op_start.merge(target.span));
            return Member::Method(self.finish_method(
                start,
                specs,
                None,
                MethodKind::Conversion,
                name,
            ));
        }

        let ty = self.parse_type();

        if self.at(&Lexeme::Operator) {
            let name = self.parse_operator_name();
            return Member::Method(self.finish_method(
                start,
                specs,
                Some(ty),
                MethodKind::Operator,
                name,
            ));
        }

        let name = self.expect_ident();
        if self.at(&Lexeme::LParen) {
            return Member::Method(self.finish_method(
                start,
                specs,
                Some(ty),
                MethodKind::Normal,
                name,
            ));
        }

        Member::Field(self.finish_var_decl(start, specs, ty, name, true))
    }

    /// `operator[]`, `operator()`, `operator+=`, `operator>>`, ...
    fn parse_operator_name(&mut self) -> Spanned<String> {
        let start = self.expect(&Lexeme::Operator);
        let mut name = "operator".to_string();
        if self.at(&Lexeme::LParen) && self.peek_at(1) == &Lexeme::RParen {
            self.advance();
            self.advance();
            name.push_str("()");
        } else if self.at(&Lexeme::LBracket) && self.peek_at(1) == &Lexeme::RBracket {
            self.advance();
            self.advance();
            name.push_str("[]");
        } else {
            while !matches!(self.peek(), Lexeme::LParen | Lexeme::Eof | Lexeme::Semicolon) {
                let tok = self.advance();
                let piece = match &tok.node {
                    Lexeme::Str { .. } => "\"\"".to_string(),
                    Lexeme::Ident(s) => s.clone(),
                    other => other.spelling().to_string(),
                };
                name.push_str(&piece);
            }
        }
        Spanned::new(name, start.merge(self.prev_span()))
    }

    fn finish_method(
        &mut self,
        start: Span,
        specifiers: Vec<Spanned<DeclSpec>>,
        ret: Option<TypeExpr>,
        kind: MethodKind,
        name: Spanned<String>,
    ) -> Method {
        let params = self.parse_params();

        let mut trailing = Vec::new();
        loop {
            let tok_span = self.current_span();
            match self.peek().clone() {
                Lexeme::Const | Lexeme::Volatile | Lexeme::Amp | Lexeme::AmpAmp => {
                    let text = self.peek().spelling().to_string();
                    self.advance();
                    trailing.push(Spanned::new(text, tok_span));
                }
                Lexeme::Noexcept => {
                    self.advance();
                    let mut span = tok_span;
                    if self.at(&Lexeme::LParen) {
                        span = span.merge(self.skip_balanced());
                    }
                    trailing.push(Spanned::new("noexcept".to_string(), span));
                }
                Lexeme::Ident(word) if word == "override" || word == "final" => {
                    self.advance();
                    trailing.push(Spanned::new(word, tok_span));
                }
                Lexeme::Arrow => {
                    self.advance();
                    let ty = self.parse_type();
                    trailing.push(Spanned::new("->".to_string(), tok_span.merge(ty.span)));
                }
                Lexeme::Eq => {
                    // `= 0`, `= default`, `= delete`
                    self.advance();
                    let value = self.advance().span;
                    trailing.push(Spanned::new("=".to_string(), tok_span.merge(value)));
                }
                _ => break,
            }
        }

        // Constructor initializer list.
        if self.eat(&Lexeme::Colon) {
            loop {
                self.parse_path(true);
                if matches!(self.peek(), Lexeme::LParen | Lexeme::LBrace) {
                    self.skip_balanced();
                } else {
                    self.error_at_current("expected member initializer");
                    break;
                }
                if !self.eat(&Lexeme::Comma) {
                    break;
                }
            }
        }

        let body = if self.at(&Lexeme::LBrace) {
            Some(self.parse_block())
        } else {
            self.expect(&Lexeme::Semicolon);
            None
        };
        let end = self.prev_span();
        self.eat(&Lexeme::Semicolon);

        Method {
            specifiers,
            ret,
            kind,
            name,
            params,
            trailing,
            body,
            span: start.merge(end),
        }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        self.expect(&Lexeme::LParen);
        let saved = self.no_gt;
        self.no_gt = false;
        let mut params = Vec::new();

        if self.at(&Lexeme::Void) && self.peek_at(1) == &Lexeme::RParen {
            self.advance();
        }

        while !self.at(&Lexeme::RParen) && !self.at(&Lexeme::Eof) {
            if self.eat(&Lexeme::Ellipsis) {
                continue;
            }
            let start = self.current_span();
            self.parse_attributes();
            let ty = self.parse_type();
            let name = if self.at_ident() {
                Some(self.expect_ident())
            } else {
                None
            };
            let array_dims = self.parse_array_dims();
            let default = if self.eat(&Lexeme::Eq) {
                Some(self.parse_initializer_clause())
            } else {
                None
            };
            params.push(Param {
                ty,
                name,
                array_dims,
                default,
                span: start.merge(self.prev_span()),
            });
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.expect(&Lexeme::RParen);
        self.no_gt = saved;
        params
    }

    // --- Variables ---

    pub(super) fn finish_var_decl(
        &mut self,
        start: Span,
        specifiers: Vec<Spanned<DeclSpec>>,
        ty: TypeExpr,
        first: Spanned<String>,
        terminated: bool,
    ) -> VarDecl {
        let mut declarators = vec![self.finish_declarator(Vec::new(), first)];
        while self.eat(&Lexeme::Comma) {
            let ptr_ops = self.parse_ptr_ops();
            let name = self.expect_ident();
            declarators.push(self.finish_declarator(ptr_ops, name));
        }
        if terminated {
            self.expect(&Lexeme::Semicolon);
        }
        VarDecl {
            specifiers,
            ty,
            declarators,
            span: start.merge(self.prev_span()),
        }
    }

    fn finish_declarator(
        &mut self,
        ptr_ops: Vec<Spanned<PtrOp>>,
        name: Spanned<String>,
    ) -> Declarator {
        let array_dims = self.parse_array_dims();
        let init = match self.peek() {
            Lexeme::Eq => {
                let eq = self.advance().span;
                let value = self.parse_initializer_clause();
                Some(Initializer::Assign { eq, value })
            }
            Lexeme::LBrace => Some(Initializer::Braced(self.parse_init_list())),
            Lexeme::LParen => {
                let (args, open, close) = self.parse_call_args();
                Some(Initializer::Paren { args, open, close })
            }
            _ => None,
        };
        let span = ptr_ops
            .first()
            .map(|p| p.span)
            .unwrap_or(name.span)
            .merge(self.prev_span());
        Declarator {
            ptr_ops,
            name,
            array_dims,
            init,
            span,
        }
    }

    fn parse_array_dims(&mut self) -> Vec<ArrayDim> {
        let mut dims = Vec::new();
        while self.at(&Lexeme::LBracket) && self.peek_at(1) != &Lexeme::LBracket {
            let open = self.advance().span;
            let saved = self.no_gt;
            self.no_gt = false;
            let size = if self.at(&Lexeme::RBracket) {
                None
            } else {
                Some(self.parse_expr())
            };
            self.no_gt = saved;
            let close = self.expect(&Lexeme::RBracket);
            dims.push(ArrayDim {
                size,
                span: open.merge(close),
            });
        }
        dims
    }

    pub(super) fn parse_init_list(&mut self) -> InitList {
        let open = self.expect(&Lexeme::LBrace);
        let saved = self.no_gt;
        self.no_gt = false;
        let mut elems = Vec::new();
        while !self.at(&Lexeme::RBrace) && !self.at(&Lexeme::Eof) {
            elems.push(self.parse_initializer_clause());
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        self.no_gt = saved;
        let close = self.expect(&Lexeme::RBrace);
        InitList { elems, open, close }
    }

    /// An assignment expression or a brace list.
    pub(super) fn parse_initializer_clause(&mut self) -> Spanned<Expr> {
        if self.at(&Lexeme::LBrace) {
            let list = self.parse_init_list();
            let span = list.span();
            Spanned::new(Expr::InitList(list), span)
        } else {
            self.parse_assign_expr()
        }
    }
}
