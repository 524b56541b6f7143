mod expr;
mod items;
mod stmts;
mod types;

pub use items::KERNEL_ATTRIBUTE;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::syntax::lexeme::Lexeme;
use crate::syntax::span::{Span, Spanned};

const MAX_NESTING_DEPTH: u32 = 256;

pub struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
    /// Set while parsing template arguments: a bare `>` closes the list
    /// instead of being a comparison.
    no_gt: bool,
}

/// Saved parser position for speculative parses.
#[derive(Clone, Copy)]
struct Checkpoint {
    pos: usize,
    diagnostics: usize,
    no_gt: bool,
    depth: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
            no_gt: false,
        }
    }

    pub fn parse_translation_unit(mut self) -> Result<TranslationUnit, Vec<Diagnostic>> {
        let mut items = Vec::new();
        while !self.at(&Lexeme::Eof) {
            let before = self.pos;
            items.push(self.parse_item());
            if self.pos == before {
                // No progress: drop the token so parsing terminates.
                let tok = self.advance();
                items.push(Item::Opaque(tok.span));
            }
        }

        if !self.diagnostics.is_empty() {
            return Err(self.diagnostics);
        }
        Ok(TranslationUnit { items })
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.error_with_help(
                "nesting depth exceeded (maximum 256 levels)",
                "split deeply nested expressions into local variables",
            );
            return false;
        }
        true
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    // --- Speculation ---

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            diagnostics: self.diagnostics.len(),
            no_gt: self.no_gt,
            depth: self.depth,
        }
    }

    fn rewind(&mut self, cp: Checkpoint) {
        self.pos = cp.pos;
        self.diagnostics.truncate(cp.diagnostics);
        self.no_gt = cp.no_gt;
        self.depth = cp.depth;
    }

    fn failed_since(&self, cp: Checkpoint) -> bool {
        self.diagnostics.len() > cp.diagnostics
    }

    /// Run `f` speculatively: keep its result only if it recorded no
    /// diagnostics and `accept` approves the token that follows.
    fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> T,
        accept: impl FnOnce(&Self, &T) -> bool,
    ) -> Option<T> {
        let cp = self.checkpoint();
        let value = f(self);
        if self.failed_since(cp) || !accept(self, &value) {
            self.rewind(cp);
            return None;
        }
        Some(value)
    }

    // --- Opaque regions ---

    /// Skip one declaration the frontend does not model: up to and
    /// including a `;` at bracket depth zero, or through a top-level
    /// `{...}` group (plus an immediately following `;`).
    fn skip_declaration(&mut self) -> Span {
        let start = self.current_span();
        let mut end = start;
        let mut depth = 0u32;
        while !self.at(&Lexeme::Eof) {
            let tok = self.advance();
            end = tok.span;
            match tok.node {
                Lexeme::LParen | Lexeme::LBracket | Lexeme::LBrace => depth += 1,
                Lexeme::RParen | Lexeme::RBracket => depth = depth.saturating_sub(1),
                Lexeme::RBrace => {
                    if depth <= 1 {
                        if self.at(&Lexeme::Semicolon) {
                            end = self.advance().span;
                        }
                        break;
                    }
                    depth -= 1;
                }
                Lexeme::Semicolon if depth == 0 => break,
                _ => {}
            }
            // A closing brace of the enclosing scope ends the region.
            if depth == 0 && self.at(&Lexeme::RBrace) {
                break;
            }
        }
        start.merge(end)
    }

    /// Skip a bracketed group starting at the current opening token.
    /// Returns the span from the opener through the matching closer.
    fn skip_balanced(&mut self) -> Span {
        let start = self.current_span();
        let mut end = start;
        let mut depth = 0u32;
        while !self.at(&Lexeme::Eof) {
            let tok = self.advance();
            end = tok.span;
            match tok.node {
                Lexeme::LParen | Lexeme::LBracket | Lexeme::LBrace => depth += 1,
                Lexeme::RParen | Lexeme::RBracket | Lexeme::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        start.merge(end)
    }

    /// Skip a `<...>` group, counting nested angles outside brackets.
    fn skip_angles(&mut self) -> Span {
        let start = self.current_span();
        let mut end = start;
        let mut angles = 0u32;
        while !self.at(&Lexeme::Eof) {
            match self.peek() {
                Lexeme::LParen | Lexeme::LBracket | Lexeme::LBrace => {
                    end = self.skip_balanced();
                    continue;
                }
                Lexeme::Lt => angles += 1,
                Lexeme::Gt => {
                    angles = angles.saturating_sub(1);
                    if angles == 0 {
                        end = self.advance().span;
                        break;
                    }
                }
                Lexeme::Semicolon => break,
                _ => {}
            }
            end = self.advance().span;
        }
        start.merge(end)
    }

    // --- Token helpers ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].node
    }

    fn peek_at(&self, offset: usize) -> &Lexeme {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].node
    }

    fn span_at(&self, offset: usize) -> Span {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].span
    }

    fn current_span(&self) -> Span {
        self.span_at(0)
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[(self.pos - 1).min(self.tokens.len() - 1)].span
        } else {
            Span::dummy()
        }
    }

    fn at(&self, token: &Lexeme) -> bool {
        self.peek() == token
    }

    fn at_ident(&self) -> bool {
        matches!(self.peek(), Lexeme::Ident(_))
    }

    fn at_ident_named(&self, name: &str) -> bool {
        matches!(self.peek(), Lexeme::Ident(s) if s == name)
    }

    /// Two `>` tokens with no gap between them spell `>>`.
    fn at_shift_right(&self) -> bool {
        self.at(&Lexeme::Gt)
            && matches!(self.peek_at(1), Lexeme::Gt | Lexeme::GtEq)
            && self.span_at(0).end == self.span_at(1).start
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> &Spanned<Lexeme> {
        let idx = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    fn expect(&mut self, token: &Lexeme) -> Span {
        if self.at(token) {
            self.advance().span
        } else {
            let found = self.peek().description();
            self.error_at_current(&format!("expected '{}', found {}", token.spelling(), found));
            self.current_span()
        }
    }

    fn expect_ident(&mut self) -> Spanned<String> {
        if let Lexeme::Ident(name) = self.peek() {
            let name = name.clone();
            let span = self.advance().span;
            Spanned::new(name, span)
        } else {
            let found = self.peek().description();
            self.error_at_current(&format!("expected identifier, found {}", found));
            Spanned::new("_error_".to_string(), self.current_span())
        }
    }

    fn error_at_current(&mut self, msg: &str) {
        self.diagnostics
            .push(Diagnostic::error(msg.to_string(), self.current_span()));
    }

    fn error_with_help(&mut self, msg: &str, help: &str) {
        self.diagnostics.push(
            Diagnostic::error(msg.to_string(), self.current_span()).with_help(help.to_string()),
        );
    }
}

#[cfg(test)]
mod tests;
