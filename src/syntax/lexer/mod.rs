use crate::diagnostic::Diagnostic;
use crate::syntax::lexeme::Lexeme;
use crate::syntax::span::{Span, Spanned};

pub struct Lexer<'src> {
    text: &'src str,
    source: &'src [u8],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// True until the first token of the current line has been produced.
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            text,
            source: text.as_bytes(),
            pos: 0,
            diagnostics: Vec::new(),
            at_line_start: true,
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_trivia();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if ch == b'#' && self.at_line_start {
                self.skip_preprocessor_line();
                continue;
            }
            self.at_line_start = false;

            if is_ident_start(ch) {
                if let Some(tok) = self.scan_prefixed_literal() {
                    return tok;
                }
                return self.scan_ident_or_keyword();
            }

            if ch.is_ascii_digit() || (ch == b'.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
            {
                return self.scan_number();
            }

            if ch == b'"' {
                return self.scan_string(start, start);
            }

            if ch == b'\'' {
                return self.scan_char(start, start);
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // scan_symbol returned None → error was recorded, try again
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                if self.source[self.pos] == b'\n' {
                    self.at_line_start = true;
                }
                self.pos += 1;
            }

            if self.starts_with("//") {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.starts_with("/*") {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.source.len() {
                        self.diagnostics.push(
                            Diagnostic::error(
                                "unterminated block comment".to_string(),
                                Span::new(start as u32, self.pos as u32),
                            )
                            .with_help("close the comment with `*/`".to_string()),
                        );
                        break;
                    }
                    if self.starts_with("*/") {
                        self.pos += 2;
                        break;
                    }
                    if self.source[self.pos] == b'\n' {
                        self.at_line_start = true;
                    }
                    self.pos += 1;
                }
                continue;
            }

            break;
        }
    }

    /// Skip a `#...` directive, honouring backslash line continuations.
    fn skip_preprocessor_line(&mut self) {
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'\\' if self.peek_at(1) == Some(b'\n') => self.pos += 2,
                b'\\' if self.peek_at(1) == Some(b'\r') && self.peek_at(2) == Some(b'\n') => {
                    self.pos += 3
                }
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
    }

    /// String and character literals with an encoding prefix
    /// (`u8"..."`, `L'x'`, `R"(...)"`).
    fn scan_prefixed_literal(&mut self) -> Option<Spanned<Lexeme>> {
        let start = self.pos;
        let mut end = start;
        while end < self.source.len() && is_ident_continue(self.source[end]) {
            end += 1;
        }
        let word = &self.text[start..end];
        let next = self.source.get(end).copied();
        match (word, next) {
            ("u8" | "u" | "U" | "L", Some(b'"')) => {
                self.pos = end;
                Some(self.scan_string(start, end))
            }
            ("u8" | "u" | "U" | "L", Some(b'\'')) => {
                self.pos = end;
                Some(self.scan_char(start, end))
            }
            ("R" | "u8R" | "uR" | "UR" | "LR", Some(b'"')) => {
                self.pos = end;
                Some(self.scan_raw_string(start))
            }
            _ => None,
        }
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = &self.text[start..self.pos];
        let token = Lexeme::from_keyword(text).unwrap_or_else(|| Lexeme::Ident(text.to_string()));
        self.make_token(token, start, self.pos)
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let radix = if self.starts_with("0x") || self.starts_with("0X") {
            self.pos += 2;
            16
        } else if self.starts_with("0b") || self.starts_with("0B") {
            self.pos += 2;
            2
        } else {
            10
        };

        let digits_start = self.pos;
        let mut is_float = false;
        while self.pos < self.source.len() {
            let c = self.source[self.pos];
            let digit = match radix {
                16 => c.is_ascii_hexdigit(),
                2 => c == b'0' || c == b'1',
                _ => c.is_ascii_digit(),
            };
            if digit || (c == b'\'' && self.pos > digits_start) {
                self.pos += 1;
            } else if radix == 10 && c == b'.' && !is_float {
                is_float = true;
                self.pos += 1;
            } else if radix == 10
                && (c == b'e' || c == b'E')
                && (self.peek_at(1).is_some_and(|d| d.is_ascii_digit())
                    || (matches!(self.peek_at(1), Some(b'+') | Some(b'-'))
                        && self.peek_at(2).is_some_and(|d| d.is_ascii_digit())))
            {
                is_float = true;
                self.pos += 2;
            } else {
                break;
            }
        }
        let digits: String = self.text[digits_start..self.pos]
            .chars()
            .filter(|c| *c != '\'')
            .collect();

        let suffix_start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let suffix = self.text[suffix_start..self.pos].to_string();
        let span = Span::new(start as u32, self.pos as u32);

        if is_float {
            return match digits.parse::<f64>() {
                Ok(value) => self.make_token(Lexeme::FloatLit { value, suffix }, start, self.pos),
                Err(_) => {
                    self.diagnostics.push(Diagnostic::error(
                        format!("malformed floating-point literal '{}'", &self.text[start..self.pos]),
                        span,
                    ));
                    self.make_token(Lexeme::FloatLit { value: 0.0, suffix }, start, self.pos)
                }
            };
        }

        // Leading zero means octal.
        let (digits, radix) = if radix == 10 && digits.len() > 1 && digits.starts_with('0') {
            (digits[1..].to_string(), 8)
        } else {
            (digits, radix)
        };
        if digits.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                format!("integer literal '{}' has no digits", &self.text[start..self.pos]),
                span,
            ));
            return self.make_token(Lexeme::Integer { value: 0, suffix }, start, self.pos);
        }
        match u64::from_str_radix(&digits, radix) {
            Ok(value) => self.make_token(Lexeme::Integer { value, suffix }, start, self.pos),
            Err(_) => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("integer literal '{}' is too large", &self.text[start..self.pos]),
                        span,
                    )
                    .with_help(format!("maximum integer value is {}", u64::MAX)),
                );
                self.make_token(Lexeme::Integer { value: 0, suffix }, start, self.pos)
            }
        }
    }

    /// Scan a `"..."` literal starting at the quote (`quote` offset), with
    /// the token span starting at `start` (which covers any prefix).
    fn scan_string(&mut self, start: usize, quote: usize) -> Spanned<Lexeme> {
        self.pos = quote + 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.current_char() else {
                self.unterminated(start, "string literal", "\"");
                break;
            };
            match c {
                '"' => {
                    self.pos += 1;
                    break;
                }
                '\n' => {
                    self.unterminated(start, "string literal", "\"");
                    break;
                }
                '\\' => {
                    self.pos += 1;
                    if let Some(esc) = self.scan_escape() {
                        value.push(esc);
                    }
                }
                other => {
                    value.push(other);
                    self.pos += other.len_utf8();
                }
            }
        }
        let suffix = self.scan_literal_suffix();
        self.make_token(Lexeme::Str { value, suffix }, start, self.pos)
    }

    fn scan_raw_string(&mut self, start: usize) -> Spanned<Lexeme> {
        // Positioned on the opening quote.
        self.pos += 1;
        let delim_start = self.pos;
        while self.pos < self.source.len() && self.source[self.pos] != b'(' {
            self.pos += 1;
        }
        let terminator = format!("){}\"", &self.text[delim_start..self.pos]);
        self.pos += 1;
        let body_start = self.pos.min(self.source.len());
        match self.text[body_start..].find(&terminator) {
            Some(rel) => {
                let value = self.text[body_start..body_start + rel].to_string();
                self.pos = body_start + rel + terminator.len();
                let suffix = self.scan_literal_suffix();
                self.make_token(Lexeme::Str { value, suffix }, start, self.pos)
            }
            None => {
                self.pos = self.source.len();
                self.unterminated(start, "raw string literal", &terminator);
                self.make_token(
                    Lexeme::Str {
                        value: String::new(),
                        suffix: String::new(),
                    },
                    start,
                    self.pos,
                )
            }
        }
    }

    fn scan_char(&mut self, start: usize, quote: usize) -> Spanned<Lexeme> {
        self.pos = quote + 1;
        let mut value = '\0';
        let mut count = 0;
        loop {
            let Some(c) = self.current_char() else {
                self.unterminated(start, "character literal", "'");
                break;
            };
            match c {
                '\'' => {
                    self.pos += 1;
                    break;
                }
                '\n' => {
                    self.unterminated(start, "character literal", "'");
                    break;
                }
                '\\' => {
                    self.pos += 1;
                    if let Some(esc) = self.scan_escape() {
                        value = esc;
                    }
                    count += 1;
                }
                other => {
                    value = other;
                    self.pos += other.len_utf8();
                    count += 1;
                }
            }
        }
        if count == 0 {
            self.diagnostics.push(Diagnostic::error(
                "empty character literal".to_string(),
                Span::new(start as u32, self.pos as u32),
            ));
        }
        self.make_token(Lexeme::CharLit(value), start, self.pos)
    }

    /// Decode the escape sequence after a backslash.
    fn scan_escape(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.pos += c.len_utf8();
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0'..='7' => {
                let mut value = c as u32 - '0' as u32;
                for _ in 0..2 {
                    match self.source.get(self.pos) {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                char::from_u32(value).unwrap_or('\0')
            }
            'x' => {
                let hex_start = self.pos;
                while self.pos < self.source.len() && self.source[self.pos].is_ascii_hexdigit() {
                    self.pos += 1;
                }
                u32::from_str_radix(&self.text[hex_start..self.pos], 16)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or('\0')
            }
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            other => other,
        };
        Some(decoded)
    }

    /// User-defined literal suffix directly after a string (`"xy"_sw`).
    fn scan_literal_suffix(&mut self) -> String {
        let start = self.pos;
        if self.pos < self.source.len() && is_ident_start(self.source[self.pos]) {
            while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
                self.pos += 1;
            }
        }
        self.text[start..self.pos].to_string()
    }

    fn unterminated(&mut self, start: usize, what: &str, close: &str) {
        self.diagnostics.push(
            Diagnostic::error(
                format!("unterminated {}", what),
                Span::new(start as u32, self.pos as u32),
            )
            .with_help(format!("close the literal with `{}`", close)),
        );
    }

    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        const SYMBOLS: &[(&str, Lexeme)] = &[
            ("...", Lexeme::Ellipsis),
            ("<<=", Lexeme::ShlEq),
            ("::", Lexeme::ColonColon),
            ("->", Lexeme::Arrow),
            ("++", Lexeme::PlusPlus),
            ("--", Lexeme::MinusMinus),
            ("+=", Lexeme::PlusEq),
            ("-=", Lexeme::MinusEq),
            ("*=", Lexeme::StarEq),
            ("/=", Lexeme::SlashEq),
            ("%=", Lexeme::PercentEq),
            ("&=", Lexeme::AmpEq),
            ("|=", Lexeme::PipeEq),
            ("^=", Lexeme::CaretEq),
            ("<<", Lexeme::Shl),
            ("<=", Lexeme::LtEq),
            (">=", Lexeme::GtEq),
            ("==", Lexeme::EqEq),
            ("!=", Lexeme::BangEq),
            ("&&", Lexeme::AmpAmp),
            ("||", Lexeme::PipePipe),
            ("(", Lexeme::LParen),
            (")", Lexeme::RParen),
            ("{", Lexeme::LBrace),
            ("}", Lexeme::RBrace),
            ("[", Lexeme::LBracket),
            ("]", Lexeme::RBracket),
            (",", Lexeme::Comma),
            (";", Lexeme::Semicolon),
            (":", Lexeme::Colon),
            (".", Lexeme::Dot),
            ("?", Lexeme::Question),
            ("+", Lexeme::Plus),
            ("-", Lexeme::Minus),
            ("*", Lexeme::Star),
            ("/", Lexeme::Slash),
            ("%", Lexeme::Percent),
            ("&", Lexeme::Amp),
            ("|", Lexeme::Pipe),
            ("^", Lexeme::Caret),
            ("~", Lexeme::Tilde),
            ("!", Lexeme::Bang),
            ("=", Lexeme::Eq),
            ("<", Lexeme::Lt),
            (">", Lexeme::Gt),
        ];

        for (spelling, tok) in SYMBOLS {
            if self.starts_with(spelling) {
                self.pos += spelling.len();
                return Some(self.make_token(tok.clone(), start, self.pos));
            }
        }

        let ch = self.current_char().unwrap_or('\0');
        self.pos += ch.len_utf8().max(1);
        self.diagnostics.push(
            Diagnostic::error(
                format!("unexpected character '{}' (U+{:04X})", ch, ch as u32),
                Span::new(start as u32, self.pos as u32),
            )
            .with_help("this character is not part of the kernel dialect".to_string()),
        );
        None
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s.as_bytes())
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos..).and_then(|s| s.chars().next())
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(start as u32, end as u32))
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

#[cfg(test)]
mod tests;
