//! Recursive-descent parser for schema object literals.
//!
//! Accepts a small, data-only subset of JavaScript expression syntax:
//! objects, arrays, string/number/boolean/null literals, and calls on the
//! `widgets` capability object (`widgets.text({ label: "Title" })`). Any other
//! identifier is rejected, so nothing outside the registry is reachable.

/// Name of the only identifier a schema literal may reference.
pub const WIDGETS_IDENT: &str = "widgets";

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// Parsed schema literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Expr>),
    /// Members in source order; duplicates are resolved at evaluation.
    Object(Vec<(String, Expr)>),
    /// `widgets.<name>(<args>)`
    Widget { name: String, args: Vec<Expr> },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A parse failure and the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} at byte {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub kind: LiteralErrorKind,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiteralErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected character `{0}`")]
    UnexpectedChar(char),
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unknown identifier `{0}`; only `widgets` is in scope")]
    UnknownIdentifier(String),
    #[error("template literal interpolation is not supported")]
    TemplateInterpolation,
    #[error("widget `{0}` must be called")]
    WidgetNotCalled(String),
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("unexpected input after literal")]
    TrailingInput,
}

type ParseResult<T> = Result<T, LiteralError>;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse a complete schema literal. Only comments and whitespace may follow it.
pub fn parse_literal(text: &str, max_depth: usize) -> ParseResult<Expr> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        max_depth,
    };
    let expr = parser.parse_value(0)?;
    parser.skip_trivia()?;
    if parser.pos < text.len() {
        return Err(parser.error(LiteralErrorKind::TrailingInput));
    }
    Ok(expr)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, kind: LiteralErrorKind) -> LiteralError {
        LiteralError {
            offset: self.pos,
            kind,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn unexpected(&self) -> LiteralError {
        match self.peek() {
            Some(ch) => self.error(LiteralErrorKind::UnexpectedChar(ch)),
            None => self.error(LiteralErrorKind::UnexpectedEnd),
        }
    }

    fn expect(&mut self, wanted: char) -> ParseResult<()> {
        self.skip_trivia()?;
        if self.peek() == Some(wanted) {
            self.pos += wanted.len_utf8();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Skip whitespace, `// line` and `/* block */` comments.
    fn skip_trivia(&mut self) -> ParseResult<()> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(ch), _) if ch.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    let rest = &self.src[self.pos..];
                    self.pos += rest.find('\n').unwrap_or(rest.len());
                }
                (Some('/'), Some('*')) => {
                    let rest = &self.src[self.pos + 2..];
                    match rest.find("*/") {
                        Some(end) => self.pos += 2 + end + 2,
                        None => return Err(self.error(LiteralErrorKind::UnterminatedComment)),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn enter(&self, depth: usize) -> ParseResult<usize> {
        let next = depth + 1;
        if next > self.max_depth {
            return Err(self.error(LiteralErrorKind::NestingTooDeep(self.max_depth)));
        }
        Ok(next)
    }

    fn parse_value(&mut self, depth: usize) -> ParseResult<Expr> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_object(self.enter(depth)?),
            Some('[') => self.parse_array(self.enter(depth)?),
            Some(quote @ ('"' | '\'' | '`')) => self.parse_string(quote).map(Expr::String),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => {
                self.parse_number()
            }
            Some(ch) if is_ident_start(ch) => self.parse_identifier_value(depth),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_object(&mut self, depth: usize) -> ParseResult<Expr> {
        self.expect('{')?;
        let mut members = Vec::new();

        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Expr::Object(members));
            }

            let key = self.parse_key()?;
            self.expect(':')?;
            let value = self.parse_value(depth)?;
            members.push((key, value));

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_key(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote),
            Some(ch) if is_ident_start(ch) => Ok(self.parse_identifier().to_string()),
            Some(ch) if ch.is_ascii_digit() => match self.parse_number()? {
                Expr::Int(n) => Ok(n.to_string()),
                Expr::Float(f) => Ok(f.to_string()),
                _ => Err(self.unexpected()),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array(&mut self, depth: usize) -> ParseResult<Expr> {
        self.expect('[')?;
        self.parse_sequence(']', depth).map(Expr::Array)
    }

    /// Comma-separated values up to `close`, trailing comma allowed.
    /// The opening delimiter has already been consumed.
    fn parse_sequence(&mut self, close: char, depth: usize) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }

            items.push(self.parse_value(depth)?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(ch) if ch == close => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> ParseResult<String> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();

        loop {
            let Some(ch) = self.bump() else {
                return Err(LiteralError {
                    offset: start,
                    kind: LiteralErrorKind::UnterminatedString,
                });
            };
            match ch {
                c if c == quote => return Ok(out),
                '\\' => self.parse_escape(&mut out)?,
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error(LiteralErrorKind::TemplateInterpolation));
                }
                '\n' | '\r' if quote != '`' => {
                    return Err(LiteralError {
                        offset: start,
                        kind: LiteralErrorKind::UnterminatedString,
                    });
                }
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> ParseResult<()> {
        let Some(ch) = self.bump() else {
            return Err(self.error(LiteralErrorKind::UnterminatedString));
        };
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.parse_hex_digits(2)?;
                out.push(char::from_u32(code).ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape))?);
            }
            'u' => out.push(self.parse_unicode_escape()?),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            c if c.is_ascii_digit() => return Err(self.error(LiteralErrorKind::InvalidEscape)),
            c => out.push(c),
        }
        Ok(())
    }

    fn parse_hex_digits(&mut self, count: usize) -> ParseResult<u32> {
        let digits = self
            .src
            .get(self.pos..self.pos + count)
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(LiteralErrorKind::InvalidEscape))?;
        self.pos += count;
        Ok(code)
    }

    /// `\uXXXX`, `\u{X...}`, and UTF-16 surrogate pairs like `\uD83D\uDE00`.
    fn parse_unicode_escape(&mut self) -> ParseResult<char> {
        if self.peek() == Some('{') {
            self.bump();
            let rest = &self.src[self.pos..];
            let end = rest
                .find('}')
                .ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape))?;
            let digits = &rest[..end];
            let code = (!digits.is_empty() && digits.len() <= 6)
                .then(|| u32::from_str_radix(digits, 16).ok())
                .flatten()
                .ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape))?;
            self.pos += end + 1;
            return char::from_u32(code).ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape));
        }

        let high = self.parse_hex_digits(4)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape));
        }

        if !self.src[self.pos..].starts_with("\\u") {
            return Err(self.error(LiteralErrorKind::InvalidEscape));
        }
        self.pos += 2;
        let low = self.parse_hex_digits(4)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(self.error(LiteralErrorKind::InvalidEscape));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or_else(|| self.error(LiteralErrorKind::InvalidEscape))
    }

    fn parse_number(&mut self) -> ParseResult<Expr> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };

        let rest = &self.src[self.pos..];
        let is_hex = rest.starts_with("0x") || rest.starts_with("0X");
        let body_start = self.pos;

        let value = if is_hex {
            self.pos += 2;
            let digits_start = self.pos;
            self.consume_while(|c| c.is_ascii_hexdigit());
            let digits = &self.src[digits_start..self.pos];
            if digits.is_empty() {
                return Err(self.invalid_number(start));
            }
            match i64::from_str_radix(digits, 16) {
                Ok(n) => Expr::Int(if negative { -n } else { n }),
                // Past i64 range the value is still a valid (rounded) number.
                Err(_) => {
                    let f = digits
                        .chars()
                        .filter_map(|c| c.to_digit(16))
                        .fold(0.0_f64, |acc, d| acc * 16.0 + f64::from(d));
                    Expr::Float(if negative { -f } else { f })
                }
            }
        } else {
            let int_digits = self.consume_while(|c| c.is_ascii_digit());
            let mut is_float = false;
            let mut frac_digits = 0;
            if self.peek() == Some('.') {
                is_float = true;
                self.bump();
                frac_digits = self.consume_while(|c| c.is_ascii_digit());
            }
            if int_digits + frac_digits == 0 {
                return Err(self.invalid_number(start));
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.bump();
                }
                if self.consume_while(|c| c.is_ascii_digit()) == 0 {
                    return Err(self.invalid_number(start));
                }
            }

            let body = &self.src[body_start..self.pos];
            let int = (!is_float).then(|| body.parse::<i64>().ok()).flatten();
            match int {
                Some(n) => Expr::Int(if negative { -n } else { n }),
                None => {
                    let f: f64 = body.parse().map_err(|_| self.invalid_number(start))?;
                    Expr::Float(if negative { -f } else { f })
                }
            }
        };

        if self.peek().is_some_and(is_ident_part) {
            self.consume_while(is_ident_part);
            return Err(self.invalid_number(start));
        }
        Ok(value)
    }

    fn invalid_number(&self, start: usize) -> LiteralError {
        LiteralError {
            offset: start,
            kind: LiteralErrorKind::InvalidNumber(self.src[start..self.pos].to_string()),
        }
    }

    /// Advance past characters matching `pred`; returns how many were consumed.
    fn consume_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(&pred) {
            self.bump();
            count += 1;
        }
        count
    }

    fn parse_identifier(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        self.consume_while(is_ident_part);
        &src[start..self.pos]
    }

    fn parse_identifier_value(&mut self, depth: usize) -> ParseResult<Expr> {
        let start = self.pos;
        match self.parse_identifier() {
            "true" => Ok(Expr::Bool(true)),
            "false" => Ok(Expr::Bool(false)),
            "null" | "undefined" => Ok(Expr::Null),
            WIDGETS_IDENT => self.parse_widget_call(depth),
            other => Err(LiteralError {
                offset: start,
                kind: LiteralErrorKind::UnknownIdentifier(other.to_string()),
            }),
        }
    }

    /// After `widgets`: `.name(args)` or `["name"](args)`.
    fn parse_widget_call(&mut self, depth: usize) -> ParseResult<Expr> {
        self.skip_trivia()?;
        let name = match self.peek() {
            Some('.') => {
                self.bump();
                self.skip_trivia()?;
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(self.unexpected());
                }
                self.parse_identifier().to_string()
            }
            Some('[') => {
                self.bump();
                self.skip_trivia()?;
                let name = match self.peek() {
                    Some(quote @ ('"' | '\'' | '`')) => self.parse_string(quote)?,
                    _ => return Err(self.unexpected()),
                };
                self.expect(']')?;
                name
            }
            _ => return Err(self.unexpected()),
        };

        self.skip_trivia()?;
        if self.peek() != Some('(') {
            return Err(self.error(LiteralErrorKind::WidgetNotCalled(name)));
        }
        self.bump();
        let args = self.parse_sequence(')', self.enter(depth)?)?;
        Ok(Expr::Widget { name, args })
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParseResult<Expr> {
        parse_literal(text, 32)
    }

    fn kind(text: &str) -> LiteralErrorKind {
        parse(text).unwrap_err().kind
    }

    #[test]
    fn parses_nested_objects_and_arrays() {
        let expr = parse(r#"{ fields: { tags: [1, -2.5, 'x', true, null,], "quoted key": {} }, }"#)
            .expect("parse");

        let Expr::Object(members) = expr else {
            panic!("expected object");
        };
        assert_eq!(members[0].0, "fields");
        let Expr::Object(fields) = &members[0].1 else {
            panic!("expected fields object");
        };
        assert_eq!(
            fields[0].1,
            Expr::Array(vec![
                Expr::Int(1),
                Expr::Float(-2.5),
                Expr::String("x".into()),
                Expr::Bool(true),
                Expr::Null,
            ])
        );
        assert_eq!(fields[1], ("quoted key".into(), Expr::Object(vec![])));
    }

    #[test]
    fn parses_widget_calls() {
        let expr = parse(r#"widgets.text({ label: "Title" })"#).expect("parse");
        assert_eq!(
            expr,
            Expr::Widget {
                name: "text".into(),
                args: vec![Expr::Object(vec![(
                    "label".into(),
                    Expr::String("Title".into())
                )])],
            }
        );

        let bracketed = parse(r#"widgets["rich-text"]()"#).expect("parse");
        assert_eq!(
            bracketed,
            Expr::Widget {
                name: "rich-text".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn comments_are_whitespace() {
        let expr = parse("{ // heading\n a: /* inline */ 1 /* tail */ }").expect("parse");
        assert_eq!(expr, Expr::Object(vec![("a".into(), Expr::Int(1))]));
        assert_eq!(kind("{ a: 1 /* open"), LiteralErrorKind::UnterminatedComment);
    }

    #[test]
    fn decodes_string_escapes() {
        let expr = parse(r#""a\"b\n\t\\ \x41 é \u{1F600} \uD83D\uDE00 \'""#).expect("parse");
        assert_eq!(expr, Expr::String("a\"b\n\t\\ A é 😀 😀 '".into()));

        assert_eq!(kind(r#""\uD83D""#), LiteralErrorKind::InvalidEscape);
        assert_eq!(kind(r#""\xZZ""#), LiteralErrorKind::InvalidEscape);
    }

    #[test]
    fn template_strings_allow_newlines_but_not_interpolation() {
        assert_eq!(parse("`a\nb`").expect("parse"), Expr::String("a\nb".into()));
        assert_eq!(kind("`${x}`"), LiteralErrorKind::TemplateInterpolation);
        assert_eq!(kind("'a\nb'"), LiteralErrorKind::UnterminatedString);
    }

    #[test]
    fn parses_number_forms() {
        assert_eq!(parse("0x1F").expect("hex"), Expr::Int(31));
        assert_eq!(
            parse("-0x8000000000000000").expect("hex"),
            Expr::Float(-9_223_372_036_854_775_808.0)
        );
        assert_eq!(
            parse("0x10000000000000000").expect("hex"),
            Expr::Float(18_446_744_073_709_551_616.0)
        );
        assert!(parse("0x").is_err());
        assert_eq!(parse(".5").expect("leading dot"), Expr::Float(0.5));
        assert_eq!(parse("1e3").expect("exp"), Expr::Float(1000.0));
        assert_eq!(parse("+7").expect("plus"), Expr::Int(7));
        assert_eq!(
            parse("99999999999999999999").expect("big"),
            Expr::Float(1e20)
        );
        assert!(matches!(kind("12px"), LiteralErrorKind::InvalidNumber(_)));
        assert!(matches!(kind("1e"), LiteralErrorKind::InvalidNumber(_)));
        assert!(matches!(kind("-"), LiteralErrorKind::InvalidNumber(_)));
    }

    #[test]
    fn numeric_keys_become_strings() {
        let expr = parse("{ 1: 'one' }").expect("parse");
        assert_eq!(
            expr,
            Expr::Object(vec![("1".into(), Expr::String("one".into()))])
        );
    }

    #[test]
    fn only_widgets_is_in_scope() {
        assert_eq!(
            kind("{ a: process.env }"),
            LiteralErrorKind::UnknownIdentifier("process".into())
        );
        assert_eq!(
            kind("{ a: globalThis }"),
            LiteralErrorKind::UnknownIdentifier("globalThis".into())
        );
        assert_eq!(
            kind("{ a: widgets.text }"),
            LiteralErrorKind::WidgetNotCalled("text".into())
        );
    }

    #[test]
    fn rejects_structural_errors() {
        assert_eq!(kind("{ a: 1"), LiteralErrorKind::UnexpectedEnd);
        assert_eq!(kind("{ a 1 }"), LiteralErrorKind::UnexpectedChar('1'));
        assert_eq!(kind("[1,,2]"), LiteralErrorKind::UnexpectedChar(','));
        assert_eq!(kind("{ a: 1 } extra"), LiteralErrorKind::TrailingInput);
        assert_eq!(kind(""), LiteralErrorKind::UnexpectedEnd);
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let deep = format!("{}{}", "[".repeat(40), "]".repeat(40));
        assert_eq!(kind(&deep), LiteralErrorKind::NestingTooDeep(32));
        assert!(parse_literal(&deep, 40).is_ok());
    }

    #[test]
    fn error_reports_offset() {
        let err = parse("{ a: @ }").unwrap_err();
        assert_eq!(err.offset, 5);
        assert_eq!(err.to_string(), "unexpected character `@` at byte 5");
    }
}
