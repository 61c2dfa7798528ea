//! Program Tokenizer
//!
//! Splits drawing programs into tokens:
//!
//!   - text in `"…"`, `'…'`, `` `…' `` or `{…}`, with `\` escaping the
//!     closing quote
//!   - numbers, including a trailing `%`
//!   - words running to whitespace, `=`, `,`, `:` or `;`; parentheses are
//!     kept with the word, so `rgb(1, 2, 3)` is one token
//!   - any other single character, such as `,`
//!
//! `url(#name)` is reduced to `name`.

use crate::error::{DrawError, DrawResult};
use crate::paths::Point;

/// A token and the byte offset where it starts
#[derive(Debug,Clone,PartialEq)]
pub struct Token {
    pub text: String,
    pub offset: usize,
    /// Token came from a quoted string
    pub quoted: bool,
}

impl Token {
    pub fn is(&self, s: &str) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case(s)
    }
}

/// Length of the number at the start of `b`, 0 if there is none
fn number_len(b: &[u8]) -> usize {
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - start;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let f = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - f;
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let e = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > e {
            i = j;
        }
    }
    i
}

/// Leading finite number of `s`, ignoring anything after it
pub fn leading_number(s: &str) -> Option<f64> {
    let n = number_len(s.trim_start().as_bytes());
    if n == 0 {
        return None;
    }
    s.trim_start()[..n].parse().ok().filter(|v: &f64| v.is_finite())
}

/// Cursor over a drawing program
#[derive(Debug,Clone)]
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
    /// Byte offset of the cursor
    pub fn offset(&self) -> usize {
        self.pos
    }
    pub fn source(&self) -> &'a str {
        self.src
    }
    fn skip_space(&mut self) {
        let b = self.src.as_bytes();
        while self.pos < b.len() && b[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }
    /// Skip to the start of the next line
    pub fn skip_line(&mut self) {
        match self.src[self.pos..].find('\n') {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.src.len(),
        }
    }
    pub fn at_end(&self) -> bool {
        self.src[self.pos..].trim_start().is_empty()
    }
    /// Next token without consuming it
    pub fn peek(&self) -> Option<Token> {
        self.clone().next()
    }
    /// Is the next token a number
    pub fn peek_number(&self) -> bool {
        let rest = self.src[self.pos..].trim_start();
        !rest.starts_with(',') && number_len(rest.as_bytes()) > 0
    }

    fn quoted(&mut self, open: u8) -> Token {
        let b = self.src.as_bytes();
        let offset = self.pos;
        let close = match open {
            b'`' => b'\'',
            b'{' => b'}',
            c => c,
        };
        let mut out = Vec::new();
        let mut i = self.pos + 1;
        while i < b.len() {
            if b[i] == b'\\' && i + 1 < b.len() && (b[i + 1] == close || b[i + 1] == b'\\') {
                out.push(b[i + 1]);
                i += 2;
                continue;
            }
            if b[i] == close {
                i += 1;
                break;
            }
            out.push(b[i]);
            i += 1;
        }
        self.pos = i;
        Token { text: String::from_utf8_lossy(&out).into_owned(), offset, quoted: true }
    }

    fn word(&mut self) -> String {
        let b = self.src.as_bytes();
        let start = self.pos;
        let mut i = self.pos;
        while i < b.len() {
            let c = b[i];
            let escaped = i > start && b[i - 1] == b'\\';
            if (c.is_ascii_whitespace() || matches!(c, b'=' | b',' | b':' | b';')) && !escaped {
                break;
            }
            if i > start && c == b'<' {
                break;
            }
            i += 1;
            if c == b'>' {
                break;
            }
            if c == b'(' {
                while i < b.len() {
                    let d = b[i];
                    i += 1;
                    if d == b')' && b[i - 2] != b'\\' {
                        break;
                    }
                }
            }
        }
        self.pos = i;
        let mut text = self.src[start..i].to_string();
        if text.len() > 5 && text.as_bytes()[..4].eq_ignore_ascii_case(b"url(") {
            let inner = text[4..].trim_end_matches(')');
            text = inner.strip_prefix('#').unwrap_or(inner).to_string();
        }
        text
    }

    /// Consume the next token
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_space();
        let b = self.src.as_bytes();
        if self.pos >= b.len() {
            return None;
        }
        let offset = self.pos;
        let c = b[self.pos];
        let text = match c {
            b'"' | b'\'' | b'`' | b'{' => return Some(self.quoted(c)),
            b'/' => {
                let n = if matches!(b.get(self.pos + 1), Some(b'>') | Some(b'/')) { 2 } else { 1 };
                self.pos += n;
                self.src[offset..offset + n].to_string()
            }
            _ => {
                let n = number_len(&b[self.pos..]);
                if n > 0 {
                    self.pos += n;
                    if b.get(self.pos) == Some(&b'%') {
                        self.pos += 1;
                    }
                    self.src[offset..self.pos].to_string()
                } else if !c.is_ascii_alphabetic() && c.is_ascii() && c != b'#' && c != b'<' {
                    self.pos += 1;
                    (c as char).to_string()
                } else {
                    self.word()
                }
            }
        };
        Some(Token { text, offset, quoted: false })
    }

    /// Next token, failing at the end of the program
    pub fn expect(&mut self, keyword: &str, expected: &'static str) -> DrawResult<Token> {
        self.next_token()
            .ok_or_else(|| DrawError::parse(keyword, expected, "end of program"))
    }

    /// Consume a `,` if one is next
    pub fn skip_comma(&mut self) {
        if self.peek().is_some_and(|t| t.is(",")) {
            self.next_token();
        }
    }

    /// A number, optionally preceded by a comma
    pub fn number(&mut self, keyword: &str) -> DrawResult<f64> {
        self.skip_comma();
        let t = self.expect(keyword, "number")?;
        leading_number(&t.text).ok_or_else(|| DrawError::parse(keyword, "number", t.text))
    }

    /// A number where `n%` means `n/100`
    pub fn fraction(&mut self, keyword: &str) -> DrawResult<f64> {
        self.skip_comma();
        let t = self.expect(keyword, "number")?;
        let v = leading_number(&t.text)
            .ok_or_else(|| DrawError::parse(keyword, "number", t.text.clone()))?;
        Ok(if t.text.contains('%') { v / 100.0 } else { v })
    }

    /// A point `x,y` or `x y`; a trailing comma is consumed
    pub fn point(&mut self, keyword: &str) -> DrawResult<Point> {
        let x = self.number(keyword)?;
        let y = self.number(keyword)?;
        self.skip_comma();
        Ok(Point::new(x, y))
    }

    /// All points up to the next token that is not a number
    pub fn points(&mut self, keyword: &str) -> DrawResult<Vec<Point>> {
        let mut v = vec![];
        while self.peek_number() {
            crate::error::reserve(&mut v, 1)?;
            v.push(self.point(keyword)?);
        }
        Ok(v)
    }

    /// Source text from `start` up to the cursor
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.src[start..self.pos]
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;
    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(s: &str) -> Vec<String> {
        Tokenizer::new(s).map(|t| t.text).collect()
    }

    #[test]
    fn splits_points_and_words() {
        assert_eq!(texts("line 0,0 10,-2.5e1"), ["line", "0", ",", "0", "10", ",", "-2.5e1"]);
        assert_eq!(texts("fill-opacity 50%"), ["fill-opacity", "50%"]);
        assert_eq!(texts("fill rgb(1, 2, 3) stroke #f00"),
                   ["fill", "rgb(1, 2, 3)", "stroke", "#f00"]);
    }

    #[test]
    fn quoted_strings() {
        let t: Vec<Token> = Tokenizer::new(r#"text 1,2 "say \"hi\"" {a b}"#).collect();
        assert_eq!(t[4].text, r#"say "hi""#);
        assert!(t[4].quoted);
        assert_eq!(t[5].text, "a b");
    }

    #[test]
    fn url_reference() {
        assert_eq!(texts("fill url(#grad)"), ["fill", "grad"]);
    }

    #[test]
    fn multibyte_words() {
        assert_eq!(texts("abcéx 1,1"), ["abcéx", "1", ",", "1"]);
        assert_eq!(texts("é"), ["é"]);
        assert_eq!(texts("url(#ré)"), ["ré"]);
    }

    #[test]
    fn point_parsing() {
        let mut t = Tokenizer::new("1,2 3 4, 5,6 rectangle");
        let pts = t.points("polyline").unwrap();
        assert_eq!(pts, vec![Point::new(1., 2.), Point::new(3., 4.), Point::new(5., 6.)]);
        assert_eq!(t.next_token().unwrap().text, "rectangle");
    }

    #[test]
    fn bad_number_names_keyword() {
        let mut t = Tokenizer::new("abc");
        let err = t.number("stroke-width").unwrap_err();
        assert!(err.to_string().contains("stroke-width"));
        assert_eq!(leading_number("12.5%"), Some(12.5));
        assert_eq!(leading_number("1e999"), None);
    }
}
