//! SVG Path Data
//!
//! Parses the `d` attribute grammar of SVG paths and flattens it into
//! subpaths of points. Commands are
//!
//!   - `M m` move to, starting a new subpath
//!   - `L l H h V v` straight lines
//!   - `C c S s` cubic Bezier curves
//!   - `Q q T t` quadratic Bezier curves
//!   - `A a` elliptical arcs
//!   - `Z z` close the current subpath
//!
//! Lower case commands take coordinates relative to the current point. A
//! command letter may be followed by several argument groups, in which case
//! the command repeats.

use crate::error::{DrawError, DrawResult};
use crate::paths::Point;
use crate::trace::{trace_arc_path, trace_bezier};

/// Byte cursor over path data
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { data: s.as_bytes(), pos: 0 }
    }
    fn skip_separators(&mut self) {
        while self.pos < self.data.len() &&
            (self.data[self.pos].is_ascii_whitespace() || self.data[self.pos] == b',') {
            self.pos += 1;
        }
    }
    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }
    /// Is another numeric argument next
    fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == b'-' || c == b'+' || c == b'.')
    }
    fn error(&self, expected: &'static str) -> DrawError {
        let end = (self.pos + 12).min(self.data.len());
        let found = String::from_utf8_lossy(&self.data[self.pos..end]).into_owned();
        DrawError::parse("path", expected, found)
    }
    fn number(&mut self) -> DrawResult<f64> {
        self.skip_separators();
        let start = self.pos;
        let d = self.data;
        let mut i = self.pos;
        if i < d.len() && (d[i] == b'+' || d[i] == b'-') {
            i += 1;
        }
        while i < d.len() && d[i].is_ascii_digit() {
            i += 1;
        }
        if i < d.len() && d[i] == b'.' {
            i += 1;
            while i < d.len() && d[i].is_ascii_digit() {
                i += 1;
            }
        }
        if i < d.len() && (d[i] == b'e' || d[i] == b'E') {
            let mut j = i + 1;
            if j < d.len() && (d[j] == b'+' || d[j] == b'-') {
                j += 1;
            }
            if j < d.len() && d[j].is_ascii_digit() {
                while j < d.len() && d[j].is_ascii_digit() {
                    j += 1;
                }
                i = j;
            }
        }
        let text = std::str::from_utf8(&d[start..i]).map_err(|_| self.error("number"))?;
        let v = text.parse::<f64>().map_err(|_| self.error("number"))?;
        self.pos = i;
        Ok(v)
    }
    fn pair(&mut self) -> DrawResult<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Point::new(x, y))
    }
    /// Arc flags may be written without separators, as in `a5,5 0 01 10,0`
    fn flag(&mut self) -> DrawResult<bool> {
        self.skip_separators();
        match self.peek() {
            Some(b'0') => { self.pos += 1; Ok(false) }
            Some(b'1') => { self.pos += 1; Ok(true) }
            _ => Err(self.error("arc flag")),
        }
    }
}

/// Subpath assembly while walking the path data
#[derive(Default)]
struct Builder {
    subpaths: Vec<Vec<Point>>,
    current: Vec<Point>,
    point: Point,
    start: Point,
}

impl Builder {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.subpaths.push(std::mem::take(&mut self.current));
        }
    }
    fn move_to(&mut self, p: Point) {
        self.flush();
        self.start = p;
        self.point = p;
        self.current.push(p);
    }
    /// Drawing commands continue from the current point
    fn begin(&mut self) {
        if self.current.is_empty() {
            self.current.push(self.point);
        }
    }
    fn line_to(&mut self, p: Point) {
        self.begin();
        self.current.push(p);
        self.point = p;
    }
    /// Append a curve whose first point is the current point
    fn extend(&mut self, pts: Vec<Point>) {
        self.begin();
        if let Some(last) = pts.last() {
            self.point = *last;
        }
        self.current.extend(pts.into_iter().skip(1));
    }
    fn close(&mut self) {
        if !self.current.is_empty() {
            self.current.push(self.start);
        }
        self.flush();
        self.point = self.start;
    }
}

fn reflect(point: Point, control: Point) -> Point {
    Point::new(2.0 * point.x - control.x, 2.0 * point.y - control.y)
}

/// Flatten SVG path data into subpaths
pub fn trace_path(data: &str) -> DrawResult<Vec<Vec<Point>>> {
    let mut s = Scanner::new(data);
    let mut b = Builder::default();
    let mut last_cubic = Point::default();
    let mut last_quad = Point::default();
    let mut last_cmd = b' ';
    loop {
        s.skip_separators();
        let cmd = match s.peek() {
            Some(c) => c,
            None => break,
        };
        s.pos += 1;
        let relative = cmd.is_ascii_lowercase();
        let mut repeat = false;
        loop {
            let origin = if relative { b.point } else { Point::default() };
            let rel = |p: Point| Point::new(origin.x + p.x, origin.y + p.y);
            match cmd.to_ascii_uppercase() {
                b'M' => {
                    let p = rel(s.pair()?);
                    if repeat {
                        // implicit repeats of a moveto are linetos
                        b.line_to(p);
                    } else {
                        b.move_to(p);
                    }
                }
                b'L' => {
                    let p = rel(s.pair()?);
                    b.line_to(p);
                }
                b'H' => {
                    let x = s.number()? + origin.x;
                    b.line_to(Point::new(x, b.point.y));
                }
                b'V' => {
                    let y = s.number()? + origin.y;
                    b.line_to(Point::new(b.point.x, y));
                }
                b'C' => {
                    let c1 = rel(s.pair()?);
                    let c2 = rel(s.pair()?);
                    let end = rel(s.pair()?);
                    b.extend(trace_bezier(&[b.point, c1, c2, end]));
                    last_cubic = c2;
                }
                b'S' => {
                    let c1 = if matches!(last_cmd, b'C' | b'c' | b'S' | b's') {
                        reflect(b.point, last_cubic)
                    } else {
                        b.point
                    };
                    let c2 = rel(s.pair()?);
                    let end = rel(s.pair()?);
                    b.extend(trace_bezier(&[b.point, c1, c2, end]));
                    last_cubic = c2;
                }
                b'Q' => {
                    let c = rel(s.pair()?);
                    let end = rel(s.pair()?);
                    b.extend(trace_bezier(&[b.point, c, end]));
                    last_quad = c;
                }
                b'T' => {
                    let c = if matches!(last_cmd, b'Q' | b'q' | b'T' | b't') {
                        reflect(b.point, last_quad)
                    } else {
                        b.point
                    };
                    let end = rel(s.pair()?);
                    b.extend(trace_bezier(&[b.point, c, end]));
                    last_quad = c;
                }
                b'A' => {
                    let radii = s.pair()?;
                    let angle = s.number()?;
                    let large_arc = s.flag()?;
                    let sweep = s.flag()?;
                    let end = rel(s.pair()?);
                    b.extend(trace_arc_path(b.point, end, radii, angle, large_arc, sweep));
                }
                b'Z' => {
                    b.close();
                }
                _ => {
                    let found = (cmd as char).to_string();
                    return Err(DrawError::parse("path", "command", found));
                }
            }
            last_cmd = cmd;
            repeat = true;
            if cmd.to_ascii_uppercase() == b'Z' || !s.at_number() {
                break;
            }
        }
    }
    b.flush();
    tracing::trace!(subpaths = b.subpaths.len(), "path data");
    Ok(b.subpaths)
}
