//! Dash Patterns
//!
//! A dash pattern alternates "on" and "off" lengths along the arc length
//! of a path. Each "on" run becomes its own open polyline and is stroked
//! independently, so joins never bridge a gap.

use crate::paths::Point;
use crate::DRAW_EPSILON;

/// Most runs a single primitive may be cut into
pub const MAX_DASH_RUNS: usize = 1 << 20;

/// Repeating on/off lengths with a starting offset
#[derive(Debug,Clone,PartialEq)]
pub struct DashPattern {
    lengths: Vec<f64>,
    offset: f64,
}

/// One on or off stretch of a dashed path
#[derive(Debug,Clone,PartialEq)]
pub struct DashRun {
    pub on: bool,
    /// Arc length where the run starts
    pub start: f64,
    /// Arc length where the run ends
    pub end: f64,
    pub points: Vec<Point>,
}

impl DashRun {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

impl DashPattern {
    /// New pattern, `None` if it cannot dash anything
    ///
    /// An odd number of lengths is repeated once so that on and off
    /// alternate. Negative or non-finite lengths, and patterns whose total
    /// length is zero, disable dashing.
    pub fn new(lengths: &[f64], offset: f64) -> Option<Self> {
        if lengths.is_empty() || lengths.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        let mut lengths = lengths.to_vec();
        if lengths.len() % 2 == 1 {
            lengths.extend_from_slice(&lengths.clone());
        }
        let period: f64 = lengths.iter().sum();
        if period <= 0.0 || !offset.is_finite() {
            return None;
        }
        Some(Self { lengths, offset })
    }
    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }
    pub fn offset(&self) -> f64 {
        self.offset
    }
    /// Length of one full cycle
    pub fn period(&self) -> f64 {
        self.lengths.iter().sum()
    }
    /// Pattern with every length and the offset multiplied by `k`, `None`
    /// if the result cannot dash anything
    pub fn scaled(&self, k: f64) -> Option<Self> {
        let lengths: Vec<f64> = self.lengths.iter().map(|v| v * k).collect();
        Self::new(&lengths, self.offset * k)
    }
    /// Upper estimate of the runs `dash_runs` makes over `length` units
    pub fn run_count(&self, length: f64) -> f64 {
        (length / self.period()).ceil() * self.lengths.len() as f64 + 2.0
    }
    /// Run index and length left in it after consuming the offset
    fn start(&self) -> (usize, f64) {
        let n = self.lengths.len();
        let mut o = self.offset.rem_euclid(self.period());
        let mut i = 0;
        for _ in 0..2 * n {
            if o <= 0.0 || o < self.lengths[i] {
                break;
            }
            o -= self.lengths[i];
            i = (i + 1) % n;
        }
        (i, self.lengths[i] - o)
    }
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Walk `path` against `pattern`, returning every on and off run in order
///
/// The runs tile the path: their lengths sum to the path length. When the
/// path ends exactly on a run boundary, a zero length run of the following
/// state is appended.
pub fn dash_runs(path: &[Point], pattern: &DashPattern) -> Vec<DashRun> {
    let first = match path.first() {
        Some(p) => *p,
        None => return vec![],
    };
    let n = pattern.lengths.len();
    let (mut index, mut left) = pattern.start();
    let mut runs = vec![];
    let mut s = 0.0;
    let mut cur = DashRun { on: index % 2 == 0, start: 0.0, end: 0.0, points: vec![first] };
    for w in path.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = a.distance(&b);
        if len < DRAW_EPSILON {
            continue;
        }
        let mut t = 0.0;
        while len - t > left {
            t += left;
            s += left;
            let p = lerp(a, b, t / len);
            cur.points.push(p);
            cur.end = s;
            index = (index + 1) % n;
            left = pattern.lengths[index];
            let next = DashRun { on: index % 2 == 0, start: s, end: s, points: vec![p] };
            runs.push(std::mem::replace(&mut cur, next));
        }
        left -= len - t;
        s += len - t;
        cur.points.push(b);
    }
    cur.end = s;
    let last = cur.points[cur.points.len() - 1];
    runs.push(cur);
    if s > 0.0 && left <= DRAW_EPSILON {
        index = (index + 1) % n;
        runs.push(DashRun { on: index % 2 == 0, start: s, end: s, points: vec![last] });
    }
    runs
}

/// Polylines of the "on" runs of `path`
pub fn split_dashes(path: &[Point], pattern: &DashPattern) -> Vec<Vec<Point>> {
    dash_runs(path, pattern).into_iter()
        .filter(|r| r.on)
        .map(|r| r.points)
        .collect()
}
