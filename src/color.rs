//! Colors
//!
//! Colors are 8-bit RGBA. Color strings accept
//!
//!   - `none` (fully transparent)
//!   - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`
//!   - `rgb(r,g,b)` and `rgba(r,g,b,a)`, components as 0-255 or percentages,
//!     alpha as 0-1
//!   - the SVG and X11 color names, including numbered variants such as
//!     `gray50` or `red3`
//!

use crate::colornames::NAMED;

/// Convert an f64 [0,1] component to a u8 [0,255] component
pub fn cu8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn color_u8_to_f64(x: u8) -> f64 {
    f64::from(x) / 255.0
}

/// Access to color components as floats in [0,1] or as bytes
pub trait Color {
    fn red(&self) -> f64;
    fn green(&self) -> f64;
    fn blue(&self) -> f64;
    fn alpha(&self) -> f64;
    fn red8(&self) -> u8;
    fn green8(&self) -> u8;
    fn blue8(&self) -> u8;
    fn alpha8(&self) -> u8;
    /// Fully transparent colors paint nothing
    fn is_visible(&self) -> bool {
        self.alpha8() > 0
    }
}

/// Color as Red, Green, Blue, and Alpha
#[derive(Debug,Default,Copy,Clone,PartialEq,Eq,Hash)]
pub struct Rgba8 {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba8 {
    /// White Color (255,255,255,255)
    pub fn white() -> Self {
        Self::new(255,255,255,255)
    }
    /// Black Color (0,0,0,255)
    pub fn black() -> Self {
        Self::new(0,0,0,255)
    }
    /// Transparent Black (0,0,0,0)
    pub fn transparent() -> Self {
        Self::new(0,0,0,0)
    }
    /// Create new color
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba8 { r, g, b, a }
    }
    /// Same color with a different alpha
    pub fn with_alpha(&self, a: u8) -> Self {
        Self { a, ..*self }
    }
    pub fn from_slice(v: &[u8]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Color for Rgba8 {
    fn   red(&self) -> f64 { color_u8_to_f64(self.r) }
    fn green(&self) -> f64 { color_u8_to_f64(self.g) }
    fn  blue(&self) -> f64 { color_u8_to_f64(self.b) }
    fn alpha(&self) -> f64 { color_u8_to_f64(self.a) }
    fn alpha8(&self) -> u8 { self.a }
    fn red8(&self) -> u8 { self.r }
    fn green8(&self) -> u8 { self.g }
    fn blue8(&self) -> u8 { self.b }
}

impl From<image::Rgba<u8>> for Rgba8 {
    fn from(c: image::Rgba<u8>) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba8> for image::Rgba<u8> {
    fn from(c: Rgba8) -> Self {
        image::Rgba(c.to_array())
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|v| v as u8)
}

fn parse_hex(s: &str) -> Option<Rgba8> {
    let d: Vec<u8> = s.bytes().map(hex_digit).collect::<Option<_>>()?;
    let pair = |i: usize| d[i] * 16 + d[i + 1];
    let c = match d.len() {
        3 => Rgba8::new(d[0] * 17, d[1] * 17, d[2] * 17, 255),
        4 => Rgba8::new(d[0] * 17, d[1] * 17, d[2] * 17, d[3] * 17),
        6 => Rgba8::new(pair(0), pair(2), pair(4), 255),
        8 => Rgba8::new(pair(0), pair(2), pair(4), pair(6)),
        _ => return None,
    };
    Some(c)
}

/// Component of an `rgb()` color, either 0-255 or a percentage
fn component(s: &str) -> Option<u8> {
    let s = s.trim();
    if let Some(p) = s.strip_suffix('%') {
        let v: f64 = p.trim().parse().ok()?;
        return Some(cu8(v / 100.0));
    }
    let v: f64 = s.parse().ok()?;
    Some(v.clamp(0.0, 255.0).round() as u8)
}

fn parse_functional(s: &str) -> Option<Rgba8> {
    let (name, rest) = s.split_once('(')?;
    let args: Vec<&str> = rest.strip_suffix(')')?.split(',').collect();
    match (name.trim(), args.len()) {
        ("rgb", 3) => Some(Rgba8::new(component(args[0])?, component(args[1])?,
                                      component(args[2])?, 255)),
        ("rgba", 4) => {
            let a = args[3].trim();
            let a = match a.strip_suffix('%') {
                Some(p) => p.trim().parse::<f64>().ok()? / 100.0,
                None => a.parse::<f64>().ok()?,
            };
            Some(Rgba8::new(component(args[0])?, component(args[1])?,
                            component(args[2])?, cu8(a)))
        }
        _ => None,
    }
}

/// Parse a color string
pub fn parse_color(s: &str) -> Option<Rgba8> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    if matches!(lower.as_str(), "none" | "transparent" | "freeze" | "matte") {
        return Some(Rgba8::transparent());
    }
    if lower.contains('(') {
        return parse_functional(&lower);
    }
    NAMED.binary_search_by(|(name, _)| (*name).cmp(lower.as_str()))
        .ok()
        .map(|i| {
            let [r, g, b] = NAMED[i].1;
            Rgba8::new(r, g, b, 255)
        })
}
