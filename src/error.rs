//! Errors and Diagnostics
//!
//! Problems found while interpreting a drawing program fall into three
//! classes:
//!
//!   - **Parse** errors stop the remaining commands of a render call
//!   - **Geometry** errors skip the offending primitive
//!   - **Allocation** errors abort the whole render call
//!
//! Parse and geometry problems are collected as [`Diagnostic`]s inside the
//! returned [`Status`]; fatal problems are returned as `Err(DrawError)`.

use std::fmt;

pub type DrawResult<T> = Result<T, DrawError>;

/// Broad category of a [`DrawError`]
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum ErrorKind {
    Parse,
    Geometry,
    Allocation,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Geometry => "geometry",
            ErrorKind::Allocation => "allocation",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DrawError {
    #[error("unrecognized keyword `{keyword}` at offset {offset}")]
    UnknownKeyword { keyword: String, offset: usize },

    #[error("expected {expected} after `{keyword}`, found `{found}`")]
    Parse { keyword: String, expected: &'static str, found: String },

    #[error("unbalanced graphic-context push/pop")]
    UnbalancedPushPop,

    #[error("nonconforming {primitive} primitive #{index}: {reason}")]
    Geometry { primitive: String, index: usize, reason: String },

    #[error("memory allocation failed for {requested} elements")]
    Allocation { requested: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl DrawError {
    pub fn parse(keyword: impl Into<String>, expected: &'static str, found: impl Into<String>) -> Self {
        Self::Parse { keyword: keyword.into(), expected, found: found.into() }
    }

    pub fn geometry(primitive: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::Geometry { primitive: primitive.into(), index, reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DrawError::UnknownKeyword { .. } |
            DrawError::Parse { .. } |
            DrawError::UnbalancedPushPop => ErrorKind::Parse,
            DrawError::Geometry { .. } |
            DrawError::Font(_) => ErrorKind::Geometry,
            DrawError::Allocation { .. } |
            DrawError::ThreadPool(_) => ErrorKind::Allocation,
            DrawError::Image(_) |
            DrawError::Io(_) => ErrorKind::Io,
        }
    }

    /// Only allocation failures unwind a whole render call
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Allocation
    }

    /// Offending token or primitive text, if known
    pub fn token(&self) -> Option<&str> {
        match self {
            DrawError::UnknownKeyword { keyword, .. } => Some(keyword),
            DrawError::Parse { found, .. } => Some(found),
            DrawError::Geometry { primitive, .. } => Some(primitive),
            _ => None,
        }
    }
}

/// Grow `v` so that `additional` more elements fit, reporting failure
/// instead of aborting the process
pub(crate) fn reserve<T>(v: &mut Vec<T>, additional: usize) -> DrawResult<()> {
    v.try_reserve(additional)
        .map_err(|_| DrawError::Allocation { requested: v.len().saturating_add(additional) })
}

/// One reported problem, located by token and primitive index
#[derive(Debug,Clone,PartialEq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub token: Option<String>,
    pub primitive_index: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn from_error(err: &DrawError, primitive_index: Option<usize>) -> Self {
        Self {
            kind: err.kind(),
            token: err.token().map(String::from),
            primitive_index,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)?;
        if let Some(i) = self.primitive_index {
            write!(f, " (primitive {})", i)?;
        }
        Ok(())
    }
}

/// Outcome of a render call that did not fail fatally
#[derive(Debug,Clone,PartialEq,Default)]
pub struct Status {
    pub success: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Status {
    pub fn ok() -> Self {
        Self { success: true, diagnostics: vec![] }
    }
    /// Record a problem; parse problems clear the success flag
    pub fn report(&mut self, diag: Diagnostic) {
        tracing::warn!("{}", diag);
        if diag.kind != ErrorKind::Geometry {
            self.success = false;
        }
        self.diagnostics.push(diag);
    }
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_taxonomy() {
        assert_eq!(DrawError::UnbalancedPushPop.kind(), ErrorKind::Parse);
        assert_eq!(DrawError::geometry("ellipse", 0, "x").kind(), ErrorKind::Geometry);
        assert!(DrawError::Allocation { requested: 3 }.is_fatal());
        assert!(!DrawError::parse("fill", "color", "x").is_fatal());
    }

    #[test]
    fn diagnostic_names_keyword() {
        let e = DrawError::UnknownKeyword { keyword: "bogus".into(), offset: 4 };
        let d = Diagnostic::from_error(&e, Some(2));
        assert_eq!(d.token.as_deref(), Some("bogus"));
        assert!(d.to_string().contains("bogus"));
        assert!(d.to_string().contains("primitive 2"));
    }

    #[test]
    fn geometry_reports_keep_success() {
        let mut s = Status::ok();
        s.report(Diagnostic::from_error(&DrawError::geometry("line", 0, "x"), Some(0)));
        assert!(s.success);
        s.report(Diagnostic::from_error(&DrawError::UnbalancedPushPop, None));
        assert!(!s.success);
    }
}
