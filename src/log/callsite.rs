use std::{fmt, panic::Location};

pub const UNKNOWN_FILE: &str = "<<unknown file>>";
pub const UNKNOWN_LINE: &str = "<<unknown line>>";

/// One entry of a captured call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: String,
    pub line: u32,
}

impl Frame {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl From<&Location<'_>> for Frame {
    fn from(loc: &Location<'_>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

/// Source frames of the current stack, innermost first, beginning at `origin`.
///
/// Frames inside the logger and the unwinder are dropped by anchoring on `origin`,
/// the location `#[track_caller]` reported. Without debug info the stack cannot be
/// matched, and `origin` is returned alone.
pub fn capture_from(origin: &Location<'_>) -> Vec<Frame> {
    let origin = Frame::from(origin);
    let trace = backtrace::Backtrace::new();
    let mut frames: Vec<Frame> = trace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .filter_map(|sym| {
            let file = sym.filename()?.to_string_lossy().into_owned();
            Some(Frame::new(file, sym.lineno()?))
        })
        .collect();

    match frames
        .iter()
        .position(|f| f.line == origin.line && f.file.ends_with(&origin.file))
    {
        Some(start) => frames.split_off(start),
        None => vec![origin],
    }
}

/// File and line of the application code that issued a log call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Callsite {
    file: Option<String>,
    line: Option<u32>,
}

impl Callsite {
    /// A call-site nobody could attribute.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            file: None,
            line: None,
        }
    }

    /// Picks the first frame whose file contains none of the `ignored` fragments
    /// (compared case-insensitively).
    pub fn resolve<'a, I, S>(frames: I, ignored: &[S]) -> Self
    where
        I: IntoIterator<Item = &'a Frame>,
        S: AsRef<str>,
    {
        frames
            .into_iter()
            .find(|frame| {
                let file = frame.file.to_lowercase();
                !ignored
                    .iter()
                    .any(|frag| file.contains(&frag.as_ref().to_lowercase()))
            })
            .map_or_else(Self::unknown, |frame| Self {
                file: Some(last_two_segments(&frame.file).to_owned()),
                line: Some(frame.line),
            })
    }

    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        self.line
    }

    /// Displayable file field, with the placeholder when unknown.
    #[must_use]
    pub fn file_field(&self) -> &str {
        self.file.as_deref().unwrap_or(UNKNOWN_FILE)
    }

    /// Displayable line field, with the placeholder when unknown.
    #[must_use]
    pub fn line_field(&self) -> String {
        self.line
            .map_or_else(|| UNKNOWN_LINE.to_owned(), |l| l.to_string())
    }
}

impl fmt::Display for Callsite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_field(), self.line_field())
    }
}

/// Keeps at most the last two segments of `path`, with its own separators.
fn last_two_segments(path: &str) -> &str {
    let is_sep = |c: char| c == '/' || c == '\\';
    let trimmed = path.trim_end_matches(is_sep);
    let Some(last) = trimmed.rfind(is_sep) else {
        return trimmed;
    };
    match trimmed[..last].rfind(is_sep) {
        Some(prev) => &trimmed[prev + 1..],
        None => trimmed,
    }
}
