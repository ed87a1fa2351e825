use core::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub struct Error {
    repr: Repr,
}

pub(crate) enum Repr {
    DuplicateFrameHeader,
    InvalidFrameHeader(Box<Error>),
    Truncated,
    Other(String),
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A second `SOFn` segment was found before the picture ended.
    DuplicateFrameHeader,
    /// A `SOFn` segment could not be decoded.
    InvalidFrameHeader,
    /// A segment ended before all of its fields could be read.
    Truncated,
    Other,
}

impl From<String> for Repr {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}
impl<'a> From<&'a str> for Repr {
    fn from(value: &'a str) -> Self {
        Self::Other(value.into())
    }
}

impl Error {
    pub(crate) fn from(e: impl Into<Repr>) -> Self {
        Self { repr: e.into() }
    }

    pub(crate) fn truncated() -> Self {
        Self {
            repr: Repr::Truncated,
        }
    }

    pub(crate) fn duplicate_frame_header() -> Self {
        Self {
            repr: Repr::DuplicateFrameHeader,
        }
    }

    pub(crate) fn invalid_frame_header(cause: Error) -> Self {
        Self {
            repr: Repr::InvalidFrameHeader(Box::new(cause)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            Repr::DuplicateFrameHeader => ErrorKind::DuplicateFrameHeader,
            Repr::InvalidFrameHeader(_) => ErrorKind::InvalidFrameHeader,
            Repr::Truncated => ErrorKind::Truncated,
            Repr::Other(_) => ErrorKind::Other,
        }
    }

    /// Returns whether this error aborts the stream it occurred in.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DuplicateFrameHeader | ErrorKind::InvalidFrameHeader
        )
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::DuplicateFrameHeader => f.write_str("duplicate SOF marker in JPEG stream"),
            Repr::InvalidFrameHeader(cause) => write!(f, "bad SOF marker segment: {cause}"),
            Repr::Truncated => f.write_str("reached end of segment while decoding JPEG stream"),
            Repr::Other(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.repr {
            Repr::InvalidFrameHeader(cause) => Some(&**cause),
            _ => None,
        }
    }
}
