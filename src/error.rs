use core::fmt;
use std::io;

/// A structured code identifying why the wire data was rejected.
///
/// This enum is intentionally stable and string-free so error handling can
/// match on codes rather than message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecErrorCode {
    /// Unexpected end-of-input while decoding.
    UnexpectedEof,
    /// Nesting depth limit exceeded.
    DepthLimitExceeded,

    /// Reserved CBOR additional-info value (28..30) was used.
    ReservedAdditionalInfo,
    /// CBOR indefinite-length marker used where a length is required.
    InvalidIndefiniteLength,
    /// CBOR `break` (0xff) outside an indefinite-length container.
    UnexpectedBreak,
    /// Chunk of an indefinite-length string has the wrong major type.
    InvalidStringChunk,
    /// Unsupported CBOR simple value.
    UnsupportedSimpleValue,
    /// Integer on the wire does not fit the document model.
    IntegerOutOfRange,

    /// Unexpected character in JSON input.
    InvalidSyntax,
    /// Malformed `true`/`false`/`null` literal.
    InvalidLiteral,
    /// Malformed JSON number.
    InvalidNumber,
    /// JSON number token exceeds the supported length.
    NumberTooLong,
    /// Malformed string escape sequence.
    InvalidEscape,

    /// Text content is not valid UTF-8.
    InvalidUtf8,
}

/// A malformed-input error with a stable code and a byte offset.
///
/// Offsets refer to the input byte position where the error was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecError {
    /// The error code.
    pub code: CodecErrorCode,
    /// Byte offset into the input where the error was detected.
    pub offset: u64,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.code {
            CodecErrorCode::UnexpectedEof => "unexpected end of input",
            CodecErrorCode::DepthLimitExceeded => "nesting depth limit exceeded",
            CodecErrorCode::ReservedAdditionalInfo => "reserved additional info value",
            CodecErrorCode::InvalidIndefiniteLength => {
                "indefinite length not permitted for this item"
            }
            CodecErrorCode::UnexpectedBreak => "break outside indefinite-length container",
            CodecErrorCode::InvalidStringChunk => "indefinite string chunk of mismatched type",
            CodecErrorCode::UnsupportedSimpleValue => "unsupported simple value",
            CodecErrorCode::IntegerOutOfRange => "integer outside representable range",
            CodecErrorCode::InvalidSyntax => "invalid syntax",
            CodecErrorCode::InvalidLiteral => "malformed literal",
            CodecErrorCode::InvalidNumber => "malformed number",
            CodecErrorCode::NumberTooLong => "number token too long",
            CodecErrorCode::InvalidEscape => "malformed string escape",
            CodecErrorCode::InvalidUtf8 => "text is not valid UTF-8",
        };
        write!(f, "codec error at {}: {msg}", self.offset)
    }
}

/// A structured code identifying a caller-side contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MisuseCode {
    /// A second top-level document was written to a root writer.
    RootAlreadyWritten,
    /// The root writer was finished without writing a document.
    RootNotWritten,
    /// The root reader's document was requested twice.
    RootAlreadyRead,
    /// A parent was operated on while a child container/string was unfinished.
    ChildNotFinished,
    /// A child position was requested but the previous one was never written.
    SlotNotWritten,
    /// A size-declared array received the wrong number of elements.
    ArrayLenMismatch,
    /// A size-declared map received the wrong number of pairs.
    MapLenMismatch,
    /// A size-declared string received the wrong number of bytes.
    StringLenMismatch,
    /// A map value was requested before its key.
    KeyExpected,
    /// A map was advanced or finished while a value was still expected.
    ValueExpected,
    /// A container reader was advanced past its end.
    ReadPastEnd,
    /// A document accessor was called for a different kind.
    WrongDocumentKind,
    /// A filtered-map index is outside the key table.
    IndexOutOfRange,
}

/// A contract violation by the caller, distinct from malformed input and I/O
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MisuseError {
    /// The misuse code.
    pub code: MisuseCode,
}

impl fmt::Display for MisuseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self.code {
            MisuseCode::RootAlreadyWritten => "root writer accepts exactly one document",
            MisuseCode::RootNotWritten => "root writer finished without a document",
            MisuseCode::RootAlreadyRead => "root document already read",
            MisuseCode::ChildNotFinished => "child writer was not finished",
            MisuseCode::SlotNotWritten => "previous child position was never written",
            MisuseCode::ArrayLenMismatch => "array element count does not match declared size",
            MisuseCode::MapLenMismatch => "map pair count does not match declared size",
            MisuseCode::StringLenMismatch => "string byte count does not match declared size",
            MisuseCode::KeyExpected => "map key expected",
            MisuseCode::ValueExpected => "map value expected",
            MisuseCode::ReadPastEnd => "container reader advanced past its end",
            MisuseCode::WrongDocumentKind => "document is not of the requested kind",
            MisuseCode::IndexOutOfRange => "key index outside the filtered key table",
        };
        write!(f, "misuse: {msg}")
    }
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Failure surfaced by the underlying byte stream.
    Io,
    /// Malformed data on the wire.
    Codec,
    /// Contract violation by the caller.
    Misuse,
}

/// The error type shared by every reader and writer operation.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failure surfaced by the underlying byte stream, propagated unchanged.
    Io(io::Error),
    /// Malformed data on the wire. The document tree is poisoned.
    Codec(CodecError),
    /// Contract violation by the caller. Does not poison the tree.
    Misuse(MisuseError),
}

impl Error {
    #[inline]
    pub(crate) const fn codec(code: CodecErrorCode, offset: u64) -> Self {
        Self::Codec(CodecError { code, offset })
    }

    #[inline]
    pub(crate) const fn misuse(code: MisuseCode) -> Self {
        Self::Misuse(MisuseError { code })
    }

    /// Classify this error.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Codec(_) => ErrorKind::Codec,
            Self::Misuse(_) => ErrorKind::Misuse,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Codec(e) => fmt::Display::fmt(e, f),
            Self::Misuse(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Codec(_) | Self::Misuse(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::Codec(c) => Self::new(io::ErrorKind::InvalidData, Error::Codec(c)),
            Error::Misuse(m) => Self::new(io::ErrorKind::Other, Error::Misuse(m)),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Replayable form of a poisoning error.
///
/// Io errors are not `Clone`; the kind is retained so every operation after a
/// failure reports the same error kind.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Replay {
    Io(io::ErrorKind),
    Codec(CodecError),
}

impl Replay {
    pub(crate) fn capture(e: &Error) -> Option<Self> {
        match e {
            Error::Io(e) => Some(Self::Io(e.kind())),
            Error::Codec(c) => Some(Self::Codec(*c)),
            Error::Misuse(_) => None,
        }
    }

    pub(crate) fn to_error(self) -> Error {
        match self {
            Self::Io(kind) => Error::Io(io::Error::from(kind)),
            Self::Codec(c) => Error::Codec(c),
        }
    }
}
